//! Populate the database with sample polls for manual testing.

use clap::Parser;

use polls::config::AppConfig;
use polls::db;
use polls::models::seed;

#[derive(Parser, Debug)]
#[command(name = "polls-seed")]
#[command(about = "Creates sample polls, questions, choices and answers", long_about = None)]
struct Args {
    /// Delete every existing poll before generating
    #[arg(long)]
    flush: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(args.flush).await {
        log::error!("Seeding failed: {e}");
        std::process::exit(1);
    }
}

async fn run(flush: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, 1).await?;
    db::run_migrations(&pool).await?;

    if flush {
        let removed = seed::flush(&pool).await?;
        log::info!("Removed {removed} existing poll(s)");
    }

    log::info!("Creating sample data...");
    seed::generate(&pool).await?;
    log::info!("Sample data created successfully.");
    Ok(())
}
