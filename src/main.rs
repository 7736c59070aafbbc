use actix_web::{App, HttpServer, middleware, web};

use polls::cache::PageCache;
use polls::config::AppConfig;
use polls::{db, routes, signals};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize database
    let pool = match db::init_pool(&config.database_url, config.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        log::error!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    let cache = web::Data::new(PageCache::new(
        config.page_cache_ttl,
        config.page_cache_max_entries,
    ));
    signals::spawn_answer_listener(pool.clone(), cache.clone());

    let static_dir = config.static_dir.clone();
    log::info!("Starting server at http://{}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            // Static files
            .service(actix_files::Files::new("/static", &static_dir))
            .configure(routes::configure)
            // Default 404 handler (must be registered last)
            .default_service(web::to(routes::not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
