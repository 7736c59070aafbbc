//! Page cache invalidation on answer changes.
//!
//! Votes recorded through this process call [`answers_changed`] right after
//! their transaction commits. Changes made elsewhere (another instance, a
//! manual delete, a cascade from removing a poll) reach us through the
//! `answers_changed` Postgres channel fed by a trigger on `answers`.

use std::time::Duration;

use actix_web::web;
use sqlx::PgPool;
use sqlx::postgres::PgListener;

use crate::cache::PageCache;

pub const ANSWERS_CHANNEL: &str = "answers_changed";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Empty the page cache because answer rows changed.
pub fn answers_changed(cache: &PageCache, reason: &str) {
    let removed = cache.clear();
    log::info!("Cache cleared ({reason}, {removed} page(s) dropped)");
}

/// Keep a LISTEN connection open for the lifetime of the server, clearing the
/// cache on every notification and reconnecting when the connection drops.
pub fn spawn_answer_listener(pool: PgPool, cache: web::Data<PageCache>) {
    actix_web::rt::spawn(async move {
        loop {
            if let Err(e) = listen(&pool, &cache).await {
                log::error!("Answer listener failed: {e}; retrying in {}s", RECONNECT_DELAY.as_secs());
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });
}

/// Open a dedicated connection subscribed to [`ANSWERS_CHANNEL`].
pub async fn subscribe(pool: &PgPool) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(ANSWERS_CHANNEL).await?;
    Ok(listener)
}

/// Wait for the next answer notification and clear the cache for it.
pub async fn clear_on_notification(listener: &mut PgListener, cache: &PageCache) -> Result<(), sqlx::Error> {
    let notification = listener.recv().await?;
    answers_changed(cache, notification.payload());
    Ok(())
}

async fn listen(pool: &PgPool, cache: &PageCache) -> Result<(), sqlx::Error> {
    let mut listener = subscribe(pool).await?;
    log::info!("Listening for answer changes on channel {ANSWERS_CHANNEL}");
    // Notifications sent while we were disconnected are lost.
    if !cache.is_empty() {
        answers_changed(cache, "listener reconnected");
    }

    loop {
        clear_on_notification(&mut listener, cache).await?;
    }
}
