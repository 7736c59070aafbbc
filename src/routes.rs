use actix_web::{HttpResponse, middleware::from_fn, web};

use crate::cache::cache_page;
use crate::errors::AppError;
use crate::handlers::{api, poll_handlers};

/// Every application route. Expects a `PgPool` and a `PageCache` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root redirect
        .route("/", web::get().to(|| async {
            HttpResponse::SeeOther()
                .insert_header(("Location", "/polls/"))
                .finish()
        }))
        // JSON API first so /polls/api/... never reaches the HTML routes
        .configure(api::configure)
        // Cached pages
        .service(
            web::resource("/polls/")
                .wrap(from_fn(cache_page))
                .route(web::get().to(poll_handlers::index)),
        )
        .service(
            web::resource("/polls/{poll_id}/")
                .wrap(from_fn(cache_page))
                .route(web::get().to(poll_handlers::detail)),
        )
        .route("/polls/{poll_id}/results/", web::get().to(poll_handlers::results))
        .route("/polls/{poll_id}/vote/", web::post().to(poll_handlers::vote));
}

/// Fallback for unmatched routes (register last).
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}
