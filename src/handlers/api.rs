use actix_web::{
    Error, HttpResponse, web,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::cache::PageCache;
use crate::errors::AppError;
use crate::models::answer::Answer;
use crate::models::vote::{self, ApiVoteError};
use crate::models::{poll, results};
use crate::signals;

#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
}

impl ApiErrorResponse {
    fn new(error: &str) -> Self {
        Self { error: error.to_string() }
    }
}

#[derive(Serialize, Debug)]
pub struct VotesAddedResponse {
    pub success: String,
    pub answers: Vec<Answer>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DetailQuery {
    #[serde(default)]
    pub include_answers: bool,
}

fn poll_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiErrorResponse::new("Poll not found"))
}

/// Vote submissions must be sent as JSON; a form post to the API is refused
/// before the extractor runs. Reads pass through.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if *req.method() == actix_web::http::Method::POST {
        let content_type = req
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest()
                .json(ApiErrorResponse::new("Votes must be sent as application/json"));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// POST /polls/api/{poll_id}/vote/
/// Body: `{"choice<question_id>": <choice_id>, ...}` covering every question.
pub async fn vote(
    pool: web::Data<PgPool>,
    cache: web::Data<PageCache>,
    path: web::Path<i64>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    if poll::find_by_id(&pool, poll_id).await?.is_none() {
        return Ok(poll_not_found());
    }

    let outcome = match vote::parse_api_entries(&body) {
        Ok(entries) => vote::submit_api(&pool, poll_id, &entries).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(answers) => {
            signals::answers_changed(&cache, "votes added via API");
            Ok(HttpResponse::Created().json(VotesAddedResponse {
                success: "Votes added".to_string(),
                answers,
            }))
        }
        Err(ApiVoteError::Db(e)) => Err(AppError::Db(e)),
        Err(e) => {
            log::debug!("Poll {poll_id}: API vote rejected: {e}");
            Ok(HttpResponse::BadRequest().json(ApiErrorResponse::new(e.message())))
        }
    }
}

/// GET /polls/api/{poll_id}/results/
/// Nested poll -> questions -> choices with answer counts; `?include_answers=true`
/// also lists each choice's answers.
pub async fn detail(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    query: web::Query<DetailQuery>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let Some(poll) = poll::find_by_id(&pool, poll_id).await? else {
        return Ok(poll_not_found());
    };
    let detail = results::find_detail(&pool, poll, query.include_answers).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Configure the JSON API routes under /polls/api.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/polls/api")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(format!("Invalid JSON body: {err}")).into()
            }))
            .route("/{poll_id}/vote/", web::post().to(vote))
            .route("/{poll_id}/results/", web::get().to(detail)),
    );
}
