use std::collections::{HashMap, HashSet};

use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::cache::PageCache;
use crate::errors::{AppError, render};
use crate::models::vote::{self, VoteOutcome};
use crate::models::{choice, poll, question, results};
use crate::signals;
use crate::templates_structs::{IndexTemplate, QuestionForm, QuestionsTemplate, ResultsTemplate};

/// GET /polls/
pub async fn index(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let polls = poll::find_all(&pool).await?;
    render(IndexTemplate { polls })
}

/// GET /polls/{poll_id}/
/// Renders the voting form with every question and its choices.
pub async fn detail(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let poll = poll::find_by_id(&pool, poll_id).await?.ok_or(AppError::NotFound)?;

    let questions = question::find_for_poll(&pool, poll_id).await?;
    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let choices = choice::find_for_questions(&pool, &ids).await?;

    render(QuestionsTemplate {
        poll,
        questions: QuestionForm::build_all(&questions, choices, &HashSet::new(), Utc::now()),
        error_message: None,
        missing_questions: vec![],
    })
}

/// GET /polls/{poll_id}/results/
pub async fn results(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let poll = poll::find_by_id(&pool, poll_id).await?.ok_or(AppError::NotFound)?;
    let question_data = results::find_results(&pool, poll_id).await?;
    render(ResultsTemplate { poll, question_data })
}

/// POST /polls/{poll_id}/vote/
/// Records one answer per question, or re-renders the form listing the
/// questions left unanswered.
pub async fn vote(
    pool: web::Data<PgPool>,
    cache: web::Data<PageCache>,
    path: web::Path<i64>,
    form: web::Form<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let poll = poll::find_by_id(&pool, poll_id).await?.ok_or(AppError::NotFound)?;

    match vote::submit_form(&pool, poll_id, &form).await? {
        VoteOutcome::Recorded(_) => {
            signals::answers_changed(&cache, "vote recorded");
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", format!("/polls/{poll_id}/results/")))
                .finish())
        }
        VoteOutcome::Incomplete { missing } => {
            let questions = question::find_for_poll(&pool, poll_id).await?;
            let choices = choice::find_for_poll(&pool, poll_id).await?;
            let missing_ids: HashSet<i64> = missing.iter().map(|q| q.id).collect();

            render(QuestionsTemplate {
                poll,
                questions: QuestionForm::build_all(&questions, choices, &missing_ids, Utc::now()),
                error_message: Some("You didn't select a choice.".to_string()),
                missing_questions: missing.into_iter().map(|q| q.question_text).collect(),
            })
        }
    }
}
