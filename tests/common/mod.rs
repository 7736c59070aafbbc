//! Shared test fixtures for the integration tests.
//!
//! Every test gets its own database from `#[sqlx::test]` with the migrations
//! already applied, so fixtures only need to insert rows.

#![allow(dead_code)]

use std::time::Duration;

use actix_web::web;
use chrono::Utc;
use sqlx::PgPool;

use polls::cache::PageCache;
use polls::models::{choice, poll, question};

pub struct QuestionFixture {
    pub id: i64,
    pub text: String,
    pub choices: Vec<i64>,
}

pub struct PollFixture {
    pub id: i64,
    pub questions: Vec<QuestionFixture>,
}

impl PollFixture {
    /// `choice<question_id>=<choice_id>` pairs picking the n-th choice of every question.
    pub fn pick_all(&self, n: usize) -> Vec<(String, String)> {
        self.questions
            .iter()
            .map(|q| (format!("choice{}", q.id), q.choices[n].to_string()))
            .collect()
    }
}

/// Create a poll with `questions` questions of `choices` choices each.
pub async fn create_poll(pool: &PgPool, name: &str, questions: usize, choices: usize) -> PollFixture {
    let poll_id = poll::create(pool, name).await.expect("create poll");
    let mut fixtures = Vec::with_capacity(questions);
    for q in 1..=questions {
        let text = format!("{name} question {q}");
        let question_id = question::create(pool, poll_id, &text, Utc::now())
            .await
            .expect("create question");
        let mut ids = Vec::with_capacity(choices);
        for c in 1..=choices {
            ids.push(
                choice::create(pool, question_id, &format!("{name} choice {q}-{c}"))
                    .await
                    .expect("create choice"),
            );
        }
        fixtures.push(QuestionFixture { id: question_id, text, choices: ids });
    }
    PollFixture { id: poll_id, questions: fixtures }
}

pub fn page_cache() -> web::Data<PageCache> {
    web::Data::new(PageCache::new(Duration::from_secs(3600), 100))
}

pub async fn total_answers(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers")
        .fetch_one(pool)
        .await
        .expect("count answers")
}

pub async fn selected_choices(pool: &PgPool, poll_id: i64) -> Vec<i64> {
    sqlx::query_scalar(
        "SELECT c.id FROM choices c JOIN questions q ON q.id = c.question_id \
         WHERE q.poll_id = $1 AND c.selected ORDER BY c.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
    .expect("selected choices")
}
