use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub poll_id: i64,
}

impl Question {
    /// Published within the 24 hours before `now`. Future dates don't count.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

pub async fn create(
    pool: &PgPool,
    poll_id: i64,
    question_text: &str,
    pub_date: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO questions (poll_id, question_text, pub_date) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(poll_id)
    .bind(question_text)
    .bind(pub_date)
    .fetch_one(pool)
    .await
}

pub async fn find_for_poll(pool: &PgPool, poll_id: i64) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, question_text, pub_date, poll_id FROM questions WHERE poll_id = $1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
}

pub async fn count_for_poll(pool: &PgPool, poll_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE poll_id = $1")
        .bind(poll_id)
        .fetch_one(pool)
        .await
}
