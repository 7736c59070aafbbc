use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Top-level grouping of questions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Poll {
    pub id: i64,
    pub poll_name: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create(pool: &PgPool, poll_name: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO polls (poll_name) VALUES ($1) RETURNING id")
        .bind(poll_name)
        .fetch_one(pool)
        .await
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<Poll>, sqlx::Error> {
    sqlx::query_as::<_, Poll>("SELECT id, poll_name, created_at FROM polls ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Poll>, sqlx::Error> {
    sqlx::query_as::<_, Poll>("SELECT id, poll_name, created_at FROM polls WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Delete a poll together with its questions, choices and answers.
/// Returns false when no poll had that id.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
