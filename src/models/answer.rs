use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

/// One recorded vote. Serialized as `{id, choice, created_at}`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Answer {
    pub id: i64,
    #[serde(rename = "choice")]
    pub choice_id: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn create(pool: &PgPool, choice_id: i64) -> Result<Answer, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    insert(&mut conn, choice_id).await
}

/// Insert on an existing connection, so callers can run it inside a transaction.
pub async fn insert(conn: &mut PgConnection, choice_id: i64) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "INSERT INTO answers (choice_id) VALUES ($1) RETURNING id, choice_id, created_at",
    )
    .bind(choice_id)
    .fetch_one(conn)
    .await
}

pub async fn count_for_choice(pool: &PgPool, choice_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE choice_id = $1")
        .bind(choice_id)
        .fetch_one(pool)
        .await
}

pub async fn count_for_poll(pool: &PgPool, poll_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM answers a \
         JOIN choices c ON c.id = a.choice_id \
         JOIN questions q ON q.id = c.question_id \
         WHERE q.poll_id = $1",
    )
    .bind(poll_id)
    .fetch_one(pool)
    .await
}

pub async fn find_for_poll(pool: &PgPool, poll_id: i64) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "SELECT a.id, a.choice_id, a.created_at FROM answers a \
         JOIN choices c ON c.id = a.choice_id \
         JOIN questions q ON q.id = c.question_id \
         WHERE q.poll_id = $1 \
         ORDER BY a.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
}

/// Most recently recorded answer across all polls.
pub async fn latest(pool: &PgPool) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "SELECT id, choice_id, created_at FROM answers ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM answers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
