use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub selected: bool,
}

pub async fn create(pool: &PgPool, question_id: i64, choice_text: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO choices (question_id, choice_text) VALUES ($1, $2) RETURNING id")
        .bind(question_id)
        .bind(choice_text)
        .fetch_one(pool)
        .await
}

/// All choices of the given questions in one query, ordered by question then id.
pub async fn find_for_questions(pool: &PgPool, question_ids: &[i64]) -> Result<Vec<Choice>, sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text, selected FROM choices \
         WHERE question_id = ANY($1) \
         ORDER BY question_id, id",
    )
    .bind(question_ids)
    .fetch_all(pool)
    .await
}

pub async fn find_for_poll(pool: &PgPool, poll_id: i64) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        "SELECT c.id, c.question_id, c.choice_text, c.selected \
         FROM choices c \
         JOIN questions q ON q.id = c.question_id \
         WHERE q.poll_id = $1 \
         ORDER BY c.question_id, c.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
}
