use chrono::Utc;
use sqlx::PgPool;

pub const POLL_COUNT: i64 = 10;
pub const CHOICES_PER_QUESTION: i64 = 5;

/// Polls 1-5 are short, the rest are long enough to exercise the list views.
pub fn questions_for_poll(poll_index: i64) -> i64 {
    if poll_index <= 5 { 5 } else { 50 }
}

/// Only the first three polls come with recorded answers.
pub fn poll_has_answers(poll_index: i64) -> bool {
    poll_index <= 3
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub polls: usize,
    pub questions: usize,
    pub choices: usize,
    pub answers: usize,
}

/// Remove every poll; cascades take questions, choices and answers with them.
pub async fn flush(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM polls").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Generate the sample data set in a single transaction.
pub async fn generate(pool: &PgPool) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();
    let now = Utc::now();

    for p in 1..=POLL_COUNT {
        let poll_id: i64 = sqlx::query_scalar("INSERT INTO polls (poll_name) VALUES ($1) RETURNING id")
            .bind(format!("Poll {p}"))
            .fetch_one(&mut *tx)
            .await?;
        summary.polls += 1;

        for q in 1..=questions_for_poll(p) {
            let question_id: i64 = sqlx::query_scalar(
                "INSERT INTO questions (poll_id, question_text, pub_date) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(poll_id)
            .bind(format!("Question {p}-{q}"))
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            summary.questions += 1;

            let texts: Vec<String> = (1..=CHOICES_PER_QUESTION)
                .map(|c| format!("Choice {p}-{q}-{c}"))
                .collect();
            let choice_ids: Vec<i64> = sqlx::query_scalar(
                "INSERT INTO choices (question_id, choice_text) \
                 SELECT $1, t FROM UNNEST($2::text[]) WITH ORDINALITY AS u(t, n) ORDER BY n \
                 RETURNING id",
            )
            .bind(question_id)
            .bind(&texts)
            .fetch_all(&mut *tx)
            .await?;
            summary.choices += choice_ids.len();

            if poll_has_answers(p) {
                let inserted = sqlx::query("INSERT INTO answers (choice_id) SELECT UNNEST($1::bigint[])")
                    .bind(&choice_ids)
                    .execute(&mut *tx)
                    .await?;
                summary.answers += inserted.rows_affected() as usize;
            }
        }
    }

    tx.commit().await?;
    log::info!(
        "Seeded {} polls, {} questions, {} choices, {} answers",
        summary.polls, summary.questions, summary.choices, summary.answers
    );
    Ok(summary)
}
