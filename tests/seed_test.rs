//! Integration tests for the sample data generator.

use polls::models::{answer, poll, question, seed};
use sqlx::PgPool;

#[sqlx::test]
async fn test_generate_creates_expected_data(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = seed::generate(&pool).await?;
    assert_eq!(summary.polls, 10);
    assert_eq!(summary.questions, 275);
    assert_eq!(summary.choices, 1375);
    assert_eq!(summary.answers, 75);

    let polls = poll::find_all(&pool).await?;
    assert_eq!(polls.len(), 10);
    assert_eq!(polls[0].poll_name, "Poll 1");
    assert_eq!(polls[9].poll_name, "Poll 10");

    let questions = question::find_for_poll(&pool, polls[0].id).await?;
    assert_eq!(questions.len(), 5);
    assert_eq!(questions[0].question_text, "Question 1-1");
    assert_eq!(question::count_for_poll(&pool, polls[9].id).await?, 50);

    // Polls 1-3 carry one answer per choice, the rest none.
    assert_eq!(answer::count_for_poll(&pool, polls[2].id).await?, 25);
    assert_eq!(answer::count_for_poll(&pool, polls[3].id).await?, 0);

    let texts: Vec<String> = sqlx::query_scalar(
        "SELECT choice_text FROM choices WHERE question_id = $1 ORDER BY id",
    )
    .bind(questions[0].id)
    .fetch_all(&pool)
    .await?;
    assert_eq!(
        texts,
        vec!["Choice 1-1-1", "Choice 1-1-2", "Choice 1-1-3", "Choice 1-1-4", "Choice 1-1-5"]
    );
    Ok(())
}

#[sqlx::test]
async fn test_flush_removes_everything(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    seed::generate(&pool).await?;
    assert_eq!(seed::flush(&pool).await?, 10);

    assert!(poll::find_all(&pool).await?.is_empty());
    let remaining: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM questions) + (SELECT COUNT(*) FROM choices) + (SELECT COUNT(*) FROM answers)",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(remaining, 0);
    Ok(())
}
