use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};

use crate::models::answer::{self, Answer};
use crate::models::question::Question;
use super::types::*;

async fn poll_questions(conn: &mut PgConnection, poll_id: i64) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, question_text, pub_date, poll_id FROM questions WHERE poll_id = $1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(conn)
    .await
}

/// choice id -> question id for every choice of the poll.
async fn poll_choice_owners(conn: &mut PgConnection, poll_id: i64) -> Result<HashMap<i64, i64>, sqlx::Error> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT c.id, c.question_id FROM choices c \
         JOIN questions q ON q.id = c.question_id \
         WHERE q.poll_id = $1",
    )
    .bind(poll_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Handle an HTML form submission for one poll, atomically.
///
/// With every question answered, one answer per question is inserted and all
/// `selected` flags of the poll are cleared. Otherwise only the flags are
/// updated to mirror what was submitted, so the re-rendered form keeps the
/// user's partial selections, and the unanswered questions are returned.
pub async fn submit_form(
    pool: &PgPool,
    poll_id: i64,
    form: &HashMap<String, String>,
) -> Result<VoteOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let questions = poll_questions(&mut tx, poll_id).await?;
    let owners = poll_choice_owners(&mut tx, poll_id).await?;
    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let mut selected = Vec::with_capacity(questions.len());
    let mut missing = Vec::new();
    for q in questions {
        match submitted_choice(form, q.id).filter(|cid| owners.get(cid) == Some(&q.id)) {
            Some(choice_id) => selected.push(choice_id),
            None => missing.push(q),
        }
    }

    if !missing.is_empty() {
        sqlx::query("UPDATE choices SET selected = (id = ANY($2)) WHERE question_id = ANY($1)")
            .bind(&question_ids)
            .bind(&selected)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        log::debug!("Poll {poll_id}: vote incomplete, {} question(s) unanswered", missing.len());
        return Ok(VoteOutcome::Incomplete { missing });
    }

    let mut answers = Vec::with_capacity(selected.len());
    for choice_id in selected {
        answers.push(answer::insert(&mut tx, choice_id).await?);
    }
    sqlx::query("UPDATE choices SET selected = FALSE WHERE question_id = ANY($1)")
        .bind(&question_ids)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("Poll {poll_id}: recorded {} answer(s)", answers.len());
    Ok(VoteOutcome::Recorded(answers))
}

/// Validate API vote entries against the poll and store them all or none.
///
/// Every entry must name a question of this poll and a choice of that
/// question, each question at most once, and every question of the poll must
/// be answered. `selected` flags are left untouched.
pub async fn submit_api(
    pool: &PgPool,
    poll_id: i64,
    entries: &[VoteEntry],
) -> Result<Vec<Answer>, ApiVoteError> {
    let mut tx = pool.begin().await?;

    let questions = poll_questions(&mut tx, poll_id).await?;
    let owners = poll_choice_owners(&mut tx, poll_id).await?;
    let poll_question_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();

    let mut answered = HashSet::new();
    for entry in entries {
        let valid = poll_question_ids.contains(&entry.question_id)
            && owners.get(&entry.choice_id) == Some(&entry.question_id)
            && answered.insert(entry.question_id);
        if !valid {
            return Err(ApiVoteError::InvalidQuestionOrChoice);
        }
    }

    if entries.is_empty() {
        return Err(ApiVoteError::NoVotes);
    }
    if answered.len() != questions.len() {
        return Err(ApiVoteError::Incomplete);
    }

    // Insert in question order so the response lists answers predictably.
    let mut ordered: Vec<&VoteEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.question_id);

    let mut answers = Vec::with_capacity(ordered.len());
    for entry in ordered {
        answers.push(answer::insert(&mut tx, entry.choice_id).await?);
    }
    tx.commit().await?;

    log::info!("Poll {poll_id}: recorded {} answer(s) via API", answers.len());
    Ok(answers)
}
