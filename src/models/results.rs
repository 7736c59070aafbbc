//! Aggregated vote counts per choice, and the two shapes they are served in:
//! the flat `QuestionResult` rows behind the results page and the nested
//! `PollDetail` document behind the JSON API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::answer::{self, Answer};
use super::poll::Poll;
use super::question::{self, Question};

/// A choice with the number of answers that reference it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChoiceTally {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub answer_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceResult {
    pub choice_text: String,
    pub answer_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_text: String,
    pub choices: Vec<ChoiceResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceDetail {
    pub id: i64,
    pub choice_text: String,
    pub num_answers: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub choices: Vec<ChoiceDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollDetail {
    pub id: i64,
    pub poll_name: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionDetail>,
}

/// Every choice of the poll with its answer count, in one grouped query.
pub async fn tally_for_poll(pool: &PgPool, poll_id: i64) -> Result<Vec<ChoiceTally>, sqlx::Error> {
    sqlx::query_as::<_, ChoiceTally>(
        "SELECT c.id, c.question_id, c.choice_text, COUNT(a.id) AS answer_count \
         FROM choices c \
         JOIN questions q ON q.id = c.question_id \
         LEFT JOIN answers a ON a.choice_id = c.id \
         WHERE q.poll_id = $1 \
         GROUP BY c.id \
         ORDER BY c.question_id, c.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
}

/// Results page data: question text with per-choice answer counts.
pub async fn find_results(pool: &PgPool, poll_id: i64) -> Result<Vec<QuestionResult>, sqlx::Error> {
    let questions = question::find_for_poll(pool, poll_id).await?;
    let tallies = tally_for_poll(pool, poll_id).await?;
    Ok(group_results(&questions, tallies))
}

/// Full nested document for the JSON API. Answers are only loaded when asked for.
pub async fn find_detail(
    pool: &PgPool,
    poll: Poll,
    include_answers: bool,
) -> Result<PollDetail, sqlx::Error> {
    let questions = question::find_for_poll(pool, poll.id).await?;
    let tallies = tally_for_poll(pool, poll.id).await?;
    let answers = if include_answers {
        Some(answer::find_for_poll(pool, poll.id).await?)
    } else {
        None
    };
    Ok(build_detail(poll, questions, tallies, answers))
}

pub fn group_results(questions: &[Question], tallies: Vec<ChoiceTally>) -> Vec<QuestionResult> {
    let mut by_question = bucket(tallies, |t| t.question_id);
    questions
        .iter()
        .map(|q| QuestionResult {
            question_text: q.question_text.clone(),
            choices: by_question
                .remove(&q.id)
                .unwrap_or_default()
                .into_iter()
                .map(|t| ChoiceResult {
                    choice_text: t.choice_text,
                    answer_count: t.answer_count,
                })
                .collect(),
        })
        .collect()
}

pub fn build_detail(
    poll: Poll,
    questions: Vec<Question>,
    tallies: Vec<ChoiceTally>,
    answers: Option<Vec<Answer>>,
) -> PollDetail {
    let mut by_question = bucket(tallies, |t| t.question_id);
    let mut by_choice = answers.map(|list| bucket(list, |a| a.choice_id));

    let questions = questions
        .into_iter()
        .map(|q| {
            let choices = by_question
                .remove(&q.id)
                .unwrap_or_default()
                .into_iter()
                .map(|t| ChoiceDetail {
                    id: t.id,
                    choice_text: t.choice_text,
                    num_answers: t.answer_count,
                    answers: by_choice
                        .as_mut()
                        .map(|m| m.remove(&t.id).unwrap_or_default()),
                })
                .collect();
            QuestionDetail {
                id: q.id,
                question_text: q.question_text,
                pub_date: q.pub_date,
                choices,
            }
        })
        .collect();

    PollDetail {
        id: poll.id,
        poll_name: poll.poll_name,
        created_at: poll.created_at,
        questions,
    }
}

/// Group rows by key, keeping their relative order within each group.
fn bucket<T>(rows: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut map: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        map.entry(key(&row)).or_default().push(row);
    }
    map
}
