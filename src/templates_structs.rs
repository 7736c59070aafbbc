// Template context structures for Askama templates.

use std::collections::{HashMap, HashSet};

use askama::Template;
use chrono::{DateTime, Utc};

use crate::models::choice::Choice;
use crate::models::poll::Poll;
use crate::models::question::Question;
use crate::models::results::QuestionResult;
use crate::models::vote;

#[derive(Template)]
#[template(path = "polls/index.html")]
pub struct IndexTemplate {
    pub polls: Vec<Poll>,
}

#[derive(Template)]
#[template(path = "polls/questions.html")]
pub struct QuestionsTemplate {
    pub poll: Poll,
    pub questions: Vec<QuestionForm>,
    pub error_message: Option<String>,
    pub missing_questions: Vec<String>,
}

#[derive(Template)]
#[template(path = "polls/results.html")]
pub struct ResultsTemplate {
    pub poll: Poll,
    pub question_data: Vec<QuestionResult>,
}

/// One radio option on the voting form.
pub struct ChoiceOption {
    pub id: i64,
    pub choice_text: String,
    pub selected: bool,
}

/// One question block on the voting form.
pub struct QuestionForm {
    pub id: i64,
    pub question_text: String,
    pub field_name: String,
    pub recently_published: bool,
    pub missing: bool,
    pub choices: Vec<ChoiceOption>,
}

impl QuestionForm {
    /// Pair each question with its choices. `missing` holds the ids of
    /// questions to highlight as unanswered.
    pub fn build_all(
        questions: &[Question],
        choices: Vec<Choice>,
        missing: &HashSet<i64>,
        now: DateTime<Utc>,
    ) -> Vec<QuestionForm> {
        let mut by_question: HashMap<i64, Vec<ChoiceOption>> = HashMap::new();
        for c in choices {
            by_question.entry(c.question_id).or_default().push(ChoiceOption {
                id: c.id,
                choice_text: c.choice_text,
                selected: c.selected,
            });
        }

        questions
            .iter()
            .map(|q| QuestionForm {
                id: q.id,
                question_text: q.question_text.clone(),
                field_name: vote::field_name(q.id),
                recently_published: q.was_published_recently(now),
                missing: missing.contains(&q.id),
                choices: by_question.remove(&q.id).unwrap_or_default(),
            })
            .collect()
    }
}
