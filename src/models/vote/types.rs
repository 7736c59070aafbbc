use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::models::answer::Answer;
use crate::models::question::Question;

const FIELD_PREFIX: &str = "choice";

/// Form/API key carrying the selected choice for a question, e.g. `choice12`.
pub fn field_name(question_id: i64) -> String {
    format!("{FIELD_PREFIX}{question_id}")
}

/// Choice id submitted for a question in the HTML form, if it parses.
pub fn submitted_choice(form: &HashMap<String, String>, question_id: i64) -> Option<i64> {
    form.get(&field_name(question_id))
        .and_then(|v| v.trim().parse::<i64>().ok())
}

/// Result of a form submission.
#[derive(Debug)]
pub enum VoteOutcome {
    /// One answer per question was stored.
    Recorded(Vec<Answer>),
    /// Nothing was stored; these questions had no valid selection.
    Incomplete { missing: Vec<Question> },
}

/// Why the JSON vote API refused a submission.
#[derive(Debug)]
pub enum ApiVoteError {
    InvalidQuestionOrChoice,
    NoVotes,
    Incomplete,
    Db(sqlx::Error),
}

impl ApiVoteError {
    pub fn message(&self) -> &'static str {
        match self {
            ApiVoteError::InvalidQuestionOrChoice => "Invalid question or choice",
            ApiVoteError::NoVotes => "No valid votes submitted",
            ApiVoteError::Incomplete => "Please answer all questions",
            ApiVoteError::Db(_) => "Database error",
        }
    }
}

impl fmt::Display for ApiVoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVoteError::Db(e) => write!(f, "Database error: {e}"),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for ApiVoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiVoteError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiVoteError {
    fn from(e: sqlx::Error) -> Self {
        ApiVoteError::Db(e)
    }
}

/// A `(question_id, choice_id)` pair taken from an API payload, not yet checked
/// against the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteEntry {
    pub question_id: i64,
    pub choice_id: i64,
}

/// Pull vote entries out of a flat `{"choice<question_id>": <choice_id>}` object.
///
/// Keys without the `choice` prefix are ignored, as are `null` and `""` values.
/// Choice ids may be JSON integers or numeric strings; anything else is invalid.
pub fn parse_api_entries(payload: &Map<String, Value>) -> Result<Vec<VoteEntry>, ApiVoteError> {
    let mut entries = Vec::new();
    for (key, value) in payload {
        let Some(raw_question) = key.strip_prefix(FIELD_PREFIX) else {
            continue;
        };
        let choice_id = match value {
            Value::Null => continue,
            Value::String(s) if s.trim().is_empty() => continue,
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
        .ok_or(ApiVoteError::InvalidQuestionOrChoice)?;
        let question_id = raw_question
            .parse::<i64>()
            .map_err(|_| ApiVoteError::InvalidQuestionOrChoice)?;
        entries.push(VoteEntry { question_id, choice_id });
    }
    Ok(entries)
}
