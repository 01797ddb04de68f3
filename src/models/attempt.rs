// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::violation::deserialize_loose_timestamp;

/// A student's response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Answer {
    #[default]
    Unanswered,
    /// Selected MCQ option index.
    Choice(usize),
    /// Source code or free text.
    Code(String),
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        !matches!(self, Answer::Unanswered)
    }

    /// Reads a raw answer as an MCQ choice.
    ///
    /// The backend stores every answer as text, so `"2"` is a choice and `"-1"` is unanswered.
    pub fn as_choice(&self) -> Option<usize> {
        match self {
            Answer::Choice(index) => Some(*index),
            Answer::Code(text) => text.trim().parse::<usize>().ok(),
            Answer::Unanswered => None,
        }
    }

    /// Normalises an MCQ answer to `Choice` / `Unanswered`.
    pub fn into_choice(self) -> Answer {
        match self.as_choice() {
            Some(index) => Answer::Choice(index),
            None => Answer::Unanswered,
        }
    }
}

/// Wire form: a number for a choice, a string for code, `-1` when unanswered.
impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Answer::Unanswered => serializer.serialize_i64(-1),
            Answer::Choice(index) => serializer.serialize_u64(*index as u64),
            Answer::Code(text) => serializer.serialize_str(text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Index(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<RawAnswer> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => Answer::Unanswered,
            Some(RawAnswer::Index(index)) if index < 0 => Answer::Unanswered,
            Some(RawAnswer::Index(index)) => Answer::Choice(index as usize),
            Some(RawAnswer::Text(text)) if text.trim() == "-1" => Answer::Unanswered,
            Some(RawAnswer::Text(text)) => Answer::Code(text),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

/// Reference to the paper an attempt belongs to.
/// The backend nests the full paper here; only the id is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRef {
    pub id: String,
}

/// A saved or to-be-saved exam attempt ("test" in the backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub paper: PaperRef,

    pub student_id: String,

    pub student_name: String,

    /// One slot per paper question, in canonical (id-sorted) order.
    #[serde(default)]
    pub answers: Vec<Answer>,

    #[serde(default)]
    pub score: f64,

    pub status: AttemptStatus,

    /// True when the system ended the attempt (threshold breach or time-out).
    #[serde(default)]
    pub automatic: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_loose_timestamp"
    )]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn paper_id(&self) -> &str {
        &self.paper.id
    }

    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}
