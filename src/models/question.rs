// src/models/question.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Question type: multiple choice or free-form coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    Coding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Java,
    Python,
    C,
    Cpp,
}

impl FromStr for QuestionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MCQ" => Ok(QuestionType::Mcq),
            "CODING" => Ok(QuestionType::Coding),
            _ => Err(AppError::BadRequest(format!("unknown question type '{}'", s))),
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(AppError::BadRequest(format!("unknown difficulty '{}'", s))),
        }
    }
}

/// Accepts both the wire value (`java`) and the stored enum name (`JAVA`).
impl FromStr for CodeLanguage {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(CodeLanguage::Java),
            "python" => Ok(CodeLanguage::Python),
            "c" => Ok(CodeLanguage::C),
            "cpp" => Ok(CodeLanguage::Cpp),
            _ => Err(AppError::BadRequest(format!("unknown language '{}'", s))),
        }
    }
}

/// A question belonging to exactly one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_choices))]
pub struct Question {
    #[validate(length(min = 1))]
    pub id: String,

    /// The prompt shown to the student.
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Mapped from the wire field `type`, a reserved word in Rust.
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub difficulty: Difficulty,

    pub topic: String,

    /// MCQ only: options in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// MCQ only: index into `options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<i32>,

    /// Coding only: reference solution or rubric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<CodeLanguage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<i32>,
}

impl Question {
    pub fn is_coding(&self) -> bool {
        self.question_type == QuestionType::Coding
    }

    pub fn is_mcq(&self) -> bool {
        self.question_type == QuestionType::Mcq
    }
}

/// An MCQ needs options and a correct index that points into them.
fn validate_choices(question: &Question) -> Result<(), ValidationError> {
    if question.question_type != QuestionType::Mcq {
        return Ok(());
    }
    let options = match &question.options {
        Some(options) if !options.is_empty() => options,
        _ => return Err(ValidationError::new("options_cannot_be_empty")),
    };
    match question.correct_answer_index {
        Some(index) if index >= 0 && (index as usize) < options.len() => Ok(()),
        _ => Err(ValidationError::new("correct_answer_out_of_range")),
    }
}
