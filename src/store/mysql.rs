// src/store/mysql.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

use crate::{
    error::AppError,
    models::{
        paper::Paper,
        question::{CodeLanguage, Difficulty, Question, QuestionType},
    },
    store::QuestionStore,
};

/// Read-only view over the backend's `papers` schema.
///
/// Questions are returned ordered by id, the same order the backend's REST
/// API uses, so assignments computed from either source agree.
#[derive(Debug, Clone)]
pub struct MySqlQuestionStore {
    pool: MySqlPool,
}

/// Represents a row of the 'papers' table.
#[derive(Debug, FromRow)]
struct PaperRow {
    id: String,
    title: String,
    exam_title: String,
    topic: String,
    difficulty: String,
    teacher_id: String,
    access_code: Option<String>,
    warning_limit: i32,
    start_time: Option<String>,
    end_time: Option<String>,
}

/// Represents a row of the 'questions' table.
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: String,
    text: String,
    title: Option<String>,
    description: Option<String>,
    question_type: String,
    difficulty: String,
    topic: String,
    correct_answer_index: Option<i32>,
    answer_key: Option<String>,
    language: Option<String>,
    marks: Option<i32>,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    question_id: String,
    option_text: String,
}

const PAPER_COLUMNS: &str = "id, title, exam_title, topic, difficulty, teacher_id, \
                             access_code, warning_limit, start_time, end_time";

impl MySqlQuestionStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_paper(&self, column: &str, value: &str) -> Result<Option<Paper>, AppError> {
        let sql = format!("SELECT {} FROM papers WHERE {} = ? LIMIT 1", PAPER_COLUMNS, column);
        let row = sqlx::query_as::<_, PaperRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch paper by {}: {:?}", column, e);
                AppError::from(e)
            })?;

        match row {
            Some(row) => {
                let questions = self.fetch_questions(&row.id).await?;
                Ok(Some(row.into_paper(questions)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_questions(&self, paper_id: &str) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                q.id,
                q.text,
                q.title,
                q.description,
                q.`type` AS question_type,
                q.difficulty,
                q.topic,
                q.correct_answer_index,
                q.answer_key,
                q.language,
                q.marks
            FROM questions q
            JOIN paper_questions pq ON pq.question_id = q.id
            WHERE pq.paper_id = ?
            ORDER BY q.id ASC
            "#,
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for paper {}: {:?}", paper_id, e);
            AppError::from(e)
        })?;

        let option_rows = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT o.question_id, o.option_text
            FROM question_options o
            JOIN paper_questions pq ON pq.question_id = o.question_id
            WHERE pq.paper_id = ?
            "#,
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await?;

        let mut options: HashMap<String, Vec<String>> = HashMap::new();
        for row in option_rows {
            options.entry(row.question_id).or_default().push(row.option_text);
        }

        rows.into_iter()
            .map(|row| {
                let question_options = options.remove(&row.id);
                row.into_question(question_options)
            })
            .collect()
    }
}

impl PaperRow {
    fn into_paper(self, questions: Vec<Question>) -> Result<Paper, AppError> {
        Ok(Paper {
            difficulty: parse_column::<Difficulty>(&self.difficulty, "papers.difficulty")?,
            id: self.id,
            title: self.title,
            exam_title: self.exam_title,
            topic: self.topic,
            questions,
            teacher_id: self.teacher_id,
            access_code: self.access_code,
            warning_limit: u32::try_from(self.warning_limit).ok(),
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

impl QuestionRow {
    fn into_question(self, options: Option<Vec<String>>) -> Result<Question, AppError> {
        let question_type = parse_column::<QuestionType>(&self.question_type, "questions.type")?;
        let difficulty = parse_column::<Difficulty>(&self.difficulty, "questions.difficulty")?;
        let language = self
            .language
            .as_deref()
            .map(|raw| parse_column::<CodeLanguage>(raw, "questions.language"))
            .transpose()?;

        Ok(Question {
            id: self.id,
            text: self.text,
            title: self.title,
            description: self.description,
            question_type,
            difficulty,
            topic: self.topic,
            options,
            correct_answer_index: self.correct_answer_index,
            answer_key: self.answer_key,
            language,
            marks: self.marks,
        })
    }
}

/// Stored enum columns that fail to parse point at corrupt data, not bad input.
fn parse_column<T>(raw: &str, column: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    raw.parse::<T>()
        .map_err(|e| AppError::InternalServerError(format!("{}: {}", column, e)))
}

#[async_trait]
impl QuestionStore for MySqlQuestionStore {
    async fn paper(&self, paper_id: &str) -> Result<Option<Paper>, AppError> {
        self.fetch_paper("id", paper_id).await
    }

    async fn paper_by_access_code(&self, access_code: &str) -> Result<Option<Paper>, AppError> {
        self.fetch_paper("access_code", access_code).await
    }
}
