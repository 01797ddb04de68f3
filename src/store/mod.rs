// src/store/mod.rs

//! Adapters for the collaborators the exam core talks to.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{attempt::Attempt, paper::Paper, violation::ViolationRecord},
};

pub mod http;
pub mod memory;
pub mod mysql;

/// Read-only source of papers.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn paper(&self, paper_id: &str) -> Result<Option<Paper>, AppError>;

    async fn paper_by_access_code(&self, access_code: &str) -> Result<Option<Paper>, AppError>;
}

/// The violation log. Recording is fire-and-forget from the exam's point of view.
#[async_trait]
pub trait ViolationSink: Send + Sync {
    async fn record(&self, record: &ViolationRecord) -> Result<(), AppError>;

    async fn violations_for_paper(&self, paper_id: &str) -> Result<Vec<ViolationRecord>, AppError>;
}

/// Where attempts are saved. A save for an existing (student, paper) pair replaces it.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, attempt: &Attempt) -> Result<Attempt, AppError>;

    async fn attempts_for_student(&self, student_id: &str) -> Result<Vec<Attempt>, AppError>;
}
