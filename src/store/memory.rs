// src/store/memory.rs

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{attempt::Attempt, paper::Paper, violation::ViolationRecord},
    store::{QuestionStore, SubmissionSink, ViolationSink},
};

/// In-process implementation of every store trait.
///
/// Mirrors the backend's behaviour: violations get an id and a server
/// timestamp, and saving an attempt for a known (student, paper) updates it.
#[derive(Default)]
pub struct MemoryStore {
    pub papers: Mutex<Vec<Paper>>,
    pub violations: Mutex<Vec<ViolationRecord>>,
    pub attempts: Mutex<Vec<Attempt>>,
    /// Makes `record` fail, to simulate an unreachable violation log.
    pub fail_violations: AtomicBool,
    /// Makes `submit` fail.
    pub fail_submissions: AtomicBool,
    next_violation_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_papers(papers: Vec<Paper>) -> Self {
        Self {
            papers: Mutex::new(papers),
            ..Self::default()
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn paper(&self, paper_id: &str) -> Result<Option<Paper>, AppError> {
        let papers = self.papers.lock().await;
        Ok(papers.iter().find(|p| p.id == paper_id).cloned())
    }

    async fn paper_by_access_code(&self, access_code: &str) -> Result<Option<Paper>, AppError> {
        let papers = self.papers.lock().await;
        Ok(papers.iter().find(|p| p.accepts_code(access_code)).cloned())
    }
}

#[async_trait]
impl ViolationSink for MemoryStore {
    async fn record(&self, record: &ViolationRecord) -> Result<(), AppError> {
        if self.fail_violations.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(
                "violation log unavailable".to_string(),
            ));
        }
        let mut saved = record.clone();
        saved.id = Some(self.next_violation_id.fetch_add(1, Ordering::SeqCst) + 1);
        saved.timestamp = Some(Utc::now());
        self.violations.lock().await.push(saved);
        Ok(())
    }

    async fn violations_for_paper(&self, paper_id: &str) -> Result<Vec<ViolationRecord>, AppError> {
        let violations = self.violations.lock().await;
        Ok(violations
            .iter()
            .filter(|v| v.paper_id == paper_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubmissionSink for MemoryStore {
    async fn submit(&self, attempt: &Attempt) -> Result<Attempt, AppError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(
                "submission store unavailable".to_string(),
            ));
        }

        let mut attempts = self.attempts.lock().await;
        let existing = attempts
            .iter_mut()
            .find(|a| a.student_id == attempt.student_id && a.paper.id == attempt.paper.id);

        if let Some(existing) = existing {
            existing.answers = attempt.answers.clone();
            existing.score = attempt.score;
            existing.status = attempt.status;
            existing.automatic = attempt.automatic;
            existing.submitted_at = Some(Utc::now());
            return Ok(existing.clone());
        }

        let mut saved = attempt.clone();
        if saved.id.is_none() {
            saved.id = Some(format!("test-{}", &uuid::Uuid::new_v4().to_string()[..8]));
        }
        saved.submitted_at = Some(Utc::now());
        attempts.push(saved.clone());
        Ok(saved)
    }

    async fn attempts_for_student(&self, student_id: &str) -> Result<Vec<Attempt>, AppError> {
        let attempts = self.attempts.lock().await;
        Ok(attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }
}
