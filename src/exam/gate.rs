// src/exam/gate.rs

use validator::Validate;

use crate::{
    error::AppError,
    exam::{answers::from_canonical, assignment::assign_questions},
    models::{
        attempt::{Answer, Attempt, AttemptStatus},
        paper::Paper,
        question::Question,
        violation::StudentIdentity,
    },
    state::AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn identity(&self, paper_id: &str) -> StudentIdentity {
        StudentIdentity {
            student_id: self.id.clone(),
            student_name: self.name.clone(),
            paper_id: paper_id.to_string(),
        }
    }
}

/// Everything needed to start (or resume) an attempt.
#[derive(Debug, Clone)]
pub struct AttemptPlan {
    /// The full paper; answers are saved against its canonical order.
    pub paper: Paper,
    /// The student's questions, in the order they are shown.
    pub assigned: Vec<Question>,
    /// One slot per assigned question.
    pub answers: Vec<Answer>,
    /// True when answers were restored from an in-progress save.
    pub resumed: bool,
    /// Id of the in-progress attempt being resumed.
    pub attempt_id: Option<String>,
}

/// Decides what a student gets for `paper`, given their earlier attempts.
pub fn plan_attempt(paper: Paper, student_id: &str, prior: &[Attempt]) -> Result<AttemptPlan, AppError> {
    let mine = prior
        .iter()
        .filter(|a| a.student_id == student_id && a.paper_id() == paper.id);

    let mut in_progress = None;
    for attempt in mine {
        match attempt.status {
            AttemptStatus::Completed => {
                return Err(AppError::AlreadyCompleted {
                    paper_id: paper.id.clone(),
                });
            }
            AttemptStatus::InProgress => in_progress = Some(attempt),
        }
    }

    let assigned = assign_questions(&paper, student_id);
    let (answers, attempt_id) = match in_progress {
        Some(saved) => (from_canonical(&paper, &assigned, &saved.answers), saved.id.clone()),
        None => (vec![Answer::Unanswered; assigned.len()], None),
    };

    Ok(AttemptPlan {
        paper,
        assigned,
        answers,
        resumed: in_progress.is_some(),
        attempt_id,
    })
}

/// Resolves an access code into an attempt plan for `student`.
pub async fn enter(state: &AppState, access_code: &str, student: &Student) -> Result<AttemptPlan, AppError> {
    let access_code = access_code.trim();
    if access_code.is_empty() {
        return Err(AppError::BadRequest("Please enter an access code.".to_string()));
    }

    let paper = state
        .questions
        .paper_by_access_code(access_code)
        .await?
        .ok_or(AppError::InvalidAccessCode)?;
    paper.validate()?;

    let prior = state.submissions.attempts_for_student(&student.id).await?;
    let plan = plan_attempt(paper, &student.id, &prior)?;

    tracing::info!(
        student_id = %student.id,
        paper_id = %plan.paper.id,
        questions = plan.assigned.len(),
        resumed = plan.resumed,
        "Attempt planned"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        attempt::PaperRef,
        paper::fixtures::paper,
        question::fixtures::{coding, mcq},
    };

    fn attempt(paper_id: &str, status: AttemptStatus, answers: Vec<Answer>) -> Attempt {
        Attempt {
            id: Some("test-1".to_string()),
            paper: PaperRef {
                id: paper_id.to_string(),
            },
            student_id: "stu-1".to_string(),
            student_name: "Asha".to_string(),
            answers,
            score: 0.0,
            status,
            automatic: false,
            submitted_at: None,
        }
    }

    #[test]
    fn test_fresh_plan() {
        let p = paper("paper-1", vec![coding("c1"), coding("c2"), coding("c3"), mcq("m1")]);
        let plan = plan_attempt(p, "stu-1", &[]).unwrap();
        assert_eq!(plan.assigned.len(), 2);
        assert_eq!(plan.answers, vec![Answer::Unanswered, Answer::Unanswered]);
        assert!(!plan.resumed);
    }

    #[test]
    fn test_completed_attempt_blocks_entry() {
        let p = paper("paper-1", vec![mcq("m1")]);
        let prior = vec![attempt("paper-1", AttemptStatus::Completed, Vec::new())];
        let err = plan_attempt(p, "stu-1", &prior).unwrap_err();
        assert_eq!(err.to_string(), "You have already appeared for this exam.");
    }

    #[test]
    fn test_other_papers_are_ignored() {
        let p = paper("paper-1", vec![mcq("m1")]);
        let prior = vec![attempt("paper-2", AttemptStatus::Completed, Vec::new())];
        assert!(plan_attempt(p, "stu-1", &prior).is_ok());
    }

    #[test]
    fn test_in_progress_attempt_is_resumed() {
        let p = paper("paper-1", vec![mcq("m2"), mcq("m1")]);
        // Canonical order m1, m2.
        let prior = vec![attempt(
            "paper-1",
            AttemptStatus::InProgress,
            vec![Answer::Code("3".into()), Answer::Unanswered],
        )];
        let plan = plan_attempt(p, "stu-1", &prior).unwrap();
        assert!(plan.resumed);
        assert_eq!(plan.attempt_id.as_deref(), Some("test-1"));

        let m1 = plan.assigned.iter().position(|q| q.id == "m1").unwrap();
        assert_eq!(plan.answers[m1], Answer::Choice(3));
        assert_eq!(plan.answers.iter().filter(|a| a.is_answered()).count(), 1);
    }
}
