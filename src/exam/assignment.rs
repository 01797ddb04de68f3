// src/exam/assignment.rs

use crate::{
    config::CODING_QUESTION_CAP,
    models::{paper::Paper, question::Question},
    utils::rng::{seeded_random, shuffle},
};

/// Determines which questions a student answers for a paper, and in what order.
///
/// * Coding questions take priority: if the paper has any, the shuffled coding
///   subset is returned, capped at two.
/// * An MCQ-only paper returns every MCQ, shuffled.
/// * The result depends only on `(student_id, paper.id)` and the paper's question order,
///   so reloading the exam page reproduces it exactly.
pub fn assign_questions(paper: &Paper, student_id: &str) -> Vec<Question> {
    if paper.questions.is_empty() {
        return Vec::new();
    }

    let mut random = seeded_random(student_id, &paper.id);

    let (coding, mcqs): (Vec<Question>, Vec<Question>) =
        paper.questions.iter().cloned().partition(Question::is_coding);

    if !coding.is_empty() {
        let mut assigned = shuffle(&coding, &mut random);
        assigned.truncate(CODING_QUESTION_CAP);
        assigned
    } else {
        shuffle(&mcqs, &mut random)
    }
}
