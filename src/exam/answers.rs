// src/exam/answers.rs

use std::collections::HashMap;

use crate::models::{attempt::Answer, paper::Paper, question::Question};

/// Paper questions in canonical order (sorted by id).
///
/// Submitted answer lists are positional against this order, independent of
/// the shuffled order the student saw.
pub fn canonical_order(paper: &Paper) -> Vec<&Question> {
    let mut questions: Vec<&Question> = paper.questions.iter().collect();
    questions.sort_by(|a, b| a.id.cmp(&b.id));
    questions
}

/// Maps answers given in assignment order onto canonical order.
/// Questions not assigned to the student are `Unanswered`.
pub fn to_canonical(paper: &Paper, assigned: &[Question], answers: &[Answer]) -> Vec<Answer> {
    let by_id: HashMap<&str, &Answer> = assigned
        .iter()
        .zip(answers)
        .map(|(q, answer)| (q.id.as_str(), answer))
        .collect();

    canonical_order(paper)
        .into_iter()
        .map(|q| by_id.get(q.id.as_str()).map(|a| (*a).clone()).unwrap_or_default())
        .collect()
}

/// Restores assignment-order answers from a saved canonical list (resume).
///
/// MCQ answers come back from the backend as text and are normalised to choices.
pub fn from_canonical(paper: &Paper, assigned: &[Question], canonical: &[Answer]) -> Vec<Answer> {
    let saved: HashMap<&str, &Answer> = canonical_order(paper)
        .into_iter()
        .zip(canonical)
        .map(|(q, answer)| (q.id.as_str(), answer))
        .collect();

    assigned
        .iter()
        .map(|q| {
            let answer = saved.get(q.id.as_str()).map(|a| (*a).clone()).unwrap_or_default();
            if q.is_mcq() { answer.into_choice() } else { answer }
        })
        .collect()
}

/// The canonical answer recorded for one question, for result display.
pub fn answer_for<'a>(paper: &Paper, canonical: &'a [Answer], question_id: &str) -> Option<&'a Answer> {
    let position = canonical_order(paper)
        .into_iter()
        .position(|q| q.id == question_id)?;
    canonical.get(position)
}
