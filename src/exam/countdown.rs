// src/exam/countdown.rs

use chrono::{DateTime, Utc};

use crate::{
    config::{CODING_EXAM_SECS, SECS_PER_MCQ},
    models::{paper::Paper, question::Question},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u64),
    Expired,
}

/// Exam clock, ticked once per second.
///
/// A paper with an end time counts down to it on the wall clock; otherwise a
/// fixed duration is decremented per tick.
#[derive(Debug, Clone)]
pub struct Countdown {
    end: Option<DateTime<Utc>>,
    remaining: u64,
}

impl Countdown {
    pub fn for_assignment(paper: &Paper, assigned: &[Question]) -> Self {
        Self {
            end: paper.ends_at(),
            remaining: fallback_secs(assigned),
        }
    }

    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            end: Some(end),
            remaining: 0,
        }
    }

    pub fn fixed(secs: u64) -> Self {
        Self {
            end: None,
            remaining: secs,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> u64 {
        match self.end {
            Some(end) => (end - now).num_seconds().max(0) as u64,
            None => self.remaining,
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        if let Some(end) = self.end {
            let left = (end - now).num_seconds();
            return if left <= 0 {
                Tick::Expired
            } else {
                Tick::Remaining(left as u64)
            };
        }

        if self.remaining == 0 {
            return Tick::Expired;
        }
        self.remaining -= 1;
        Tick::Remaining(self.remaining)
    }
}

/// 30 minutes when any coding question is assigned, else a minute per question.
pub fn fallback_secs(assigned: &[Question]) -> u64 {
    if assigned.iter().any(Question::is_coding) {
        CODING_EXAM_SECS
    } else {
        assigned.len() as u64 * SECS_PER_MCQ
    }
}

/// `mm:ss` as shown in the exam header.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
