// src/models/paper.rs

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{Difficulty, Question};

/// A named pool of questions with scheduling and proctoring policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    #[validate(length(min = 1))]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub exam_title: String,

    #[serde(default)]
    pub topic: String,

    pub difficulty: Difficulty,

    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<Question>,

    #[serde(default)]
    pub teacher_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,

    /// Warnings before the attempt is force-submitted. The backend stores 0 when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_limit: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Paper {
    /// Configured warning limit, or `default` when unset or zero.
    pub fn effective_warning_limit(&self, default: u32) -> u32 {
        self.warning_limit.filter(|limit| *limit > 0).unwrap_or(default)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.as_deref().and_then(parse_schedule_time)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn accepts_code(&self, code: &str) -> bool {
        self.access_code.as_deref() == Some(code)
    }
}

/// Parses the schedule strings the backend stores.
///
/// Accepts RFC 3339 and the zone-less `datetime-local` forms
/// (`2025-03-01T10:00`, `2025-03-01T10:00:00`), the latter read as local wall time.
pub fn parse_schedule_time(raw: &str) -> Option<DateTime<Utc>> {
    parse_schedule_time_in(raw, &Local)
}

/// Like [`parse_schedule_time`], reading zone-less strings in `tz`.
///
/// A wall time skipped by a DST gap is `None`; an ambiguous one takes the earlier instant.
pub fn parse_schedule_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
