// src/models/violation.rs

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Kinds of proctoring-integrity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    TabSwitch,
    FocusLoss,
    FullscreenExit,
    CopyPaste,
    RightClick,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 5] = [
        ViolationKind::TabSwitch,
        ViolationKind::FocusLoss,
        ViolationKind::FullscreenExit,
        ViolationKind::CopyPaste,
        ViolationKind::RightClick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "TAB_SWITCH",
            ViolationKind::FocusLoss => "FOCUS_LOSS",
            ViolationKind::FullscreenExit => "FULLSCREEN_EXIT",
            ViolationKind::CopyPaste => "COPY_PASTE",
            ViolationKind::RightClick => "RIGHT_CLICK",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation as observed locally by the proctoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// The record shipped to (and listed from) the violation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_id: String,
    pub student_name: String,
    pub paper_id: String,
    pub violation_type: ViolationKind,
    #[serde(default)]
    pub details: String,
    /// The backend stamps its own zone-less local time on save.
    #[serde(default, deserialize_with = "deserialize_loose_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Identity attached to every record an attempt emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    pub student_id: String,
    pub student_name: String,
    pub paper_id: String,
}

impl ViolationRecord {
    pub fn from_event(identity: &StudentIdentity, event: &ViolationEvent) -> Self {
        Self {
            id: None,
            student_id: identity.student_id.clone(),
            student_name: identity.student_name.clone(),
            paper_id: identity.paper_id.clone(),
            violation_type: event.kind,
            details: event.detail.clone(),
            timestamp: Some(event.timestamp),
        }
    }
}

/// Accepts RFC 3339 as well as `LocalDateTime` strings without an offset (read as UTC).
pub(crate) fn deserialize_loose_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
