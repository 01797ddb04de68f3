// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Centralizes the failure modes of the store adapters, the entry gate and configuration.
/// The proctoring state machine itself never returns one of these.
#[derive(Debug)]
pub enum AppError {
    // Unexpected failure inside an adapter (database, HTTP client)
    InternalServerError(String),

    // Malformed input from the caller
    BadRequest(String),

    // No paper carries the given access code
    InvalidAccessCode,

    // The student already has a COMPLETED attempt for this paper
    AlreadyCompleted { paper_id: String },

    // Missing paper or attempt
    NotFound(String),

    // The remote collaborator answered with a non-success status
    Upstream { status: u16, message: String },

    // Bad environment / configuration value
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::InvalidAccessCode => {
                write!(f, "Invalid Access Code. Please try again.")
            }
            AppError::AlreadyCompleted { .. } => {
                write!(f, "You have already appeared for this exam.")
            }
            AppError::NotFound(what) => write!(f, "not found: {}", what),
            AppError::Upstream { status, message } => {
                write!(f, "upstream returned {}: {}", status, message)
            }
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_use_student_facing_text() {
        assert_eq!(
            AppError::InvalidAccessCode.to_string(),
            "Invalid Access Code. Please try again."
        );
        let err = AppError::AlreadyCompleted {
            paper_id: "paper-1".to_string(),
        };
        assert_eq!(err.to_string(), "You have already appeared for this exam.");
    }

    #[test]
    fn test_url_errors_are_config_errors() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, AppError::Config(_)));
    }
}
