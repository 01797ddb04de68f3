// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

use crate::{error::AppError, exam::proctor::ProctorTimings};

/// Warning limit applied when a paper leaves it unset (or stores 0).
pub const DEFAULT_WARNING_LIMIT: u32 = 10;

/// At most this many coding questions are assigned per student.
pub const CODING_QUESTION_CAP: usize = 2;

pub const DEBOUNCE_SECS: u64 = 3;
pub const KIND_SUPPRESSION_SECS: u64 = 2;
pub const LOCKOUT_DISPLAY_SECS: u64 = 5;

/// Fallback exam length when the paper has no end time.
pub const CODING_EXAM_SECS: u64 = 1800;
pub const SECS_PER_MCQ: u64 = 60;

pub const DEFAULT_API_URL: &str = "http://localhost:8087";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the LabQMS backend (papers, tests, violations).
    pub api_base_url: Url,
    /// Optional direct connection to the backend's MySQL schema.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub log_dir: String,
    pub timings: ProctorTimings,
    pub default_warning_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("LABQMS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(&api_base_url)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let log_dir = lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        let timings = ProctorTimings {
            debounce: seconds(&lookup, "PROCTOR_DEBOUNCE_SECS", DEBOUNCE_SECS)?,
            kind_suppression: seconds(&lookup, "PROCTOR_KIND_SUPPRESSION_SECS", KIND_SUPPRESSION_SECS)?,
            lockout_display: seconds(&lookup, "PROCTOR_LOCKOUT_SECS", LOCKOUT_DISPLAY_SECS)?,
        };

        let default_warning_limit = match lookup("DEFAULT_WARNING_LIMIT") {
            Some(raw) => parse_number(&raw, "DEFAULT_WARNING_LIMIT")?,
            None => DEFAULT_WARNING_LIMIT,
        };
        if default_warning_limit == 0 {
            return Err(AppError::Config(
                "DEFAULT_WARNING_LIMIT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            database_url,
            rust_log,
            log_dir,
            timings,
            default_warning_limit,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => Ok(Duration::from_secs(parse_number(&raw, key)?)),
        None => Ok(Duration::from_secs(default)),
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8087/");
        assert!(config.database_url.is_none());
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.timings, ProctorTimings::default());
        assert_eq!(config.default_warning_limit, 10);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("LABQMS_API_URL", "http://exam.lab:9000"),
            ("DATABASE_URL", "mysql://lab@localhost/labqms"),
            ("PROCTOR_DEBOUNCE_SECS", "4"),
            ("PROCTOR_LOCKOUT_SECS", "8"),
            ("DEFAULT_WARNING_LIMIT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.host_str(), Some("exam.lab"));
        assert_eq!(config.database_url.as_deref(), Some("mysql://lab@localhost/labqms"));
        assert_eq!(config.timings.debounce, Duration::from_secs(4));
        assert_eq!(config.timings.kind_suppression, Duration::from_secs(2));
        assert_eq!(config.timings.lockout_display, Duration::from_secs(8));
        assert_eq!(config.default_warning_limit, 5);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = Config::from_lookup(lookup_from(&[("PROCTOR_DEBOUNCE_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("DEFAULT_WARNING_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("LABQMS_API_URL", "::nope")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
