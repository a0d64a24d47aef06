//! Record store over the workspace database.
//!
//! Four collections (classes, students, answer keys, exam results) plus the
//! settings/profile singletons. Every write runs inside one transaction, so a
//! failed save or delete leaves the previous state intact. Referential rules
//! are enforced here rather than through cascading SQLite constraints.

pub mod answer_keys;
pub mod classes;
pub mod results;
pub mod settings;
pub mod students;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    ConstraintViolation {
        blocking_students: usize,
        message: String,
    },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Write timestamp, RFC 3339 UTC with millisecond precision.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn required_text(value: &str, field: &str) -> StoreResult<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(StoreError::validation(format!("{} is required", field)));
    }
    Ok(t.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}

fn normalize_timestamp(value: &str, field: &str) -> StoreResult<String> {
    let parsed = DateTime::parse_from_rfc3339(value.trim()).map_err(|e| {
        StoreError::validation(format!("{} must be an RFC 3339 timestamp: {}", field, e))
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
pub(crate) fn test_conn() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().expect("memory db");
    crate::db::init_schema(&conn).expect("init schema");
    conn
}
