//! Boundary between raw attempt records and the analytics engine.
//!
//! Rows arrive from CSV files or the attempt store with loosely typed
//! values. They are normalized into [`QuizAttempt`] here, and records the
//! engine cannot trust (unparseable timestamps, negative scores) are
//! rejected with an [`AttemptError`].

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{QuizAttempt, DEFAULT_QUIZ_TITLE, DEFAULT_TOPIC};

#[derive(Debug, Error, PartialEq)]
pub enum AttemptError {
    #[error("invalid completed_at timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("score must be a finite, non-negative number (got {0})")]
    InvalidScore(f64),

    #[error("max_score must be a finite number (got {0})")]
    InvalidMaxScore(f64),
}

/// One attempt as written in an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptRow {
    pub username: String,
    pub quiz_title: Option<String>,
    pub topic: Option<String>,
    pub score: f64,
    pub max_score: Option<f64>,
    pub completed_at: Option<String>,
    pub source_key: Option<String>,
}

impl TryFrom<&AttemptRow> for QuizAttempt {
    type Error = AttemptError;

    fn try_from(row: &AttemptRow) -> Result<Self, Self::Error> {
        if !row.score.is_finite() || row.score < 0.0 {
            return Err(AttemptError::InvalidScore(row.score));
        }
        if let Some(max) = row.max_score {
            if !max.is_finite() {
                return Err(AttemptError::InvalidMaxScore(max));
            }
        }

        let completed_at = match present(row.completed_at.as_deref()) {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => None,
        };

        Ok(QuizAttempt {
            quiz_title: present(row.quiz_title.as_deref())
                .unwrap_or(DEFAULT_QUIZ_TITLE)
                .to_string(),
            score: row.score,
            max_score: row.max_score,
            completed_at,
            topic: present(row.topic.as_deref())
                .unwrap_or(DEFAULT_TOPIC)
                .to_string(),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parses an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AttemptError> {
    let raw = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AttemptError::InvalidTimestamp(raw.to_string()))
}

pub fn read_rows(csv_path: &Path) -> anyhow::Result<Vec<AttemptRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<AttemptRow>().enumerate() {
        // header is line 1
        let row = result.with_context(|| format!("malformed row at line {}", index + 2))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Loads every attempt belonging to `username` from a CSV export.
pub fn load_attempts(csv_path: &Path, username: &str) -> anyhow::Result<Vec<QuizAttempt>> {
    let rows = read_rows(csv_path)?;
    let mut attempts = Vec::new();

    for row in rows.iter().filter(|row| row.username.trim() == username.trim()) {
        let attempt = QuizAttempt::try_from(row).with_context(|| {
            format!(
                "rejected attempt {:?} for {}",
                row.quiz_title.as_deref().unwrap_or(DEFAULT_QUIZ_TITLE),
                row.username
            )
        })?;
        attempts.push(attempt);
    }

    tracing::debug!(count = attempts.len(), username, "loaded attempts from csv");
    Ok(attempts)
}
