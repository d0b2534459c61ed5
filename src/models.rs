use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::trend::TrendAnalysis;

pub const DEFAULT_QUIZ_TITLE: &str = "Unnamed Quiz";
pub const DEFAULT_TOPIC: &str = "General Knowledge";
pub const INCOMPLETE_LABEL: &str = "Incomplete";

/// Display format shared by attempt dates and the report generation date.
pub const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Learner {
    pub id: Option<Uuid>,
    pub username: String,
}

impl Learner {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
        }
    }
}

/// One submission of a quiz, as supplied by the attempt history.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub quiz_title: String,
    pub score: f64,
    pub max_score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub topic: String,
}

impl QuizAttempt {
    pub fn new(quiz_title: impl Into<String>, score: f64, max_score: f64) -> Self {
        Self {
            quiz_title: quiz_title.into(),
            score,
            max_score: Some(max_score),
            completed_at: None,
            topic: DEFAULT_TOPIC.to_string(),
        }
    }

    pub fn completed(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn title_or_default(&self) -> &str {
        non_empty_or(&self.quiz_title, DEFAULT_QUIZ_TITLE)
    }

    pub fn topic_or_default(&self) -> &str {
        non_empty_or(&self.topic, DEFAULT_TOPIC)
    }

    /// True when the attempt can take part in percentage math.
    pub fn is_scoreable(&self) -> bool {
        matches!(self.max_score, Some(max) if max > 0.0)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAttempt {
    pub quiz_title: String,
    pub topic: String,
    pub score: f64,
    pub max_score: f64,
    pub completed_at: Option<DateTime<Utc>>,
    pub date_label: String,
    pub score_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PerformanceLevel {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Satisfactory,
    Good,
    Excellent,
}

impl PerformanceLevel {
    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Satisfactory => "Satisfactory",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "improved significantly")]
    ImprovedSignificantly,
    #[serde(rename = "shown improvement")]
    ShownImprovement,
    #[serde(rename = "declined")]
    Declined,
    #[serde(rename = "remained consistent")]
    RemainedConsistent,
    #[serde(rename = "not shown a clear trend yet due to limited data")]
    LimitedData,
}

impl Trend {
    /// Phrase completing "Over the last <period>, performance has ...".
    pub fn description(self) -> &'static str {
        match self {
            Trend::ImprovedSignificantly => "improved significantly",
            Trend::ShownImprovement => "shown improvement",
            Trend::Declined => "declined",
            Trend::RemainedConsistent => "remained consistent",
            Trend::LimitedData => "not shown a clear trend yet due to limited data",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub report_title: String,
    pub student_name: String,
    pub report_period: String,
    pub generation_date: String,
    pub trend_period: String,
    pub current_year: i32,
    pub total_quizzes: usize,
    pub average_score: f64,
    pub overall_progress: PerformanceLevel,
    pub quiz_results: Vec<ScoredAttempt>,
    pub improvement_areas: Vec<String>,
    pub trend_description: Trend,
    /// Half means behind `trend_description`; `None` with fewer than two scored attempts.
    pub trend_analysis: Option<TrendAnalysis>,
}

#[derive(Debug, Clone)]
pub struct LearnerSummary {
    pub username: String,
    pub attempt_count: usize,
    pub average_score: f64,
    pub overall_progress: PerformanceLevel,
    pub trend: Trend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_and_topic_fall_back_to_defaults() {
        let attempt = QuizAttempt::new("  ", 1.0, 2.0).with_topic("");
        assert_eq!(attempt.title_or_default(), "Unnamed Quiz");
        assert_eq!(attempt.topic_or_default(), "General Knowledge");
    }

    #[test]
    fn scoreable_requires_positive_max() {
        assert!(QuizAttempt::new("Fractions", 1.0, 2.0).is_scoreable());
        assert!(!QuizAttempt::new("Fractions", 1.0, 0.0).is_scoreable());
        let mut missing = QuizAttempt::new("Fractions", 1.0, 2.0);
        missing.max_score = None;
        assert!(!missing.is_scoreable());
    }

    #[test]
    fn performance_levels_serialize_as_labels() {
        let json = serde_json::to_string(&PerformanceLevel::NeedsImprovement).unwrap();
        assert_eq!(json, "\"Needs Improvement\"");
        assert_eq!(Trend::Declined.to_string(), "declined");
    }
}
