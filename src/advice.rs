use std::collections::HashSet;

use crate::models::ScoredAttempt;

/// Attempts below this percentage flag their topic for review.
pub const LOW_TOPIC_THRESHOLD: f64 = 70.0;
/// Averages below this add the across-the-board advisory.
pub const LOW_AVERAGE_THRESHOLD: f64 = 60.0;

pub const REVIEW_BASICS: &str = "Consider reviewing basic concepts across all topics.";
pub const KEEP_PRACTICING: &str = "Continue practicing to maintain your excellent progress.";

pub fn topic_advice(topic: &str) -> String {
    format!("Focus on improving understanding of {topic} concepts.")
}

/// Builds the improvement areas for a report. Never returns an empty list.
///
/// Topics appear in the order they are first seen in `scored`. The low-average
/// advisory needs at least one scored attempt behind the average.
pub fn improvement_areas(scored: &[ScoredAttempt], average_score: f64) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut areas = Vec::new();

    for attempt in scored {
        if attempt.score_percentage < LOW_TOPIC_THRESHOLD && seen.insert(attempt.topic.as_str()) {
            areas.push(topic_advice(&attempt.topic));
        }
    }

    if !scored.is_empty() && average_score < LOW_AVERAGE_THRESHOLD {
        areas.push(REVIEW_BASICS.to_string());
    }

    if areas.is_empty() {
        areas.push(KEEP_PRACTICING.to_string());
    }

    areas
}
