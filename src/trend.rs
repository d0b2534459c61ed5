use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{QuizAttempt, Trend};

/// Shift in percentage points below which a change counts as noise.
pub const SIGNIFICANT_SHIFT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub earlier_mean: f64,
    pub later_mean: f64,
    pub delta: f64,
    pub trend: Trend,
}

/// Ordering key for completion times. Incomplete attempts sort as the earliest instant.
pub fn chronological_key(completed_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    completed_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn classify_delta(delta: f64) -> Trend {
    if delta > SIGNIFICANT_SHIFT {
        Trend::ImprovedSignificantly
    } else if delta > 0.0 {
        Trend::ShownImprovement
    } else if delta < -SIGNIFICANT_SHIFT {
        Trend::Declined
    } else {
        Trend::RemainedConsistent
    }
}

/// Compares the earlier and later halves of the scoreable history.
///
/// Returns `None` when fewer than two attempts have a positive `max_score`.
/// With an odd count the extra attempt lands in the later half.
pub fn analyze(attempts: &[QuizAttempt]) -> Option<TrendAnalysis> {
    let mut ratios: Vec<(DateTime<Utc>, f64)> = attempts
        .iter()
        .filter_map(|attempt| match attempt.max_score {
            Some(max) if max > 0.0 => Some((
                chronological_key(attempt.completed_at),
                attempt.score / max * 100.0,
            )),
            _ => None,
        })
        .collect();

    if ratios.len() < 2 {
        return None;
    }

    ratios.sort_by_key(|(at, _)| *at);
    let mid = ratios.len() / 2;
    let (earlier, later) = ratios.split_at(mid);

    let earlier_mean = mean(earlier);
    let later_mean = mean(later);
    let delta = later_mean - earlier_mean;

    Some(TrendAnalysis {
        earlier_mean,
        later_mean,
        delta,
        trend: classify_delta(delta),
    })
}

pub fn classify_trend(attempts: &[QuizAttempt]) -> Trend {
    analyze(attempts)
        .map(|analysis| analysis.trend)
        .unwrap_or(Trend::LimitedData)
}

fn mean(values: &[(DateTime<Utc>, f64)]) -> f64 {
    values.iter().map(|(_, pct)| pct).sum::<f64>() / values.len() as f64
}
