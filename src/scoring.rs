use chrono::{DateTime, Utc};

use crate::models::{PerformanceLevel, QuizAttempt, ScoredAttempt, DATE_FORMAT, INCOMPLETE_LABEL};

/// Rounds to one decimal place, ties to even.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Percentage of `max_score` earned, or `None` when the attempt has no usable maximum.
pub fn percentage(score: f64, max_score: Option<f64>) -> Option<f64> {
    match max_score {
        Some(max) if max > 0.0 => Some(round_one_decimal(score / max * 100.0)),
        _ => None,
    }
}

pub fn date_label(completed_at: Option<DateTime<Utc>>) -> String {
    match completed_at {
        Some(at) => at.format(DATE_FORMAT).to_string(),
        None => INCOMPLETE_LABEL.to_string(),
    }
}

/// Scores every attempt with a positive `max_score`, keeping input order.
pub fn score_attempts(attempts: &[QuizAttempt]) -> Vec<ScoredAttempt> {
    attempts
        .iter()
        .filter_map(|attempt| {
            let max_score = attempt.max_score?;
            let score_percentage = percentage(attempt.score, Some(max_score))?;
            Some(ScoredAttempt {
                quiz_title: attempt.title_or_default().to_string(),
                topic: attempt.topic_or_default().to_string(),
                score: attempt.score,
                max_score,
                completed_at: attempt.completed_at,
                date_label: date_label(attempt.completed_at),
                score_percentage,
            })
        })
        .collect()
}

pub fn average_score(scored: &[ScoredAttempt]) -> f64 {
    if scored.is_empty() {
        return 0.0;
    }

    let total: f64 = scored.iter().map(|attempt| attempt.score_percentage).sum();
    round_one_decimal(total / scored.len() as f64).clamp(0.0, 100.0)
}

pub fn classify_performance(average: f64) -> PerformanceLevel {
    if average >= 80.0 {
        PerformanceLevel::Excellent
    } else if average >= 70.0 {
        PerformanceLevel::Good
    } else if average >= 60.0 {
        PerformanceLevel::Satisfactory
    } else {
        PerformanceLevel::NeedsImprovement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1.0, Some(3.0)), Some(33.3));
        assert_eq!(percentage(2.0, Some(3.0)), Some(66.7));
        assert_eq!(percentage(4.0, Some(4.0)), Some(100.0));
    }

    #[test]
    fn exact_ties_round_to_even() {
        assert_eq!(percentage(1.0, Some(16.0)), Some(6.2));
        assert_eq!(percentage(3.0, Some(16.0)), Some(18.8));
        assert_eq!(round_one_decimal(6.25), 6.2);
    }

    #[test]
    fn percentage_guards_non_positive_max() {
        assert_eq!(percentage(3.0, Some(0.0)), None);
        assert_eq!(percentage(3.0, Some(-2.0)), None);
        assert_eq!(percentage(3.0, None), None);
    }

    #[test]
    fn unscoreable_attempts_are_dropped() {
        let attempts = vec![
            QuizAttempt::new("Algebra", 4.0, 5.0),
            QuizAttempt::new("Broken", 2.0, 0.0),
            QuizAttempt::new("", 1.0, 2.0),
        ];
        let scored = score_attempts(&attempts);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].score_percentage, 80.0);
        assert_eq!(scored[1].quiz_title, "Unnamed Quiz");
        assert_eq!(scored[1].date_label, "Incomplete");
    }

    #[test]
    fn completed_attempts_get_a_readable_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 15, 30, 0).unwrap();
        let scored = score_attempts(&[QuizAttempt::new("Algebra", 1.0, 2.0).completed(at)]);
        assert_eq!(scored[0].date_label, "March 04, 2026");
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_score(&[]), 0.0);
    }

    #[test]
    fn average_uses_only_scored_attempts() {
        let attempts = vec![
            QuizAttempt::new("A", 4.0, 4.0),
            QuizAttempt::new("B", 2.0, 4.0),
            QuizAttempt::new("C", 9.0, 0.0),
        ];
        assert_eq!(average_score(&score_attempts(&attempts)), 75.0);
    }

    #[test]
    fn average_stays_within_bounds_for_bonus_points() {
        let attempts = vec![QuizAttempt::new("Bonus", 12.0, 10.0)];
        assert_eq!(average_score(&score_attempts(&attempts)), 100.0);
    }

    #[test]
    fn performance_boundaries_belong_to_higher_band() {
        assert_eq!(classify_performance(100.0), PerformanceLevel::Excellent);
        assert_eq!(classify_performance(80.0), PerformanceLevel::Excellent);
        assert_eq!(classify_performance(79.9), PerformanceLevel::Good);
        assert_eq!(classify_performance(70.0), PerformanceLevel::Good);
        assert_eq!(classify_performance(60.0), PerformanceLevel::Satisfactory);
        assert_eq!(classify_performance(59.9), PerformanceLevel::NeedsImprovement);
        assert_eq!(classify_performance(0.0), PerformanceLevel::NeedsImprovement);
    }
}
