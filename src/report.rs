use chrono::{DateTime, Datelike, TimeDelta, Utc};

use crate::advice;
use crate::models::{Learner, LearnerSummary, QuizAttempt, ReportData, Trend, DATE_FORMAT};
use crate::scoring;
use crate::trend::{self, chronological_key};

pub const DEFAULT_STUDENT_NAME: &str = "Student";
pub const DEFAULT_REPORT_PERIOD: &str = "Last 30 days";
pub const DEFAULT_TREND_PERIOD: &str = "month";

/// Caller-supplied descriptive fields. Anything left `None` gets a default.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub title: Option<String>,
    pub report_period: Option<String>,
    pub trend_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub title: String,
    pub report_period: String,
    pub trend_period: String,
}

impl ReportOptions {
    pub fn for_window(since_days: i64) -> Self {
        Self {
            report_period: Some(period_label(since_days)),
            ..Self::default()
        }
    }

    pub fn resolve(&self, student_name: &str) -> ResolvedOptions {
        ResolvedOptions {
            title: non_blank(&self.title)
                .unwrap_or_else(|| format!("Progress Report for {student_name}")),
            report_period: non_blank(&self.report_period)
                .unwrap_or_else(|| DEFAULT_REPORT_PERIOD.to_string()),
            trend_period: non_blank(&self.trend_period)
                .unwrap_or_else(|| DEFAULT_TREND_PERIOD.to_string()),
        }
    }
}

/// Start of a `since_days` window ending at `now`, or `None` when it falls outside chrono's range.
pub fn cutoff(since_days: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(since_days.max(1)).and_then(|window| now.checked_sub_signed(window))
}

/// Keeps attempts completed since `cutoff`. Incomplete attempts are always kept.
pub fn within_window(attempts: Vec<QuizAttempt>, cutoff: DateTime<Utc>) -> Vec<QuizAttempt> {
    attempts
        .into_iter()
        .filter(|attempt| attempt.completed_at.map_or(true, |at| at >= cutoff))
        .collect()
}

pub fn period_label(since_days: i64) -> String {
    match since_days.max(1) {
        1 => "Last 1 day".to_string(),
        days => format!("Last {days} days"),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn student_name(learner: &Learner) -> String {
    let name = learner.username.trim();
    if name.is_empty() {
        DEFAULT_STUDENT_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Builds the report for `learner` as of `now`.
///
/// Pure: the same attempts, options and `now` always give the same report.
pub fn assemble(
    learner: &Learner,
    attempts: &[QuizAttempt],
    options: &ReportOptions,
    now: DateTime<Utc>,
) -> ReportData {
    let student_name = student_name(learner);
    let resolved = options.resolve(&student_name);

    let mut quiz_results = scoring::score_attempts(attempts);
    quiz_results.sort_by(|a, b| {
        chronological_key(b.completed_at).cmp(&chronological_key(a.completed_at))
    });

    let average_score = scoring::average_score(&quiz_results);
    let overall_progress = scoring::classify_performance(average_score);
    let improvement_areas = advice::improvement_areas(&quiz_results, average_score);
    let trend_analysis = trend::analyze(attempts);
    let trend_description = trend_analysis
        .map(|analysis| analysis.trend)
        .unwrap_or(Trend::LimitedData);

    tracing::debug!(
        student = %student_name,
        total = attempts.len(),
        scored = quiz_results.len(),
        average_score,
        "assembled progress report"
    );

    ReportData {
        report_title: resolved.title,
        student_name,
        report_period: resolved.report_period,
        generation_date: now.format(DATE_FORMAT).to_string(),
        trend_period: resolved.trend_period,
        current_year: now.year(),
        total_quizzes: attempts.len(),
        average_score,
        overall_progress,
        quiz_results,
        improvement_areas,
        trend_description,
        trend_analysis,
    }
}

/// Builds the report using the current time, read once.
pub fn build_report(learner: &Learner, attempts: &[QuizAttempt], options: &ReportOptions) -> ReportData {
    assemble(learner, attempts, options, Utc::now())
}

pub fn summarize_learner(learner: &Learner, attempts: &[QuizAttempt]) -> LearnerSummary {
    let average_score = scoring::average_score(&scoring::score_attempts(attempts));
    LearnerSummary {
        username: student_name(learner),
        attempt_count: attempts.len(),
        average_score,
        overall_progress: scoring::classify_performance(average_score),
        trend: trend::classify_trend(attempts),
    }
}

/// Summaries ordered lowest average first, so learners needing help lead.
pub fn rank_learners(histories: &[(Learner, Vec<QuizAttempt>)]) -> Vec<LearnerSummary> {
    let mut summaries: Vec<LearnerSummary> = histories
        .iter()
        .map(|(learner, attempts)| summarize_learner(learner, attempts))
        .collect();
    summaries.sort_by(|a, b| {
        a.average_score
            .partial_cmp(&b.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}
