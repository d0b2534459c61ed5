use std::fmt::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::models::ReportData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format '{other}' (expected markdown or json)")),
        }
    }
}

pub fn render(report: &ReportData, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// `progress_report_<name>_<timestamp>.<ext>`. The name is lowercased and every
/// character other than a letter or digit becomes `_`, so it stays one path segment.
pub fn default_file_name(report: &ReportData, format: OutputFormat, now: DateTime<Utc>) -> String {
    let slug: String = report
        .student_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    format!(
        "progress_report_{}_{}.{}",
        slug,
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Escapes text for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

pub fn render_markdown(report: &ReportData) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", report.report_title);
    let _ = writeln!(
        output,
        "Student: {} | Period: {} | Generated {}",
        report.student_name, report.report_period, report.generation_date
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Overall progress: {}", report.overall_progress);
    let _ = writeln!(output, "- Quizzes taken: {}", report.total_quizzes);
    let _ = writeln!(output, "- Average score: {:.1}%", report.average_score);
    let _ = writeln!(
        output,
        "- Over the last {}, performance has {}.",
        report.trend_period, report.trend_description
    );
    if let Some(analysis) = report.trend_analysis {
        let _ = writeln!(
            output,
            "- Earlier average {:.1}%, recent average {:.1}% ({:+.1} points)",
            analysis.earlier_mean, analysis.later_mean, analysis.delta
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quiz Results");

    if report.quiz_results.is_empty() {
        let _ = writeln!(output, "No scored quizzes in this period.");
    } else {
        let _ = writeln!(output, "| Quiz | Topic | Date | Score | Percentage |");
        let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
        for result in report.quiz_results.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {}/{} | {:.1}% |",
                cell(&result.quiz_title),
                cell(&result.topic),
                result.date_label,
                result.score,
                result.max_score,
                result.score_percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Areas for Improvement");
    for area in report.improvement_areas.iter() {
        let _ = writeln!(output, "- {area}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "---");
    let _ = writeln!(output, "© {} Progress Reports", report.current_year);

    output
}
