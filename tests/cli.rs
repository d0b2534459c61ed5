//! CLI tests for the CSV-backed report path. No database required.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn progress_report() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("quiz-progress-report").unwrap()
}

fn write_csv(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("attempts.csv");
    fs::write(
        &path,
        format!("username,quiz_title,topic,score,max_score,completed_at,source_key\n{body}"),
    )
    .unwrap();
    path
}

#[test]
fn markdown_report_from_csv() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(
        dir.path(),
        "avery,Week 1,Algebra,4,4,2026-02-01T10:00:00Z,a-1\n\
         avery,Week 2,Algebra,2,4,2026-02-08T10:00:00Z,a-2\n\
         avery,Draft,Algebra,0,0,,a-3\n\
         jules,Week 1,Geometry,1,4,2026-02-01T10:00:00Z,j-1\n",
    );
    let out = dir.path().join("report.md");

    progress_report()
        .args(["report", "--username", "avery", "--since-days", "100000"])
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let markdown = fs::read_to_string(&out).unwrap();
    assert!(markdown.contains("# Progress Report for avery"));
    assert!(markdown.contains("- Quizzes taken: 3"));
    assert!(markdown.contains("- Average score: 75.0%"));
    assert!(markdown.contains("- Overall progress: Good"));
    assert!(markdown.contains("performance has declined."));
    assert!(markdown.contains("Focus on improving understanding of Algebra concepts."));
    assert!(!markdown.contains("Geometry"));
}

#[test]
fn json_report_for_unknown_learner_is_zero_state() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path(), "avery,Week 1,Algebra,4,4,2026-02-01,a-1\n");
    let out = dir.path().join("report.json");

    progress_report()
        .args(["report", "--username", "nobody", "--format", "json"])
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["total_quizzes"], 0);
    assert_eq!(value["average_score"], 0.0);
    assert_eq!(value["overall_progress"], "Needs Improvement");
    assert_eq!(
        value["trend_description"],
        "not shown a clear trend yet due to limited data"
    );
    assert_eq!(
        value["improvement_areas"][0],
        "Continue practicing to maintain your excellent progress."
    );
}

#[test]
fn malformed_timestamp_is_rejected() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path(), "avery,Week 1,Algebra,4,4,yesterday,a-1\n");

    progress_report()
        .args(["report", "--username", "avery"])
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(dir.path().join("report.md"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid completed_at timestamp"));
}

#[test]
fn unknown_format_is_a_usage_error() {
    progress_report()
        .args(["report", "--username", "avery", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn oversized_window_is_an_error_not_a_crash() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(dir.path(), "avery,Week 1,Algebra,4,4,2026-02-01,a-1\n");

    progress_report()
        .args(["report", "--username", "avery", "--since-days", "200000000"])
        .arg("--csv")
        .arg(&csv)
        .arg("--out")
        .arg(dir.path().join("report.md"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--since-days 200000000 is out of range"));
}
