use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::input::{self, AttemptRow};
use crate::models::{Learner, QuizAttempt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_learner(pool: &PgPool, username: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO progress_report.learners (id, username)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert learner {username}"))?
    .get("id");

    Ok(id)
}

/// Inserts one attempt. Returns `false` when `source_key` was already stored.
async fn insert_attempt(
    pool: &PgPool,
    learner_id: Uuid,
    attempt: &QuizAttempt,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO progress_report.quiz_attempts
        (id, learner_id, quiz_title, topic, score, max_score, completed_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(learner_id)
    .bind(&attempt.quiz_title)
    .bind(&attempt.topic)
    .bind(attempt.score)
    .bind(attempt.max_score)
    .bind(attempt.completed_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let at = |month: u32, day: u32| -> anyhow::Result<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2026, month, day, 16, 0, 0)
            .single()
            .context("invalid seed date")
    };

    let attempts = vec![
        ("seed-001", "avery.lee", "Cell Structure", "Biology", 6.0, Some(10.0), Some(at(2, 2)?)),
        ("seed-002", "avery.lee", "Photosynthesis", "Biology", 8.0, Some(10.0), Some(at(2, 9)?)),
        ("seed-003", "avery.lee", "Newton's Laws", "Physics", 9.0, Some(10.0), Some(at(2, 16)?)),
        ("seed-004", "avery.lee", "Draft Quiz", "Physics", 0.0, Some(0.0), None),
        ("seed-005", "jules.moreno", "Fractions", "Mathematics", 9.0, Some(10.0), Some(at(1, 28)?)),
        ("seed-006", "jules.moreno", "Decimals", "Mathematics", 5.0, Some(10.0), Some(at(2, 4)?)),
        ("seed-007", "kiara.patel", "World Capitals", "Geography", 3.0, Some(10.0), Some(at(2, 1)?)),
    ];

    for (source_key, username, title, topic, score, max_score, completed_at) in attempts {
        let learner_id = upsert_learner(pool, username).await?;
        let attempt = QuizAttempt {
            quiz_title: title.to_string(),
            score,
            max_score,
            completed_at,
            topic: topic.to_string(),
        };
        insert_attempt(pool, learner_id, &attempt, source_key).await?;
    }

    Ok(())
}

pub async fn fetch_learner(pool: &PgPool, username: &str) -> anyhow::Result<Option<Learner>> {
    let row = sqlx::query("SELECT id, username FROM progress_report.learners WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| Learner {
        id: Some(row.get("id")),
        username: row.get("username"),
    }))
}

/// Attempts completed on or after `since`, plus every incomplete attempt.
pub async fn fetch_attempts(
    pool: &PgPool,
    learner_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<QuizAttempt>> {
    let rows = sqlx::query(
        r#"
        SELECT quiz_title, topic, score, max_score, completed_at
        FROM progress_report.quiz_attempts
        WHERE learner_id = $1
          AND (completed_at IS NULL OR completed_at >= $2)
        ORDER BY recorded_at
        "#,
    )
    .bind(learner_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(attempt_from_row).collect())
}

/// Every learner with their attempts since `since`, in username order.
pub async fn fetch_all_attempts(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<(Learner, Vec<QuizAttempt>)>> {
    let rows = sqlx::query(
        r#"
        SELECT l.id AS learner_id, l.username,
               a.quiz_title, a.topic, a.score, a.max_score, a.completed_at
        FROM progress_report.quiz_attempts a
        JOIN progress_report.learners l ON l.id = a.learner_id
        WHERE a.completed_at IS NULL OR a.completed_at >= $1
        ORDER BY l.username, a.recorded_at
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<(Learner, Vec<QuizAttempt>)> = Vec::new();
    for row in rows.iter() {
        let learner_id: Uuid = row.get("learner_id");
        let attempt = attempt_from_row(row);
        match grouped.last_mut() {
            Some((learner, attempts)) if learner.id == Some(learner_id) => {
                attempts.push(attempt);
                continue;
            }
            _ => {}
        }
        grouped.push((
            Learner {
                id: Some(learner_id),
                username: row.get("username"),
            },
            vec![attempt],
        ));
    }

    Ok(grouped)
}

fn attempt_from_row(row: &sqlx::postgres::PgRow) -> QuizAttempt {
    QuizAttempt {
        quiz_title: row.get("quiz_title"),
        score: row.get("score"),
        max_score: row.get("max_score"),
        completed_at: row.get("completed_at"),
        topic: row.get("topic"),
    }
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    let rows = input::read_rows(csv_path)?;
    let mut summary = ImportSummary::default();

    for row in rows.iter() {
        let attempt = match QuizAttempt::try_from(row) {
            Ok(attempt) => attempt,
            Err(err) => {
                tracing::warn!(username = %row.username, "skipping row: {err}");
                summary.rejected += 1;
                continue;
            }
        };

        let learner_id = upsert_learner(pool, row.username.trim()).await?;
        let source_key = source_key_for(row);

        if insert_attempt(pool, learner_id, &attempt, &source_key).await? {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "csv import finished"
    );
    Ok(summary)
}

fn source_key_for(row: &AttemptRow) -> String {
    row.source_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()))
}
