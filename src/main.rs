use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use quiz_progress_report::models::Learner;
use quiz_progress_report::render::{self, OutputFormat};
use quiz_progress_report::report::{self, ReportOptions};
use quiz_progress_report::{db, input};

#[derive(Parser)]
#[command(name = "quiz-progress-report")]
#[command(about = "Learner progress reports built from quiz attempt history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo learners and attempts
    Seed,
    /// Import quiz attempts from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank learners by average score
    Summary {
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a progress report for one learner
    Report {
        #[arg(long)]
        username: String,
        /// Read attempts from this CSV file instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long)]
        title: Option<String>,
        /// markdown or json
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {} attempts from {} ({} duplicates, {} rejected).",
                summary.inserted,
                csv.display(),
                summary.duplicates,
                summary.rejected
            );
        }
        Commands::Summary { since_days, limit } => {
            let pool = connect().await?;
            let since = report::cutoff(since_days, Utc::now())
                .with_context(|| format!("--since-days {since_days} is out of range"))?;
            let histories = db::fetch_all_attempts(&pool, since).await?;
            let summaries = report::rank_learners(&histories);

            if summaries.is_empty() {
                println!("No quiz attempts found for this window.");
                return Ok(());
            }

            println!("Learners by average score:");
            for summary in summaries.iter().take(limit) {
                println!(
                    "- {} average {:.1}% ({}) across {} attempts, trend: {}",
                    summary.username,
                    summary.average_score,
                    summary.overall_progress,
                    summary.attempt_count,
                    summary.trend
                );
            }
        }
        Commands::Report {
            username,
            csv,
            since_days,
            title,
            format,
            out,
        } => {
            let now = Utc::now();
            let since = report::cutoff(since_days, now)
                .with_context(|| format!("--since-days {since_days} is out of range"))?;

            let (learner, attempts) = match csv {
                Some(path) => {
                    let attempts = input::load_attempts(&path, &username)?;
                    (Learner::named(username), report::within_window(attempts, since))
                }
                None => {
                    let pool = connect().await?;
                    let learner = db::fetch_learner(&pool, &username)
                        .await?
                        .with_context(|| format!("no learner named {username}"))?;
                    let learner_id = learner.id.context("stored learner without id")?;
                    let attempts = db::fetch_attempts(&pool, learner_id, since).await?;
                    (learner, attempts)
                }
            };

            let options = ReportOptions {
                title,
                ..ReportOptions::for_window(since_days)
            };
            let data = report::assemble(&learner, &attempts, &options, now);
            tracing::info!(
                student = %data.student_name,
                total = data.total_quizzes,
                average = data.average_score,
                "report assembled"
            );

            let rendered = render::render(&data, format)?;
            let out = out.unwrap_or_else(|| PathBuf::from(render::default_file_name(&data, format, now)));
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
