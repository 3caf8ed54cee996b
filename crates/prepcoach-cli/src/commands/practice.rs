//! The `prepcoach practice` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use prepcoach_core::config::load_config_from;
use prepcoach_core::grader::CodeGrader;
use prepcoach_core::report::PracticeReport;
use prepcoach_core::results::{AnswerRecord, ExerciseRecord, ItemError};
use prepcoach_core::scorer::AnswerScorer;
use prepcoach_core::session::{PracticeSession, ProgressReporter, Submission};

use super::{load_catalog, sandbox};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_answer_scored(&self, record: &AnswerRecord) {
        eprintln!(
            "  Scored: {} {}/{} ({})",
            record.question_id,
            record.report.score,
            record.report.max_score,
            record.report.band()
        );
    }

    fn on_exercise_start(&self, question_id: &str) {
        eprintln!("  Grading: {question_id}");
    }

    fn on_exercise_complete(&self, record: &ExerciseRecord) {
        match record.failure() {
            Some(error) => eprintln!("  Done: {} FAIL {error}", record.question_id),
            None => eprintln!(
                "  Done: {} tests {}/{} ({}ms)",
                record.question_id,
                record.passed(),
                record.total(),
                record.duration_ms
            ),
        }
    }

    fn on_item_error(&self, error: &ItemError) {
        tracing::error!("practice item failed: {error}");
        eprintln!("  ERROR: {error}");
    }

    fn on_session_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} items processed, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    catalog_path: PathBuf,
    submission_path: PathBuf,
    output: Option<PathBuf>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let catalog = load_catalog(&catalog_path)?;
    let submission = Submission::load(&submission_path)?;
    anyhow::ensure!(
        !submission.is_empty(),
        "submission {} has no answers or solutions",
        submission_path.display()
    );

    let mut session = PracticeSession::new(AnswerScorer::new(config.scoring_profile()?), parallelism);
    if !submission.solutions.is_empty() {
        session = session.with_grader(CodeGrader::new(sandbox(&config)?));
    }

    eprintln!(
        "prepcoach v{}: {} answers, {} solutions against '{}'",
        env!("CARGO_PKG_VERSION"),
        submission.answers.len(),
        submission.solutions.len(),
        catalog.name
    );
    eprintln!();

    let report = session.run(&catalog, &submission, &ConsoleReporter).await?;

    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("practice-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &PracticeReport) {
    use comfy_table::{Cell, Table};

    let stats = &report.stats;

    let mut table = Table::new();
    table.set_header(vec!["Answers", "Mean score", "Exercises", "Tests passed", "Exercise pass %"]);
    table.add_row(vec![
        Cell::new(stats.answers_scored),
        Cell::new(format!("{:.1}/10", stats.mean_score)),
        Cell::new(stats.exercises_graded),
        Cell::new(format!("{}/{}", stats.test_cases_passed, stats.test_cases_total)),
        Cell::new(format!("{:.1}%", stats.exercise_pass_rate * 100.0)),
    ]);
    eprintln!("\n{table}");

    if !stats.per_category.is_empty() {
        let mut categories = Table::new();
        categories.set_header(vec!["Category", "Mean score"]);
        for (category, mean) in &stats.per_category {
            categories.add_row(vec![Cell::new(category), Cell::new(format!("{mean:.1}"))]);
        }
        eprintln!("{categories}");
    }
}
