//! The `prepcoach score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use prepcoach_core::config::load_config_from;
use prepcoach_core::scorer::{AnswerScorer, ScoreReport};

use super::{find_question, load_catalog};

pub fn execute(
    catalog_path: PathBuf,
    question_id: String,
    answer: Option<String>,
    answer_file: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = load_catalog(&catalog_path)?;
    let (_, question) = find_question(&catalog, &question_id)?;

    let answer = match (answer, answer_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read answer from {}", path.display()))?,
        (None, None) => anyhow::bail!("an answer is required (--answer or --answer-file)"),
    };

    let scorer = AnswerScorer::new(config.scoring_profile()?);
    let report = scorer.analyze_answer(&answer, &question.answer, &question.question);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&question.question, &report),
    }

    Ok(())
}

fn print_report(question: &str, report: &ScoreReport) {
    println!("Question: {question}");
    println!("Score: {}/{} ({})", report.score, report.max_score, report.band());
    println!(
        "  accuracy {:.1}  completeness {:.1}  clarity {:.1}",
        report.accuracy, report.completeness, report.clarity
    );

    for line in &report.feedback {
        println!("\n{line}");
    }
    if !report.keyword_matches.is_empty() {
        println!("\nKey terms covered: {}", report.keyword_matches.join(", "));
    }
    if !report.strengths.is_empty() {
        println!("\nStrengths:");
        for s in &report.strengths {
            println!("  + {s}");
        }
    }
    if !report.improvements.is_empty() {
        println!("\nTo improve:");
        for i in &report.improvements {
            println!("  - {i}");
        }
    }
}
