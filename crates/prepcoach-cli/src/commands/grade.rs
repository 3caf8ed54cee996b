//! The `prepcoach grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use prepcoach_core::config::load_config_from;
use prepcoach_core::grader::{CodeGrader, TestOutcome};

use super::{find_question, load_catalog, sandbox};

pub async fn execute(
    catalog_path: PathBuf,
    question_id: String,
    code_file: Option<PathBuf>,
    reference: bool,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = load_catalog(&catalog_path)?;
    let (_, question) = find_question(&catalog, &question_id)?;
    let exercise = question
        .exercise
        .as_ref()
        .with_context(|| format!("question '{question_id}' has no coding exercise"))?;

    let code = match (code_file, reference) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read code from {}", path.display()))?,
        (None, true) => question
            .reference_code()
            .with_context(|| format!("question '{question_id}' has no reference code"))?
            .to_string(),
        (None, false) => anyhow::bail!("code is required (--code-file or --reference)"),
    };

    let grader = CodeGrader::new(sandbox(&config)?);
    let outcomes = grader
        .run_test_cases(&code, &exercise.function_name, &exercise.test_cases)
        .await;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        _ => print_outcomes(&exercise.function_name, &outcomes),
    }

    Ok(())
}

fn print_outcomes(function_name: &str, outcomes: &[TestOutcome]) {
    if let Some(error) = outcomes.iter().find_map(TestOutcome::error) {
        println!("{function_name}: {error}");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Input", "Expected", "Actual", "Result"]);
    for case in outcomes.iter().filter_map(TestOutcome::as_case) {
        table.add_row(vec![
            Cell::new(case.index),
            Cell::new(&case.input),
            Cell::new(&case.expected),
            Cell::new(&case.actual),
            Cell::new(if case.passed { "PASS" } else { "FAIL" }),
        ]);
    }
    println!("{table}");

    let passed = outcomes.iter().filter(|o| o.passed()).count();
    println!("{function_name}: {passed}/{} test cases passed", outcomes.len());
}
