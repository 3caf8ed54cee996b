//! The `prepcoach quick-score` command.

use anyhow::Result;

use prepcoach_core::scorer::{quick_score, MAX_SCORE};

pub fn execute(answer: String, keywords: String) -> Result<()> {
    let keywords: Vec<String> = keywords
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let score = quick_score(&answer, &keywords);
    println!("Quick score: {score}/{MAX_SCORE}");

    Ok(())
}
