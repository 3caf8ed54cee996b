//! The `prepcoach compare` command.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use prepcoach_core::report::{PracticeReport, ProgressReport, ScoreChange};
use prepcoach_core::scorer::ScoreBand;
use prepcoach_core::statistics::SessionStats;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = PracticeReport::load_json(&baseline_path)?;
    let current = PracticeReport::load_json(&current_path)?;

    let progress = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => println!("{}", progress.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&progress)?),
        _ => print_text(&baseline.stats, &current.stats, &progress),
    }

    if fail_on_regression && progress.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_text(baseline: &SessionStats, current: &SessionStats, progress: &ProgressReport) {
    println!(
        "Mean answer score: {:.1} -> {:.1} ({:+.1})",
        progress.baseline_mean,
        progress.current_mean,
        progress.current_mean - progress.baseline_mean
    );
    if baseline.exercises_graded > 0 || current.exercises_graded > 0 {
        println!(
            "Exercises fully passing: {:.0}% -> {:.0}%",
            baseline.exercise_pass_rate * 100.0,
            current.exercise_pass_rate * 100.0
        );
    }

    let mut bands = Table::new();
    bands.set_header(vec!["Band", "Baseline", "Current", "Change"]);
    for (band, before, after) in band_rows(baseline, current) {
        bands.add_row(vec![
            band.to_string(),
            before.to_string(),
            after.to_string(),
            format!("{:+}", after as i64 - before as i64),
        ]);
    }
    println!("\n{bands}");

    let categories = category_rows(baseline, current);
    if !categories.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Baseline", "Current", "Change"]);
        let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |m| format!("{m:.1}"));
        for (id, before, after) in categories {
            let change = match (before, after) {
                (Some(b), Some(a)) => format!("{:+.1}", a - b),
                _ => "-".to_string(),
            };
            table.add_row(vec![id, show(before), show(after), change]);
        }
        println!("\n{table}");
    }

    print_changes("Regressions", &progress.regressions);
    print_changes("Improvements", &progress.improvements);

    println!(
        "\n{} unchanged, {} new, {} removed question(s)",
        progress.unchanged, progress.new_questions, progress.removed_questions
    );
}

fn print_changes(title: &str, changes: &[ScoreChange]) {
    if changes.is_empty() {
        return;
    }
    println!("\n{title} ({}):", changes.len());
    for c in changes {
        println!(
            "  {} {}/10 -> {}/10 ({:+})",
            c.question_id, c.baseline_score, c.current_score, c.delta
        );
    }
}

fn band_count(stats: &SessionStats, band: ScoreBand) -> usize {
    stats
        .band_distribution
        .iter()
        .find(|b| b.band == band)
        .map_or(0, |b| b.count)
}

/// Answer counts per band, best band first.
fn band_rows(baseline: &SessionStats, current: &SessionStats) -> Vec<(ScoreBand, usize, usize)> {
    ScoreBand::all()
        .into_iter()
        .map(|band| (band, band_count(baseline, band), band_count(current, band)))
        .collect()
}

/// Mean score per category across both sessions, by category id.
fn category_rows(
    baseline: &SessionStats,
    current: &SessionStats,
) -> Vec<(String, Option<f64>, Option<f64>)> {
    let ids: BTreeSet<&String> = baseline
        .per_category
        .keys()
        .chain(current.per_category.keys())
        .collect();
    ids.into_iter()
        .map(|id| {
            (
                id.clone(),
                baseline.per_category.get(id).copied(),
                current.per_category.get(id).copied(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepcoach_core::statistics::BandCount;

    fn stats(categories: &[(&str, f64)], good: usize) -> SessionStats {
        SessionStats {
            band_distribution: vec![BandCount {
                band: ScoreBand::Good,
                count: good,
            }],
            per_category: categories
                .iter()
                .map(|&(id, mean)| (id.to_string(), mean))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn band_rows_fill_missing_bands() {
        let rows = band_rows(&stats(&[], 2), &SessionStats::default());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], (ScoreBand::Excellent, 0, 0));
        assert_eq!(rows[1], (ScoreBand::Good, 2, 0));
    }

    #[test]
    fn category_rows_cover_both_sessions() {
        let rows = category_rows(
            &stats(&[("async", 4.0), ("fundamentals", 6.0)], 0),
            &stats(&[("coding", 7.0), ("fundamentals", 8.0)], 0),
        );
        assert_eq!(
            rows,
            vec![
                ("async".to_string(), Some(4.0), None),
                ("coding".to_string(), None, Some(7.0)),
                ("fundamentals".to_string(), Some(6.0), Some(8.0)),
            ]
        );
    }
}
