//! Practice reports with JSON persistence and progress tracking.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::results::{AnswerRecord, ExerciseRecord, ItemError};
use crate::statistics::SessionStats;

/// A complete practice report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the catalog practiced against.
    pub catalog: CatalogSummary,
    /// Name of the sandbox that graded the solutions.
    pub sandbox: String,
    pub answers: Vec<AnswerRecord>,
    pub exercises: Vec<ExerciseRecord>,
    /// Submission items that could not be processed.
    #[serde(default)]
    pub errors: Vec<ItemError>,
    pub stats: SessionStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a catalog (without the questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl PracticeReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: PracticeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Best answer score per question id.
    fn best_scores(&self) -> HashMap<&str, u8> {
        let mut map: HashMap<&str, u8> = HashMap::new();
        for a in &self.answers {
            let entry = map.entry(a.question_id.as_str()).or_insert(0);
            *entry = (*entry).max(a.score());
        }
        map
    }

    /// Compare answer scores against a baseline report.
    ///
    /// A change counts only when it exceeds `threshold` score points.
    pub fn compare(&self, baseline: &PracticeReport, threshold: f64) -> ProgressReport {
        let baseline_scores = baseline.best_scores();
        let current_scores = self.best_scores();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for (&question_id, &current) in &current_scores {
            let Some(&baseline_score) = baseline_scores.get(question_id) else {
                new_questions += 1;
                continue;
            };
            let change = ScoreChange {
                question_id: question_id.to_string(),
                baseline_score,
                current_score: current,
                delta: current as i16 - baseline_score as i16,
            };
            let delta = change.delta as f64;
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        regressions.sort_by(|a, b| a.delta.cmp(&b.delta).then(a.question_id.cmp(&b.question_id)));
        improvements.sort_by(|a, b| b.delta.cmp(&a.delta).then(a.question_id.cmp(&b.question_id)));

        let removed_questions = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        ProgressReport {
            regressions,
            improvements,
            unchanged,
            new_questions,
            removed_questions,
            baseline_mean: baseline.stats.mean_score,
            current_mean: self.stats.mean_score,
        }
    }
}

/// Result of comparing two practice reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Questions whose score went down, worst first.
    pub regressions: Vec<ScoreChange>,
    /// Questions whose score went up, best first.
    pub improvements: Vec<ScoreChange>,
    pub unchanged: usize,
    /// Questions answered now but not in the baseline.
    pub new_questions: usize,
    /// Questions answered in the baseline but not now.
    pub removed_questions: usize,
    pub baseline_mean: f64,
    pub current_mean: f64,
}

/// A per-question score change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub question_id: String,
    pub baseline_score: u8,
    pub current_score: u8,
    pub delta: i16,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged (mean {:.1} -> {:.1})\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.baseline_mean,
            self.current_mean
        ));

        let mut table = |title: &str, changes: &[ScoreChange]| {
            if changes.is_empty() {
                return;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Question | Baseline | Current | Delta |\n");
            md.push_str("|----------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {}/10 | {}/10 | {:+} |\n",
                    c.question_id, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        };
        table("Regressions", &self.regressions);
        table("Improvements", &self.improvements);

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{ScoreReport, MAX_SCORE};
    use crate::statistics::compute_session_stats;

    fn answer(question_id: &str, score: u8) -> AnswerRecord {
        AnswerRecord {
            question_id: question_id.into(),
            category_id: "fundamentals".into(),
            answer: "a closure captures variables".into(),
            report: ScoreReport {
                score,
                max_score: MAX_SCORE,
                feedback: vec![],
                strengths: vec![],
                improvements: vec![],
                keyword_matches: vec![],
                completeness: 5.0,
                accuracy: 5.0,
                clarity: 5.0,
            },
        }
    }

    fn make_report(answers: Vec<AnswerRecord>) -> PracticeReport {
        let stats = compute_session_stats(&answers, &[]);
        PracticeReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            catalog: CatalogSummary {
                id: "test".into(),
                name: "Test".into(),
                question_count: 3,
            },
            sandbox: "fake".into(),
            answers,
            exercises: vec![],
            errors: vec![],
            stats,
            duration_ms: 0,
        }
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(vec![answer("q1", 6)]);
        let current = make_report(vec![answer("q1", 6)]);

        let report = current.compare(&baseline, 0.5);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(vec![answer("q1", 8), answer("q2", 3)]);
        let current = make_report(vec![answer("q1", 5), answer("q2", 7)]);

        let report = current.compare(&baseline, 0.5);
        assert_eq!(report.regressions.len(), 1);
        assert_eq!(report.regressions[0].question_id, "q1");
        assert_eq!(report.regressions[0].delta, -3);
        assert_eq!(report.improvements.len(), 1);
        assert_eq!(report.improvements[0].delta, 4);
        assert!(report.has_regressions());
    }

    #[test]
    fn threshold_absorbs_small_changes() {
        let baseline = make_report(vec![answer("q1", 6)]);
        let current = make_report(vec![answer("q1", 7)]);
        let report = current.compare(&baseline, 1.0);
        assert_eq!(report.unchanged, 1);
        assert!(report.improvements.is_empty());
    }

    #[test]
    fn best_score_per_question_is_compared() {
        let baseline = make_report(vec![answer("q1", 4)]);
        let current = make_report(vec![answer("q1", 2), answer("q1", 9)]);
        let report = current.compare(&baseline, 0.5);
        assert_eq!(report.improvements[0].current_score, 9);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![answer("old", 5)]);
        let current = make_report(vec![answer("new", 5)]);

        let report = current.compare(&baseline, 0.5);
        assert_eq!(report.new_questions, 1);
        assert_eq!(report.removed_questions, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![answer("q1", 7)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = PracticeReport::load_json(&path).unwrap();

        assert_eq!(loaded.catalog.id, "test");
        assert_eq!(loaded.answers.len(), 1);
        assert_eq!(loaded.stats, report.stats);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![answer("q1", 8)]);
        let current = make_report(vec![answer("q1", 4)]);

        let md = current.compare(&baseline, 0.5).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("| q1 | 8/10 | 4/10 | -4 |"));
    }
}
