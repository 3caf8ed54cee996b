//! Aggregate statistics over a practice session.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::results::{AnswerRecord, ExerciseRecord};
use crate::scorer::ScoreBand;

/// Number of answers that landed in one score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCount {
    pub band: ScoreBand,
    pub count: usize,
}

/// Session-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub answers_scored: usize,
    /// Mean answer score, 0.0 when nothing was scored.
    pub mean_score: f64,
    /// One entry per band, best band first.
    pub band_distribution: Vec<BandCount>,
    pub exercises_graded: usize,
    pub test_cases_passed: usize,
    pub test_cases_total: usize,
    /// Fraction of exercises with every test case passing.
    pub exercise_pass_rate: f64,
    /// Mean answer score per category id.
    pub per_category: BTreeMap<String, f64>,
}

impl SessionStats {
    /// Fraction of all test cases that passed.
    pub fn test_pass_rate(&self) -> f64 {
        if self.test_cases_total == 0 {
            0.0
        } else {
            self.test_cases_passed as f64 / self.test_cases_total as f64
        }
    }
}

fn mean(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
}

/// Compute statistics from a session's records.
pub fn compute_session_stats(answers: &[AnswerRecord], exercises: &[ExerciseRecord]) -> SessionStats {
    let scores: Vec<u8> = answers.iter().map(AnswerRecord::score).collect();

    let mut bands: HashMap<ScoreBand, usize> = HashMap::new();
    for &s in &scores {
        *bands.entry(ScoreBand::from_score(s)).or_default() += 1;
    }
    let band_distribution = ScoreBand::all()
        .into_iter()
        .map(|band| BandCount {
            band,
            count: bands.get(&band).copied().unwrap_or(0),
        })
        .collect();

    let mut by_category: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for a in answers {
        by_category
            .entry(a.category_id.clone())
            .or_default()
            .push(a.score());
    }
    let per_category = by_category
        .into_iter()
        .map(|(id, scores)| (id, mean(&scores)))
        .collect();

    let test_cases_passed = exercises.iter().map(ExerciseRecord::passed).sum();
    let test_cases_total = exercises.iter().map(ExerciseRecord::total).sum();
    let fully_passed = exercises.iter().filter(|e| e.all_passed()).count();
    let exercise_pass_rate = if exercises.is_empty() {
        0.0
    } else {
        fully_passed as f64 / exercises.len() as f64
    };

    SessionStats {
        answers_scored: answers.len(),
        mean_score: mean(&scores),
        band_distribution,
        exercises_graded: exercises.len(),
        test_cases_passed,
        test_cases_total,
        exercise_pass_rate,
        per_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grader::{GradeFailure, TestOutcome, TestResult};
    use crate::scorer::{ScoreReport, MAX_SCORE};

    fn answer(category: &str, score: u8) -> AnswerRecord {
        AnswerRecord {
            question_id: format!("{category}-{score}"),
            category_id: category.into(),
            answer: String::new(),
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

    fn exercise(results: &[bool]) -> ExerciseRecord {
        ExerciseRecord {
            question_id: "ex".into(),
            category_id: "coding".into(),
            function_name: "f".into(),
            outcomes: results
                .iter()
                .enumerate()
                .map(|(i, &passed)| {
                    TestOutcome::Case(TestResult {
                        index: i + 1,
                        input: String::new(),
                        expected: String::new(),
                        actual: String::new(),
                        passed,
                    })
                })
                .collect(),
            duration_ms: 0,
        }
    }

    #[test]
    fn empty_session() {
        let stats = compute_session_stats(&[], &[]);
        assert_eq!(stats.answers_scored, 0);
        assert_eq!(stats.mean_score, 0.0);
        assert_eq!(stats.exercise_pass_rate, 0.0);
        assert_eq!(stats.test_pass_rate(), 0.0);
        assert_eq!(stats.band_distribution.len(), 5);
        assert!(stats.band_distribution.iter().all(|b| b.count == 0));
    }

    #[test]
    fn answer_statistics() {
        let answers = [
            answer("closures", 9),
            answer("closures", 7),
            answer("async", 2),
        ];
        let stats = compute_session_stats(&answers, &[]);
        assert_eq!(stats.answers_scored, 3);
        assert!((stats.mean_score - 6.0).abs() < 1e-9);
        assert_eq!(stats.per_category["closures"], 8.0);
        assert_eq!(stats.per_category["async"], 2.0);

        let count = |band| {
            stats
                .band_distribution
                .iter()
                .find(|b| b.band == band)
                .map(|b| b.count)
                .unwrap()
        };
        assert_eq!(count(ScoreBand::Excellent), 1);
        assert_eq!(count(ScoreBand::Good), 1);
        assert_eq!(count(ScoreBand::MajorImprovement), 1);
        assert_eq!(count(ScoreBand::Decent), 0);
        assert_eq!(stats.band_distribution[0].band, ScoreBand::Excellent);
    }

    #[test]
    fn exercise_statistics() {
        let mut failed = exercise(&[]);
        failed.outcomes = vec![TestOutcome::Failure(GradeFailure {
            error: "boom".into(),
        })];
        let exercises = [exercise(&[true, true]), exercise(&[true, false]), failed];
        let stats = compute_session_stats(&[], &exercises);
        assert_eq!(stats.exercises_graded, 3);
        assert_eq!(stats.test_cases_passed, 3);
        assert_eq!(stats.test_cases_total, 4);
        assert!((stats.exercise_pass_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.test_pass_rate() - 0.75).abs() < 1e-9);
    }
}
