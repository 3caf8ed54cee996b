//! Per-item results produced by a practice session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grader::TestOutcome;
use crate::scorer::ScoreReport;

/// A scored free-text answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub category_id: String,
    /// The user's answer as submitted.
    pub answer: String,
    pub report: ScoreReport,
}

impl AnswerRecord {
    pub fn score(&self) -> u8 {
        self.report.score
    }
}

/// A graded code submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub question_id: String,
    pub category_id: String,
    pub function_name: String,
    pub outcomes: Vec<TestOutcome>,
    /// Wall-clock grading time in milliseconds.
    pub duration_ms: u64,
}

impl ExerciseRecord {
    /// Number of test cases that passed.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of test cases that produced a result.
    ///
    /// A batch-level failure means no case ran, so it counts as zero.
    pub fn total(&self) -> usize {
        self.outcomes.iter().filter(|o| o.as_case().is_some()).count()
    }

    /// True when at least one case ran and every case passed.
    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(TestOutcome::passed)
    }

    /// The batch-level failure message, if grading never reached the cases.
    pub fn failure(&self) -> Option<&str> {
        self.outcomes.iter().find_map(TestOutcome::error)
    }
}

/// What kind of submission item an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Answer,
    Solution,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Answer => write!(f, "answer"),
            ItemKind::Solution => write!(f, "solution"),
        }
    }
}

/// A submission item that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub question_id: String,
    pub kind: ItemKind,
    pub message: String,
}

impl ItemError {
    pub fn new(question_id: impl Into<String>, kind: ItemKind, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.question_id, self.message)
    }
}
