//! Practice sessions.
//!
//! A session takes a submission (answers and code solutions keyed by
//! question id), scores every answer, and grades every solution against the
//! catalog with bounded parallelism.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::grader::CodeGrader;
use crate::model::Catalog;
use crate::report::{CatalogSummary, PracticeReport};
use crate::results::{AnswerRecord, ExerciseRecord, ItemError, ItemKind};
use crate::scorer::AnswerScorer;
use crate::statistics::compute_session_stats;

/// A free-text answer to one question.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub answer: String,
}

/// Code submitted for a coding exercise, inline or from a file.
#[derive(Debug, Clone, Deserialize)]
pub struct SolutionSubmission {
    pub question_id: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Path to the code, relative to the submission file.
    #[serde(default)]
    pub code_file: Option<PathBuf>,
}

impl SolutionSubmission {
    fn source(&self, base_dir: &Path) -> Result<String> {
        match (&self.code, &self.code_file) {
            (Some(_), Some(_)) => anyhow::bail!("give either code or code_file, not both"),
            (Some(code), None) => Ok(code.clone()),
            (None, Some(file)) => {
                let path = base_dir.join(file);
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))
            }
            (None, None) => anyhow::bail!("no code or code_file given"),
        }
    }
}

/// A practice submission file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
    #[serde(default)]
    pub solutions: Vec<SolutionSubmission>,
    /// Directory `code_file` paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Submission {
    /// Load a submission from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read submission: {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse_str(&content, base_dir)
            .with_context(|| format!("failed to parse submission: {}", path.display()))
    }

    /// Parse a submission from TOML text.
    pub fn parse_str(content: &str, base_dir: PathBuf) -> Result<Self> {
        let mut submission: Submission = toml::from_str(content)?;
        submission.base_dir = base_dir;
        Ok(submission)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.solutions.is_empty()
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_answer_scored(&self, record: &AnswerRecord);
    fn on_exercise_start(&self, question_id: &str);
    fn on_exercise_complete(&self, record: &ExerciseRecord);
    fn on_item_error(&self, error: &ItemError);
    fn on_session_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_answer_scored(&self, _: &AnswerRecord) {}
    fn on_exercise_start(&self, _: &str) {}
    fn on_exercise_complete(&self, _: &ExerciseRecord) {}
    fn on_item_error(&self, _: &ItemError) {}
    fn on_session_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Scores and grades a submission against a catalog.
pub struct PracticeSession {
    scorer: AnswerScorer,
    grader: Option<CodeGrader>,
    parallelism: usize,
}

impl PracticeSession {
    pub fn new(scorer: AnswerScorer, parallelism: usize) -> Self {
        Self {
            scorer,
            grader: None,
            parallelism: parallelism.max(1),
        }
    }

    /// Grade solutions with `grader`; without one, every solution is an
    /// item error.
    pub fn with_grader(mut self, grader: CodeGrader) -> Self {
        self.grader = Some(grader);
        self
    }

    /// Run the whole submission and build a report.
    ///
    /// Unknown question ids, questions without an exercise, and unreadable
    /// solutions become item errors; they never abort the session.
    pub async fn run(
        &self,
        catalog: &Catalog,
        submission: &Submission,
        progress: &dyn ProgressReporter,
    ) -> Result<PracticeReport> {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let mut errors = Vec::new();

        let mut answers = Vec::with_capacity(submission.answers.len());
        for item in &submission.answers {
            let Some((category, question)) = catalog.find_question(&item.question_id) else {
                let err = ItemError::new(&item.question_id, ItemKind::Answer, "unknown question id");
                progress.on_item_error(&err);
                errors.push(err);
                continue;
            };
            let report = self
                .scorer
                .analyze_answer(&item.answer, &question.answer, &question.question);
            let record = AnswerRecord {
                question_id: question.id.clone(),
                category_id: category.id.clone(),
                answer: item.answer.clone(),
                report,
            };
            progress.on_answer_scored(&record);
            answers.push(record);
        }

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut futures = FuturesUnordered::new();

        for (position, item) in submission.solutions.iter().enumerate() {
            let prepared = match (&self.grader, catalog.find_question(&item.question_id)) {
                (None, _) => Err("no code sandbox available".to_string()),
                (Some(_), None) => Err("unknown question id".to_string()),
                (Some(grader), Some((category, question))) => match &question.exercise {
                    None => Err("question has no coding exercise".to_string()),
                    Some(exercise) => item
                        .source(&submission.base_dir)
                        .map(|code| (grader.clone(), category.id.clone(), exercise.clone(), code))
                        .map_err(|e| format!("{e:#}")),
                },
            };
            let (grader, category_id, exercise, code) = match prepared {
                Ok(parts) => parts,
                Err(message) => {
                    let err = ItemError::new(&item.question_id, ItemKind::Solution, message);
                    progress.on_item_error(&err);
                    errors.push(err);
                    continue;
                }
            };

            let semaphore = Arc::clone(&semaphore);
            let question_id = item.question_id.clone();

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                progress.on_exercise_start(&question_id);
                let graded_at = Instant::now();
                let outcomes = grader
                    .run_test_cases(&code, &exercise.function_name, &exercise.test_cases)
                    .await;

                Ok::<_, anyhow::Error>((
                    position,
                    ExerciseRecord {
                        question_id,
                        category_id,
                        function_name: exercise.function_name,
                        outcomes,
                        duration_ms: graded_at.elapsed().as_millis() as u64,
                    },
                ))
            });
        }

        let mut graded = Vec::new();
        while let Some(result) = futures.next().await {
            let (position, record) = result?;
            progress.on_exercise_complete(&record);
            graded.push((position, record));
        }
        graded.sort_by_key(|(position, _)| *position);
        let exercises: Vec<ExerciseRecord> = graded.into_iter().map(|(_, r)| r).collect();

        let elapsed = start.elapsed();
        let total = submission.answers.len() + submission.solutions.len();
        progress.on_session_complete(total, total - errors.len(), errors.len(), elapsed);

        tracing::info!(
            answers = answers.len(),
            exercises = exercises.len(),
            errors = errors.len(),
            "practice session finished in {}ms",
            elapsed.as_millis()
        );

        let stats = compute_session_stats(&answers, &exercises);

        Ok(PracticeReport {
            id,
            created_at: chrono::Utc::now(),
            catalog: CatalogSummary {
                id: catalog.id.clone(),
                name: catalog.name.clone(),
                question_count: catalog.question_count(),
            },
            sandbox: self
                .grader
                .as_ref()
                .map_or("none", CodeGrader::sandbox_name)
                .to_string(),
            answers,
            exercises,
            errors,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
