//! Grading submitted code against literal test cases.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GradeError, SandboxError};
use crate::literal;
use crate::model::TestCase;
use crate::traits::{CodeSandbox, ExecutionOutput, ResolveRequest, Resolution};

/// Message shown when a free-form run printed nothing.
pub const NO_OUTPUT: &str = "Code executed successfully (no output)";

/// Outcome of one graded test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// 1-based position in the test table.
    pub index: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// A grading failure that prevented any test case from running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeFailure {
    pub error: String,
}

/// One entry of a grading run: a test result, or a batch-level failure.
///
/// Serialized untagged, so a failure carries `error` and no `passed` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestOutcome {
    Case(TestResult),
    Failure(GradeFailure),
}

impl TestOutcome {
    fn failure(error: impl Into<String>) -> Self {
        TestOutcome::Failure(GradeFailure {
            error: error.into(),
        })
    }

    pub fn passed(&self) -> bool {
        matches!(self, TestOutcome::Case(r) if r.passed)
    }

    pub fn as_case(&self) -> Option<&TestResult> {
        match self {
            TestOutcome::Case(r) => Some(r),
            TestOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TestOutcome::Case(_) => None,
            TestOutcome::Failure(f) => Some(&f.error),
        }
    }
}

impl From<GradeError> for TestOutcome {
    fn from(err: GradeError) -> Self {
        TestOutcome::failure(err.to_string())
    }
}

/// Grades code by driving a [`CodeSandbox`].
#[derive(Clone)]
pub struct CodeGrader {
    sandbox: Arc<dyn CodeSandbox>,
}

impl CodeGrader {
    pub fn new(sandbox: Arc<dyn CodeSandbox>) -> Self {
        Self { sandbox }
    }

    pub fn sandbox_name(&self) -> &str {
        self.sandbox.name()
    }

    /// Run `code`, resolve `function_name`, and grade it against each test
    /// case in order.
    ///
    /// A missing function, a top-level exception, or a sandbox failure
    /// yields a single failure entry. Anything that goes wrong inside one
    /// test case only fails that case.
    pub async fn run_test_cases(
        &self,
        code: &str,
        function_name: &str,
        test_cases: &[TestCase],
    ) -> Vec<TestOutcome> {
        if !is_identifier(function_name) {
            return vec![GradeError::MissingFunction(function_name.to_string()).into()];
        }

        let parsed: Vec<_> = test_cases
            .iter()
            .map(|tc| literal::parse_arguments(&tc.input))
            .collect();

        let request = ResolveRequest {
            source: code.to_string(),
            function: function_name.to_string(),
            calls: parsed
                .iter()
                .filter_map(|args| args.as_ref().ok().cloned())
                .collect(),
        };

        let resolution = match self.sandbox.run_and_resolve(&request).await {
            Ok(resolution) => resolution,
            Err(e) => {
                let permanent = e
                    .downcast_ref::<SandboxError>()
                    .is_some_and(SandboxError::is_permanent);
                tracing::warn!(
                    sandbox = self.sandbox.name(),
                    permanent,
                    "grading {function_name} failed: {e:#}"
                );
                return vec![TestOutcome::failure(format!("{e:#}"))];
            }
        };

        let outcomes = match resolution {
            Resolution::Missing => {
                return vec![GradeError::MissingFunction(function_name.to_string()).into()];
            }
            Resolution::LoadFailed { message } => return vec![TestOutcome::failure(message)],
            Resolution::Resolved { outcomes } => outcomes,
        };

        if outcomes.len() != request.calls.len() {
            return vec![TestOutcome::failure(format!(
                "{} returned {} results for {} calls",
                self.sandbox.name(),
                outcomes.len(),
                request.calls.len()
            ))];
        }

        let mut outcomes = outcomes.into_iter();
        let results: Vec<TestOutcome> = test_cases
            .iter()
            .zip(parsed)
            .enumerate()
            .map(|(i, (tc, args))| {
                let index = i + 1;
                let actual = match args {
                    Err(e) => Err(e.to_string()),
                    Ok(_) => outcomes
                        .next()
                        .map(|o| o.stringify())
                        .unwrap_or_else(|| Err("no result from sandbox".to_string())),
                };
                let (actual, passed) = match actual {
                    Ok(text) => {
                        let passed = text == tc.expected;
                        (text, passed)
                    }
                    Err(message) => (GradeError::TestCase { index, message }.to_string(), false),
                };
                TestOutcome::Case(TestResult {
                    index,
                    input: tc.input.clone(),
                    expected: tc.expected.clone(),
                    actual,
                    passed,
                })
            })
            .collect();

        tracing::debug!(
            function = function_name,
            passed = results.iter().filter(|r| r.passed()).count(),
            total = results.len(),
            "graded test cases"
        );

        results
    }

    /// Run `code` and return its captured console output as text.
    pub async fn run_code(&self, code: &str) -> String {
        let output = match self.sandbox.execute(code).await {
            Ok(output) => output,
            Err(e) => ExecutionOutput {
                lines: Vec::new(),
                error: Some(format!("{e:#}")),
            },
        };
        render_console(output)
    }
}

/// Join captured console lines, appending any top-level exception.
pub fn render_console(output: ExecutionOutput) -> String {
    let mut lines = output.lines;
    if let Some(error) = output.error {
        lines.push(GradeError::Execution(error).to_string());
    }
    if lines.is_empty() {
        NO_OUTPUT.to_string()
    } else {
        lines.join("\n")
    }
}

/// Whether `name` can be looked up as a plain binding.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
