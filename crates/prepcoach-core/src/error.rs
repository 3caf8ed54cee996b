//! Grading and sandbox error types.
//!
//! Every error here is recovered locally and surfaced to callers as
//! structured data. Sandbox errors are defined in `prepcoach-core` so the
//! grader can downcast and classify failures without string matching.

use thiserror::Error;

/// Failures that can occur while grading submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    /// The target function was not defined, or is not callable.
    #[error("Function '{0}' not found or not a function")]
    MissingFunction(String),

    /// Parsing or invoking a single test case failed.
    #[error("Error: {message}")]
    TestCase { index: usize, message: String },

    /// The submitted code threw during top-level execution.
    #[error("ERROR: {0}")]
    Execution(String),
}

/// Errors raised by a code sandbox host.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// No runtime is available to execute code.
    #[error("code runtime unavailable: {0}")]
    Unavailable(String),

    /// The host process exceeded its deadline and was killed.
    #[error("code execution timed out after {0}ms")]
    Timeout(u64),

    /// The host process could not be started or exited abnormally.
    #[error("failed to run code host: {0}")]
    Spawn(String),

    /// The host answered with something that is not a valid response.
    #[error("malformed response from code host: {0}")]
    Protocol(String),
}

impl SandboxError {
    /// Returns `true` if retrying with the same configuration cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SandboxError::Unavailable(_))
    }
}

/// A test-case input the literal grammar rejects.
#[derive(Debug, Error)]
pub enum LiteralError {
    /// A bracketed piece was not a valid array/object literal.
    #[error("invalid structured literal `{text}`: {source}")]
    Malformed {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    /// Brackets or quotes were left open.
    #[error("unbalanced input `{0}`")]
    Unbalanced(String),
}
