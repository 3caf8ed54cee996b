//! The code sandbox trait.
//!
//! The grader never executes code itself. A host implements [`CodeSandbox`]
//! (the `prepcoach-runner` crate provides one backed by Node.js) and the
//! grader drives it through these types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A host capable of running source text and invoking what it defines.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Human-readable host name (e.g. "node").
    fn name(&self) -> &str;

    /// Run `request.source`, resolve `request.function` among the bindings
    /// it defines, and invoke it once per argument list.
    async fn run_and_resolve(&self, request: &ResolveRequest) -> anyhow::Result<Resolution>;

    /// Run `source` and capture everything it writes to the console.
    async fn execute(&self, source: &str) -> anyhow::Result<ExecutionOutput>;
}

/// Request to resolve and invoke a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The submitted source code.
    pub source: String,
    /// Binding to resolve after the source has run.
    pub function: String,
    /// Positional arguments, one list per invocation.
    #[serde(default)]
    pub calls: Vec<Vec<Value>>,
}

/// What the host found after running the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// The binding is absent or not callable.
    Missing,
    /// The source threw while running its top level.
    LoadFailed { message: String },
    /// One outcome per requested call, in request order.
    Resolved { outcomes: Vec<CallOutcome> },
}

/// The result of a single invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallOutcome {
    /// A value with a JSON form.
    Json { value: Value },
    /// The function returned nothing.
    Undefined,
    /// A value with no JSON form, in the host's own string rendering
    /// (e.g. `NaN`, `Infinity`, a function's source).
    Opaque { text: String },
    /// The invocation threw or exceeded its deadline.
    Error { message: String },
}

impl CallOutcome {
    /// Render a returned value as text, or `Err` with the failure message.
    ///
    /// Arrays and objects become compact JSON; strings are used verbatim;
    /// other primitives use their literal spelling.
    pub fn stringify(&self) -> Result<String, String> {
        match self {
            CallOutcome::Json { value } => Ok(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            CallOutcome::Undefined => Ok("undefined".to_string()),
            CallOutcome::Opaque { text } => Ok(text.clone()),
            CallOutcome::Error { message } => Err(message.clone()),
        }
    }
}

/// Console output captured from a free-form run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Captured lines; error and warning lines carry `ERROR: ` / `WARNING: `.
    #[serde(default)]
    pub lines: Vec<String>,
    /// Message of an exception thrown at top level.
    #[serde(default)]
    pub error: Option<String>,
}
