//! prepcoach-runner: Node.js-backed code sandbox.
//!
//! Each call spawns a `node` process on a throwaway workspace. The harness
//! evaluates the submitted source inside an empty `vm` context that exposes
//! only a capturing `console`, invokes the requested function once per
//! argument list, and reports back as JSON.
//!
//! `vm` is not a security boundary. Isolation is limited to an empty
//! context, a scrubbed environment, a temporary working directory, and
//! deadlines.

pub mod host;
pub mod sandbox;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use prepcoach_core::config::RuntimeConfig;
use prepcoach_core::error::SandboxError;
use prepcoach_core::traits::{CodeSandbox, ExecutionOutput, ResolveRequest, Resolution};

use crate::host::HostRequest;
use crate::sandbox::Workspace;

/// Code sandbox that runs JavaScript in a `node` subprocess.
#[derive(Debug, Clone)]
pub struct NodeSandbox {
    node: PathBuf,
    /// Startup allowance; the process deadline adds one call budget per
    /// invocation on top of it.
    timeout: Duration,
    /// Per-invocation deadline, enforced inside the host.
    call_timeout: Duration,
}

impl NodeSandbox {
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            timeout: Duration::from_secs(30),
            call_timeout: Duration::from_millis(2000),
        }
    }

    /// Find `node` on PATH.
    pub fn locate() -> Result<Self, SandboxError> {
        Self::locate_binary("node")
    }

    /// Resolve `binary` (a bare name searched on PATH, or a path).
    pub fn locate_binary(binary: &str) -> Result<Self, SandboxError> {
        let node = which::which(binary)
            .map_err(|e| SandboxError::Unavailable(format!("cannot find '{binary}': {e}")))?;
        tracing::debug!(node = %node.display(), "located node");
        Ok(Self::new(node))
    }

    /// Build a sandbox from runtime settings.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, SandboxError> {
        let sandbox = match config.node_binary.as_deref() {
            Some(binary) if !binary.trim().is_empty() => Self::locate_binary(binary.trim())?,
            _ => Self::locate()?,
        };
        Ok(sandbox
            .with_timeout(config.timeout())
            .with_call_timeout(config.call_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Path of the `node` binary in use.
    pub fn node_path(&self) -> &Path {
        &self.node
    }

    fn call_timeout_ms(&self) -> u64 {
        (self.call_timeout.as_millis() as u64).max(1)
    }

    /// Deadline for a host process that makes `invocations` timed vm runs:
    /// the top-level script plus one per call.
    fn process_deadline(&self, invocations: usize) -> Duration {
        let runs = u32::try_from(invocations).unwrap_or(u32::MAX);
        self.timeout
            .saturating_add(self.call_timeout.saturating_mul(runs))
    }

    fn workspace(&self) -> Result<Workspace, SandboxError> {
        Workspace::new().map_err(|e| SandboxError::Spawn(format!("{e:#}")))
    }
}

#[async_trait]
impl CodeSandbox for NodeSandbox {
    fn name(&self) -> &str {
        "node"
    }

    async fn run_and_resolve(&self, request: &ResolveRequest) -> Result<Resolution> {
        let workspace = self.workspace()?;
        let host_request = HostRequest::Resolve {
            source: &request.source,
            function: &request.function,
            calls: &request.calls,
            call_timeout_ms: self.call_timeout_ms(),
        };
        let deadline = self.process_deadline(request.calls.len() + 1);
        let resolution: Resolution =
            host::exchange(&self.node, &workspace, &host_request, deadline).await?;
        tracing::debug!(
            function = %request.function,
            calls = request.calls.len(),
            "node resolved submission"
        );
        Ok(resolution)
    }

    async fn execute(&self, source: &str) -> Result<ExecutionOutput> {
        let workspace = self.workspace()?;
        let host_request = HostRequest::Execute {
            source,
            call_timeout_ms: self.call_timeout_ms(),
        };
        let deadline = self.process_deadline(1);
        let output = host::exchange(&self.node, &workspace, &host_request, deadline).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use prepcoach_core::grader::{CodeGrader, TestOutcome, NO_OUTPUT};
    use prepcoach_core::model::TestCase;
    use prepcoach_core::traits::CallOutcome;
    use serde_json::json;

    fn node() -> Option<NodeSandbox> {
        match NodeSandbox::locate() {
            Ok(sandbox) => Some(sandbox),
            Err(e) => {
                eprintln!("skipping: {e}");
                None
            }
        }
    }

    fn grader(sandbox: NodeSandbox) -> CodeGrader {
        CodeGrader::new(Arc::new(sandbox))
    }

    const TWO_SUM: &str = r#"
function twoSum(nums, target) {
  let left = 0;
  let right = nums.length - 1;
  while (left < right) {
    const sum = nums[left] + nums[right];
    if (sum === target) return [left, right];
    if (sum < target) left++;
    else right--;
  }
  return [];
}
"#;

    #[tokio::test]
    async fn two_sum_passes_all_cases() {
        let Some(sandbox) = node() else { return };
        let cases = [
            TestCase::new("[2,7,11,15], 9", "[0,1]"),
            TestCase::new("[1,2,3,4,6], 6", "[1,3]"),
        ];
        let results = grader(sandbox).run_test_cases(TWO_SUM, "twoSum", &cases).await;
        assert_eq!(results.len(), 2);
        for (i, r) in results.iter().enumerate() {
            let case = r.as_case().unwrap();
            assert_eq!(case.index, i + 1);
            assert!(case.passed, "case {} got {}", case.index, case.actual);
        }
    }

    #[tokio::test]
    async fn one_based_two_sum_matches_expected_text() {
        let Some(sandbox) = node() else { return };
        let code = "function twoSum(numbers, target) {\n  let l = 0, r = numbers.length - 1;\n  while (l < r) {\n    const s = numbers[l] + numbers[r];\n    if (s === target) return [l + 1, r + 1];\n    if (s < target) l++; else r--;\n  }\n  return [];\n}";
        let results = grader(sandbox)
            .run_test_cases(code, "twoSum", &[TestCase::new("[2,7,11,15], 9", "[1,2]")])
            .await;
        assert_eq!(results.len(), 1);
        let case = results[0].as_case().unwrap();
        assert_eq!(case.index, 1);
        assert_eq!(case.actual, "[1,2]");
        assert!(case.passed);
    }

    #[tokio::test]
    async fn lexical_bindings_resolve() {
        let Some(sandbox) = node() else { return };
        let code = "const double = (n) => n * 2;\nlet shout = function (s) { return s.toUpperCase(); };";
        let g = grader(sandbox);

        let results = g
            .run_test_cases(code, "double", &[TestCase::new("21", "42")])
            .await;
        assert!(results[0].passed());

        let results = g
            .run_test_cases(code, "shout", &[TestCase::new("\"hey\"", "HEY")])
            .await;
        assert!(results[0].passed());
    }

    #[tokio::test]
    async fn missing_function_is_single_error() {
        let Some(sandbox) = node() else { return };
        let results = grader(sandbox)
            .run_test_cases(
                "const notAFunction = 3;",
                "notAFunction",
                &[TestCase::new("1", "1"), TestCase::new("2", "2")],
            )
            .await;
        assert_eq!(
            results,
            vec![TestOutcome::Failure(prepcoach_core::grader::GradeFailure {
                error: "Function 'notAFunction' not found or not a function".into()
            })]
        );
    }

    #[tokio::test]
    async fn top_level_throw_is_single_error() {
        let Some(sandbox) = node() else { return };
        let results = grader(sandbox)
            .run_test_cases(
                "throw new Error('bad setup');",
                "f",
                &[TestCase::new("1", "1")],
            )
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error(), Some("bad setup"));
    }

    #[tokio::test]
    async fn thrown_case_is_isolated() {
        let Some(sandbox) = node() else { return };
        let code = "function inv(n) { if (n === 0) throw new Error('division by zero'); return 1 / n; }";
        let results = grader(sandbox)
            .run_test_cases(
                code,
                "inv",
                &[TestCase::new("0", "x"), TestCase::new("4", "0.25")],
            )
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_case().unwrap().actual, "Error: division by zero");
        assert!(!results[0].passed());
        assert!(results[1].passed());
    }

    #[tokio::test]
    async fn per_call_deadline_fails_only_that_case() {
        let Some(sandbox) = node() else { return };
        let sandbox = sandbox.with_call_timeout(Duration::from_millis(200));
        let code = "function spin(n) { if (n > 0) { while (true) {} } return n; }";
        let results = grader(sandbox)
            .run_test_cases(
                code,
                "spin",
                &[TestCase::new("1", "1"), TestCase::new("0", "0")],
            )
            .await;
        let first = results[0].as_case().unwrap();
        assert!(!first.passed);
        assert!(first.actual.starts_with("Error: "), "{}", first.actual);
        assert!(first.actual.contains("timed out"));
        assert!(results[1].passed());
    }

    #[tokio::test]
    async fn many_hanging_cases_do_not_sink_the_batch() {
        let Some(sandbox) = node() else { return };
        let sandbox = sandbox
            .with_timeout(Duration::from_secs(3))
            .with_call_timeout(Duration::from_millis(300));
        let code = "function spin(n) { if (n > 0) { while (true) {} } return n; }";
        let mut cases = vec![TestCase::new("0", "0")];
        cases.extend((0..12).map(|_| TestCase::new("1", "1")));

        let results = grader(sandbox).run_test_cases(code, "spin", &cases).await;
        assert_eq!(results.len(), 13, "{results:?}");
        assert!(results[0].passed());
        for r in &results[1..] {
            let case = r.as_case().unwrap();
            assert!(!case.passed);
            assert!(case.actual.contains("timed out"), "{}", case.actual);
        }
    }

    #[tokio::test]
    async fn promise_job_hang_is_a_case_error() {
        let Some(sandbox) = node() else { return };
        let sandbox = sandbox
            .with_timeout(Duration::from_secs(3))
            .with_call_timeout(Duration::from_millis(300));
        let code = "function f(n) { Promise.resolve().then(() => { while (true) {} }); return n; }";
        let results = grader(sandbox)
            .run_test_cases(code, "f", &[TestCase::new("1", "1")])
            .await;
        assert_eq!(results.len(), 1);
        let case = results[0].as_case().expect("per-case outcome, not a batch failure");
        assert!(case.actual.contains("timed out"), "{}", case.actual);
    }

    #[tokio::test]
    async fn values_without_json_form_are_opaque() {
        let Some(sandbox) = node() else { return };
        let request = ResolveRequest {
            source: "function f(kind) { return ({ nan: NaN, inf: Infinity, none: undefined, obj: { b: 1, a: [1, 'x'] } })[kind]; }".into(),
            function: "f".into(),
            calls: vec![
                vec![json!("nan")],
                vec![json!("inf")],
                vec![json!("none")],
                vec![json!("obj")],
            ],
        };
        let resolution = sandbox.run_and_resolve(&request).await.unwrap();
        let Resolution::Resolved { outcomes } = resolution else {
            panic!("expected resolved, got {resolution:?}");
        };
        assert_eq!(outcomes[0], CallOutcome::Opaque { text: "NaN".into() });
        assert_eq!(outcomes[1], CallOutcome::Opaque { text: "Infinity".into() });
        assert_eq!(outcomes[2], CallOutcome::Undefined);
        assert_eq!(outcomes[3].stringify().unwrap(), "{\"b\":1,\"a\":[1,\"x\"]}");
    }

    #[tokio::test]
    async fn context_exposes_no_host_globals() {
        let Some(sandbox) = node() else { return };
        let results = grader(sandbox)
            .run_test_cases(
                "function probe() { return typeof require + ',' + typeof process; }",
                "probe",
                &[TestCase::new("", "undefined,undefined")],
            )
            .await;
        assert!(results[0].passed(), "{:?}", results[0]);
    }

    #[tokio::test]
    async fn run_code_captures_console() {
        let Some(sandbox) = node() else { return };
        let g = grader(sandbox);

        let out = g
            .run_code("console.log('a', 1); console.info([1,2]); console.warn('careful'); console.error('bad');")
            .await;
        assert_eq!(out, "a 1\n[1,2]\nWARNING: careful\nERROR: bad");

        assert_eq!(g.run_code("const x = 1;").await, NO_OUTPUT);

        let out = g.run_code("console.log('before'); throw new Error('boom');").await;
        assert_eq!(out, "before\nERROR: boom");
    }

    #[tokio::test]
    async fn unknown_binary_fails_to_spawn() {
        let sandbox = NodeSandbox::new("/nonexistent/prepcoach/node");
        let err = sandbox.execute("1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SandboxError>(),
            Some(SandboxError::Spawn(_))
        ));
    }

    #[test]
    fn unresolvable_binary_is_unavailable() {
        let config = RuntimeConfig {
            node_binary: Some("/nonexistent/prepcoach/node".into()),
            ..Default::default()
        };
        let err = NodeSandbox::from_config(&config).unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn builder_sets_deadlines() {
        let sandbox = NodeSandbox::new("node")
            .with_timeout(Duration::from_secs(5))
            .with_call_timeout(Duration::ZERO);
        assert_eq!(sandbox.timeout, Duration::from_secs(5));
        assert_eq!(sandbox.call_timeout_ms(), 1);
        assert_eq!(sandbox.node_path(), Path::new("node"));
    }

    #[test]
    fn process_deadline_grows_with_calls() {
        let sandbox = NodeSandbox::new("node")
            .with_timeout(Duration::from_secs(30))
            .with_call_timeout(Duration::from_millis(2000));
        assert_eq!(sandbox.process_deadline(1), Duration::from_secs(32));
        // 15 hanging calls plus the top-level script
        assert_eq!(sandbox.process_deadline(16), Duration::from_secs(62));
        assert_eq!(
            NodeSandbox::new("node")
                .with_timeout(Duration::MAX)
                .process_deadline(usize::MAX),
            Duration::MAX
        );
    }
}
