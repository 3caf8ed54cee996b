//! One request/response exchange with a `node` host process.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use prepcoach_core::error::SandboxError;

use crate::sandbox::Workspace;

/// A request written to the harness on stdin.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HostRequest<'a> {
    Resolve {
        source: &'a str,
        function: &'a str,
        calls: &'a [Vec<Value>],
        call_timeout_ms: u64,
    },
    Execute {
        source: &'a str,
        call_timeout_ms: u64,
    },
}

/// Spawn `node` on the workspace harness, send `request`, and parse the
/// single JSON line it answers with.
///
/// The child is killed if it outlives `timeout`.
pub async fn exchange<T: DeserializeOwned>(
    node: &Path,
    workspace: &Workspace,
    request: &HostRequest<'_>,
    timeout: Duration,
) -> Result<T, SandboxError> {
    let payload =
        serde_json::to_vec(request).map_err(|e| SandboxError::Protocol(e.to_string()))?;

    let mut cmd = Command::new(node);
    cmd.arg(workspace.harness_path())
        .current_dir(workspace.work_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, val) in workspace.build_env() {
        cmd.env(&key, &val);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| SandboxError::Spawn(format!("{}: {e}", node.display())))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| SandboxError::Spawn("host stdin unavailable".into()))?;

    let exchange = async move {
        stdin.write_all(&payload).await?;
        stdin.shutdown().await?;
        drop(stdin);
        child.wait_with_output().await
    };

    let output = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| SandboxError::Timeout(timeout.as_millis() as u64))?
        .map_err(|e| SandboxError::Spawn(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SandboxError::Spawn(format!(
            "host exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_response(&stdout)
}

/// Parse the last non-empty line of host output.
fn parse_response<T: DeserializeOwned>(stdout: &str) -> Result<T, SandboxError> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| SandboxError::Protocol("empty response".into()))?;
    serde_json::from_str(line).map_err(|e| SandboxError::Protocol(format!("{e}: {line}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepcoach_core::traits::{ExecutionOutput, Resolution};
    use serde_json::json;

    #[test]
    fn request_wire_format() {
        let calls = vec![vec![json!([2, 7]), json!(9)]];
        let request = HostRequest::Resolve {
            source: "function f() {}",
            function: "f",
            calls: &calls,
            call_timeout_ms: 2000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mode"], "resolve");
        assert_eq!(value["calls"], json!([[[2, 7], 9]]));
        assert_eq!(value["call_timeout_ms"], 2000);

        let value = serde_json::to_value(HostRequest::Execute {
            source: "console.log(1)",
            call_timeout_ms: 50,
        })
        .unwrap();
        assert_eq!(value["mode"], "execute");
    }

    #[test]
    fn parses_last_line() {
        let parsed: Resolution = parse_response("\n{\"status\":\"missing\"}\n\n").unwrap();
        assert_eq!(parsed, Resolution::Missing);

        let parsed: ExecutionOutput =
            parse_response("{\"lines\":[\"hi\"],\"error\":null}\n").unwrap();
        assert_eq!(parsed.lines, vec!["hi".to_string()]);
    }

    #[test]
    fn bad_responses_are_protocol_errors() {
        assert!(matches!(
            parse_response::<Resolution>(""),
            Err(SandboxError::Protocol(_))
        ));
        assert!(matches!(
            parse_response::<Resolution>("not json"),
            Err(SandboxError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn deadline_kills_host() {
        let Ok(node) = which::which("node") else {
            eprintln!("skipping: node not found on PATH");
            return;
        };
        let ws = Workspace::new().unwrap();
        let request = HostRequest::Execute {
            source: "while (true) {}",
            call_timeout_ms: 30_000,
        };
        let err = exchange::<ExecutionOutput>(&node, &ws, &request, Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::Timeout(500)));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let ws = Workspace::new().unwrap();
        let request = HostRequest::Execute {
            source: "",
            call_timeout_ms: 10,
        };
        let err = exchange::<ExecutionOutput>(
            Path::new("/nonexistent/prepcoach/node"),
            &ws,
            &request,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SandboxError::Spawn(_)));
    }
}
