//! Temporary workspace the Node host runs in.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// The harness script executed by `node`.
pub const HARNESS: &str = include_str!("harness.js");

const HARNESS_FILE: &str = "harness.js";

/// Environment variables blanked before the host starts.
const SCRUBBED_ENV: &[&str] = &[
    "NODE_OPTIONS",
    "NODE_PATH",
    "NODE_REPL_EXTERNAL_MODULE",
    "SSH_AUTH_SOCK",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GITHUB_TOKEN",
    "GH_TOKEN",
    "NPM_TOKEN",
    "NPM_CONFIG_USERCONFIG",
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "DOCKER_HOST",
    "DOCKER_CONFIG",
    "KUBECONFIG",
    "DATABASE_URL",
];

/// A throwaway directory holding the harness script.
///
/// On drop, the directory is removed.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace with the harness written into it.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("prepcoach-")
            .tempdir()
            .context("failed to create temp directory")?;
        std::fs::write(dir.path().join(HARNESS_FILE), HARNESS)
            .context("failed to write harness script")?;
        Ok(Self { dir })
    }

    /// Get the path to the workspace directory.
    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Get the path to the harness script.
    pub fn harness_path(&self) -> PathBuf {
        self.dir.path().join(HARNESS_FILE)
    }

    /// Build environment variables for the host process.
    ///
    /// Points HOME and TMPDIR at the workspace and blanks sensitive variables.
    pub fn build_env(&self) -> Vec<(String, String)> {
        let work_dir = self.dir.path().to_string_lossy().to_string();
        let mut env = vec![
            ("HOME".to_string(), work_dir.clone()),
            ("TMPDIR".to_string(), work_dir),
        ];
        for var in SCRUBBED_ENV {
            env.push((var.to_string(), String::new()));
        }
        env
    }
}
