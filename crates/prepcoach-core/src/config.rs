//! prepcoach configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::profile::ScoringProfile;

/// Settings for the code-execution host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Explicit path to the `node` binary; searched on PATH when unset.
    #[serde(default)]
    pub node_binary: Option<String>,
    /// Host-process allowance in seconds; each timed vm run adds
    /// `call_timeout_ms` to the process deadline.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for one function invocation, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_call_timeout_ms() -> u64 {
    2000
}

impl RuntimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            node_binary: None,
            timeout_secs: default_timeout_secs(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

/// Top-level prepcoach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepcoachConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Output directory for practice reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Max concurrent gradings in a practice session.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Vocabulary file replacing the built-in scoring profile.
    #[serde(default)]
    pub vocabulary: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./prepcoach-results")
}
fn default_parallelism() -> usize {
    4
}

impl Default for PrepcoachConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            output_dir: default_output_dir(),
            parallelism: default_parallelism(),
            vocabulary: None,
        }
    }
}

impl PrepcoachConfig {
    /// The scoring profile this configuration selects.
    pub fn scoring_profile(&self) -> Result<ScoringProfile> {
        match &self.vocabulary {
            Some(path) => ScoringProfile::load(path),
            None => Ok(ScoringProfile::javascript()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `prepcoach.toml` in the current directory
/// 2. `~/.config/prepcoach/config.toml`
///
/// Environment variable overrides: `PREPCOACH_NODE`, `PREPCOACH_TIMEOUT_SECS`.
pub fn load_config() -> Result<PrepcoachConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PrepcoachConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("prepcoach.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PrepcoachConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PrepcoachConfig::default(),
    };

    apply_env_overrides(&mut config)?;

    config.runtime.node_binary = config.runtime.node_binary.as_deref().map(resolve_env_vars);
    config.output_dir = resolve_path(&config.output_dir);
    config.vocabulary = config.vocabulary.as_deref().map(resolve_path);

    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");

    Ok(config)
}

fn apply_env_overrides(config: &mut PrepcoachConfig) -> Result<()> {
    if let Ok(node) = std::env::var("PREPCOACH_NODE") {
        config.runtime.node_binary = Some(node);
    }
    if let Ok(secs) = std::env::var("PREPCOACH_TIMEOUT_SECS") {
        config.runtime.timeout_secs = secs
            .trim()
            .parse()
            .with_context(|| format!("invalid PREPCOACH_TIMEOUT_SECS: '{secs}'"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("prepcoach"))
}
