//! The `prepcoach run` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use prepcoach_core::config::load_config_from;
use prepcoach_core::grader::CodeGrader;

use super::sandbox;

pub async fn execute(code_file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let code = std::fs::read_to_string(&code_file)
        .with_context(|| format!("failed to read code from {}", code_file.display()))?;

    let grader = CodeGrader::new(sandbox(&config)?);
    println!("{}", grader.run_code(&code).await);

    Ok(())
}
