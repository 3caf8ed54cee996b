pub mod compare;
pub mod grade;
pub mod init;
pub mod practice;
pub mod quick_score;
pub mod run;
pub mod score;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use prepcoach_core::config::PrepcoachConfig;
use prepcoach_core::model::{Catalog, Question};
use prepcoach_core::parser;
use prepcoach_core::traits::CodeSandbox;
use prepcoach_runner::NodeSandbox;

/// Load every catalog under `path` and merge them into one.
pub(crate) fn load_catalog(path: &Path) -> Result<Catalog> {
    let mut catalogs = parser::load_catalogs(path)?;
    anyhow::ensure!(!catalogs.is_empty(), "no catalogs found in {}", path.display());
    if catalogs.len() == 1 {
        return Ok(catalogs.remove(0));
    }
    let mut merged = Catalog {
        id: "merged".to_string(),
        name: path.display().to_string(),
        description: String::new(),
        categories: Vec::new(),
    };
    for catalog in catalogs {
        merged.categories.extend(catalog.categories);
    }
    Ok(merged)
}

/// Find a question by id, returning its category id alongside it.
pub(crate) fn find_question(catalog: &Catalog, id: &str) -> Result<(String, Question)> {
    catalog
        .find_question(id)
        .map(|(category, question)| (category.id.clone(), question.clone()))
        .with_context(|| format!("question '{id}' not found in catalog '{}'", catalog.name))
}

/// Build the code sandbox selected by the configuration.
pub(crate) fn sandbox(config: &PrepcoachConfig) -> Result<Arc<dyn CodeSandbox>> {
    let sandbox = NodeSandbox::from_config(&config.runtime)
        .context("JavaScript grading needs Node.js; install it or set runtime.node_binary")?;
    tracing::debug!(node = %sandbox.node_path().display(), "using node sandbox");
    Ok(Arc::new(sandbox))
}
