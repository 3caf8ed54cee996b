//! The `prepcoach validate` command.

use std::path::PathBuf;

use anyhow::Result;

use prepcoach_core::parser::{load_catalogs, validate_catalog};

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = load_catalogs(&catalog_path)?;
    anyhow::ensure!(
        !catalogs.is_empty(),
        "no catalogs found in {}",
        catalog_path.display()
    );

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} categories, {} questions)",
            catalog.name,
            catalog.categories.len(),
            catalog.question_count()
        );

        let warnings = validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
