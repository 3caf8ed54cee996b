//! TOML question catalog parser.
//!
//! Loads catalogs from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::grader::is_identifier;
use crate::literal;
use crate::model::{Catalog, Category, CategoryKind, CodingExercise, Question, TestCase};

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    categories: Vec<TomlCategory>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlCategory {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

fn default_kind() -> String {
    "concepts".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    question: String,
    answer: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    exercise: Option<TomlExercise>,
}

#[derive(Debug, Deserialize)]
struct TomlExercise {
    function_name: String,
    #[serde(default)]
    starter_code: Option<String>,
    #[serde(default)]
    test_cases: Vec<TomlTestCase>,
}

#[derive(Debug, Deserialize)]
struct TomlTestCase {
    input: String,
    expected: String,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let categories = parsed
        .categories
        .into_iter()
        .map(|c| {
            let kind: CategoryKind = c
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("category '{}': {}", c.id, e))?;

            let questions = c
                .questions
                .into_iter()
                .map(|q| Question {
                    id: q.id,
                    question: q.question,
                    answer: q.answer,
                    code: q.code,
                    keywords: q.keywords,
                    exercise: q.exercise.map(|e| CodingExercise {
                        function_name: e.function_name,
                        starter_code: e.starter_code,
                        test_cases: e
                            .test_cases
                            .into_iter()
                            .map(|t| TestCase {
                                input: t.input,
                                expected: t.expected,
                            })
                            .collect(),
                    }),
                })
                .collect();

            Ok(Category {
                id: c.id,
                name: c.name,
                description: c.description,
                kind,
                questions,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        categories,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// Load a catalog file, or every catalog under a directory.
pub fn load_catalogs(path: &Path) -> Result<Vec<Catalog>> {
    if path.is_dir() {
        load_catalog_directory(path)
    } else {
        Ok(vec![parse_catalog(path)?])
    }
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn for_question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a catalog for common authoring mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_categories = std::collections::HashSet::new();
    for category in &catalog.categories {
        if !seen_categories.insert(&category.id) {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("duplicate category ID: {}", category.id),
            });
        }
        if category.questions.is_empty() {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("category '{}' has no questions", category.id),
            });
        }
    }

    let mut seen_ids = std::collections::HashSet::new();
    for (category, question) in catalog.questions() {
        let id = question.id.as_str();

        if !seen_ids.insert(id) {
            warnings.push(ValidationWarning::for_question(
                id,
                format!("duplicate question ID: {id}"),
            ));
        }

        if question.answer.trim().is_empty() {
            warnings.push(ValidationWarning::for_question(id, "reference answer is empty"));
        }

        let Some(exercise) = &question.exercise else {
            if category.kind == CategoryKind::Coding {
                warnings.push(ValidationWarning::for_question(
                    id,
                    "question in a coding category has no exercise",
                ));
            }
            continue;
        };

        if !is_identifier(&exercise.function_name) {
            warnings.push(ValidationWarning::for_question(
                id,
                format!(
                    "function_name '{}' is not a valid identifier",
                    exercise.function_name
                ),
            ));
        }

        if exercise.test_cases.is_empty() {
            warnings.push(ValidationWarning::for_question(id, "exercise has no test cases"));
        }

        for (i, tc) in exercise.test_cases.iter().enumerate() {
            if let Err(e) = literal::parse_arguments(&tc.input) {
                warnings.push(ValidationWarning::for_question(
                    id,
                    format!("test case {} input is not a valid literal: {e}", i + 1),
                ));
            }
        }

        if let Some(code) = question.reference_code() {
            if !code.contains(&exercise.function_name) {
                warnings.push(ValidationWarning::for_question(
                    id,
                    format!(
                        "reference code does not mention '{}'",
                        exercise.function_name
                    ),
                ));
            }
        }
    }

    warnings
}
