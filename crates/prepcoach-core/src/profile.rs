//! Scoring vocabularies.
//!
//! A [`ScoringProfile`] bundles every fixed table the answer scorer reads:
//! weighted keywords, concept detectors, filler words, technical terms, and
//! code tokens. The built-in profile targets JavaScript interviews; other
//! domains load their own profile from TOML.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Ordered mapping from lower-case keyword to importance weight (1..=3).
#[derive(Debug, Clone, Default)]
pub struct KeywordWeightTable {
    entries: Vec<(String, u8)>,
}

impl KeywordWeightTable {
    /// Build a table, lower-casing keywords and keeping the first weight
    /// seen for a duplicate keyword. Weights are clamped into 1..=3.
    pub fn new<S: AsRef<str>>(entries: impl IntoIterator<Item = (S, u8)>) -> Self {
        let mut table = Self::default();
        for (keyword, weight) in entries {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() || table.weight(&keyword).is_some() {
                continue;
            }
            table.entries.push((keyword, weight.clamp(1, 3)));
        }
        table
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn weight(&self, keyword: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named pattern that adds `weight` to the concept score when it matches
/// normalized answer text.
#[derive(Debug, Clone)]
pub struct Detector {
    name: String,
    pattern: Regex,
    weight: u8,
}

impl Detector {
    pub fn new(name: &str, pattern: &str, weight: u8) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            pattern: Regex::new(pattern)?,
            weight,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Every table the answer scorer consults.
#[derive(Debug, Clone)]
pub struct ScoringProfile {
    pub keywords: KeywordWeightTable,
    /// Applied in order; the first two that fire are named in feedback.
    pub detectors: Vec<Detector>,
    /// Whole-word phrases that count against clarity.
    pub filler_words: Vec<String>,
    /// Terms whose distinct use counts toward clarity.
    pub technical_terms: Vec<String>,
    /// Whole-word tokens that mark an answer as containing code.
    pub code_tokens: Vec<String>,
}

const JS_KEYWORDS: &[(&str, u8)] = &[
    ("closure", 3),
    ("lexical", 3),
    ("scope", 2),
    ("hoisting", 3),
    ("prototype", 3),
    ("inheritance", 2),
    ("execution context", 3),
    ("event loop", 3),
    ("call stack", 2),
    ("callback", 2),
    ("promise", 3),
    ("async", 3),
    ("await", 2),
    ("microtask", 3),
    ("temporal dead zone", 3),
    ("block scope", 2),
    ("strict mode", 2),
    ("type coercion", 3),
    ("equality", 2),
    ("higher order", 2),
    ("arrow function", 2),
    ("destructuring", 2),
    ("spread", 2),
    ("immutable", 2),
    ("constructor", 2),
    ("module", 2),
    ("event delegation", 3),
    ("bubbling", 2),
    ("debounce", 3),
    ("throttle", 3),
    ("recursion", 2),
    ("garbage collection", 2),
    ("map", 2),
    ("filter", 2),
    ("reduce", 2),
    ("function", 1),
    ("variable", 1),
    ("object", 1),
    ("array", 1),
    ("environment", 1),
    ("memory", 1),
    ("undefined", 1),
];

const JS_DETECTORS: &[(&str, &str, u8)] = &[
    (
        "reasoning",
        r"\b(because|since|therefore|thus|so that|which means)\b",
        2,
    ),
    (
        "sequencing",
        r"\b(first|then|next|finally|after that|afterwards)\b",
        1,
    ),
    ("examples", r"\b(for example|for instance|such as|eg)\b", 2),
    (
        "structure",
        r"\b(functions?|variables?|objects?|arrays?|class(es)?|methods?)\b",
        1,
    ),
    (
        "comparison",
        r"\b(whereas|unlike|however|instead|compared to|difference|differs)\b",
        2,
    ),
    (
        "trade-offs",
        r"\b(performance|complexity|memory|efficient|efficiency|trade ?offs?)\b",
        1,
    ),
];

const FILLER_WORDS: &[&str] = &["um", "uh", "like", "you know", "basically", "actually"];

const JS_TECHNICAL_TERMS: &[&str] = &[
    "closure",
    "scope",
    "lexical",
    "hoisting",
    "prototype",
    "callback",
    "promise",
    "async",
    "event loop",
    "function",
    "variable",
    "object",
    "array",
    "algorithm",
    "complexity",
    "recursion",
    "iteration",
    "immutable",
];

const CODE_TOKENS: &[&str] = &["function", "var", "let", "const", "if", "for", "while"];

impl ScoringProfile {
    /// The built-in JavaScript interview vocabulary.
    pub fn javascript() -> Self {
        let detectors = JS_DETECTORS
            .iter()
            .map(|(name, pattern, weight)| {
                Detector::new(name, pattern, *weight).expect("built-in detector pattern is valid")
            })
            .collect();

        Self {
            keywords: KeywordWeightTable::new(JS_KEYWORDS.iter().copied()),
            detectors,
            filler_words: to_strings(FILLER_WORDS),
            technical_terms: to_strings(JS_TECHNICAL_TERMS),
            code_tokens: to_strings(CODE_TOKENS),
        }
    }

    /// Load a profile from a TOML vocabulary file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read vocabulary: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse vocabulary: {}", path.display()))
    }

    /// Parse a profile from TOML. Omitted sections fall back to the
    /// built-in JavaScript tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: TomlProfile = toml::from_str(content).context("invalid vocabulary TOML")?;
        let mut profile = Self::javascript();

        if let Some(keywords) = parsed.keywords {
            for (keyword, weight) in &keywords {
                anyhow::ensure!(
                    (1..=3).contains(weight),
                    "keyword '{keyword}' has weight {weight}, expected 1..=3"
                );
            }
            profile.keywords = KeywordWeightTable::new(keywords);
        }

        if let Some(detectors) = parsed.detectors {
            profile.detectors = detectors
                .into_iter()
                .map(|d| {
                    anyhow::ensure!(
                        (1..=2).contains(&d.weight),
                        "detector '{}' has weight {}, expected 1 or 2",
                        d.name,
                        d.weight
                    );
                    Detector::new(&d.name, &d.pattern, d.weight)
                        .with_context(|| format!("invalid pattern for detector '{}'", d.name))
                })
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(words) = parsed.filler_words {
            profile.filler_words = lowercase_all(words);
        }
        if let Some(terms) = parsed.technical_terms {
            profile.technical_terms = lowercase_all(terms);
        }
        if let Some(tokens) = parsed.code_tokens {
            profile.code_tokens = lowercase_all(tokens);
        }

        Ok(profile)
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::javascript()
    }
}

#[derive(Debug, Deserialize)]
struct TomlProfile {
    #[serde(default)]
    keywords: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    detectors: Option<Vec<TomlDetector>>,
    #[serde(default)]
    filler_words: Option<Vec<String>>,
    #[serde(default)]
    technical_terms: Option<Vec<String>>,
    #[serde(default)]
    code_tokens: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TomlDetector {
    name: String,
    pattern: String,
    weight: u8,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.trim().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profile_is_populated() {
        let profile = ScoringProfile::javascript();
        assert_eq!(profile.keywords.weight("closure"), Some(3));
        assert_eq!(profile.keywords.weight("function"), Some(1));
        assert_eq!(profile.detectors.len(), 6);
        assert_eq!(profile.detectors[0].name(), "reasoning");
        assert!(profile.filler_words.contains(&"you know".to_string()));
    }

    #[test]
    fn keyword_table_normalizes_entries() {
        let table = KeywordWeightTable::new([("Closure", 9), ("closure", 1), ("  ", 2), ("Scope", 0)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.weight("closure"), Some(3));
        assert_eq!(table.weight("scope"), Some(1));
    }

    #[test]
    fn detector_matches_normalized_text() {
        let detector = Detector::new("reasoning", r"\bbecause\b", 2).unwrap();
        assert!(detector.is_match("it works because of scope"));
        assert!(!detector.is_match("becausewhy"));
        assert_eq!(detector.weight(), 2);
    }

    #[test]
    fn vocabulary_overrides_only_given_sections() {
        let toml = r#"
filler_words = ["Erm"]

[keywords]
"list comprehension" = 3
generator = 2

[[detectors]]
name = "reasoning"
pattern = "\\b(because|hence)\\b"
weight = 2
"#;
        let profile = ScoringProfile::from_toml_str(toml).unwrap();
        assert_eq!(profile.keywords.len(), 2);
        assert_eq!(profile.keywords.weight("list comprehension"), Some(3));
        assert_eq!(profile.detectors.len(), 1);
        assert_eq!(profile.filler_words, vec!["erm"]);
        // untouched sections keep the built-in tables
        assert!(profile.code_tokens.contains(&"const".to_string()));
    }

    #[test]
    fn vocabulary_rejects_bad_weights_and_patterns() {
        assert!(ScoringProfile::from_toml_str("[keywords]\nclosure = 5\n").is_err());
        let bad_pattern = r#"
[[detectors]]
name = "broken"
pattern = "(unclosed"
weight = 1
"#;
        assert!(ScoringProfile::from_toml_str(bad_pattern).is_err());
        let bad_weight = r#"
[[detectors]]
name = "heavy"
pattern = "x"
weight = 3
"#;
        assert!(ScoringProfile::from_toml_str(bad_weight).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.toml");
        std::fs::write(&path, "technical_terms = [\"Borrow Checker\"]\n").unwrap();
        let profile = ScoringProfile::load(&path).unwrap();
        assert_eq!(profile.technical_terms, vec!["borrow checker"]);
    }
}
