//! Core data model types for prepcoach.
//!
//! These are the types the whole system uses to represent the question
//! catalog, coding exercises, and their test cases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single study question with its reference answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: String,
    /// The question text shown to the user.
    pub question: String,
    /// The reference answer a user's answer is compared against.
    pub answer: String,
    /// Optional reference code illustrating the answer.
    #[serde(default)]
    pub code: Option<String>,
    /// Keywords used by quick scoring.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Coding exercise attached to this question, if any.
    #[serde(default)]
    pub exercise: Option<CodingExercise>,
}

impl Question {
    /// Reference code, used to check that an exercise's test table is sound.
    pub fn reference_code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// A function-implementation exercise graded against literal test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingExercise {
    /// Name of the function the submission must define.
    pub function_name: String,
    /// Code shown to the user as a starting point.
    #[serde(default)]
    pub starter_code: Option<String>,
    /// Test cases, in the order they are reported.
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// One (input, expected output) pair.
///
/// `input` is a literal expression or a comma-separated list of them;
/// `expected` is compared verbatim against the stringified return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// How questions in a category are practised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Free-text concept questions.
    #[default]
    Concepts,
    /// Coding-pattern exercises with test cases.
    Coding,
    /// Spoken Q&A practice (answers arrive as transcripts).
    Voice,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Concepts => write!(f, "concepts"),
            CategoryKind::Coding => write!(f, "coding"),
            CategoryKind::Voice => write!(f, "voice"),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concepts" | "concept" => Ok(CategoryKind::Concepts),
            "coding" | "patterns" => Ok(CategoryKind::Coding),
            "voice" => Ok(CategoryKind::Voice),
            other => Err(format!("unknown category kind: {other}")),
        }
    }
}

/// A named group of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: CategoryKind,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// An ordered collection of categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Catalog {
    /// All questions in catalog order, paired with their category.
    pub fn questions(&self) -> impl Iterator<Item = (&Category, &Question)> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter().map(move |q| (c, q)))
    }

    /// Look up a question by id.
    pub fn find_question(&self, id: &str) -> Option<(&Category, &Question)> {
        self.questions().find(|(_, q)| q.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        Catalog {
            id: "js".into(),
            name: "JavaScript".into(),
            description: String::new(),
            categories: vec![
                Category {
                    id: "fundamentals".into(),
                    name: "Fundamentals".into(),
                    description: String::new(),
                    kind: CategoryKind::Concepts,
                    questions: vec![Question {
                        id: "closure".into(),
                        question: "What is a closure?".into(),
                        answer: "A closure is a function bundled with its lexical environment."
                            .into(),
                        code: None,
                        keywords: vec!["closure".into()],
                        exercise: None,
                    }],
                },
                Category {
                    id: "patterns".into(),
                    name: "Patterns".into(),
                    description: String::new(),
                    kind: CategoryKind::Coding,
                    questions: vec![Question {
                        id: "two-sum".into(),
                        question: "Two sum on a sorted array".into(),
                        answer: "Use two pointers.".into(),
                        code: None,
                        keywords: vec![],
                        exercise: Some(CodingExercise {
                            function_name: "twoSum".into(),
                            starter_code: None,
                            test_cases: vec![TestCase::new("[2,7,11,15], 9", "[1,2]")],
                        }),
                    }],
                },
            ],
        }
    }

    #[test]
    fn category_kind_display_and_parse() {
        assert_eq!(CategoryKind::Coding.to_string(), "coding");
        assert_eq!(
            "Patterns".parse::<CategoryKind>().unwrap(),
            CategoryKind::Coding
        );
        assert_eq!("voice".parse::<CategoryKind>().unwrap(), CategoryKind::Voice);
        assert!("trivia".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn find_question_across_categories() {
        let catalog = sample_catalog();
        let (category, question) = catalog.find_question("two-sum").unwrap();
        assert_eq!(category.id, "patterns");
        assert_eq!(
            question.exercise.as_ref().unwrap().function_name,
            "twoSum"
        );
        assert!(catalog.find_question("missing").is_none());
        assert_eq!(catalog.question_count(), 2);
    }

    #[test]
    fn questions_preserve_catalog_order() {
        let catalog = sample_catalog();
        let ids: Vec<&str> = catalog.questions().map(|(_, q)| q.id.as_str()).collect();
        assert_eq!(ids, vec!["closure", "two-sum"]);
    }
}
