//! Heuristic answer scoring.
//!
//! Combines four components into a 0–10 score:
//!
//! | component          | weight | reported as     |
//! |--------------------|--------|-----------------|
//! | keyword coverage   | 40%    | `accuracy`      |
//! | concept coverage   | 30%    | (internal)      |
//! | clarity            | 20%    | `clarity`       |
//! | completeness       | 10%    | `completeness`  |
//!
//! All scoring is a pure function of the inputs and the [`ScoringProfile`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::ScoringProfile;

/// Highest score any answer can receive.
pub const MAX_SCORE: u8 = 10;

const NEUTRAL: f64 = 5.0;

/// The result of scoring one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Overall score, 0..=10.
    pub score: u8,
    /// Always [`MAX_SCORE`].
    pub max_score: u8,
    /// Exactly one overall message, chosen by [`ScoreBand`].
    pub feedback: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Keywords found in both the reference and the user answer, in
    /// vocabulary order.
    pub keyword_matches: Vec<String>,
    pub completeness: f64,
    /// Keyword coverage component.
    pub accuracy: f64,
    pub clarity: f64,
}

impl ScoreReport {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Coarse grouping of overall scores used for feedback and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    MajorImprovement,
    Basic,
    Decent,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            9..=u8::MAX => ScoreBand::Excellent,
            7..=8 => ScoreBand::Good,
            5..=6 => ScoreBand::Decent,
            3..=4 => ScoreBand::Basic,
            _ => ScoreBand::MajorImprovement,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => {
                "Excellent answer! You demonstrated a thorough understanding of the concept."
            }
            ScoreBand::Good => "Good answer! You covered the main points well.",
            ScoreBand::Decent => "Decent answer, but there is room for improvement.",
            ScoreBand::Basic => "Basic answer that needs improvement. Review the key concepts.",
            ScoreBand::MajorImprovement => {
                "This answer needs major improvement. Study the reference answer carefully."
            }
        }
    }

    pub fn all() -> [ScoreBand; 5] {
        [
            ScoreBand::Excellent,
            ScoreBand::Good,
            ScoreBand::Decent,
            ScoreBand::Basic,
            ScoreBand::MajorImprovement,
        ]
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "excellent"),
            ScoreBand::Good => write!(f, "good"),
            ScoreBand::Decent => write!(f, "decent"),
            ScoreBand::Basic => write!(f, "basic"),
            ScoreBand::MajorImprovement => write!(f, "major improvement needed"),
        }
    }
}

/// Scores free-text answers against a reference answer.
#[derive(Debug, Clone, Default)]
pub struct AnswerScorer {
    profile: ScoringProfile,
}

#[derive(Default)]
struct Notes {
    strengths: Vec<String>,
    improvements: Vec<String>,
}

impl AnswerScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Score `user_answer` against `correct_answer`.
    ///
    /// Never fails: empty inputs resolve to neutral component scores.
    pub fn analyze_answer(
        &self,
        user_answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> ScoreReport {
        let user = normalize(user_answer);
        let reference = normalize(correct_answer);
        let mut notes = Notes::default();

        let (accuracy, keyword_matches) = self.keyword_coverage(&user, &reference, &mut notes);
        let concept = self.concept_coverage(&user, &mut notes);
        let clarity = self.clarity(user_answer, &user, &mut notes);
        let completeness = self.completeness(&user, &reference, &mut notes);

        let weighted = accuracy * 0.4 + concept * 0.3 + clarity * 0.2 + completeness * 0.1;
        let score = weighted.round().clamp(0.0, f64::from(MAX_SCORE)) as u8;
        let band = ScoreBand::from_score(score);

        if keyword_matches.len() < 2 {
            notes
                .improvements
                .push("Use more technical terminology relevant to the question".into());
        }
        if clarity < 6.0 {
            notes
                .improvements
                .push("Work on structuring your answer more clearly".into());
        }
        if completeness < 6.0 {
            notes
                .improvements
                .push("Provide a more complete answer covering all aspects".into());
        }

        tracing::debug!(
            question,
            score,
            accuracy,
            concept,
            clarity,
            completeness,
            "scored answer"
        );

        ScoreReport {
            score,
            max_score: MAX_SCORE,
            feedback: vec![band.message().to_string()],
            strengths: notes.strengths,
            improvements: notes.improvements,
            keyword_matches,
            completeness,
            accuracy,
            clarity,
        }
    }

    fn keyword_coverage(
        &self,
        user: &str,
        reference: &str,
        notes: &mut Notes,
    ) -> (f64, Vec<String>) {
        let mut total = 0u32;
        let mut matched = 0u32;
        let mut matches = Vec::new();

        for (keyword, weight) in self.profile.keywords.iter() {
            if !reference.contains(keyword) {
                continue;
            }
            total += u32::from(weight);
            if user.contains(keyword) {
                matched += u32::from(weight);
                matches.push(keyword.to_string());
            }
        }

        let score = if total == 0 {
            NEUTRAL
        } else {
            (f64::from(matched) / f64::from(total) * 10.0).min(10.0)
        };

        if !matches.is_empty() {
            let listed: Vec<&str> = matches.iter().take(3).map(String::as_str).collect();
            notes
                .strengths
                .push(format!("Good use of key terms: {}", listed.join(", ")));
        }

        (score, matches)
    }

    fn concept_coverage(&self, user: &str, notes: &mut Notes) -> f64 {
        let mut score = NEUTRAL;
        let mut fired = Vec::new();

        for detector in &self.profile.detectors {
            if detector.is_match(user) {
                score += f64::from(detector.weight());
                fired.push(detector.name());
            }
        }

        if !fired.is_empty() {
            let listed: Vec<&str> = fired.iter().take(2).copied().collect();
            notes.strengths.push(format!(
                "Demonstrates understanding of: {}",
                listed.join(", ")
            ));
        }

        score.min(10.0)
    }

    fn clarity(&self, raw: &str, user: &str, notes: &mut Notes) -> f64 {
        let mut score = NEUTRAL;

        let sentences: Vec<&str> = raw
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if !sentences.is_empty() {
            let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
            let average = words as f64 / sentences.len() as f64;
            if (10.0..=20.0).contains(&average) {
                score += 2.0;
                notes
                    .strengths
                    .push("Clear structure with well-sized sentences".into());
            } else if average < 5.0 {
                score -= 1.0;
                notes
                    .improvements
                    .push("Add more detail to your sentences".into());
            } else if average > 30.0 {
                score -= 1.0;
                notes
                    .improvements
                    .push("Break down long sentences for clarity".into());
            }
        }

        let words: Vec<&str> = user.split_whitespace().collect();
        let fillers: usize = self
            .profile
            .filler_words
            .iter()
            .map(|filler| count_phrase(&words, filler))
            .sum();
        if fillers > 3 {
            score -= 1.0;
            notes
                .improvements
                .push("Reduce filler words such as \"um\", \"like\" and \"basically\"".into());
        }

        let terms = self
            .profile
            .technical_terms
            .iter()
            .filter(|term| !term.is_empty() && user.contains(term.as_str()))
            .count();
        if terms > 2 {
            score += 1.0;
            notes
                .strengths
                .push("Good use of technical terminology".into());
        }

        score.clamp(0.0, 10.0)
    }

    fn completeness(&self, user: &str, reference: &str, notes: &mut Notes) -> f64 {
        let mut score = NEUTRAL;

        let user_words: Vec<&str> = user.split_whitespace().collect();
        let reference_words: Vec<&str> = reference.split_whitespace().collect();

        if !reference_words.is_empty() {
            let ratio = user_words.len() as f64 / reference_words.len() as f64;
            if ratio >= 0.5 {
                score += 3.0;
                notes
                    .strengths
                    .push("Comprehensive answer covering the key points".into());
            } else if ratio >= 0.3 {
                score += 1.0;
            } else {
                score -= 2.0;
                notes
                    .improvements
                    .push("The answer needs more detail".into());
            }
        }

        let has_code = |words: &[&str]| {
            self.profile
                .code_tokens
                .iter()
                .any(|token| count_phrase(words, token) > 0)
        };
        match (has_code(&reference_words), has_code(&user_words)) {
            (true, false) => notes
                .improvements
                .push("Include code examples or syntax where relevant".into()),
            (true, true) => {
                score += 2.0;
                notes
                    .strengths
                    .push("Includes relevant code constructs".into());
            }
            _ => {}
        }

        score.clamp(0.0, 10.0)
    }
}

/// Simplified scoring: 5 plus one point per expected keyword present in the
/// answer, capped at 10.
pub fn quick_score(user_answer: &str, expected_keywords: &[String]) -> u8 {
    let user = normalize(user_answer);
    let found = expected_keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty() && user.contains(k.as_str()))
        .count();
    (5 + found).min(usize::from(MAX_SCORE)) as u8
}

/// Lower-case, drop punctuation, and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count whole-word occurrences of a (possibly multi-word) phrase.
fn count_phrase(words: &[&str], phrase: &str) -> usize {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return 0;
    }
    words
        .windows(needle.len())
        .filter(|window| *window == needle.as_slice())
        .count()
}
