//! # Lexicon
//!
//! Text heuristics shared by scoring, causal linking and pattern mining.
//!
//! All matching is case-insensitive. Phrase lexicons use substring matching
//! (so "error" also hits "errors"); keywords are whole whitespace tokens.

use crate::primitives::{
    MAX_KEYWORDS, MEASURABILITY_MARKERS, MIN_KEYWORD_LEN, STOP_WORDS, TECHNICAL_TERMS,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// KEYWORDS
// =============================================================================

/// Extract at most [`MAX_KEYWORDS`] keywords from `text`.
///
/// Tokens are split on whitespace and lowercased; tokens of
/// [`MIN_KEYWORD_LEN`] characters or fewer and stop words are dropped.
/// Order of appearance is preserved and duplicates are kept.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > MIN_KEYWORD_LEN && !STOP_WORDS.contains(&w.as_str()))
        .take(MAX_KEYWORDS)
        .collect()
}

/// Number of keywords in `subject` that also occur in `other`.
#[must_use]
pub fn keyword_overlap(subject: &[String], other: &[String]) -> usize {
    subject.iter().filter(|w| other.contains(w)).count()
}

/// Overlap normalized by the longer keyword list; 0 when both are empty.
#[must_use]
pub fn keyword_similarity(subject: &[String], other: &[String]) -> f64 {
    let longest = subject.len().max(other.len());
    if longest == 0 {
        return 0.0;
    }
    keyword_overlap(subject, other) as f64 / longest as f64
}

// =============================================================================
// PHRASE LEXICONS
// =============================================================================

/// Count how many entries of `lexicon` occur in `text` (each entry at most once).
#[must_use]
pub fn count_matches(text: &str, lexicon: &[&str]) -> usize {
    let lower = text.to_lowercase();
    lexicon.iter().filter(|term| lower.contains(*term)).count()
}

/// Number of whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of distinct technical terms mentioned.
#[must_use]
pub fn technical_term_count(text: &str) -> usize {
    count_matches(text, TECHNICAL_TERMS)
}

/// Whether an outcome states something measurable.
#[must_use]
pub fn has_measurable_outcome(outcome: &str) -> bool {
    count_matches(outcome, MEASURABILITY_MARKERS) > 0
}

// =============================================================================
// DECISION THEMES
// =============================================================================

/// Theme of a decision, by the first matching keyword family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionTheme {
    Initiation,
    Optimization,
    ProblemSolving,
    Development,
    Experimentation,
    Analysis,
    General,
}

/// Keyword families in priority order.
const THEME_FAMILIES: &[(DecisionTheme, &[&str])] = &[
    (DecisionTheme::Initiation, &["launch", "start", "begin"]),
    (DecisionTheme::Optimization, &["improve", "optimize", "enhance"]),
    (DecisionTheme::ProblemSolving, &["fix", "solve", "debug"]),
    (DecisionTheme::Development, &["add", "implement", "create"]),
    (DecisionTheme::Experimentation, &["test", "experiment", "try"]),
    (DecisionTheme::Analysis, &["analyze", "research", "study"]),
];

impl DecisionTheme {
    /// Classify a decision text.
    #[must_use]
    pub fn classify(decision: &str) -> Self {
        let lower = decision.to_lowercase();
        THEME_FAMILIES
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map_or(DecisionTheme::General, |(theme, _)| *theme)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTheme::Initiation => "initiation",
            DecisionTheme::Optimization => "optimization",
            DecisionTheme::ProblemSolving => "problem-solving",
            DecisionTheme::Development => "development",
            DecisionTheme::Experimentation => "experimentation",
            DecisionTheme::Analysis => "analysis",
            DecisionTheme::General => "general",
        }
    }
}

impl fmt::Display for DecisionTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
