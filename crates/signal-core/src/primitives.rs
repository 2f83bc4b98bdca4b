//! # Innate Primitives
//!
//! Hardcoded constants and lexicons for the First Signal engine.
//!
//! The engine starts with zero nodes but fixed logic. These values are
//! compiled into the binary; the tunable subset is mirrored by
//! [`EngineConfig`](crate::config::EngineConfig) defaults.

// =============================================================================
// METRIC DEFAULTS
// =============================================================================

/// Synaptic efficiency reported for an empty log.
pub const DEFAULT_SYNAPTIC_EFFICIENCY: f64 = 0.5;

/// Temporal alignment before any recent node has been seen.
pub const DEFAULT_TEMPORAL_ALIGNMENT: f64 = 0.65;

/// Weight of the all-time mean in synaptic efficiency.
pub const HISTORICAL_WEIGHT: f64 = 0.7;

/// Weight of the recent-window mean in synaptic efficiency.
pub const RECENT_WEIGHT: f64 = 0.3;

/// Stand-in for the recent mean when no node falls in the window.
pub const NEUTRAL_RECENT_SCORE: f64 = 0.5;

/// Temporal alignment = min(ceiling, base + rate × success_rate + learning bonus).
pub const ALIGNMENT_BASE: f64 = 0.4;
pub const ALIGNMENT_SUCCESS_WEIGHT: f64 = 0.5;
pub const ALIGNMENT_LEARNING_BONUS: f64 = 0.1;
pub const ALIGNMENT_CEILING: f64 = 0.95;

// =============================================================================
// WINDOWS & LIMITS
// =============================================================================

/// "Recent" means inserted less than one hour ago.
pub const RECENT_WINDOW_MS: i64 = 3_600_000;

/// How many of the latest nodes are inspected for causal predecessors.
pub const PREDECESSOR_WINDOW: usize = 10;

/// Maximum predecessors recorded per node.
pub const MAX_PREDECESSORS: usize = 3;

/// Maximum keywords kept per text.
pub const MAX_KEYWORDS: usize = 10;

/// Keywords must be longer than this many characters.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Maximum world-model connections recorded per node.
pub const MAX_CONNECTIONS: usize = 5;

/// Half-life-like horizon of temporal decay, in hours (one week).
pub const DECAY_HORIZON_HOURS: f64 = 168.0;

// =============================================================================
// SCORING CONSTANTS
// =============================================================================

pub const WORDING_BONUS_CAP: f64 = 0.1;
pub const WORDING_BONUS_DIVISOR: f64 = 1000.0;
pub const SPECIFICITY_BONUS_CAP: f64 = 0.1;
pub const SPECIFICITY_BONUS_DIVISOR: f64 = 500.0;
pub const MEASURABILITY_BONUS: f64 = 0.05;
pub const CONTEXT_BONUS_WEIGHT: f64 = 0.1;

/// Contextual relevance used when the log holds no success yet.
pub const NEUTRAL_RELEVANCE: f64 = 0.5;

/// Complexity = min(1, (words + 2 × technical terms) / divisor).
pub const COMPLEXITY_DIVISOR: f64 = 50.0;

/// Nodes above this complexity fall in the "complex" pattern bucket.
pub const COMPLEX_THRESHOLD: f64 = 0.6;

pub const IMPACT_BASE: f64 = 0.5;
pub const IMPACT_STEP: f64 = 0.1;

pub const CONFIDENCE_BASE: f64 = 0.7;
pub const CONFIDENCE_STEP: f64 = 0.05;
pub const CONFIDENCE_FLOOR: f64 = 0.1;
pub const CONFIDENCE_CEILING: f64 = 0.95;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for decision or outcome text (64KB).
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum length for a user identifier.
pub const MAX_USER_ID_LENGTH: usize = 256;

// =============================================================================
// PERSISTENCE FORMAT
// =============================================================================

/// Magic bytes for the binary state format header.
pub const MAGIC_BYTES: &[u8; 4] = b"FSIG";

/// Current serialization format version.
pub const FORMAT_VERSION: u8 = 2;

// =============================================================================
// LEXICONS
// =============================================================================

/// Dropped during keyword extraction. Only "with" is long enough to matter
/// once short tokens are gone; words like "from" or "that" stay keywords.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Domain vocabulary counted towards complexity.
pub const TECHNICAL_TERMS: &[&str] = &[
    "algorithm",
    "optimization",
    "implementation",
    "integration",
    "architecture",
    "framework",
    "methodology",
    "protocol",
    "interface",
    "system",
    "process",
    "analysis",
    "evaluation",
    "performance",
    "efficiency",
    "scalability",
];

/// Outcome markers that make a result measurable.
pub const MEASURABILITY_MARKERS: &[&str] = &[
    "%",
    "increased by",
    "decreased by",
    "improved by",
    "reduced by",
    "faster",
    "slower",
    "more",
    "less",
];

pub const POSITIVE_IMPACT_KEYWORDS: &[&str] = &[
    "increased",
    "improved",
    "enhanced",
    "optimized",
    "accelerated",
    "solved",
];

pub const NEGATIVE_IMPACT_KEYWORDS: &[&str] =
    &["decreased", "failed", "slowed", "blocked", "error"];

pub const CERTAINTY_WORDS: &[&str] = &[
    "definitely",
    "certainly",
    "clearly",
    "obviously",
    "precisely",
];

pub const UNCERTAINTY_WORDS: &[&str] = &[
    "might",
    "possibly",
    "perhaps",
    "maybe",
    "approximately",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_weights_sum_to_one() {
        assert!((HISTORICAL_WEIGHT + RECENT_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"FSIG");
    }

    #[test]
    fn lexicons_are_lowercase() {
        for list in [
            STOP_WORDS,
            TECHNICAL_TERMS,
            MEASURABILITY_MARKERS,
            POSITIVE_IMPACT_KEYWORDS,
            NEGATIVE_IMPACT_KEYWORDS,
            CERTAINTY_WORDS,
            UNCERTAINTY_WORDS,
        ] {
            for word in list {
                assert_eq!(*word, word.to_lowercase());
            }
        }
    }
}
