//! # Scoring
//!
//! Heuristic scores computed once per node at insertion time.
//!
//! - `synaptic_score`: noisy per-kind base + wording, specificity,
//!   measurability and context bonuses, clamped to `[0, 1]`
//! - `complexity`: word and technical-term density, capped at 1
//! - `impact_score`: outcome sentiment + kind adjustment, clamped to `[0, 1]`
//! - `confidence`: hedging vocabulary + kind adjustment, clamped to `[0.1, 0.95]`
//!
//! The only nondeterminism is the base draw, which comes from the injected
//! [`RandomSource`].

use crate::config::BaseRanges;
use crate::lexicon::{
    count_matches, extract_keywords, has_measurable_outcome, keyword_similarity,
    technical_term_count, word_count,
};
use crate::ports::RandomSource;
use crate::primitives::{
    CERTAINTY_WORDS, COMPLEXITY_DIVISOR, CONFIDENCE_BASE, CONFIDENCE_CEILING, CONFIDENCE_FLOOR,
    CONFIDENCE_STEP, CONTEXT_BONUS_WEIGHT, IMPACT_BASE, IMPACT_STEP, MEASURABILITY_BONUS,
    NEGATIVE_IMPACT_KEYWORDS, NEUTRAL_RELEVANCE, POSITIVE_IMPACT_KEYWORDS, SPECIFICITY_BONUS_CAP,
    SPECIFICITY_BONUS_DIVISOR, UNCERTAINTY_WORDS, WORDING_BONUS_CAP, WORDING_BONUS_DIVISOR,
};
use crate::{CausalNode, NodeKind};

/// The four scores attached to a new node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeScores {
    pub synaptic: f64,
    pub complexity: f64,
    pub impact: f64,
    pub confidence: f64,
}

/// Score a decision/outcome pair against the existing log.
pub fn score_node(
    decision: &str,
    outcome: &str,
    kind: NodeKind,
    history: &[CausalNode],
    ranges: &BaseRanges,
    random: &mut dyn RandomSource,
) -> NodeScores {
    let relevance = contextual_relevance(decision, history);
    NodeScores {
        synaptic: synaptic_score(decision, outcome, kind, relevance, ranges, random),
        complexity: complexity(decision, outcome),
        impact: impact_score(outcome, kind),
        confidence: confidence(decision, outcome, kind),
    }
}

// =============================================================================
// SYNAPTIC SCORE
// =============================================================================

/// Heuristic decision quality in `[0, 1]`.
pub fn synaptic_score(
    decision: &str,
    outcome: &str,
    kind: NodeKind,
    contextual_relevance: f64,
    ranges: &BaseRanges,
    random: &mut dyn RandomSource,
) -> f64 {
    let range = ranges.for_kind(kind);
    let base = random.in_range(range.min, range.max);

    let wording =
        (decision.chars().count() as f64 / WORDING_BONUS_DIVISOR).min(WORDING_BONUS_CAP);
    let specificity =
        (outcome.chars().count() as f64 / SPECIFICITY_BONUS_DIVISOR).min(SPECIFICITY_BONUS_CAP);
    let measurability = if has_measurable_outcome(outcome) {
        MEASURABILITY_BONUS
    } else {
        0.0
    };
    let context = contextual_relevance * CONTEXT_BONUS_WEIGHT;

    (base + wording + specificity + measurability + context).clamp(0.0, 1.0)
}

/// Mean keyword similarity between `decision` and every prior success.
///
/// Returns [`NEUTRAL_RELEVANCE`] when there is no prior success.
#[must_use]
pub fn contextual_relevance(decision: &str, history: &[CausalNode]) -> f64 {
    let successes: Vec<&CausalNode> = history
        .iter()
        .filter(|n| n.kind == NodeKind::Success)
        .collect();
    if successes.is_empty() {
        return NEUTRAL_RELEVANCE;
    }

    let keywords = extract_keywords(decision);
    let total: f64 = successes
        .iter()
        .map(|n| keyword_similarity(&keywords, &extract_keywords(&n.decision)))
        .sum();
    total / successes.len() as f64
}

// =============================================================================
// COMPLEXITY
// =============================================================================

/// `min(1, (words(decision) + words(outcome) + 2 × technical terms) / 50)`.
#[must_use]
pub fn complexity(decision: &str, outcome: &str) -> f64 {
    let words = word_count(decision) + word_count(outcome);
    let technical = technical_term_count(&format!("{decision} {outcome}"));
    ((words + 2 * technical) as f64 / COMPLEXITY_DIVISOR).min(1.0)
}

// =============================================================================
// IMPACT
// =============================================================================

/// Outcome impact in `[0, 1]`.
#[must_use]
pub fn impact_score(outcome: &str, kind: NodeKind) -> f64 {
    let positive = count_matches(outcome, POSITIVE_IMPACT_KEYWORDS) as f64;
    let negative = count_matches(outcome, NEGATIVE_IMPACT_KEYWORDS) as f64;
    let adjustment = match kind {
        NodeKind::Success => 0.2,
        NodeKind::Insight => 0.15,
        NodeKind::Failure => -0.1,
        NodeKind::Delusion => -0.2,
    };
    (IMPACT_BASE + IMPACT_STEP * (positive - negative) + adjustment).clamp(0.0, 1.0)
}

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Self-reported certainty in `[0.1, 0.95]`.
#[must_use]
pub fn confidence(decision: &str, outcome: &str, kind: NodeKind) -> f64 {
    let text = format!("{decision} {outcome}");
    let certain = count_matches(&text, CERTAINTY_WORDS) as f64;
    let hedged = count_matches(&text, UNCERTAINTY_WORDS) as f64;
    let adjustment = match kind {
        NodeKind::Success | NodeKind::Insight => 0.1,
        NodeKind::Failure => 0.0,
        NodeKind::Delusion => -0.2,
    };
    (CONFIDENCE_BASE + CONFIDENCE_STEP * (certain - hedged) + adjustment)
        .clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

// =============================================================================
// TESTS
// =============================================================================
