//! # Rolling Metrics
//!
//! Synaptic efficiency and temporal alignment, recomputed from the node log
//! after every insertion. Both are pure functions of the node sequence, the
//! current time and (for alignment) the previous value.

use crate::primitives::{
    ALIGNMENT_BASE, ALIGNMENT_CEILING, ALIGNMENT_LEARNING_BONUS, ALIGNMENT_SUCCESS_WEIGHT,
    DEFAULT_SYNAPTIC_EFFICIENCY, HISTORICAL_WEIGHT, NEUTRAL_RECENT_SCORE, RECENT_WEIGHT,
};
use crate::{CausalNode, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two rolling scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    pub synaptic_efficiency: f64,
    pub temporal_alignment: f64,
}

/// Recompute both metrics.
#[must_use]
pub fn recompute(
    nodes: &[CausalNode],
    now: DateTime<Utc>,
    recent_window_ms: i64,
    previous_alignment: f64,
) -> RollingMetrics {
    RollingMetrics {
        synaptic_efficiency: synaptic_efficiency(nodes, now, recent_window_ms),
        temporal_alignment: temporal_alignment(nodes, now, recent_window_ms)
            .unwrap_or(previous_alignment),
    }
}

/// `0.7 × mean(all) + 0.3 × mean(recent)`; 0.5 for an empty log.
#[must_use]
pub fn synaptic_efficiency(nodes: &[CausalNode], now: DateTime<Utc>, recent_window_ms: i64) -> f64 {
    if nodes.is_empty() {
        return DEFAULT_SYNAPTIC_EFFICIENCY;
    }

    let historical = mean(nodes.iter().map(|n| n.synaptic_score)).unwrap_or(DEFAULT_SYNAPTIC_EFFICIENCY);
    let recent = mean(
        nodes
            .iter()
            .filter(|n| n.is_recent(now, recent_window_ms))
            .map(|n| n.synaptic_score),
    )
    .unwrap_or(NEUTRAL_RECENT_SCORE);

    HISTORICAL_WEIGHT * historical + RECENT_WEIGHT * recent
}

/// Alignment over the recent window, or `None` when nothing is recent.
#[must_use]
pub fn temporal_alignment(
    nodes: &[CausalNode],
    now: DateTime<Utc>,
    recent_window_ms: i64,
) -> Option<f64> {
    let recent: Vec<&CausalNode> = nodes
        .iter()
        .filter(|n| n.is_recent(now, recent_window_ms))
        .collect();
    if recent.is_empty() {
        return None;
    }

    let positive = recent.iter().filter(|n| n.kind.is_positive()).count();
    let success_rate = positive as f64 / recent.len() as f64;
    let learning_bonus = if recent.iter().any(|n| n.kind == NodeKind::Failure) {
        ALIGNMENT_LEARNING_BONUS
    } else {
        0.0
    };

    Some((ALIGNMENT_BASE + ALIGNMENT_SUCCESS_WEIGHT * success_rate + learning_bonus).min(ALIGNMENT_CEILING))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

// =============================================================================
// TESTS
// =============================================================================
