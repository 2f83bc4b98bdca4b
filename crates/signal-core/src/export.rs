//! # Snapshot Export
//!
//! A point-in-time view of an engine (state + summary metrics + patterns)
//! for consumers that poll, plus integrity checksums over a state.
//!
//! The checksum is an order-independent XOR/rotate fold: two states holding
//! the same nodes, edges and metrics produce the same value regardless of
//! how they were built. With the `crypto-hash` feature a BLAKE3 digest of the
//! binary persistence form is also available.

use crate::patterns::EmergentPatterns;
use crate::{CognitiveState, EmergentPattern};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary metrics carried in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Same value as the state's synaptic efficiency.
    pub average_score: f64,
    pub processing_time_micros: u64,
    pub patterns: Vec<EmergentPattern>,
}

/// Everything a dashboard needs in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveSnapshot {
    pub timestamp: DateTime<Utc>,
    pub state: CognitiveState,
    pub metrics: SnapshotMetrics,
    /// [`snapshot_checksum`] of `state`.
    pub checksum: u64,
}

impl CognitiveSnapshot {
    /// Capture a snapshot. The state is copied.
    #[must_use]
    pub fn capture(state: &CognitiveState, patterns: EmergentPatterns, at: DateTime<Utc>) -> Self {
        let metrics = SnapshotMetrics {
            total_nodes: state.nodes.len(),
            total_edges: state.edge_count(),
            average_score: state.synaptic_efficiency,
            processing_time_micros: state.total_processing_micros,
            patterns: patterns.into_vec(),
        };
        Self {
            timestamp: at,
            checksum: snapshot_checksum(state),
            state: state.clone(),
            metrics,
        }
    }
}

/// Odd multiplier (64-bit golden ratio) for edge terms.
const EDGE_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic checksum over node identities, scores, edges and metrics.
///
/// Not collision resistant; use [`state_crypto_hash`] where that matters.
#[must_use]
pub fn snapshot_checksum(state: &CognitiveState) -> u64 {
    let fold = |id: u128| (id as u64) ^ ((id >> 64) as u64).rotate_left(32);
    let mut hash: u64 = 0;

    for node in &state.nodes {
        let id = fold(node.id.as_u128());
        hash ^= id.rotate_left(13);
        hash ^= (node.kind as u64).rotate_left(3);
        hash ^= node.synaptic_score.to_bits().rotate_left(7);
        hash ^= node.complexity.to_bits().rotate_left(11);
        hash ^= node.impact_score.to_bits().rotate_left(19);
        hash ^= node.confidence.to_bits().rotate_left(23);
        for (position, pred) in node.caused_by.iter().enumerate() {
            // Multiplying binds each edge to its owner, so edges can't cancel
            // in the fold; the rotation keeps predecessor rank.
            let edge = (fold(pred.as_u128()).rotate_left(17) ^ id).wrapping_mul(EDGE_MIX);
            hash ^= edge.rotate_left(29 + position as u32);
        }
    }

    hash ^= state.synaptic_efficiency.to_bits().rotate_left(5);
    hash ^= state.temporal_alignment.to_bits().rotate_left(37);
    hash
}

/// BLAKE3 hex digest of the binary persistence form of `state`.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
pub fn state_crypto_hash(state: &CognitiveState) -> Result<String, crate::SignalError> {
    let bytes = crate::formats::state_to_bytes(state)?;
    Ok(compute_blake3_hash(&bytes))
}

/// BLAKE3 hex digest of raw bytes.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn compute_blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
