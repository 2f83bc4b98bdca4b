//! # Causal Linking
//!
//! Predecessor discovery and edge mirroring.
//!
//! A new node may name up to `max_predecessors` earlier nodes as causes.
//! Only the latest `predecessor_window` nodes (by insertion order) are
//! inspected, so the cost of an insertion is bounded regardless of log size.
//!
//! Edge invariant: if A lists B in `caused_by`, B lists A in `caused_nodes`.

use crate::config::EngineConfig;
use crate::lexicon::{extract_keywords, keyword_overlap};
use crate::{CausalNode, NodeId};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::ops::Range;

/// A node that qualified as a predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredecessorMatch {
    /// Position of the candidate in the node log.
    pub index: usize,
    pub id: NodeId,
    /// Shared decision keywords.
    pub overlap: usize,
}

/// Indices of the log inspected for predecessors: the latest `window` nodes.
#[must_use]
pub fn candidate_window(len: usize, window: usize) -> Range<usize> {
    len.saturating_sub(window)..len
}

/// Find causal predecessors of a new decision.
///
/// A candidate qualifies with two or more shared keywords, or with one shared
/// keyword when it is younger than the recent window. Matches are ranked by
/// overlap, ties going to the more recent node, and truncated to
/// `max_predecessors`.
#[must_use]
pub fn find_predecessors(
    decision: &str,
    nodes: &[CausalNode],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<PredecessorMatch> {
    let keywords = extract_keywords(decision);
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<PredecessorMatch> = candidate_window(nodes.len(), config.predecessor_window)
        .filter_map(|index| {
            let candidate = &nodes[index];
            let overlap = keyword_overlap(&keywords, &extract_keywords(&candidate.decision));
            let qualifies = overlap >= 2
                || (overlap >= 1 && candidate.is_recent(now, config.recent_window_ms));
            qualifies.then_some(PredecessorMatch {
                index,
                id: candidate.id,
                overlap,
            })
        })
        .collect();

    matches.sort_by_key(|m| (Reverse(m.overlap), Reverse(m.index)));
    matches.truncate(config.max_predecessors);
    matches
}

/// Record `successor` in the `caused_nodes` list of every matched predecessor.
///
/// Returns the ids of predecessors whose list actually changed.
pub fn mirror_edges(
    nodes: &mut [CausalNode],
    predecessors: &[PredecessorMatch],
    successor: NodeId,
) -> Vec<NodeId> {
    let mut touched = Vec::with_capacity(predecessors.len());
    for m in predecessors {
        if let Some(node) = nodes.get_mut(m.index) {
            if node.id == m.id && !node.caused_nodes.contains(&successor) {
                node.caused_nodes.push(successor);
                touched.push(node.id);
            }
        }
    }
    touched
}

/// Drop every reference to `removed` from the remaining nodes' edge lists.
pub fn prune_references(nodes: &mut [CausalNode], removed: &[NodeId]) {
    if removed.is_empty() {
        return;
    }
    for node in nodes {
        node.caused_by.retain(|id| !removed.contains(id));
        node.caused_nodes.retain(|id| !removed.contains(id));
    }
}

/// Check the mirroring invariant over a whole log.
///
/// Returns the first `(node, predecessor)` pair whose back edge is missing,
/// or a self-reference as `(node, node)`.
#[must_use]
pub fn find_unmirrored_edge(nodes: &[CausalNode]) -> Option<(NodeId, NodeId)> {
    for node in nodes {
        for pred_id in &node.caused_by {
            if *pred_id == node.id {
                return Some((node.id, node.id));
            }
            let mirrored = nodes
                .iter()
                .find(|n| n.id == *pred_id)
                .is_some_and(|pred| pred.caused_nodes.contains(&node.id));
            if !mirrored {
                return Some((node.id, *pred_id));
            }
        }
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================
