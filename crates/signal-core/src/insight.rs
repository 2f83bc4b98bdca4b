//! # Insight
//!
//! Per-node world-model annotations, bias correction and temporal decay.
//!
//! Annotations are derived once when a node is inserted and refreshed for
//! predecessors that gain a successor (their opportunity set depends on it).

use crate::lexicon::{extract_keywords, keyword_overlap};
use crate::primitives::DECAY_HORIZON_HOURS;
use crate::{BiasProfile, CausalNode, CognitiveBias, NodeId, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complexity above which a success counts as a complex success.
const COMPLEX_SUCCESS_THRESHOLD: f64 = 0.7;
/// Complexity above which a success teaches something about complex work.
const COMPLEX_LEARNING_THRESHOLD: f64 = 0.6;
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;
const HIGH_IMPACT_THRESHOLD: f64 = 0.7;
/// Successor count above which a decision amplifies.
const AMPLIFICATION_THRESHOLD: usize = 2;
/// Strength of the optimism correction.
const OPTIMISM_CORRECTION: f64 = 0.1;

/// What the engine learned from one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldModelEntry {
    pub learnings: Vec<String>,
    /// Earlier nodes sharing at least one decision keyword.
    pub connections: Vec<NodeId>,
    pub patterns: Vec<String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
}

impl WorldModelEntry {
    /// Derive the entry for `node` against the log it is being added to.
    ///
    /// `others` may contain `node` itself; it is skipped.
    #[must_use]
    pub fn derive(node: &CausalNode, others: &[CausalNode], max_connections: usize) -> Self {
        Self {
            learnings: learnings(node),
            connections: connections(node, others, max_connections),
            patterns: node_patterns(node),
            risk_factors: risk_factors(node),
            opportunities: opportunities(node),
        }
    }

    /// Recompute the parts that depend on the node's successors.
    pub fn refresh(&mut self, node: &CausalNode) {
        self.opportunities = opportunities(node);
    }
}

fn learnings(node: &CausalNode) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();
    match node.kind {
        NodeKind::Success => {
            out.push("Successful pattern identified");
            if node.complexity > COMPLEX_LEARNING_THRESHOLD {
                out.push("Complex implementation succeeded");
            }
        }
        NodeKind::Failure => {
            out.push("Failure mode documented");
            out.push("Adaptation opportunity identified");
        }
        NodeKind::Insight => {
            out.push("New insight gained");
            out.push("Mental model updated");
        }
        NodeKind::Delusion => {
            out.push("False assumption detected");
            out.push("Reality calibration needed");
        }
    }
    out.into_iter().map(String::from).collect()
}

fn connections(node: &CausalNode, others: &[CausalNode], limit: usize) -> Vec<NodeId> {
    let keywords = extract_keywords(&node.decision);
    others
        .iter()
        .filter(|other| other.id != node.id)
        .filter(|other| keyword_overlap(&keywords, &extract_keywords(&other.decision)) > 0)
        .map(|other| other.id)
        .take(limit)
        .collect()
}

fn node_patterns(node: &CausalNode) -> Vec<String> {
    let decision = node.decision.to_lowercase();
    let mut out = Vec::new();
    if decision.contains("implement") {
        out.push("implementation-pattern".to_string());
    }
    if decision.contains("optimize") {
        out.push("optimization-pattern".to_string());
    }
    if node.kind == NodeKind::Success && node.complexity > COMPLEX_SUCCESS_THRESHOLD {
        out.push("complex-success-pattern".to_string());
    }
    out
}

fn risk_factors(node: &CausalNode) -> Vec<String> {
    let mut out = Vec::new();
    if matches!(node.kind, NodeKind::Failure | NodeKind::Delusion) {
        out.push("historical-failure-risk".to_string());
    }
    if node.confidence < LOW_CONFIDENCE_THRESHOLD {
        out.push("low-confidence-risk".to_string());
    }
    if node.caused_by.is_empty() {
        out.push("isolated-decision-risk".to_string());
    }
    out
}

fn opportunities(node: &CausalNode) -> Vec<String> {
    let mut out = Vec::new();
    if node.kind == NodeKind::Success && node.impact_score > HIGH_IMPACT_THRESHOLD {
        out.push("high-impact-replication".to_string());
    }
    if node.kind == NodeKind::Insight {
        out.push("knowledge-application".to_string());
    }
    if node.caused_nodes.len() > AMPLIFICATION_THRESHOLD {
        out.push("decision-amplification".to_string());
    }
    out
}

// =============================================================================
// BIAS & DECAY
// =============================================================================

/// Synaptic score corrected for optimism bias.
///
/// Successes are discounted and failures credited by
/// `optimismBias × 0.1`; result clamped to `[0, 1]`.
#[must_use]
pub fn bias_adjusted_score(node: &CausalNode, profile: &BiasProfile) -> f64 {
    let optimism = profile.strength(CognitiveBias::OptimismBias);
    let factor = match node.kind {
        NodeKind::Success => 1.0 - optimism * OPTIMISM_CORRECTION,
        NodeKind::Failure => 1.0 + optimism * OPTIMISM_CORRECTION,
        NodeKind::Insight | NodeKind::Delusion => 1.0,
    };
    (node.synaptic_score * factor).clamp(0.0, 1.0)
}

/// `exp(-age_hours / 168)`: 1 for a fresh node, ~0.37 after a week.
#[must_use]
pub fn temporal_decay(node: &CausalNode, now: DateTime<Utc>) -> f64 {
    let age_hours = node.age_millis(now) as f64 / 3_600_000.0;
    (-age_hours / DECAY_HORIZON_HOURS).exp()
}

// =============================================================================
// TESTS
// =============================================================================
