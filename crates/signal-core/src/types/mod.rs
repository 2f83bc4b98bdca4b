//! # Core Type Definitions
//!
//! This module contains all core types for the First Signal cognitive engine:
//! - Node identifiers and categories (`NodeId`, `NodeKind`)
//! - The recorded decision/outcome event (`CausalNode`)
//! - Bias profile (`CognitiveBias`, `BiasProfile`)
//! - Aggregate state (`CognitiveState`) and derived patterns (`EmergentPattern`)
//! - Error types (`SignalError`)
//!
//! ## Score Guarantees
//!
//! Every score carried by a `CausalNode` is a finite `f64` in `[0, 1]`
//! (confidence is additionally bounded to `[0.1, 0.95]`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::insight::WorldModelEntry;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the causal log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// The identifier as a 128-bit integer (used for checksums).
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NodeId {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(NodeId)
            .map_err(|_| SignalError::InvalidInput(format!("not a node id: {s}")))
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// The category a logged decision falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Success,
    Failure,
    Insight,
    Delusion,
}

impl NodeKind {
    /// All kinds, in declaration order.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Success,
        NodeKind::Failure,
        NodeKind::Insight,
        NodeKind::Delusion,
    ];

    /// Lowercase name used in pattern signatures and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Success => "success",
            NodeKind::Failure => "failure",
            NodeKind::Insight => "insight",
            NodeKind::Delusion => "delusion",
        }
    }

    /// Success and insight both count as a positive outcome.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self, NodeKind::Success | NodeKind::Insight)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(NodeKind::Success),
            "failure" => Ok(NodeKind::Failure),
            "insight" => Ok(NodeKind::Insight),
            "delusion" => Ok(NodeKind::Delusion),
            _ => Err(SignalError::InvalidKind(s.to_string())),
        }
    }
}

// =============================================================================
// CAUSAL NODE
// =============================================================================

/// One recorded decision/outcome event.
///
/// Created exactly once by the engine. Only `caused_nodes` changes afterwards,
/// and only when a later node names this one as a predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalNode {
    pub id: NodeId,
    pub decision: String,
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
    pub kind: NodeKind,
    /// Heuristic decision quality.
    pub synaptic_score: f64,
    pub complexity: f64,
    pub impact_score: f64,
    pub confidence: f64,
    /// Predecessors: nodes that caused this one.
    pub caused_by: Vec<NodeId>,
    /// Successors: nodes that name this one in their `caused_by`.
    pub caused_nodes: Vec<NodeId>,
}

impl CausalNode {
    /// Age of the node relative to `now`, in milliseconds (negative if in the future).
    #[must_use]
    pub fn age_millis(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp).num_milliseconds()
    }

    /// Whether the node was inserted less than `window_ms` before `now`.
    #[must_use]
    pub fn is_recent(&self, now: DateTime<Utc>, window_ms: i64) -> bool {
        self.age_millis(now) < window_ms
    }
}

// =============================================================================
// BIAS PROFILE
// =============================================================================

/// Named cognitive biases tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CognitiveBias {
    ConfirmationBias,
    AvailabilityHeuristic,
    Anchoring,
    OptimismBias,
    DunningKruger,
    SurvivorshipBias,
}

impl CognitiveBias {
    /// Default strength assigned at engine construction.
    #[must_use]
    pub fn default_strength(&self) -> f64 {
        match self {
            CognitiveBias::ConfirmationBias => 0.3,
            CognitiveBias::AvailabilityHeuristic => 0.4,
            CognitiveBias::Anchoring => 0.35,
            CognitiveBias::OptimismBias => 0.25,
            CognitiveBias::DunningKruger => 0.2,
            CognitiveBias::SurvivorshipBias => 0.15,
        }
    }

    pub const ALL: [CognitiveBias; 6] = [
        CognitiveBias::ConfirmationBias,
        CognitiveBias::AvailabilityHeuristic,
        CognitiveBias::Anchoring,
        CognitiveBias::OptimismBias,
        CognitiveBias::DunningKruger,
        CognitiveBias::SurvivorshipBias,
    ];
}

/// Bias identifier → strength in `[0, 1]`. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiasProfile(pub BTreeMap<CognitiveBias, f64>);

impl BiasProfile {
    /// Strength of one bias (0 if absent).
    #[must_use]
    pub fn strength(&self, bias: CognitiveBias) -> f64 {
        self.0.get(&bias).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CognitiveBias, f64)> + '_ {
        self.0.iter().map(|(b, s)| (*b, *s))
    }
}

impl Default for BiasProfile {
    fn default() -> Self {
        Self(
            CognitiveBias::ALL
                .iter()
                .map(|b| (*b, b.default_strength()))
                .collect(),
        )
    }
}

// =============================================================================
// COGNITIVE STATE
// =============================================================================

/// Aggregate view over the node log for one user.
///
/// `synaptic_efficiency` and `temporal_alignment` are only ever written by
/// metric recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveState {
    pub id: Uuid,
    pub user_id: String,
    /// Insertion order is chronological order.
    pub nodes: Vec<CausalNode>,
    pub bias_profile: BiasProfile,
    pub synaptic_efficiency: f64,
    pub temporal_alignment: f64,
    pub last_updated: DateTime<Utc>,
    /// Annotations derived per node at insertion time.
    pub world_model: BTreeMap<NodeId, WorldModelEntry>,
    /// Wall time spent inside node insertion, in microseconds.
    pub total_processing_micros: u64,
}

impl CognitiveState {
    /// Fresh state with default bias profile and default metrics.
    #[must_use]
    pub fn new(id: Uuid, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            nodes: Vec::new(),
            bias_profile: BiasProfile::default(),
            synaptic_efficiency: crate::primitives::DEFAULT_SYNAPTIC_EFFICIENCY,
            temporal_alignment: crate::primitives::DEFAULT_TEMPORAL_ALIGNMENT,
            last_updated: now,
            world_model: BTreeMap::new(),
            total_processing_micros: 0,
        }
    }

    /// Find a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CausalNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of causal edges (sum of predecessor list lengths).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.caused_by.len()).sum()
    }

    /// Check a state before an engine adopts it.
    ///
    /// Rejects duplicate node ids, self-edges, repeated or dangling edges,
    /// edges without their mirror, scores or metrics outside `[0, 1]`, and
    /// world-model entries for nodes that are not in the log.
    pub fn validate(&self) -> Result<(), SignalError> {
        let mut index: BTreeMap<NodeId, &CausalNode> = BTreeMap::new();
        for node in &self.nodes {
            if index.insert(node.id, node).is_some() {
                return Err(invalid_state(format!("duplicate node {}", node.id)));
            }
            for (field, score) in [
                ("synaptic_score", node.synaptic_score),
                ("complexity", node.complexity),
                ("impact_score", node.impact_score),
                ("confidence", node.confidence),
            ] {
                if !in_unit_interval(score) {
                    return Err(invalid_state(format!(
                        "node {} has {field} {score} outside [0, 1]",
                        node.id
                    )));
                }
            }
        }

        for node in &self.nodes {
            check_edges(node, &node.caused_by, &index, "caused_by", |other| {
                other.caused_nodes.as_slice()
            })?;
            check_edges(node, &node.caused_nodes, &index, "caused_nodes", |other| {
                other.caused_by.as_slice()
            })?;
        }

        for (field, value) in [
            ("synaptic_efficiency", self.synaptic_efficiency),
            ("temporal_alignment", self.temporal_alignment),
        ] {
            if !in_unit_interval(value) {
                return Err(invalid_state(format!("{field} {value} outside [0, 1]")));
            }
        }

        if let Some(orphan) = self.world_model.keys().find(|id| !index.contains_key(id)) {
            return Err(invalid_state(format!(
                "world-model entry for unknown node {orphan}"
            )));
        }
        Ok(())
    }
}

fn invalid_state(reason: String) -> SignalError {
    SignalError::InvalidInput(format!("invalid state: {reason}"))
}

fn in_unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Every id in `edges` must name another logged node whose `mirror` list
/// names `node` back, and no id may repeat.
fn check_edges(
    node: &CausalNode,
    edges: &[NodeId],
    index: &BTreeMap<NodeId, &CausalNode>,
    field: &str,
    mirror: impl Fn(&CausalNode) -> &[NodeId],
) -> Result<(), SignalError> {
    for (position, other_id) in edges.iter().enumerate() {
        if *other_id == node.id {
            return Err(invalid_state(format!("node {} lists itself in {field}", node.id)));
        }
        if edges[..position].contains(other_id) {
            return Err(invalid_state(format!(
                "node {} lists {other_id} twice in {field}",
                node.id
            )));
        }
        let Some(other) = index.get(other_id) else {
            return Err(invalid_state(format!(
                "node {} lists unknown node {other_id} in {field}",
                node.id
            )));
        };
        if !mirror(other).contains(&node.id) {
            return Err(invalid_state(format!(
                "edge {} -> {other_id} in {field} is not mirrored",
                node.id
            )));
        }
    }
    Ok(())
}

// =============================================================================
// EMERGENT PATTERN
// =============================================================================

/// A recurring `kind:theme:complexity` signature with aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergentPattern {
    pub pattern: String,
    pub frequency: usize,
    /// Mean impact score over the group.
    pub impact: f64,
    /// Mean confidence over the group.
    pub confidence: f64,
}

impl EmergentPattern {
    /// Ranking weight: frequency × mean impact.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.frequency as f64 * self.impact
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in First Signal.
///
/// The engine's scoring operations never fail; errors come from input
/// validation at the boundary, configuration and storage.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Decision or outcome text was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The category is not one of success, failure, insight, delusion.
    #[error("Unknown node kind: {0}")]
    InvalidKind(String),

    /// The engine configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested node is not in the log.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
