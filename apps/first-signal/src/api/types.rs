//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Nodes, patterns and world-model
//! entries are sent in their engine form.

use serde::{Deserialize, Serialize};
use signal_core::{
    CausalNode, CognitiveEngine, CognitiveState, EmergentPattern, NodeId, NodeKind, SignalError,
    WorldModelEntry, primitives::MAX_TEXT_LENGTH,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Aggregate view of the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub pattern_count: usize,
    pub synaptic_efficiency: f64,
    pub temporal_alignment: f64,
    /// RFC 3339.
    pub last_updated: String,
    pub persistent: bool,
}

impl StatusResponse {
    pub fn from_state(state: &CognitiveState, pattern_count: usize, persistent: bool) -> Self {
        Self {
            user_id: state.user_id.clone(),
            node_count: state.nodes.len(),
            edge_count: state.edge_count(),
            pattern_count,
            synaptic_efficiency: state.synaptic_efficiency,
            temporal_alignment: state.temporal_alignment,
            last_updated: state.last_updated.to_rfc3339(),
            persistent,
        }
    }
}

// =============================================================================
// LOG REQUEST/RESPONSE
// =============================================================================

/// A decision to record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRequest {
    pub decision: String,
    pub outcome: String,
    /// success, failure, insight or delusion (case-insensitive).
    #[serde(alias = "type")]
    pub kind: String,
}

impl LogRequest {
    /// Parse the kind and check text lengths before anything reaches the engine.
    pub fn validate(&self) -> Result<NodeKind, SignalError> {
        for (field, text) in [("decision", &self.decision), ("outcome", &self.outcome)] {
            if text.trim().is_empty() {
                return Err(SignalError::InvalidInput(format!("{} must not be empty", field)));
            }
            if text.len() > MAX_TEXT_LENGTH {
                return Err(SignalError::InvalidInput(format!(
                    "{} length {} exceeds maximum {} bytes",
                    field,
                    text.len(),
                    MAX_TEXT_LENGTH
                )));
            }
        }
        self.kind.parse()
    }
}

/// Result of logging a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResponse {
    pub success: bool,
    pub node: Option<CausalNode>,
    pub error: Option<String>,
}

impl LogResponse {
    pub fn success(node: CausalNode) -> Self {
        Self {
            success: true,
            node: Some(node),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            node: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// NODE RESPONSES
// =============================================================================

/// Filters for `GET /nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodesQuery {
    /// Return at most this many of the most recent matches.
    pub limit: Option<usize>,
    pub kind: Option<String>,
}

/// Node listing, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesResponse {
    /// Matches before `limit` was applied.
    pub total: usize,
    pub nodes: Vec<CausalNode>,
}

impl NodesResponse {
    /// Apply the kind filter, then keep the latest `limit` matches.
    pub fn select(nodes: &[CausalNode], query: &NodesQuery) -> Result<Self, SignalError> {
        let kind = query
            .kind
            .as_deref()
            .map(str::parse::<NodeKind>)
            .transpose()?;
        let matching: Vec<&CausalNode> = nodes
            .iter()
            .filter(|n| kind.is_none_or(|k| n.kind == k))
            .collect();
        let total = matching.len();
        let skip = query.limit.map_or(0, |limit| total.saturating_sub(limit));
        Ok(Self {
            total,
            nodes: matching.into_iter().skip(skip).cloned().collect(),
        })
    }
}

/// One node with its derived views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResponse {
    pub node: CausalNode,
    pub world_model: Option<WorldModelEntry>,
    pub bias_adjusted_score: f64,
    pub temporal_decay: f64,
}

impl NodeResponse {
    pub fn build(engine: &CognitiveEngine, id: NodeId) -> Result<Self, SignalError> {
        let node = engine.node(id).ok_or(SignalError::NodeNotFound(id))?.clone();
        Ok(Self {
            world_model: engine.world_model_entry(id).cloned(),
            bias_adjusted_score: engine.bias_adjusted_score(id)?,
            temporal_decay: engine.temporal_decay(id)?,
            node,
        })
    }
}

// =============================================================================
// PATTERNS RESPONSE
// =============================================================================

/// Emergent patterns, strongest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsResponse {
    pub patterns: Vec<EmergentPattern>,
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    /// Base64 encoded binary state.
    pub data: Option<String>,
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: u64) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// HASH RESPONSE
// =============================================================================

/// BLAKE3 digest of the binary state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub success: bool,
    pub hash: Option<String>,
    pub algorithm: String,
    pub node_count: usize,
    pub error: Option<String>,
}

impl HashResponse {
    pub fn success(hash: String, node_count: usize) -> Self {
        Self {
            success: true,
            hash: Some(hash),
            algorithm: "blake3".to_string(),
            node_count,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            hash: None,
            algorithm: "blake3".to_string(),
            node_count: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of 4xx/5xx responses that carry no other payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
