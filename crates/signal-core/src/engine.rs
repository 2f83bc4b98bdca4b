//! # Cognitive Engine
//!
//! Owns the [`CognitiveState`] of one user and the collaborators it needs
//! (clock, id generator, randomness). Every public operation is synchronous
//! and runs to completion; hosts that share an engine between threads wrap
//! it in a lock.
//!
//! Insertion pipeline:
//! 1. score the node against the existing log
//! 2. find up to `max_predecessors` causes among the latest nodes
//! 3. mirror the edges onto the predecessors
//! 4. append, then apply retention
//! 5. derive world-model entries
//! 6. recompute the rolling metrics

use crate::causal::{find_predecessors, mirror_edges, prune_references};
use crate::config::EngineConfig;
use crate::export::CognitiveSnapshot;
use crate::insight::{self, WorldModelEntry};
use crate::metrics::{self, RollingMetrics};
use crate::patterns::EmergentPatterns;
use crate::ports::{Clock, EntropyRandom, IdGenerator, RandomSource, SystemClock, UuidGenerator};
use crate::primitives::{MAX_TEXT_LENGTH, MAX_USER_ID_LENGTH};
use crate::scoring::score_node;
use crate::{CausalNode, CognitiveState, NodeId, NodeKind, SignalError};
use std::time::Instant;
use uuid::Uuid;

/// What one insertion changed.
///
/// Storage backends use this to persist only the affected records.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    /// The new node, as appended.
    pub node: CausalNode,
    /// Predecessors whose `caused_nodes` gained the new node.
    pub touched: Vec<NodeId>,
    /// Nodes dropped by retention, oldest first.
    pub evicted: Vec<NodeId>,
    /// Surviving nodes whose edges or connections lost an evicted node.
    pub pruned: Vec<NodeId>,
}

/// The cognitive state engine.
pub struct CognitiveEngine {
    state: CognitiveState,
    config: EngineConfig,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    random: Box<dyn RandomSource>,
}

impl std::fmt::Debug for CognitiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitiveEngine")
            .field("user_id", &self.state.user_id)
            .field("node_count", &self.state.nodes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CognitiveEngine {
    /// Engine for `user_id` with the system clock, random ids and an
    /// OS-seeded random source.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        let clock = SystemClock;
        let state = CognitiveState::new(Uuid::new_v4(), user_id, clock.now());
        Self {
            state,
            config: EngineConfig::default(),
            clock: Box::new(clock),
            ids: Box::new(UuidGenerator),
            random: Box::new(EntropyRandom::new()),
        }
    }

    /// Start configuring an engine.
    #[must_use]
    pub fn builder(user_id: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(user_id)
    }

    /// Resume from a previously persisted state with default ports.
    ///
    /// The state is checked with [`CognitiveState::validate`] first.
    pub fn from_state(state: CognitiveState, config: EngineConfig) -> Result<Self, SignalError> {
        EngineBuilder::new(state.user_id.clone())
            .config(config)
            .resume(state)
            .build()
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Record a decision/outcome pair and return the new node.
    ///
    /// Text is not validated here; see [`try_add_node`](Self::try_add_node).
    pub fn add_node(&mut self, decision: &str, outcome: &str, kind: NodeKind) -> CausalNode {
        self.insert(decision, outcome, kind).node
    }

    /// Like [`add_node`](Self::add_node), rejecting empty or oversized text.
    pub fn try_add_node(
        &mut self,
        decision: &str,
        outcome: &str,
        kind: NodeKind,
    ) -> Result<CausalNode, SignalError> {
        self.try_insert(decision, outcome, kind).map(|i| i.node)
    }

    /// Validating form of [`insert`](Self::insert).
    pub fn try_insert(
        &mut self,
        decision: &str,
        outcome: &str,
        kind: NodeKind,
    ) -> Result<Insertion, SignalError> {
        validate_text("decision", decision)?;
        validate_text("outcome", outcome)?;
        Ok(self.insert(decision, outcome, kind))
    }

    /// Insert a node and report every record the insertion changed.
    pub fn insert(&mut self, decision: &str, outcome: &str, kind: NodeKind) -> Insertion {
        let started = Instant::now();
        let now = self.clock.now();

        let scores = score_node(
            decision,
            outcome,
            kind,
            &self.state.nodes,
            &self.config.base_ranges,
            self.random.as_mut(),
        );
        let predecessors = find_predecessors(decision, &self.state.nodes, now, &self.config);

        let id = self.ids.next_id();
        let node = CausalNode {
            id,
            decision: decision.to_string(),
            outcome: outcome.to_string(),
            timestamp: now,
            kind,
            synaptic_score: scores.synaptic,
            complexity: scores.complexity,
            impact_score: scores.impact,
            confidence: scores.confidence,
            caused_by: predecessors
                .iter()
                .map(|m| m.id)
                .filter(|pred| *pred != id)
                .collect(),
            caused_nodes: Vec::new(),
        };

        let touched = mirror_edges(&mut self.state.nodes, &predecessors, id);
        let entry = WorldModelEntry::derive(&node, &self.state.nodes, self.config.max_connections);
        self.state.nodes.push(node.clone());
        self.state.world_model.insert(id, entry);
        self.refresh_world_model(&touched);

        let (evicted, pruned) = self.apply_retention();

        self.recompute_metrics();
        self.state.last_updated = now;

        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.state.total_processing_micros =
            self.state.total_processing_micros.saturating_add(elapsed);

        tracing::debug!(
            node = %id,
            kind = %kind,
            synaptic = scores.synaptic,
            predecessors = node.caused_by.len(),
            evicted = evicted.len(),
            "node added"
        );

        let node = self.state.node(id).cloned().unwrap_or(node);
        Insertion {
            node,
            touched,
            evicted,
            pruned,
        }
    }

    fn refresh_world_model(&mut self, ids: &[NodeId]) {
        for id in ids {
            if let (Some(node), Some(entry)) = (
                self.state.nodes.iter().find(|n| n.id == *id),
                self.state.world_model.get_mut(id),
            ) {
                entry.refresh(node);
            }
        }
    }

    /// Drop the oldest nodes beyond `max_nodes`.
    ///
    /// Returns the evicted ids and the surviving nodes that referenced them.
    fn apply_retention(&mut self) -> (Vec<NodeId>, Vec<NodeId>) {
        let Some(limit) = self.config.max_nodes else {
            return (Vec::new(), Vec::new());
        };
        let excess = self.state.nodes.len().saturating_sub(limit);
        if excess == 0 {
            return (Vec::new(), Vec::new());
        }

        let evicted: Vec<NodeId> = self.state.nodes.drain(..excess).map(|n| n.id).collect();
        let world_model = &self.state.world_model;
        let pruned: Vec<NodeId> = self
            .state
            .nodes
            .iter()
            .filter(|n| {
                n.caused_by.iter().chain(&n.caused_nodes).any(|id| evicted.contains(id))
                    || world_model
                        .get(&n.id)
                        .is_some_and(|e| e.connections.iter().any(|c| evicted.contains(c)))
            })
            .map(|n| n.id)
            .collect();

        prune_references(&mut self.state.nodes, &evicted);
        for id in &evicted {
            self.state.world_model.remove(id);
        }
        for entry in self.state.world_model.values_mut() {
            entry.connections.retain(|c| !evicted.contains(c));
        }
        (evicted, pruned)
    }

    // =========================================================================
    // METRICS & QUERIES
    // =========================================================================

    /// Recompute synaptic efficiency and temporal alignment at the current time.
    pub fn recompute_metrics(&mut self) -> RollingMetrics {
        let metrics = metrics::recompute(
            &self.state.nodes,
            self.clock.now(),
            self.config.recent_window_ms,
            self.state.temporal_alignment,
        );
        self.state.synaptic_efficiency = metrics.synaptic_efficiency;
        self.state.temporal_alignment = metrics.temporal_alignment;
        metrics
    }

    /// Current emergent patterns, ranked. Never mutates the engine.
    #[must_use]
    pub fn emergent_patterns(&self) -> EmergentPatterns {
        EmergentPatterns::mine(&self.state.nodes)
    }

    /// Independent deep copy of the state.
    #[must_use]
    pub fn cognitive_state(&self) -> CognitiveState {
        self.state.clone()
    }

    /// Borrow the state without copying.
    #[must_use]
    pub fn state(&self) -> &CognitiveState {
        &self.state
    }

    /// State, metrics and patterns at the current time.
    #[must_use]
    pub fn snapshot(&self) -> CognitiveSnapshot {
        CognitiveSnapshot::capture(&self.state, self.emergent_patterns(), self.clock.now())
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CausalNode> {
        self.state.node(id)
    }

    /// All nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[CausalNode] {
        &self.state.nodes
    }

    #[must_use]
    pub fn world_model_entry(&self, id: NodeId) -> Option<&WorldModelEntry> {
        self.state.world_model.get(&id)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Synaptic score of `id` corrected by the user's optimism bias.
    pub fn bias_adjusted_score(&self, id: NodeId) -> Result<f64, SignalError> {
        let node = self.node(id).ok_or(SignalError::NodeNotFound(id))?;
        Ok(insight::bias_adjusted_score(node, &self.state.bias_profile))
    }

    /// Relevance of `id` decayed by its age.
    pub fn temporal_decay(&self, id: NodeId) -> Result<f64, SignalError> {
        let node = self.node(id).ok_or(SignalError::NodeNotFound(id))?;
        Ok(insight::temporal_decay(node, self.clock.now()))
    }
}

fn validate_text(field: &str, text: &str) -> Result<(), SignalError> {
    if text.trim().is_empty() {
        return Err(SignalError::InvalidInput(format!("{field} must not be empty")));
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(SignalError::InvalidInput(format!(
            "{field} is {} bytes, limit is {MAX_TEXT_LENGTH}",
            text.len()
        )));
    }
    Ok(())
}

// =============================================================================
// BUILDER
// =============================================================================

/// Configures a [`CognitiveEngine`].
pub struct EngineBuilder {
    user_id: String,
    config: EngineConfig,
    clock: Option<Box<dyn Clock>>,
    ids: Option<Box<dyn IdGenerator>>,
    random: Option<Box<dyn RandomSource>>,
    state_id: Option<Uuid>,
    state: Option<CognitiveState>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            config: EngineConfig::default(),
            clock: None,
            ids: None,
            random: None,
            state_id: None,
            state: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    #[must_use]
    pub fn ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    #[must_use]
    pub fn random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Some(Box::new(random));
        self
    }

    /// Fix the state identifier (random otherwise).
    #[must_use]
    pub fn state_id(mut self, id: Uuid) -> Self {
        self.state_id = Some(id);
        self
    }

    /// Continue from an existing state instead of starting empty.
    ///
    /// [`build`](Self::build) rejects a state that fails
    /// [`CognitiveState::validate`].
    #[must_use]
    pub fn resume(mut self, state: CognitiveState) -> Self {
        self.state = Some(state);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<CognitiveEngine, SignalError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let state = match self.state {
            Some(state) => {
                state.validate()?;
                state
            }
            None => {
                validate_user_id(&self.user_id)?;
                CognitiveState::new(
                    self.state_id.unwrap_or_else(Uuid::new_v4),
                    self.user_id,
                    clock.now(),
                )
            }
        };

        Ok(CognitiveEngine {
            state,
            config: self.config,
            clock,
            ids: self.ids.unwrap_or_else(|| Box::new(UuidGenerator)),
            random: self
                .random
                .unwrap_or_else(|| Box::new(EntropyRandom::new())),
        })
    }
}

fn validate_user_id(user_id: &str) -> Result<(), SignalError> {
    if user_id.trim().is_empty() {
        return Err(SignalError::InvalidInput("user id must not be empty".to_string()));
    }
    if user_id.len() > MAX_USER_ID_LENGTH {
        return Err(SignalError::InvalidInput(format!(
            "user id exceeds {MAX_USER_ID_LENGTH} bytes"
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
