//! # Engine Configuration
//!
//! Tunables for scoring noise, causal linking and retention. Defaults
//! reproduce the fixed behavior described in [`primitives`](crate::primitives);
//! hosts may override them from a config file.

use crate::primitives::{
    MAX_CONNECTIONS, MAX_PREDECESSORS, PREDECESSOR_WINDOW, RECENT_WINDOW_MS,
};
use crate::{NodeKind, SignalError};
use serde::{Deserialize, Serialize};

/// Inclusive range a synaptic base score is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the range (the noise amplitude).
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.max - self.min
    }

    fn validate(&self, label: &str) -> Result<(), SignalError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.min) || !in_unit(self.max) || self.min > self.max {
            return Err(SignalError::InvalidConfig(format!(
                "{label} range [{}, {}] must satisfy 0 <= min <= max <= 1",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-kind synaptic base ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseRanges {
    pub success: ScoreRange,
    pub insight: ScoreRange,
    pub failure: ScoreRange,
    pub delusion: ScoreRange,
}

impl Default for BaseRanges {
    fn default() -> Self {
        Self {
            success: ScoreRange::new(0.80, 0.95),
            insight: ScoreRange::new(0.70, 0.90),
            failure: ScoreRange::new(0.30, 0.60),
            delusion: ScoreRange::new(0.10, 0.30),
        }
    }
}

impl BaseRanges {
    #[must_use]
    pub fn for_kind(&self, kind: NodeKind) -> ScoreRange {
        match kind {
            NodeKind::Success => self.success,
            NodeKind::Insight => self.insight,
            NodeKind::Failure => self.failure,
            NodeKind::Delusion => self.delusion,
        }
    }
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_ranges: BaseRanges,
    /// Latest nodes inspected for predecessors.
    pub predecessor_window: usize,
    pub max_predecessors: usize,
    /// Width of the "recent" window in milliseconds.
    pub recent_window_ms: i64,
    pub max_connections: usize,
    /// Keep at most this many nodes; `None` keeps everything.
    pub max_nodes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_ranges: BaseRanges::default(),
            predecessor_window: PREDECESSOR_WINDOW,
            max_predecessors: MAX_PREDECESSORS,
            recent_window_ms: RECENT_WINDOW_MS,
            max_connections: MAX_CONNECTIONS,
            max_nodes: None,
        }
    }
}

impl EngineConfig {
    /// Check ranges and limits.
    pub fn validate(&self) -> Result<(), SignalError> {
        for kind in NodeKind::ALL {
            self.base_ranges.for_kind(kind).validate(kind.as_str())?;
        }
        if self.recent_window_ms <= 0 {
            return Err(SignalError::InvalidConfig(
                "recent_window_ms must be positive".to_string(),
            ));
        }
        if self.max_nodes == Some(0) {
            return Err(SignalError::InvalidConfig(
                "max_nodes must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}
