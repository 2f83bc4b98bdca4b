//! # Ports
//!
//! Collaborators the engine needs from its environment: wall-clock time,
//! identifier generation and a source of randomness for noisy
//! self-assessment. Each is a trait so tests can pin them down.
//!
//! All ports are `Send + Sync` so an engine can live behind a lock in a
//! multi-threaded host.

use crate::NodeId;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use uuid::Uuid;

// =============================================================================
// CLOCK
// =============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Start at the given instant.
    #[must_use]
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(at.timestamp_millis())),
        }
    }

    /// Move forward by `millis` milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

// =============================================================================
// ID GENERATION
// =============================================================================

/// Source of unique node identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> NodeId;
}

/// Random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> NodeId {
        NodeId(Uuid::new_v4())
    }
}

/// Deterministic ids 1, 2, 3, ... encoded as UUIDs.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue after an existing highest id.
    #[must_use]
    pub fn starting_after(last: u64) -> Self {
        Self {
            next: AtomicU64::new(last),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NodeId {
        let n = self.next.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        NodeId(Uuid::from_u128(u128::from(n)))
    }
}

// =============================================================================
// RANDOMNESS
// =============================================================================

/// Uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn unit(&mut self) -> f64;

    /// Uniform sample in `[low, high]`.
    fn in_range(&mut self, low: f64, high: f64) -> f64 {
        low + self.unit() * (high - low)
    }
}

/// OS-seeded standard generator.
#[derive(Debug)]
pub struct EntropyRandom(StdRng);

impl EntropyRandom {
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

/// Reproducible generator for tests and replays.
#[derive(Debug)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

/// Always returns the same sample (clamped into `[0, 1]`).
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn unit(&mut self) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
