//! # signal-core
//!
//! The Cognitive State Engine for First Signal.
//!
//! This crate records decision/outcome pairs as nodes of a causal graph,
//! scores each node heuristically, links it to recent related decisions and
//! keeps two rolling metrics (synaptic efficiency, temporal alignment) over
//! the whole log. Recurring decision shapes are mined on demand as emergent
//! patterns.
//!
//! ## Architectural Constraints
//!
//! - Pure, synchronous Rust: no async, no network
//! - Time, identifiers and randomness come from injected [`ports`], so every
//!   operation is reproducible under test
//! - Every public operation is a bounded CPU-only computation; predecessor
//!   search never looks past the latest `predecessor_window` nodes
//! - Persistence (binary format, redb journal) is optional and lives beside
//!   the engine, not inside it

// =============================================================================
// MODULES
// =============================================================================

pub mod causal;
pub mod config;
pub mod engine;
pub mod export;
pub mod formats;
pub mod insight;
pub mod lexicon;
pub mod metrics;
pub mod patterns;
pub mod ports;
pub mod primitives;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    BiasProfile, CausalNode, CognitiveBias, CognitiveState, EmergentPattern, NodeId, NodeKind,
    SignalError,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use config::{BaseRanges, EngineConfig, ScoreRange};
pub use engine::{CognitiveEngine, EngineBuilder, Insertion};
pub use insight::WorldModelEntry;
pub use metrics::RollingMetrics;
pub use patterns::EmergentPatterns;
pub use ports::{
    Clock, EntropyRandom, FixedRandom, IdGenerator, ManualClock, RandomSource, SeededRandom,
    SequentialIds, SystemClock, UuidGenerator,
};
pub use session::{Session, StorageBackend};
pub use storage::RedbJournal;

// =============================================================================
// RE-EXPORTS: Export & Formats
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use export::{compute_blake3_hash, state_crypto_hash};
pub use export::{CognitiveSnapshot, SnapshotMetrics, snapshot_checksum};
pub use formats::{PersistenceHeader, state_from_bytes, state_to_bytes};
