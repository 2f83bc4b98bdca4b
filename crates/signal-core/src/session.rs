//! # Session Module
//!
//! A [`CognitiveEngine`] paired with where its log lives.
//!
//! ## Storage Backends
//!
//! - `InMemory`: nothing is written; the host may export the state itself
//! - `Persistent`: every insertion is journaled to redb before the call returns

use crate::config::EngineConfig;
use crate::engine::{CognitiveEngine, EngineBuilder};
use crate::export::CognitiveSnapshot;
use crate::storage::RedbJournal;
use crate::{CausalNode, CognitiveState, NodeKind, SignalError};
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug, Default)]
pub enum StorageBackend {
    /// Volatile.
    #[default]
    InMemory,
    /// Disk-backed journal using redb (ACID, persistent).
    Persistent(RedbJournal),
}

/// An engine plus its storage.
///
/// Not `Clone`: a journal handle cannot be shared. Use
/// [`Session::cognitive_state`] to take a copy of the data.
#[derive(Debug)]
pub struct Session {
    engine: CognitiveEngine,
    backend: StorageBackend,
}

impl Session {
    /// In-memory session around an existing engine.
    #[must_use]
    pub fn new(engine: CognitiveEngine) -> Self {
        Self {
            engine,
            backend: StorageBackend::InMemory,
        }
    }

    /// Open (or create) a persistent session at `path` with default ports.
    ///
    /// An existing journal is resumed and `user_id` is ignored.
    pub fn with_redb(
        path: impl AsRef<Path>,
        user_id: &str,
        config: EngineConfig,
    ) -> Result<Self, SignalError> {
        let journal = RedbJournal::open(path)?;
        Self::with_journal(journal, CognitiveEngine::builder(user_id).config(config))
    }

    /// Persistent session over an opened journal.
    ///
    /// The builder supplies ports and config; a stored state takes precedence
    /// over a fresh one.
    pub fn with_journal(
        mut journal: RedbJournal,
        builder: EngineBuilder,
    ) -> Result<Self, SignalError> {
        let engine = match journal.load()? {
            Some(state) => {
                tracing::info!(
                    user = %state.user_id,
                    nodes = state.nodes.len(),
                    "resumed journal"
                );
                builder.resume(state).build()?
            }
            None => {
                let engine = builder.build()?;
                journal.write_all(engine.state())?;
                engine
            }
        };
        Ok(Self {
            engine,
            backend: StorageBackend::Persistent(journal),
        })
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn engine(&self) -> &CognitiveEngine {
        &self.engine
    }

    /// Validate, insert and (for persistent sessions) journal a decision.
    ///
    /// Nothing is inserted when validation fails. A journal failure is
    /// returned after the in-memory insertion has happened; the journal then
    /// rewrites every record on the next successful write.
    pub fn log_decision(
        &mut self,
        decision: &str,
        outcome: &str,
        kind: NodeKind,
    ) -> Result<CausalNode, SignalError> {
        let insertion = self.engine.try_insert(decision, outcome, kind)?;
        if let StorageBackend::Persistent(journal) = &mut self.backend {
            journal.record(self.engine.state(), &insertion)?;
        }
        Ok(insertion.node)
    }

    /// Replace the whole state (e.g. after an import).
    ///
    /// An invalid state is rejected and the current one kept. A journal is
    /// rewritten and compacted.
    pub fn replace_state(&mut self, state: CognitiveState) -> Result<(), SignalError> {
        let config = self.engine.config().clone();
        let engine = CognitiveEngine::from_state(state, config)?;
        if let StorageBackend::Persistent(journal) = &mut self.backend {
            journal.write_all(engine.state())?;
            if journal.compact()? {
                tracing::debug!("journal compacted after import");
            }
        }
        self.engine = engine;
        Ok(())
    }

    #[must_use]
    pub fn cognitive_state(&self) -> CognitiveState {
        self.engine.cognitive_state()
    }

    #[must_use]
    pub fn snapshot(&self) -> CognitiveSnapshot {
        self.engine.snapshot()
    }
}

// =============================================================================
// TESTS
// =============================================================================
