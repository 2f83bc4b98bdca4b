//! # redb-backed Node Journal
//!
//! Persists a [`CognitiveState`] in a redb database:
//! - `nodes`: insertion sequence (u64) → postcard `(CausalNode, WorldModelEntry)`
//! - `meta`: `"state"` → postcard aggregate fields (identity, bias profile,
//!   metrics, timestamps, next sequence number)
//!
//! Each insertion is written in one ACID transaction: the new record, the
//! rewritten predecessor records, the deletions and pruned survivors caused
//! by retention, and the aggregate fields. Loading the journal reproduces
//! the state it was written from.

use crate::engine::Insertion;
use crate::insight::WorldModelEntry;
use crate::{BiasProfile, CausalNode, CognitiveState, NodeId, SignalError};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use uuid::Uuid;

/// Insertion sequence → encoded node record.
const NODES: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");

/// Key → encoded metadata.
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const STATE_KEY: &str = "state";

fn io_err(e: impl std::fmt::Display) -> SignalError {
    SignalError::IoError(e.to_string())
}

/// One stored node with its world-model entry.
#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    node: CausalNode,
    entry: Option<WorldModelEntry>,
}

/// Everything in a state except the node log.
#[derive(Debug, Serialize, Deserialize)]
struct StateHeader {
    id: Uuid,
    user_id: String,
    bias_profile: BiasProfile,
    synaptic_efficiency: f64,
    temporal_alignment: f64,
    last_updated: DateTime<Utc>,
    total_processing_micros: u64,
    next_seq: u64,
}

/// Disk-backed journal of one user's node log.
pub struct RedbJournal {
    db: Database,
    /// Node id → sequence key, for rewriting predecessors in place.
    index: BTreeMap<NodeId, u64>,
    next_seq: u64,
    initialized: bool,
    /// Set after a failed write; the stored records may lag behind memory.
    dirty: bool,
}

impl std::fmt::Debug for RedbJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbJournal")
            .field("node_count", &self.index.len())
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl RedbJournal {
    /// Open or create a journal at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SignalError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        {
            let txn = db.begin_write().map_err(io_err)?;
            txn.open_table(NODES).map_err(io_err)?;
            txn.open_table(META).map_err(io_err)?;
            txn.commit().map_err(io_err)?;
        }

        let mut journal = Self {
            db,
            index: BTreeMap::new(),
            next_seq: 0,
            initialized: false,
            dirty: false,
        };

        if let Some(header) = journal.read_header()? {
            journal.next_seq = header.next_seq;
            journal.initialized = true;
        }

        {
            let txn = journal.db.begin_read().map_err(io_err)?;
            let table = txn.open_table(NODES).map_err(io_err)?;
            for entry in table.iter().map_err(io_err)? {
                let (key, value) = entry.map_err(io_err)?;
                let record = decode_record(value.value())?;
                journal.index.insert(record.node.id, key.value());
            }
        }

        Ok(journal)
    }

    /// Whether a state has ever been written.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    fn read_header(&self) -> Result<Option<StateHeader>, SignalError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(META).map_err(io_err)?;
        let Some(raw) = table.get(STATE_KEY).map_err(io_err)? else {
            return Ok(None);
        };
        postcard::from_bytes(raw.value())
            .map(Some)
            .map_err(|e| SignalError::DeserializationError(format!("journal header: {e}")))
    }

    /// Rebuild the stored state, or `None` for a fresh journal.
    pub fn load(&self) -> Result<Option<CognitiveState>, SignalError> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };

        let mut nodes = Vec::with_capacity(self.index.len());
        let mut world_model = BTreeMap::new();
        {
            let txn = self.db.begin_read().map_err(io_err)?;
            let table = txn.open_table(NODES).map_err(io_err)?;
            for entry in table.iter().map_err(io_err)? {
                let (_, value) = entry.map_err(io_err)?;
                let record = decode_record(value.value())?;
                if let Some(wm) = record.entry {
                    world_model.insert(record.node.id, wm);
                }
                nodes.push(record.node);
            }
        }

        Ok(Some(CognitiveState {
            id: header.id,
            user_id: header.user_id,
            nodes,
            bias_profile: header.bias_profile,
            synaptic_efficiency: header.synaptic_efficiency,
            temporal_alignment: header.temporal_alignment,
            last_updated: header.last_updated,
            world_model,
            total_processing_micros: header.total_processing_micros,
        }))
    }

    /// Persist the records changed by one insertion.
    ///
    /// Evicted records are deleted and the survivors they were linked to are
    /// rewritten. After a failed write the journal no longer matches memory,
    /// so the next call rewrites every record.
    pub fn record(
        &mut self,
        state: &CognitiveState,
        insertion: &Insertion,
    ) -> Result<(), SignalError> {
        let result = if self.dirty || !self.initialized {
            self.write_all(state)
        } else {
            self.write_changes(state, insertion)
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, node = %insertion.node.id, "journal write failed");
            self.mark_dirty();
        }
        result
    }

    /// Force the next [`record`](Self::record) to rewrite every record.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn write_changes(
        &mut self,
        state: &CognitiveState,
        insertion: &Insertion,
    ) -> Result<(), SignalError> {
        let mut next_seq = self.next_seq;
        let mut new_keys = Vec::with_capacity(1);
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(NODES).map_err(io_err)?;

            for id in &insertion.evicted {
                if let Some(key) = self.index.get(id) {
                    table.remove(*key).map_err(io_err)?;
                }
            }

            let changed: BTreeSet<NodeId> = std::iter::once(insertion.node.id)
                .chain(insertion.touched.iter().copied())
                .chain(insertion.pruned.iter().copied())
                .collect();
            for id in changed {
                let Some(node) = state.node(id) else {
                    continue;
                };
                let key = match self.index.get(&id) {
                    Some(key) => *key,
                    None => {
                        let key = next_seq;
                        next_seq += 1;
                        new_keys.push((id, key));
                        key
                    }
                };
                let bytes = encode_record(node, state.world_model.get(&id))?;
                table.insert(key, bytes.as_slice()).map_err(io_err)?;
            }
        }
        write_header(&txn, state, next_seq)?;
        txn.commit().map_err(io_err)?;

        for id in &insertion.evicted {
            self.index.remove(id);
        }
        self.next_seq = next_seq;
        self.index.extend(new_keys);
        Ok(())
    }

    /// Replace the journal contents with `state`.
    pub fn write_all(&mut self, state: &CognitiveState) -> Result<(), SignalError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        txn.delete_table(NODES).map_err(io_err)?;
        let mut index = BTreeMap::new();
        {
            let mut table = txn.open_table(NODES).map_err(io_err)?;
            for (seq, node) in (0u64..).zip(&state.nodes) {
                let bytes = encode_record(node, state.world_model.get(&node.id))?;
                table.insert(seq, bytes.as_slice()).map_err(io_err)?;
                index.insert(node.id, seq);
            }
        }
        let next_seq = state.nodes.len() as u64;
        write_header(&txn, state, next_seq)?;
        txn.commit().map_err(io_err)?;

        self.index = index;
        self.next_seq = next_seq;
        self.initialized = true;
        self.dirty = false;
        Ok(())
    }

    /// Reclaim the space left behind by a full rewrite.
    ///
    /// Returns whether redb found anything to compact.
    pub fn compact(&mut self) -> Result<bool, SignalError> {
        self.db.compact().map_err(io_err)
    }
}

fn encode_record(node: &CausalNode, entry: Option<&WorldModelEntry>) -> Result<Vec<u8>, SignalError> {
    let record = NodeRecord {
        node: node.clone(),
        entry: entry.cloned(),
    };
    postcard::to_stdvec(&record).map_err(|e| SignalError::SerializationError(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> Result<NodeRecord, SignalError> {
    postcard::from_bytes(bytes)
        .map_err(|e| SignalError::DeserializationError(format!("journal record: {e}")))
}

fn write_header(txn: &WriteTransaction, state: &CognitiveState, next_seq: u64) -> Result<(), SignalError> {
    let header = StateHeader {
        id: state.id,
        user_id: state.user_id.clone(),
        bias_profile: state.bias_profile.clone(),
        synaptic_efficiency: state.synaptic_efficiency,
        temporal_alignment: state.temporal_alignment,
        last_updated: state.last_updated,
        total_processing_micros: state.total_processing_micros,
        next_seq,
    };
    let bytes =
        postcard::to_stdvec(&header).map_err(|e| SignalError::SerializationError(e.to_string()))?;
    let mut table = txn.open_table(META).map_err(io_err)?;
    table.insert(STATE_KEY, bytes.as_slice()).map_err(io_err)?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;
    use crate::config::EngineConfig;
    use crate::engine::CognitiveEngine;
    use crate::ports::{FixedRandom, ManualClock, SequentialIds};
    use tempfile::TempDir;

    fn engine(config: EngineConfig) -> CognitiveEngine {
        let clock = ManualClock::starting_at(DateTime::from_timestamp_millis(0).expect("ts"));
        CognitiveEngine::builder("alice")
            .config(config)
            .clock(clock)
            .ids(SequentialIds::new())
            .random(FixedRandom(0.5))
            .build()
            .expect("build")
    }

    #[test]
    fn fresh_journal_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let journal = RedbJournal::open(dir.path().join("j.redb")).expect("open");
        assert!(!journal.is_initialized());
        assert!(journal.load().expect("load").is_none());
    }

    #[test]
    fn incremental_records_reload_identically() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("j.redb");
        let mut engine = engine(EngineConfig::default());
        {
            let mut journal = RedbJournal::open(&path).expect("open");
            for (d, k) in [
                ("Refactor billing service", NodeKind::Success),
                ("Billing service alerts", NodeKind::Insight),
                ("Billing service outage", NodeKind::Failure),
            ] {
                let insertion = engine.insert(d, "done", k);
                journal.record(engine.state(), &insertion).expect("record");
            }
        }

        let journal = RedbJournal::open(&path).expect("reopen");
        assert_eq!(journal.node_count(), 3);
        let loaded = journal.load().expect("load").expect("state");
        assert_eq!(&loaded, engine.state());
    }

    #[test]
    fn eviction_deletes_dropped_records() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("j.redb");
        let config = EngineConfig {
            max_nodes: Some(2),
            ..EngineConfig::default()
        };
        let mut engine = engine(config);
        {
            let mut journal = RedbJournal::open(&path).expect("open");
            for d in [
                "pricing page test",
                "pricing page copy",
                "pricing page layout",
                "pricing page launch",
            ] {
                let insertion = engine.insert(d, "done", NodeKind::Success);
                journal.record(engine.state(), &insertion).expect("record");
            }
            assert_eq!(journal.node_count(), 2);
            // Sequence keys keep growing; only evicted keys are removed.
            assert_eq!(journal.next_seq, 4);
            let loaded = journal.load().expect("load").expect("state");
            assert_eq!(&loaded, engine.state());
        }

        let journal = RedbJournal::open(&path).expect("reopen");
        let loaded = journal.load().expect("load").expect("state");
        assert_eq!(&loaded, engine.state());
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn dirty_journal_rewrites_everything() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("j.redb");
        let mut engine = engine(EngineConfig::default());
        {
            let mut journal = RedbJournal::open(&path).expect("open");
            let first = engine.insert("Refactor billing service", "done", NodeKind::Success);
            journal.record(engine.state(), &first).expect("record");

            // The second insertion never reached disk.
            engine.insert("Billing service alerts", "done", NodeKind::Insight);
            journal.mark_dirty();

            let third = engine.insert("Billing service costs", "done", NodeKind::Failure);
            journal.record(engine.state(), &third).expect("record");
            assert!(!journal.dirty);
        }

        let journal = RedbJournal::open(&path).expect("reopen");
        assert_eq!(journal.node_count(), 3);
        let loaded = journal.load().expect("load").expect("state");
        assert_eq!(&loaded, engine.state());
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn compaction_keeps_contents() {
        let dir = TempDir::new().expect("tempdir");
        let mut engine = engine(EngineConfig::default());
        let mut journal = RedbJournal::open(dir.path().join("j.redb")).expect("open");
        for d in ["launch beta", "beta onboarding", "beta pricing"] {
            engine.insert(d, "done", NodeKind::Success);
            journal.write_all(engine.state()).expect("write");
        }
        journal.compact().expect("compact");
        let loaded = journal.load().expect("load").expect("state");
        assert_eq!(&loaded, engine.state());
    }
}
