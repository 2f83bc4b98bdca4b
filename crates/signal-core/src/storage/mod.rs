//! # Storage
//!
//! Disk-backed journal for the node log.

pub mod redb_journal;

pub use redb_journal::RedbJournal;
