//! # Formats
//!
//! Binary encodings of engine state. File I/O lives in the host.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, state_from_bytes, state_to_bytes,
};
