//! # Persistence Format
//!
//! Binary serialization for a [`CognitiveState`].
//!
//! Format: header (21 bytes) + postcard-serialized state.
//! - 4 bytes: magic (`FSIG`)
//! - 1 byte: version
//! - 8 bytes: node count (little endian)
//! - 8 bytes: [`snapshot_checksum`] of the state (little endian)
//!
//! Size and header are validated before the payload is decoded, so a
//! truncated or hostile file fails fast without large allocations. The
//! decoded state must then match the header's count and checksum.

use crate::export::snapshot_checksum;
use crate::{CognitiveState, SignalError, primitives};

/// Largest accepted encoded state, header included.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

const HEADER_LEN: usize = 21;

// =============================================================================
// HEADER
// =============================================================================

/// The header preceding every encoded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub node_count: u64,
    pub checksum: u64,
}

impl PersistenceHeader {
    /// Header describing `state` in the current format version.
    #[must_use]
    pub fn for_state(state: &CognitiveState) -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
            node_count: state.nodes.len() as u64,
            checksum: snapshot_checksum(state),
        }
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(SignalError::DeserializationError(
                "not a First Signal state file".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(SignalError::DeserializationError(format!(
                "unsupported format version {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Check a decoded state against the recorded count and checksum.
    pub fn verify(&self, state: &CognitiveState) -> Result<(), SignalError> {
        if state.nodes.len() as u64 != self.node_count {
            return Err(SignalError::DeserializationError(format!(
                "node count mismatch: header says {}, payload has {}",
                self.node_count,
                state.nodes.len()
            )));
        }
        let computed = snapshot_checksum(state);
        if computed != self.checksum {
            return Err(SignalError::DeserializationError(format!(
                "checksum mismatch: expected {}, got {computed}",
                self.checksum
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5..13].copy_from_slice(&self.node_count.to_le_bytes());
        bytes[13..].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignalError> {
        let Some(head) = bytes.get(..HEADER_LEN) else {
            return Err(SignalError::DeserializationError(
                "header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[..4]);
        let mut count = [0u8; 8];
        count.copy_from_slice(&head[5..13]);
        let mut checksum = [0u8; 8];
        checksum.copy_from_slice(&head[13..]);
        Ok(Self {
            magic,
            version: head[4],
            node_count: u64::from_le_bytes(count),
            checksum: u64::from_le_bytes(checksum),
        })
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a state (header + payload). Pure; no file I/O.
pub fn state_to_bytes(state: &CognitiveState) -> Result<Vec<u8>, SignalError> {
    let payload =
        postcard::to_stdvec(state).map_err(|e| SignalError::SerializationError(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&PersistenceHeader::for_state(state).to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a state produced by [`state_to_bytes`].
///
/// Only the encoding is checked here; engines check the data invariants
/// with [`CognitiveState::validate`] when they adopt the state.
pub fn state_from_bytes(bytes: &[u8]) -> Result<CognitiveState, SignalError> {
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(SignalError::DeserializationError(format!(
            "state is {} bytes, limit is {MAX_PERSISTENCE_PAYLOAD_SIZE}",
            bytes.len()
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let state: CognitiveState = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| SignalError::DeserializationError(format!("state payload: {e}")))?;
    header.verify(&state)?;
    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CognitiveEngine;
    use crate::ports::{FixedRandom, ManualClock, SequentialIds};
    use crate::NodeKind;
    use chrono::DateTime;

    fn populated_state() -> CognitiveState {
        let clock = ManualClock::starting_at(DateTime::from_timestamp_millis(0).expect("ts"));
        let mut engine = CognitiveEngine::builder("alice")
            .clock(clock.clone())
            .ids(SequentialIds::new())
            .random(FixedRandom(0.25))
            .build()
            .expect("build");
        engine.add_node("Implement billing service", "Latency reduced by 20%", NodeKind::Success);
        clock.advance_millis(1_000);
        engine.add_node("Billing service outage", "failed with error", NodeKind::Failure);
        engine.cognitive_state()
    }

    #[test]
    fn header_layout() {
        let state = populated_state();
        let header = PersistenceHeader::for_state(&state);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], b"FSIG");
        assert_eq!(bytes[4], primitives::FORMAT_VERSION);
        assert_eq!(&bytes[5..13], &2u64.to_le_bytes());
        assert_eq!(PersistenceHeader::from_bytes(&bytes).expect("header"), header);
        assert!(PersistenceHeader::from_bytes(&bytes[..3]).is_err());
    }

    #[test]
    fn state_survives_encoding() {
        let state = populated_state();
        let bytes = state_to_bytes(&state).expect("encode");
        let decoded = state_from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, state);
        assert_eq!(state_to_bytes(&decoded).expect("encode"), bytes);
    }

    #[test]
    fn rejects_foreign_or_future_files() {
        let mut bytes = state_to_bytes(&populated_state()).expect("encode");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(matches!(
            state_from_bytes(&bytes),
            Err(SignalError::DeserializationError(_))
        ));

        bytes[0] = b'X';
        assert!(state_from_bytes(&bytes).is_err());
        assert!(state_from_bytes(b"FS").is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = state_to_bytes(&populated_state()).expect("encode");
        assert!(state_from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn rejects_payload_that_disagrees_with_header() {
        let state = populated_state();
        let mut tampered = state.clone();
        tampered.nodes[0].synaptic_score = 0.123;
        let payload = postcard::to_stdvec(&tampered).expect("payload");

        let mut bytes = PersistenceHeader::for_state(&state).to_bytes().to_vec();
        bytes.extend_from_slice(&payload);
        assert!(matches!(
            state_from_bytes(&bytes),
            Err(SignalError::DeserializationError(msg)) if msg.contains("checksum")
        ));

        let mut short = state.clone();
        short.nodes.pop();
        let mut bytes = PersistenceHeader::for_state(&state).to_bytes().to_vec();
        bytes.extend_from_slice(&postcard::to_stdvec(&short).expect("payload"));
        assert!(matches!(
            state_from_bytes(&bytes),
            Err(SignalError::DeserializationError(msg)) if msg.contains("node count")
        ));
    }
}
