//! Snapshot codec: BuildState encoder/decoder.
//!
//! Pure codec layer. No side effects, no timestamps, no envelope.
//!
//! - `encode_state`:  BuildState → JSON string
//! - `decode_state`:  JSON string → BuildState (strict, unknown fields rejected)
//! - `restore_state`: decode + invariant validation

use build_engine::domain::BuildState;
use build_engine::invariants::validate_invariants;

use crate::error::SnapshotError;

pub fn encode_state(state: &BuildState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(SnapshotError::Serialization)
}

pub fn decode_state(json: &str) -> Result<BuildState, SnapshotError> {
    serde_json::from_str(json).map_err(SnapshotError::Deserialization)
}

/// Decode and reject anything the kernel could never have committed.
pub fn restore_state(json: &str) -> Result<BuildState, SnapshotError> {
    let state = decode_state(json)?;
    validate_invariants(&state)?;
    Ok(state)
}
