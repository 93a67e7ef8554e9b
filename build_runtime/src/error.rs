//! Runtime error types.

use std::io;

use thiserror::Error;

use build_engine::error::{BuildError, RulesetError};
use build_engine::invariants::InvariantViolation;

/// Action journal failures.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io: {0}")]
    Io(#[from] io::Error),

    #[error("sequence violation in journal: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("invalid frame length: {0}")]
    InvalidFrameLength(usize),

    #[error("truncated frame after sequence {after}")]
    Truncated { after: u64 },

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("record {sequence} carries no action")]
    MissingAction { sequence: u64 },

    #[error("record {sequence} is invalid: {reason}")]
    InvalidRecord { sequence: u64, reason: String },

    #[error("record {sequence} written under rules v{found}, expected v{expected}")]
    RulesVersion {
        sequence: u64,
        found: u32,
        expected: u32,
    },
}

/// Checkpoint / codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization failed: {0}")]
    Serialization(serde_json::Error),

    #[error("deserialization failed: {0}")]
    Deserialization(serde_json::Error),

    #[error("checkpoint state violates invariants: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    #[error("checkpoint digest mismatch at sequence {sequence}")]
    DigestMismatch { sequence: u64 },

    #[error("checkpoint written under rules v{found}, expected v{expected}")]
    RulesVersion { found: u32, expected: u32 },

    #[error("checkpoint at sequence {sequence} belongs to a different ruleset")]
    RulesetMismatch { sequence: u64 },

    #[error("checkpoint io: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by sessions and the registry.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Ruleset(#[from] RulesetError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("journal record {sequence} was written under a different ruleset")]
    RulesetMismatch { sequence: u64 },

    #[error("session {0:?} already exists")]
    DuplicateSession(String),

    #[error("session {0:?} not found")]
    UnknownSession(String),

    #[error("session lock poisoned")]
    Poisoned,

    #[error("replay is not deterministic: {first} vs {second}")]
    Nondeterministic { first: String, second: String },
}

impl SessionError {
    /// The kernel rejection behind this error, if that is what it is.
    pub fn as_build_error(&self) -> Option<&BuildError> {
        match self {
            SessionError::Build(e) => Some(e),
            _ => None,
        }
    }
}
