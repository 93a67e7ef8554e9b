//! Build kernel: Error Taxonomy
//!
//! Every rejection is a value. Nothing in the kernel panics on bad input;
//! the caller decides whether to re-prompt.

use std::fmt;

use thiserror::Error;

use crate::invariants::InvariantViolation;

/// What kind of ruleset entry a request referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Stat,
    Ability,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Stat => f.write_str("stat"),
            TargetKind::Ability => f.write_str("ability"),
        }
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("stat level {level} outside 1..=5")]
    LevelOutOfRange { level: u8 },

    #[error("needs {required} points, {available} available")]
    InsufficientPoints { required: u32, available: u32 },

    #[error("ability {path:?} is not available")]
    AbilityUnavailable { path: String },

    #[error("ranged attacks need at least {threshold} points, {available} available")]
    RangedLocked { threshold: u32, available: u32 },

    #[error("point pool would exceed its representable range")]
    BudgetOverflow,

    #[error("build is already finalized")]
    Finalized,

    #[error(transparent)]
    InvariantViolated(InvariantViolation),
}

/// Completion criteria that were not met at finalize time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Incomplete {
    #[error("a major ability must be selected")]
    MajorAbilityRequired,
}

/// Errors surfaced by the build kernel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] Rejection),

    #[error("incomplete build: {0}")]
    IncompleteBuild(#[from] Incomplete),

    #[error("unknown {kind} {target:?}")]
    UnknownTarget { kind: TargetKind, target: String },

    #[error("malformed {action:?} request: {reason}")]
    MalformedAction { action: String, reason: String },
}

impl BuildError {
    pub fn unknown_stat(name: &str) -> Self {
        Self::UnknownTarget {
            kind: TargetKind::Stat,
            target: name.to_string(),
        }
    }

    pub fn unknown_ability(path: &str) -> Self {
        Self::UnknownTarget {
            kind: TargetKind::Ability,
            target: path.to_string(),
        }
    }

    pub fn malformed(action: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAction {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable reason code reported to the transport layer.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition(_) => "invalid_transition",
            Self::IncompleteBuild(_) => "incomplete_build",
            Self::UnknownTarget { .. } => "unknown_target",
            Self::MalformedAction { .. } => "malformed_action",
        }
    }
}

/// Errors raised while ingesting a ruleset.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("stat at index {index} has an empty name")]
    EmptyStatName { index: usize },

    #[error("duplicate stat {name:?}")]
    DuplicateStat { name: String },

    #[error("{group} ability at index {index} has an empty {field}")]
    EmptyAbilityField {
        group: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("duplicate ability path {path:?}")]
    DuplicateAbility { path: String },

    #[error("invalid ruleset JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read ruleset: {0}")]
    Io(#[from] std::io::Error),
}

/// A colour string that is not `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid colour {0:?}: expected #RRGGBB")]
pub struct ColorParseError(pub String);
