//! Build kernel: Invariant Checks
//!
//! Run against every candidate state before it is committed, and against
//! restored checkpoints. The first failing check is reported.

use thiserror::Error;

use crate::domain::{AbilityGroup, BuildState, MAX_STAT_LEVEL, MIN_STAT_LEVEL};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("[INVARIANT:stat_level] stat {stat:?} at level {level}")]
    StatLevelOutOfRange { stat: String, level: u8 },

    #[error("[INVARIANT:major_exclusive] {count} major abilities selected")]
    MultipleMajors { count: usize },

    #[error("[INVARIANT:selected_available] ability {path:?} selected while unavailable")]
    UnavailableSelected { path: String },

    #[error("[INVARIANT:ability_group] ability {path:?} filed under the wrong group")]
    WrongGroup { path: String },

    #[error(
        "[INVARIANT:point_ledger] {points} remaining + {spent} spent != {starting} starting"
    )]
    LedgerMismatch { points: u32, spent: u64, starting: u32 },
}

/// Run every check. Returns the first failure.
pub fn validate_invariants(state: &BuildState) -> Result<(), InvariantViolation> {
    check_stat_levels(state)?;
    check_ability_groups(state)?;
    check_major_exclusive(state)?;
    check_selected_available(state)?;
    check_point_ledger(state)?;
    Ok(())
}

fn check_stat_levels(state: &BuildState) -> Result<(), InvariantViolation> {
    match state
        .stats
        .iter()
        .find(|s| !(MIN_STAT_LEVEL..=MAX_STAT_LEVEL).contains(&s.level))
    {
        Some(s) => Err(InvariantViolation::StatLevelOutOfRange {
            stat: s.name.clone(),
            level: s.level,
        }),
        None => Ok(()),
    }
}

fn check_ability_groups(state: &BuildState) -> Result<(), InvariantViolation> {
    let misfiled = state
        .abilities_major
        .iter()
        .find(|a| a.group != AbilityGroup::Major)
        .or_else(|| {
            state
                .abilities_minor
                .iter()
                .find(|a| a.group != AbilityGroup::Minor)
        });
    match misfiled {
        Some(a) => Err(InvariantViolation::WrongGroup {
            path: a.path.clone(),
        }),
        None => Ok(()),
    }
}

fn check_major_exclusive(state: &BuildState) -> Result<(), InvariantViolation> {
    let count = state.abilities_major.iter().filter(|a| a.selected).count();
    if count > 1 {
        return Err(InvariantViolation::MultipleMajors { count });
    }
    Ok(())
}

fn check_selected_available(state: &BuildState) -> Result<(), InvariantViolation> {
    match state.abilities().find(|a| a.selected && !a.available) {
        Some(a) => Err(InvariantViolation::UnavailableSelected {
            path: a.path.clone(),
        }),
        None => Ok(()),
    }
}

/// Remaining plus committed points always equal the starting pool.
fn check_point_ledger(state: &BuildState) -> Result<(), InvariantViolation> {
    let spent = state.spent_points();
    if u64::from(state.points) + spent != u64::from(state.starting_points) {
        return Err(InvariantViolation::LedgerMismatch {
            points: state.points,
            spent,
            starting: state.starting_points,
        });
    }
    Ok(())
}
