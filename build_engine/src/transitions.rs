//! Build kernel: Centralized Transition Logic
//!
//! ALL state mutation lives here. Each handler runs its legality check
//! first and only then mutates a private clone, so the caller's state is
//! never touched by a rejected action.

use crate::actions::BuildAction;
use crate::budget::{level_delta, settle, swap_cost};
use crate::domain::{AttackMode, BuildState, MajorReselect, Rgb, TransitionOutcome};
use crate::error::BuildError;
use crate::legality;
use crate::state::reset_allocations;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply *action* to *state* and return `(new_state, outcome)`.
/// The original state is never mutated.
pub fn apply_action(
    state: &BuildState,
    action: &BuildAction,
) -> Result<(BuildState, TransitionOutcome), BuildError> {
    let mut next = state.clone();

    let mut outcome = TransitionOutcome {
        action: action.kind().to_string(),
        points_before: state.points,
        points_after: state.points,
        changed: false,
        color_requested: false,
        finalized: false,
    };

    match action {
        BuildAction::SetName { name } => apply_set_name(&mut next, name)?,
        BuildAction::RequestColor => {
            apply_request_color(&mut next)?;
            outcome.color_requested = true;
        }
        BuildAction::SetColor { color } => apply_set_color(&mut next, *color)?,
        BuildAction::Reset => apply_reset(&mut next)?,
        BuildAction::SwitchAttackMode { mode } => apply_switch_attack_mode(&mut next, *mode)?,
        BuildAction::SetStat { name, level } => apply_set_stat(&mut next, name, *level)?,
        BuildAction::SelectMajor { path } => apply_select_major(&mut next, path)?,
        BuildAction::SelectMinor { path } => apply_select_minor(&mut next, path)?,
        BuildAction::Finalize => {
            apply_finalize(&mut next)?;
            outcome.finalized = true;
        }
    }

    outcome.points_after = next.points;
    outcome.changed = next != *state;
    Ok((next, outcome))
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn apply_set_name(state: &mut BuildState, name: &str) -> Result<(), BuildError> {
    legality::check_not_finalized(state)?;
    state.name = name.trim().to_string();
    Ok(())
}

fn apply_request_color(state: &mut BuildState) -> Result<(), BuildError> {
    legality::check_not_finalized(state)?;
    state.awaiting_color = true;
    Ok(())
}

fn apply_set_color(state: &mut BuildState, color: Rgb) -> Result<(), BuildError> {
    legality::check_not_finalized(state)?;
    state.color = color;
    state.awaiting_color = false;
    Ok(())
}

fn apply_reset(state: &mut BuildState) -> Result<(), BuildError> {
    legality::check_not_finalized(state)?;
    reset_allocations(state);
    Ok(())
}

/// The threshold is a gate, never a price.
fn apply_switch_attack_mode(state: &mut BuildState, mode: AttackMode) -> Result<(), BuildError> {
    legality::check_switch_attack_mode(state, mode)?;
    state.attack_mode = mode;
    Ok(())
}

fn apply_set_stat(state: &mut BuildState, name: &str, level: u8) -> Result<(), BuildError> {
    legality::check_set_stat_level(state, name, level)?;
    let current = state
        .stat(name)
        .map(|s| s.level)
        .ok_or_else(|| BuildError::unknown_stat(name))?;
    state.points = settle(state.points, level_delta(current, level))?;
    if let Some(stat) = state.stat_mut(name) {
        stat.level = level;
    }
    Ok(())
}

/// Swap the held major for *path* as one net charge. Re-selecting the
/// held major follows `BuildRules::major_reselect`.
fn apply_select_major(state: &mut BuildState, path: &str) -> Result<(), BuildError> {
    legality::check_select_major(state, path)?;

    let target = state
        .abilities_major
        .iter()
        .position(|a| a.path == path)
        .ok_or_else(|| BuildError::unknown_ability(path))?;
    let held = state.abilities_major.iter().position(|a| a.selected);

    if held == Some(target) {
        if state.rules.major_reselect == MajorReselect::Deselect {
            let refund = state.abilities_major[target].cost;
            state.points = settle(state.points, -i64::from(refund))?;
            state.abilities_major[target].selected = false;
        }
        return Ok(());
    }

    let held_cost = state.held_major_cost();
    let cost = state.abilities_major[target].cost;
    state.points = settle(state.points, swap_cost(cost, held_cost))?;
    for (index, ability) in state.abilities_major.iter_mut().enumerate() {
        ability.selected = index == target;
    }
    Ok(())
}

/// Toggle a minor ability: selecting charges, deselecting refunds.
fn apply_select_minor(state: &mut BuildState, path: &str) -> Result<(), BuildError> {
    legality::check_select_minor(state, path)?;

    let ability = state
        .abilities_minor
        .iter_mut()
        .find(|a| a.path == path)
        .ok_or_else(|| BuildError::unknown_ability(path))?;
    let spend = if ability.selected {
        -i64::from(ability.cost)
    } else {
        i64::from(ability.cost)
    };
    state.points = settle(state.points, spend)?;
    ability.selected = !ability.selected;
    Ok(())
}

fn apply_finalize(state: &mut BuildState) -> Result<(), BuildError> {
    legality::check_finalize(state)?;
    state.finalized = true;
    state.awaiting_color = false;
    Ok(())
}
