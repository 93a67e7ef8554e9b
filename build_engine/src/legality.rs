//! Build kernel: Legality Predicates
//!
//! One `check_*` per transition. The transition table calls the same
//! check before mutating, so a control reported as disabled is always
//! rejected when attempted anyway. The `can_*` forms are the boolean
//! views handed to presentation.

use crate::budget::{level_delta, settle, swap_cost};
use crate::domain::{AttackMode, BuildState, MajorRequirement, MAX_STAT_LEVEL, MIN_STAT_LEVEL};
use crate::error::{BuildError, Incomplete, Rejection};

pub fn check_not_finalized(state: &BuildState) -> Result<(), BuildError> {
    if state.finalized {
        return Err(Rejection::Finalized.into());
    }
    Ok(())
}

/// Level in range and the marginal delta affordable.
pub fn check_set_stat_level(state: &BuildState, name: &str, level: u8) -> Result<(), BuildError> {
    check_not_finalized(state)?;
    let stat = state.stat(name).ok_or_else(|| BuildError::unknown_stat(name))?;
    if !(MIN_STAT_LEVEL..=MAX_STAT_LEVEL).contains(&level) {
        return Err(Rejection::LevelOutOfRange { level }.into());
    }
    settle(state.points, level_delta(stat.level, level))?;
    Ok(())
}

/// Unavailable is never legal; the held ability always is; anything else
/// must be affordable once the held ability's cost is refunded.
pub fn check_select_major(state: &BuildState, path: &str) -> Result<(), BuildError> {
    check_not_finalized(state)?;
    let ability = state.major(path).ok_or_else(|| BuildError::unknown_ability(path))?;
    if !ability.available {
        return Err(Rejection::AbilityUnavailable {
            path: path.to_string(),
        }
        .into());
    }
    if ability.selected {
        return Ok(());
    }
    settle(state.points, swap_cost(ability.cost, state.held_major_cost()))?;
    Ok(())
}

/// Available, and either already held (toggle off) or affordable.
pub fn check_select_minor(state: &BuildState, path: &str) -> Result<(), BuildError> {
    check_not_finalized(state)?;
    let ability = state.minor(path).ok_or_else(|| BuildError::unknown_ability(path))?;
    if !ability.available {
        return Err(Rejection::AbilityUnavailable {
            path: path.to_string(),
        }
        .into());
    }
    if ability.selected {
        return Ok(());
    }
    settle(state.points, i64::from(ability.cost))?;
    Ok(())
}

/// Only melee → ranged is gated, on the remaining pool.
pub fn check_switch_attack_mode(state: &BuildState, mode: AttackMode) -> Result<(), BuildError> {
    check_not_finalized(state)?;
    if state.attack_mode == AttackMode::Melee
        && mode == AttackMode::Ranged
        && state.points < state.rules.ranged_threshold
    {
        return Err(Rejection::RangedLocked {
            threshold: state.rules.ranged_threshold,
            available: state.points,
        }
        .into());
    }
    Ok(())
}

/// Completion criteria for `spawn`.
pub fn check_finalize(state: &BuildState) -> Result<(), BuildError> {
    check_not_finalized(state)?;
    if state.rules.major_requirement == MajorRequirement::Required
        && state.selected_major().is_none()
    {
        return Err(Incomplete::MajorAbilityRequired.into());
    }
    Ok(())
}

pub fn can_set_stat_level(state: &BuildState, name: &str, level: u8) -> bool {
    check_set_stat_level(state, name, level).is_ok()
}

pub fn can_select_major(state: &BuildState, path: &str) -> bool {
    check_select_major(state, path).is_ok()
}

pub fn can_select_minor(state: &BuildState, path: &str) -> bool {
    check_select_minor(state, path).is_ok()
}

pub fn can_switch_attack_mode(state: &BuildState, mode: AttackMode) -> bool {
    check_switch_attack_mode(state, mode).is_ok()
}

pub fn can_finalize(state: &BuildState) -> bool {
    check_finalize(state).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildRules;
    use crate::ruleset::{AbilitySpec, Ruleset, StatSpec};
    use crate::state::create_initial_state;

    fn spec(name: &str, cost: u32, available: bool) -> AbilitySpec {
        AbilitySpec {
            name: name.to_string(),
            path: format!("/{name}"),
            cost,
            desc: String::new(),
            icon: None,
            available,
            requiem: false,
        }
    }

    fn state_with(points: u32) -> BuildState {
        let ruleset = Ruleset {
            starting_points: points,
            default_name: String::new(),
            stats: vec![StatSpec {
                name: "Strength".to_string(),
                desc: String::new(),
            }],
            abilities_major: vec![spec("big", 4, true), spec("mid", 3, true), spec("locked", 1, false)],
            abilities_minor: vec![spec("small", 2, true), spec("hidden", 0, false)],
            rules: BuildRules::default(),
        };
        create_initial_state(&ruleset)
    }

    #[test]
    fn stat_level_bounds_and_budget() {
        let state = state_with(3);
        assert!(can_set_stat_level(&state, "Strength", 4));
        assert!(!can_set_stat_level(&state, "Strength", 5));
        assert!(can_set_stat_level(&state, "Strength", 1));
        assert_eq!(
            check_set_stat_level(&state, "Strength", 0),
            Err(BuildError::InvalidTransition(Rejection::LevelOutOfRange { level: 0 }))
        );
        assert!(!can_set_stat_level(&state, "Strength", 6));
        assert_eq!(
            check_set_stat_level(&state, "Luck", 2),
            Err(BuildError::unknown_stat("Luck"))
        );
    }

    #[test]
    fn lowering_is_always_affordable() {
        let mut state = state_with(0);
        state.stats[0].level = 5;
        for level in 1..=5 {
            assert!(can_set_stat_level(&state, "Strength", level));
        }
    }

    #[test]
    fn major_swap_counts_the_refund() {
        let mut state = state_with(5);
        state.abilities_major[0].selected = true;
        state.points = 1;
        assert!(can_select_major(&state, "/mid"));
        assert!(can_select_major(&state, "/big"));
        assert!(!can_select_major(&state, "/locked"));
    }

    #[test]
    fn major_unaffordable_without_refund() {
        let state = state_with(3);
        assert!(!can_select_major(&state, "/big"));
        assert!(can_select_major(&state, "/mid"));
    }

    #[test]
    fn unavailable_minor_is_never_legal() {
        let state = state_with(100);
        assert_eq!(
            check_select_minor(&state, "/hidden"),
            Err(BuildError::InvalidTransition(Rejection::AbilityUnavailable {
                path: "/hidden".to_string()
            }))
        );
    }

    #[test]
    fn minor_held_can_always_be_dropped() {
        let mut state = state_with(2);
        state.abilities_minor[0].selected = true;
        state.points = 0;
        assert!(can_select_minor(&state, "/small"));
    }

    #[test]
    fn groups_do_not_cross() {
        let state = state_with(10);
        assert_eq!(
            check_select_minor(&state, "/big"),
            Err(BuildError::unknown_ability("/big"))
        );
        assert_eq!(
            check_select_major(&state, "/small"),
            Err(BuildError::unknown_ability("/small"))
        );
    }

    #[test]
    fn ranged_gate() {
        let mut state = state_with(2);
        assert!(can_switch_attack_mode(&state, AttackMode::Melee));
        assert!(!can_switch_attack_mode(&state, AttackMode::Ranged));
        state.points = 3;
        assert!(can_switch_attack_mode(&state, AttackMode::Ranged));

        state.attack_mode = AttackMode::Ranged;
        state.points = 0;
        assert!(can_switch_attack_mode(&state, AttackMode::Ranged));
        assert!(can_switch_attack_mode(&state, AttackMode::Melee));
    }

    #[test]
    fn finalized_disables_everything() {
        let mut state = state_with(10);
        state.finalized = true;
        assert!(!can_set_stat_level(&state, "Strength", 2));
        assert!(!can_select_major(&state, "/mid"));
        assert!(!can_select_minor(&state, "/small"));
        assert!(!can_switch_attack_mode(&state, AttackMode::Melee));
        assert!(!can_finalize(&state));
    }

    #[test]
    fn finalize_requirement() {
        let mut state = state_with(10);
        assert!(can_finalize(&state));
        state.rules.major_requirement = MajorRequirement::Required;
        assert_eq!(
            check_finalize(&state),
            Err(BuildError::IncompleteBuild(Incomplete::MajorAbilityRequired))
        );
        state.abilities_major[1].selected = true;
        assert!(can_finalize(&state));
    }
}
