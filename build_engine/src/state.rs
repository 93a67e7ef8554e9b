//! Build kernel: State Construction

use crate::domain::{Ability, AbilityGroup, AttackMode, BuildState, Rgb, Stat, MIN_STAT_LEVEL};
use crate::ruleset::{AbilitySpec, Ruleset};

/// Create a fresh build from a validated ruleset: every stat at level 1,
/// nothing selected, melee, full starting pool.
pub fn create_initial_state(ruleset: &Ruleset) -> BuildState {
    BuildState {
        points: ruleset.starting_points,
        starting_points: ruleset.starting_points,
        stats: ruleset
            .stats
            .iter()
            .map(|s| Stat {
                name: s.name.clone(),
                desc: s.desc.clone(),
                level: MIN_STAT_LEVEL,
            })
            .collect(),
        abilities_major: abilities_from_specs(&ruleset.abilities_major, AbilityGroup::Major),
        abilities_minor: abilities_from_specs(&ruleset.abilities_minor, AbilityGroup::Minor),
        attack_mode: AttackMode::Melee,
        default_name: ruleset.default_name.clone(),
        name: String::new(),
        color: Rgb::default(),
        rules: ruleset.rules.clone(),
        awaiting_color: false,
        finalized: false,
    }
}

/// Return stats, selections, mode and pool to their initial values.
/// Cosmetics and availability are left alone.
pub fn reset_allocations(state: &mut BuildState) {
    for stat in &mut state.stats {
        stat.level = MIN_STAT_LEVEL;
    }
    for ability in state
        .abilities_major
        .iter_mut()
        .chain(state.abilities_minor.iter_mut())
    {
        ability.selected = false;
    }
    state.attack_mode = AttackMode::Melee;
    state.points = state.starting_points;
}

fn abilities_from_specs(specs: &[AbilitySpec], group: AbilityGroup) -> Vec<Ability> {
    specs
        .iter()
        .map(|spec| Ability {
            name: spec.name.clone(),
            path: spec.path.clone(),
            cost: spec.cost,
            desc: spec.desc.clone(),
            icon: spec.icon.clone(),
            requiem: spec.requiem,
            available: spec.available,
            selected: false,
            group,
        })
        .collect()
}
