//! Build kernel: Outbound Snapshot
//!
//! The structured view pushed to presentation after every action. Field
//! names are the transport contract; keep them stable.

use serde::{Deserialize, Serialize};

use crate::domain::{Ability, BuildState, MajorRequirement, Stat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedSkill {
    pub name: String,
    pub level: u8,
    pub desc: String,
}

impl From<&Stat> for RatedSkill {
    fn from(stat: &Stat) -> Self {
        Self {
            name: stat.name.clone(),
            level: stat.level,
            desc: stat.desc.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityView {
    pub name: String,
    pub path: String,
    pub cost: u32,
    pub desc: String,
    pub icon: Option<String>,
    pub selected: bool,
    pub available: bool,
    pub requiem: bool,
}

impl From<&Ability> for AbilityView {
    fn from(ability: &Ability) -> Self {
        Self {
            name: ability.name.clone(),
            path: ability.path.clone(),
            cost: ability.cost,
            desc: ability.desc.clone(),
            icon: ability.icon.clone(),
            selected: ability.selected,
            available: ability.available,
            requiem: ability.requiem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub points: u32,
    /// Ruleset default, shown as the placeholder name.
    pub name: String,
    pub guardian_name: String,
    pub guardian_color: String,
    pub melee: bool,
    pub ratedskills: Vec<RatedSkill>,
    pub abilities_major: Vec<AbilityView>,
    pub abilities_minor: Vec<AbilityView>,
    /// Major selection is optional under the current rules.
    pub no_ability: bool,
    /// An answer from the colour picker is still outstanding.
    pub waiting: bool,
    pub finalized: bool,
}

impl BuildSnapshot {
    pub fn from_state(state: &BuildState) -> Self {
        Self {
            points: state.points,
            name: state.default_name.clone(),
            guardian_name: state.name.clone(),
            guardian_color: state.color.to_string(),
            melee: state.is_melee(),
            ratedskills: state.stats.iter().map(RatedSkill::from).collect(),
            abilities_major: state.abilities_major.iter().map(AbilityView::from).collect(),
            abilities_minor: state.abilities_minor.iter().map(AbilityView::from).collect(),
            no_ability: state.rules.major_requirement == MajorRequirement::Optional,
            waiting: state.awaiting_color,
            finalized: state.finalized,
        }
    }
}
