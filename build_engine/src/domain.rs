//! Build kernel: Core Domain Types
//!
//! Pure data plus lookups. No transition logic lives here.
//! Points and costs are unsigned: the pool can never go negative.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;

/// Lowest stat level. Holding it costs nothing.
pub const MIN_STAT_LEVEL: u8 = 1;
/// Highest stat level.
pub const MAX_STAT_LEVEL: u8 = 5;
/// Default gate for switching from melee to ranged.
pub const DEFAULT_RANGED_THRESHOLD: u32 = 3;

// ── Stats ──────────────────────────────────────────────────────────

/// A rated skill. Always present; priced at one point per level above 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stat {
    pub name: String,
    pub desc: String,
    pub level: u8,
}

impl Stat {
    /// Points currently sunk into this stat.
    pub fn spent(&self) -> u32 {
        u32::from(self.level.saturating_sub(MIN_STAT_LEVEL))
    }

    /// Letter grade shown for a level: F, D, C, B, A.
    pub fn grade(&self) -> char {
        grade_for_level(self.level)
    }
}

pub fn grade_for_level(level: u8) -> char {
    match level {
        1 => 'F',
        2 => 'D',
        3 => 'C',
        4 => 'B',
        5 => 'A',
        _ => '?',
    }
}

// ── Abilities ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityGroup {
    Major,
    Minor,
}

impl AbilityGroup {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AbilityGroup::Major => "major",
            AbilityGroup::Minor => "minor",
        }
    }
}

impl fmt::Display for AbilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unlockable power. `available` comes from external unlock rules and is
/// never changed by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ability {
    pub name: String,
    pub path: String,
    pub cost: u32,
    pub desc: String,
    pub icon: Option<String>,
    pub requiem: bool,
    pub available: bool,
    pub selected: bool,
    pub group: AbilityGroup,
}

// ── Attack mode ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackMode {
    #[default]
    Melee,
    Ranged,
}

impl AttackMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AttackMode::Melee => "melee",
            AttackMode::Ranged => "ranged",
        }
    }
}

// ── Colour ─────────────────────────────────────────────────────────

/// 24-bit colour, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

// ── Policy ─────────────────────────────────────────────────────────

/// Whether finalizing needs a major ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorRequirement {
    #[default]
    Optional,
    Required,
}

/// What re-selecting the currently held major ability does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorReselect {
    /// Leave the selection as it is.
    #[default]
    Keep,
    /// Drop the selection and refund its cost.
    Deselect,
}

/// Ruleset policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildRules {
    pub ranged_threshold: u32,
    pub major_requirement: MajorRequirement,
    pub major_reselect: MajorReselect,
}

impl Default for BuildRules {
    fn default() -> Self {
        Self {
            ranged_threshold: DEFAULT_RANGED_THRESHOLD,
            major_requirement: MajorRequirement::Optional,
            major_reselect: MajorReselect::Keep,
        }
    }
}

// ── Outcome ────────────────────────────────────────────────────────

/// Structured outcome of an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionOutcome {
    pub action: String,
    pub points_before: u32,
    pub points_after: u32,
    /// False when the action was accepted but left the build untouched.
    pub changed: bool,
    pub color_requested: bool,
    pub finalized: bool,
}

// ── Aggregate ──────────────────────────────────────────────────────

/// Complete build snapshot owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildState {
    pub points: u32,
    pub starting_points: u32,
    pub stats: Vec<Stat>,
    pub abilities_major: Vec<Ability>,
    pub abilities_minor: Vec<Ability>,
    pub attack_mode: AttackMode,
    pub default_name: String,
    pub name: String,
    pub color: Rgb,
    pub rules: BuildRules,
    /// Set by the `color` action until the picker answers with `set_color`.
    pub awaiting_color: bool,
    pub finalized: bool,
}

impl BuildState {
    pub fn stat(&self, name: &str) -> Option<&Stat> {
        self.stats.iter().find(|s| s.name == name)
    }

    pub fn stat_mut(&mut self, name: &str) -> Option<&mut Stat> {
        self.stats.iter_mut().find(|s| s.name == name)
    }

    pub fn major(&self, path: &str) -> Option<&Ability> {
        self.abilities_major.iter().find(|a| a.path == path)
    }

    pub fn minor(&self, path: &str) -> Option<&Ability> {
        self.abilities_minor.iter().find(|a| a.path == path)
    }

    /// The major ability currently held, if any.
    pub fn selected_major(&self) -> Option<&Ability> {
        self.abilities_major.iter().find(|a| a.selected)
    }

    /// Cost of the held major ability, 0 when none is held.
    pub fn held_major_cost(&self) -> u32 {
        self.selected_major().map_or(0, |a| a.cost)
    }

    pub fn selected_minors(&self) -> impl Iterator<Item = &Ability> {
        self.abilities_minor.iter().filter(|a| a.selected)
    }

    /// Every ability across both groups, majors first.
    pub fn abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities_major.iter().chain(self.abilities_minor.iter())
    }

    /// Total points committed to stats and selected abilities.
    pub fn spent_points(&self) -> u64 {
        let stats: u64 = self.stats.iter().map(|s| u64::from(s.spent())).sum();
        let abilities: u64 = self
            .abilities()
            .filter(|a| a.selected)
            .map(|a| u64::from(a.cost))
            .sum();
        stats + abilities
    }

    pub fn is_melee(&self) -> bool {
        self.attack_mode == AttackMode::Melee
    }

    /// Name shown for the build: the chosen one, else the ruleset default.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.default_name
        } else {
            &self.name
        }
    }
}
