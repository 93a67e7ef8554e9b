//! Build kernel: Ruleset Ingestion
//!
//! The catalogue a session is created from: starting pool, stats, both
//! ability groups and policy. Validated once at ingestion; the kernel
//! trusts a validated ruleset afterwards.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{AbilityGroup, BuildRules};
use crate::error::RulesetError;
use crate::hashing::sha256_hex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatSpec {
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbilitySpec {
    pub name: String,
    pub path: String,
    pub cost: u32,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub requiem: bool,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ruleset {
    pub starting_points: u32,
    #[serde(default)]
    pub default_name: String,
    pub stats: Vec<StatSpec>,
    #[serde(default)]
    pub abilities_major: Vec<AbilitySpec>,
    #[serde(default)]
    pub abilities_minor: Vec<AbilitySpec>,
    #[serde(default)]
    pub rules: BuildRules,
}

impl Ruleset {
    /// Parse and validate a JSON ruleset.
    pub fn from_json_str(json: &str) -> Result<Self, RulesetError> {
        let ruleset: Ruleset = serde_json::from_str(json)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Read, parse and validate a JSON ruleset file.
    pub fn from_path(path: &Path) -> Result<Self, RulesetError> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// SHA-256 of the ruleset's JSON form. Anything recorded against one
    /// ruleset must not be replayed against another.
    pub fn digest(&self) -> Result<String, RulesetError> {
        let json = serde_json::to_vec(self)?;
        Ok(sha256_hex(&json))
    }

    /// Structural checks: non-empty names, unique stat names, unique
    /// ability paths across both groups.
    pub fn validate(&self) -> Result<(), RulesetError> {
        let mut stat_names = BTreeSet::new();
        for (index, stat) in self.stats.iter().enumerate() {
            if stat.name.trim().is_empty() {
                return Err(RulesetError::EmptyStatName { index });
            }
            if !stat_names.insert(stat.name.as_str()) {
                return Err(RulesetError::DuplicateStat {
                    name: stat.name.clone(),
                });
            }
        }

        let mut paths = BTreeSet::new();
        let groups = [
            (AbilityGroup::Major, &self.abilities_major),
            (AbilityGroup::Minor, &self.abilities_minor),
        ];
        for (group, specs) in groups {
            for (index, spec) in specs.iter().enumerate() {
                let empty = |field| RulesetError::EmptyAbilityField {
                    group: group.as_str(),
                    index,
                    field,
                };
                if spec.name.trim().is_empty() {
                    return Err(empty("name"));
                }
                if spec.path.trim().is_empty() {
                    return Err(empty("path"));
                }
                if !paths.insert(spec.path.as_str()) {
                    return Err(RulesetError::DuplicateAbility {
                        path: spec.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Ruleset {
    /// Built-in guardian catalogue.
    fn default() -> Self {
        let stat = |name: &str, desc: &str| StatSpec {
            name: name.to_string(),
            desc: desc.to_string(),
        };
        let ability = |name: &str, path: &str, cost: u32, desc: &str, icon: &str| AbilitySpec {
            name: name.to_string(),
            path: path.to_string(),
            cost,
            desc: desc.to_string(),
            icon: Some(icon.to_string()),
            available: true,
            requiem: false,
        };

        Self {
            starting_points: 15,
            default_name: "Guardian Spirit".to_string(),
            stats: vec![
                stat("Damage", "How much damage the guardian deals per hit."),
                stat("Defense", "How much incoming damage is reduced while manifested."),
                stat("Speed", "How quickly the guardian attacks and moves."),
                stat("Potential", "Strength of the guardian's abilities."),
                stat("Range", "How far the guardian may stray from its summoner."),
            ],
            abilities_major: vec![
                ability(
                    "Assassin",
                    "/guardian_ability/major/assassin",
                    4,
                    "Sneak up on targets for a devastating opening strike.",
                    "user-secret",
                ),
                ability(
                    "Charger",
                    "/guardian_ability/major/charger",
                    3,
                    "Charge through the field, knocking targets down.",
                    "running",
                ),
                ability(
                    "Protector",
                    "/guardian_ability/major/protector",
                    3,
                    "Take a defensive stance that shields the summoner.",
                    "shield-alt",
                ),
                ability(
                    "Healing",
                    "/guardian_ability/major/healing",
                    4,
                    "Mend the wounds of whatever the guardian touches.",
                    "medkit",
                ),
                AbilitySpec {
                    requiem: true,
                    available: false,
                    ..ability(
                        "Gold Experience Requiem",
                        "/guardian_ability/major/requiem",
                        5,
                        "Return any action against the summoner to zero.",
                        "sun",
                    )
                },
            ],
            abilities_minor: vec![
                ability(
                    "Telepathy",
                    "/guardian_ability/minor/telepathy",
                    1,
                    "Speak silently to anyone the guardian can see.",
                    "comment",
                ),
                ability(
                    "Night Vision",
                    "/guardian_ability/minor/night_vision",
                    1,
                    "See clearly in darkness.",
                    "eye",
                ),
                ability(
                    "Scout",
                    "/guardian_ability/minor/scout",
                    2,
                    "Detach and roam as an intangible scout.",
                    "binoculars",
                ),
            ],
            rules: BuildRules::default(),
        }
    }
}
