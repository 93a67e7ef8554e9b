//! Build kernel: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing.
//!
//! Rules:
//!   - Stats and abilities in ruleset order
//!   - Fixed field order, no whitespace, integers only
//!   - `rules_version` first for identity binding

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{Ability, BuildState};
use crate::RULES_VERSION;

/// Canonical serialization of BuildState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &BuildState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &BuildState) -> String {
    sha256_hex(&canonical_serialize(state))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Field order: rules_version, points, starting_points, stats,
/// abilities_major, abilities_minor, attack_mode, name, color,
/// awaiting_color, finalized.
///
/// Presentation-only text (descriptions, icons) is left out: two builds
/// that differ only in flavour text hash the same.
fn build_canonical_value(state: &BuildState) -> Value {
    let stats: Vec<Value> = state
        .stats
        .iter()
        .map(|s| {
            let mut m = Map::new();
            m.insert("name".to_string(), Value::String(s.name.clone()));
            m.insert("level".to_string(), Value::from(s.level));
            Value::Object(m)
        })
        .collect();

    let mut root = Map::new();
    root.insert("rules_version".to_string(), Value::from(RULES_VERSION));
    root.insert("points".to_string(), Value::from(state.points));
    root.insert(
        "starting_points".to_string(),
        Value::from(state.starting_points),
    );
    root.insert("stats".to_string(), Value::Array(stats));
    root.insert(
        "abilities_major".to_string(),
        canonical_abilities(&state.abilities_major),
    );
    root.insert(
        "abilities_minor".to_string(),
        canonical_abilities(&state.abilities_minor),
    );
    root.insert(
        "attack_mode".to_string(),
        Value::String(state.attack_mode.as_str().to_string()),
    );
    root.insert("name".to_string(), Value::String(state.name.clone()));
    root.insert("color".to_string(), Value::String(state.color.to_string()));
    root.insert(
        "awaiting_color".to_string(),
        Value::Bool(state.awaiting_color),
    );
    root.insert("finalized".to_string(), Value::Bool(state.finalized));
    Value::Object(root)
}

fn canonical_abilities(abilities: &[Ability]) -> Value {
    Value::Array(
        abilities
            .iter()
            .map(|a| {
                let mut m = Map::new();
                m.insert("path".to_string(), Value::String(a.path.clone()));
                m.insert("cost".to_string(), Value::from(a.cost));
                m.insert("available".to_string(), Value::Bool(a.available));
                m.insert("selected".to_string(), Value::Bool(a.selected));
                Value::Object(m)
            })
            .collect(),
    )
}
