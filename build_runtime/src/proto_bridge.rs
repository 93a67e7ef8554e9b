//! Proto ↔ kernel conversion bridge.
//!
//! Journal records are decoded back into typed `BuildAction`s; anything the
//! kernel could not have produced is an `InvalidRecord`.

use build_engine::actions::BuildAction;
use build_engine::domain::{AttackMode, Rgb};
use build_engine::RULES_VERSION;

use crate::error::JournalError;
use crate::proto_types::*;

/// Wrap a kernel action into a journal record.
pub fn action_to_proto(sequence: u64, action: &BuildAction) -> ProtoActionRecord {
    let kind = match action {
        BuildAction::SetName { name } => ActionKind::SetName(SetName { name: name.clone() }),
        BuildAction::RequestColor => ActionKind::RequestColor(RequestColor {}),
        BuildAction::SetColor { color } => ActionKind::SetColor(SetColor {
            rgb: rgb_to_u32(*color),
        }),
        BuildAction::Reset => ActionKind::Reset(Reset {}),
        BuildAction::SwitchAttackMode { mode } => {
            let mode = match mode {
                AttackMode::Melee => ProtoAttackMode::Melee,
                AttackMode::Ranged => ProtoAttackMode::Ranged,
            };
            ActionKind::SwitchAttackMode(SwitchAttackMode { mode: mode as i32 })
        }
        BuildAction::SetStat { name, level } => ActionKind::SetStat(SetStat {
            name: name.clone(),
            level: u32::from(*level),
        }),
        BuildAction::SelectMajor { path } => {
            ActionKind::SelectMajor(SelectAbility { path: path.clone() })
        }
        BuildAction::SelectMinor { path } => {
            ActionKind::SelectMinor(SelectAbility { path: path.clone() })
        }
        BuildAction::Finalize => ActionKind::Finalize(Finalize {}),
    };

    ProtoActionRecord {
        sequence,
        rules_version: RULES_VERSION,
        action: Some(ProtoAction { kind: Some(kind) }),
        ruleset_digest: String::new(),
    }
}

/// Decode a journal record into a kernel action.
pub fn proto_to_action(record: &ProtoActionRecord) -> Result<BuildAction, JournalError> {
    let sequence = record.sequence;
    if record.rules_version != RULES_VERSION {
        return Err(JournalError::RulesVersion {
            sequence,
            found: record.rules_version,
            expected: RULES_VERSION,
        });
    }
    let kind = record
        .action
        .as_ref()
        .and_then(|a| a.kind.as_ref())
        .ok_or(JournalError::MissingAction { sequence })?;
    let invalid = |reason: String| JournalError::InvalidRecord { sequence, reason };

    let action = match kind {
        ActionKind::SetName(m) => BuildAction::SetName {
            name: m.name.clone(),
        },
        ActionKind::RequestColor(_) => BuildAction::RequestColor,
        ActionKind::SetColor(m) => BuildAction::SetColor {
            color: rgb_from_u32(m.rgb).ok_or_else(|| invalid(format!("colour {:#x}", m.rgb)))?,
        },
        ActionKind::Reset(_) => BuildAction::Reset,
        ActionKind::SwitchAttackMode(m) => {
            let mode = match ProtoAttackMode::try_from(m.mode) {
                Ok(ProtoAttackMode::Melee) => AttackMode::Melee,
                Ok(ProtoAttackMode::Ranged) => AttackMode::Ranged,
                Err(_) => return Err(invalid(format!("attack mode {}", m.mode))),
            };
            BuildAction::SwitchAttackMode { mode }
        }
        ActionKind::SetStat(m) => BuildAction::SetStat {
            name: m.name.clone(),
            level: u8::try_from(m.level).map_err(|_| invalid(format!("level {}", m.level)))?,
        },
        ActionKind::SelectMajor(m) => BuildAction::SelectMajor {
            path: m.path.clone(),
        },
        ActionKind::SelectMinor(m) => BuildAction::SelectMinor {
            path: m.path.clone(),
        },
        ActionKind::Finalize(_) => BuildAction::Finalize,
    };
    Ok(action)
}

fn rgb_to_u32(color: Rgb) -> u32 {
    (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
}

fn rgb_from_u32(value: u32) -> Option<Rgb> {
    if value > 0xFF_FFFF {
        return None;
    }
    let [_, r, g, b] = value.to_be_bytes();
    Some(Rgb::new(r, g, b))
}
