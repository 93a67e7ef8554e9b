//! Build kernel: Action Definitions
//!
//! Actions are pure data. They carry intent and payload only and contain
//! no transition logic. Inbound `(name, payload)` requests are parsed into
//! a closed [`BuildAction`] before they reach the kernel.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::{AttackMode, Rgb};
use crate::error::BuildError;

/// Transport envelope: an action name and a loosely typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

impl ActionRequest {
    pub fn new(action: &str, payload: Value) -> Self {
        Self {
            action: action.to_string(),
            payload,
        }
    }

    /// A request with an empty payload.
    pub fn bare(action: &str) -> Self {
        Self::new(action, Value::Object(Map::new()))
    }
}

/// Every transition the kernel understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAction {
    SetName { name: String },
    /// Ask the external colour picker for a value.
    RequestColor,
    SetColor { color: Rgb },
    Reset,
    SwitchAttackMode { mode: AttackMode },
    SetStat { name: String, level: u8 },
    SelectMajor { path: String },
    SelectMinor { path: String },
    /// `spawn`: finalize the build.
    Finalize,
}

impl BuildAction {
    /// Wire name of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildAction::SetName { .. } => "set_name",
            BuildAction::RequestColor => "color",
            BuildAction::SetColor { .. } => "set_color",
            BuildAction::Reset => "reset",
            BuildAction::SwitchAttackMode {
                mode: AttackMode::Melee,
            } => "melee",
            BuildAction::SwitchAttackMode {
                mode: AttackMode::Ranged,
            } => "ranged",
            BuildAction::SetStat { .. } => "set",
            BuildAction::SelectMajor { .. } => "ability_major",
            BuildAction::SelectMinor { .. } => "ability_minor",
            BuildAction::Finalize => "spawn",
        }
    }

    /// Parse an inbound request. Unknown names and missing or ill-typed
    /// payload fields are `MalformedAction`.
    pub fn from_request(request: &ActionRequest) -> Result<Self, BuildError> {
        let name = request.action.as_str();
        let p = &request.payload;

        let action = match name {
            "set_name" | "name" => BuildAction::SetName {
                name: str_field(name, p, "name")?.to_string(),
            },
            "color" => BuildAction::RequestColor,
            "set_color" => {
                let raw = str_field(name, p, "value")?;
                let color = raw
                    .parse::<Rgb>()
                    .map_err(|e| BuildError::malformed(name, e.to_string()))?;
                BuildAction::SetColor { color }
            }
            "reset" => BuildAction::Reset,
            "melee" => BuildAction::SwitchAttackMode {
                mode: AttackMode::Melee,
            },
            "ranged" => BuildAction::SwitchAttackMode {
                mode: AttackMode::Ranged,
            },
            "set" => {
                let level = p
                    .get("level")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| BuildError::malformed(name, "missing integer 'level'"))?;
                // Saturate so the kernel reports an oversized level as out of range.
                let level = u8::try_from(level).unwrap_or(u8::MAX);
                BuildAction::SetStat {
                    name: str_field(name, p, "name")?.to_string(),
                    level,
                }
            }
            "ability_major" => BuildAction::SelectMajor {
                path: str_field(name, p, "path")?.to_string(),
            },
            "ability_minor" => BuildAction::SelectMinor {
                path: str_field(name, p, "path")?.to_string(),
            },
            "spawn" => BuildAction::Finalize,
            _ => return Err(BuildError::malformed(name, "unknown action")),
        };
        Ok(action)
    }

    /// Render back into a transport request.
    pub fn to_request(&self) -> ActionRequest {
        let payload = match self {
            BuildAction::SetName { name } => json!({ "name": name }),
            BuildAction::SetColor { color } => json!({ "value": color.to_string() }),
            BuildAction::SetStat { name, level } => json!({ "name": name, "level": level }),
            BuildAction::SelectMajor { path } | BuildAction::SelectMinor { path } => {
                json!({ "path": path })
            }
            BuildAction::RequestColor
            | BuildAction::Reset
            | BuildAction::SwitchAttackMode { .. }
            | BuildAction::Finalize => Value::Object(Map::new()),
        };
        ActionRequest::new(self.kind(), payload)
    }
}

fn str_field<'a>(action: &str, payload: &'a Value, field: &str) -> Result<&'a str, BuildError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| BuildError::malformed(action, format!("missing string '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(action: &str, payload: Value) -> Result<BuildAction, BuildError> {
        BuildAction::from_request(&ActionRequest::new(action, payload))
    }

    #[test]
    fn parses_every_transport_action() {
        assert_eq!(
            parse("set", json!({"name": "Speed", "level": 3})),
            Ok(BuildAction::SetStat {
                name: "Speed".to_string(),
                level: 3
            })
        );
        assert_eq!(
            parse("name", json!({"name": "Star"})),
            parse("set_name", json!({"name": "Star"}))
        );
        assert_eq!(
            parse("set_color", json!({"value": "#00ff00"})),
            Ok(BuildAction::SetColor {
                color: Rgb::new(0, 0xFF, 0)
            })
        );
        assert_eq!(parse("color", json!({})), Ok(BuildAction::RequestColor));
        assert_eq!(parse("reset", Value::Null), Ok(BuildAction::Reset));
        assert_eq!(
            parse("ranged", json!({})),
            Ok(BuildAction::SwitchAttackMode {
                mode: AttackMode::Ranged
            })
        );
        assert_eq!(parse("spawn", json!({})), Ok(BuildAction::Finalize));
        assert_eq!(
            parse("ability_minor", json!({"path": "/m"})),
            Ok(BuildAction::SelectMinor {
                path: "/m".to_string()
            })
        );
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        for (action, payload) in [
            ("set", json!({"name": "Speed"})),
            ("set", json!({"name": "Speed", "level": "3"})),
            ("set", json!({"name": "Speed", "level": -1})),
            ("ability_major", json!({})),
            ("set_color", json!({"value": "red"})),
            ("dance", json!({})),
        ] {
            let err = parse(action, payload).unwrap_err();
            assert_eq!(err.code(), "malformed_action", "{action}");
        }
    }

    #[test]
    fn oversized_level_saturates() {
        assert_eq!(
            parse("set", json!({"name": "Speed", "level": 300})),
            Ok(BuildAction::SetStat {
                name: "Speed".to_string(),
                level: u8::MAX,
            })
        );
    }

    #[test]
    fn to_request_parses_back() {
        let actions = [
            BuildAction::SetStat {
                name: "Damage".to_string(),
                level: 5,
            },
            BuildAction::SetColor {
                color: Rgb::new(9, 8, 7),
            },
            BuildAction::SwitchAttackMode {
                mode: AttackMode::Melee,
            },
            BuildAction::Finalize,
        ];
        for action in actions {
            assert_eq!(BuildAction::from_request(&action.to_request()), Ok(action));
        }
    }

    #[test]
    fn request_deserializes_without_payload() {
        let req: ActionRequest = serde_json::from_str(r#"{"action": "reset"}"#).unwrap();
        assert_eq!(req.payload, Value::Null);
        assert_eq!(BuildAction::from_request(&req), Ok(BuildAction::Reset));
    }
}
