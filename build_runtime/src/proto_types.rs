//! Hand-written protobuf types for the action journal.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format; never renumber.

use prost::Message;

// ── Record envelope ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoActionRecord {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint32, tag = "2")]
    pub rules_version: u32,
    #[prost(message, optional, tag = "3")]
    pub action: Option<ProtoAction>,
    /// Digest of the ruleset the action was accepted under.
    #[prost(string, tag = "4")]
    pub ruleset_digest: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoAction {
    #[prost(oneof = "ActionKind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub kind: Option<ActionKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum ActionKind {
    #[prost(message, tag = "1")]
    SetName(SetName),
    #[prost(message, tag = "2")]
    RequestColor(RequestColor),
    #[prost(message, tag = "3")]
    SetColor(SetColor),
    #[prost(message, tag = "4")]
    Reset(Reset),
    #[prost(message, tag = "5")]
    SwitchAttackMode(SwitchAttackMode),
    #[prost(message, tag = "6")]
    SetStat(SetStat),
    #[prost(message, tag = "7")]
    SelectMajor(SelectAbility),
    #[prost(message, tag = "8")]
    SelectMinor(SelectAbility),
    #[prost(message, tag = "9")]
    Finalize(Finalize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoAttackMode {
    Melee = 0,
    Ranged = 1,
}

// ── Action payloads ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct SetName {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct RequestColor {}

#[derive(Clone, PartialEq, Message)]
pub struct SetColor {
    /// 0xRRGGBB
    #[prost(uint32, tag = "1")]
    pub rgb: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Reset {}

#[derive(Clone, PartialEq, Message)]
pub struct SwitchAttackMode {
    #[prost(enumeration = "ProtoAttackMode", tag = "1")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetStat {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint32, tag = "2")]
    pub level: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SelectAbility {
    #[prost(string, tag = "1")]
    pub path: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Finalize {}
