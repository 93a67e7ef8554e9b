#![forbid(unsafe_code)]

//! Point-budget rules kernel for guardian builds.
//!
//! All state mutation flows through [`engine::BuildEngine`]; presentation
//! calls the `can_*` queries and renders accordingly.

/// Rules v1. Bound into every canonical hash.
pub const RULES_VERSION: u32 = 1;

pub mod actions;
pub mod budget;
pub mod domain;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod invariants;
pub mod legality;
pub mod ruleset;
pub mod state;
pub mod transitions;
pub mod view;

pub use actions::{ActionRequest, BuildAction};
pub use domain::{
    Ability, AbilityGroup, AttackMode, BuildRules, BuildState, MajorRequirement, MajorReselect,
    Rgb, Stat, TransitionOutcome,
};
pub use engine::BuildEngine;
pub use error::{BuildError, Incomplete, Rejection, RulesetError, TargetKind};
pub use ruleset::{AbilitySpec, Ruleset, StatSpec};
pub use view::BuildSnapshot;
