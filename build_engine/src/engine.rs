//! Build kernel: Engine
//!
//! Top-level orchestrator. Owns the build, delegates mutation to
//! transitions and validates every candidate via invariants before
//! committing it. A rejected action leaves the committed state untouched.

use tracing::{debug, error, info, warn};

use crate::actions::{ActionRequest, BuildAction};
use crate::domain::{AttackMode, BuildState, Rgb, TransitionOutcome};
use crate::error::{BuildError, Rejection};
use crate::hashing::canonical_hash;
use crate::invariants::{validate_invariants, InvariantViolation};
use crate::legality;
use crate::ruleset::Ruleset;
use crate::state::create_initial_state;
use crate::transitions::apply_action;
use crate::view::BuildSnapshot;

/// Single-writer rules engine for one build session.
#[derive(Debug, Clone)]
pub struct BuildEngine {
    state: BuildState,
    applied: u64,
}

impl BuildEngine {
    /// Fresh build from a validated ruleset.
    pub fn new(ruleset: &Ruleset) -> Self {
        Self {
            state: create_initial_state(ruleset),
            applied: 0,
        }
    }

    /// Resume from a previously committed state (checkpoint restore).
    pub fn from_state(state: BuildState) -> Result<Self, InvariantViolation> {
        validate_invariants(&state)?;
        Ok(Self { state, applied: 0 })
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Accepted actions since construction.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn points(&self) -> u32 {
        self.state.points
    }

    pub fn is_finalized(&self) -> bool {
        self.state.finalized
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        BuildSnapshot::from_state(&self.state)
    }

    pub fn state_hash(&self) -> String {
        canonical_hash(&self.state)
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn can_set_stat_level(&self, name: &str, level: u8) -> bool {
        legality::can_set_stat_level(&self.state, name, level)
    }

    pub fn can_select_major(&self, path: &str) -> bool {
        legality::can_select_major(&self.state, path)
    }

    pub fn can_select_minor(&self, path: &str) -> bool {
        legality::can_select_minor(&self.state, path)
    }

    pub fn can_switch_attack_mode(&self, mode: AttackMode) -> bool {
        legality::can_switch_attack_mode(&self.state, mode)
    }

    pub fn can_finalize(&self) -> bool {
        legality::can_finalize(&self.state)
    }

    // ── Transitions ────────────────────────────────────────────────

    pub fn set_stat_level(&mut self, name: &str, level: u8) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SetStat {
            name: name.to_string(),
            level,
        })
    }

    pub fn select_major(&mut self, path: &str) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SelectMajor {
            path: path.to_string(),
        })
    }

    pub fn select_minor(&mut self, path: &str) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SelectMinor {
            path: path.to_string(),
        })
    }

    pub fn switch_attack_mode(&mut self, mode: AttackMode) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SwitchAttackMode { mode })
    }

    pub fn reset_all(&mut self) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::Reset)
    }

    pub fn set_name(&mut self, name: &str) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SetName {
            name: name.to_string(),
        })
    }

    pub fn request_color(&mut self) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::RequestColor)
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::SetColor { color })
    }

    pub fn finalize(&mut self) -> Result<TransitionOutcome, BuildError> {
        self.apply(&BuildAction::Finalize)
    }

    /// Parse a transport request and apply it.
    pub fn apply_request(&mut self, request: &ActionRequest) -> Result<TransitionOutcome, BuildError> {
        let action = BuildAction::from_request(request).inspect_err(|e| {
            warn!(action = %request.action, code = e.code(), "rejected request: {e}");
        })?;
        self.apply(&action)
    }

    /// Apply a single action:
    ///   1. Delegate to transitions (legality check + mutation of a clone)
    ///   2. Validate invariants on the candidate
    ///   3. Commit
    pub fn apply(&mut self, action: &BuildAction) -> Result<TransitionOutcome, BuildError> {
        let (next, outcome) = match apply_action(&self.state, action) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(action = action.kind(), code = e.code(), "rejected: {e}");
                return Err(e);
            }
        };

        if let Err(violation) = validate_invariants(&next) {
            error!(action = action.kind(), "candidate state discarded: {violation}");
            return Err(Rejection::InvariantViolated(violation).into());
        }

        self.state = next;
        self.applied += 1;

        if outcome.finalized {
            info!(guardian = self.state.display_name(), points = self.state.points, "build finalized");
        } else {
            debug!(
                action = action.kind(),
                points_before = outcome.points_before,
                points_after = outcome.points_after,
                changed = outcome.changed,
                "applied"
            );
        }
        Ok(outcome)
    }

    /// Apply an ordered sequence of actions, stopping at the first rejection.
    pub fn apply_sequence(&mut self, actions: &[BuildAction]) -> Result<&BuildState, BuildError> {
        for action in actions {
            self.apply(action)?;
        }
        Ok(&self.state)
    }
}
