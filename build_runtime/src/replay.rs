//! Replay orchestrator: rebuild a build from its action history.
//!
//! Delegates all rules to the kernel. No shortcuts, no cached state.

use build_engine::actions::BuildAction;
use build_engine::domain::BuildState;
use build_engine::engine::BuildEngine;
use build_engine::ruleset::Ruleset;

use crate::error::{JournalError, SessionError};
use crate::proto_bridge::proto_to_action;
use crate::proto_types::ProtoActionRecord;

/// Rebuild the build from *actions* on a fresh engine and return
/// `(final_state, canonical_hash)`. Any rejection aborts the replay:
/// a journal only ever holds accepted actions.
pub fn rebuild_state(
    ruleset: &Ruleset,
    actions: &[BuildAction],
) -> Result<(BuildState, String), SessionError> {
    let mut engine = BuildEngine::new(ruleset);
    engine.apply_sequence(actions)?;
    let hash = engine.state_hash();
    Ok((engine.state().clone(), hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(ruleset: &Ruleset, actions: &[BuildAction]) -> Result<String, SessionError> {
    rebuild_state(ruleset, actions).map(|(_, hash)| hash)
}

/// Replay twice and require identical hashes.
pub fn verify_determinism(
    ruleset: &Ruleset,
    actions: &[BuildAction],
) -> Result<String, SessionError> {
    let first = rebuild_hash(ruleset, actions)?;
    let second = rebuild_hash(ruleset, actions)?;
    if first != second {
        return Err(SessionError::Nondeterministic { first, second });
    }
    Ok(first)
}

/// Decode journal records into kernel actions.
pub fn decode_records(records: &[ProtoActionRecord]) -> Result<Vec<BuildAction>, JournalError> {
    records.iter().map(proto_to_action).collect()
}
