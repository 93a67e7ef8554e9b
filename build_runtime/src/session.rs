//! Session manager: isolated build sessions with persist-after-apply semantics.
//!
//! Each session owns one engine. Persistent sessions also own a directory
//! with an action journal and checkpoints. Concurrency: one Mutex per
//! session serializes its actions; sessions share nothing.
//!
//! Apply-before-persist order:
//!   1. kernel applies the action to a copy of the engine
//!   2. journal append, only if step 1 succeeded
//!   3. commit the copy
//!   4. checkpoint if the interval is reached

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use build_engine::actions::{ActionRequest, BuildAction};
use build_engine::domain::{BuildState, TransitionOutcome};
use build_engine::engine::BuildEngine;
use build_engine::ruleset::Ruleset;
use build_engine::view::BuildSnapshot;

use crate::error::{SessionError, SnapshotError};
use crate::journal::ActionJournal;
use crate::proto_bridge::action_to_proto;
use crate::proto_types::ProtoActionRecord;
use crate::replay::decode_records;
use crate::snapshot;

struct Storage {
    dir: PathBuf,
    journal: ActionJournal,
    checkpoint_interval: u64,
    ruleset_digest: String,
}

impl Storage {
    fn checkpoint_dir(&self) -> PathBuf {
        self.dir.join("checkpoints")
    }
}

/// One build session: a single writer over one engine.
pub struct Session {
    session_id: String,
    ruleset: Ruleset,
    engine: BuildEngine,
    history: Vec<BuildAction>,
    storage: Option<Storage>,
}

impl Session {
    /// A session that lives only in memory.
    pub fn in_memory(session_id: &str, ruleset: Ruleset) -> Self {
        info!(session = session_id, "session created");
        Self {
            session_id: session_id.to_string(),
            engine: BuildEngine::new(&ruleset),
            ruleset,
            history: Vec::new(),
            storage: None,
        }
    }

    /// Open or create a persistent session under *base_dir*.
    ///
    /// Directory structure:
    ///   <base_dir>/<session_id>/actions.log
    ///   <base_dir>/<session_id>/checkpoints/
    ///
    /// An existing journal is replayed, starting from the latest valid
    /// checkpoint when there is one. A journal written under a different
    /// ruleset is refused.
    pub fn open(
        base_dir: &Path,
        session_id: &str,
        ruleset: Ruleset,
        checkpoint_interval: u64,
    ) -> Result<Self, SessionError> {
        ruleset.validate()?;
        let ruleset_digest = ruleset.digest()?;
        let dir = base_dir.join(session_id);
        let journal = ActionJournal::open(&dir.join("actions.log"))?;

        let records = journal.load_all()?;
        if let Some(foreign) = records.iter().find(|r| r.ruleset_digest != ruleset_digest) {
            return Err(SessionError::RulesetMismatch {
                sequence: foreign.sequence,
            });
        }
        let history = decode_records(&records)?;

        let storage = Storage {
            dir,
            journal,
            checkpoint_interval,
            ruleset_digest,
        };
        let engine = resume(&ruleset, &storage, &history)?;
        info!(
            session = session_id,
            replayed = history.len(),
            "session opened"
        );

        Ok(Self {
            session_id: session_id.to_string(),
            ruleset,
            engine,
            history,
            storage: Some(storage),
        })
    }

    /// Parse and apply a transport request.
    pub fn apply(
        &mut self,
        request: &ActionRequest,
    ) -> Result<(BuildSnapshot, TransitionOutcome), SessionError> {
        let action = BuildAction::from_request(request)?;
        self.apply_action(&action)
    }

    /// Apply one action. On any failure the session is unchanged.
    pub fn apply_action(
        &mut self,
        action: &BuildAction,
    ) -> Result<(BuildSnapshot, TransitionOutcome), SessionError> {
        let mut next = self.engine.clone();
        let outcome = next.apply(action)?;

        let sequence = self.current_sequence() + 1;
        if let Some(storage) = self.storage.as_mut() {
            let record = ProtoActionRecord {
                ruleset_digest: storage.ruleset_digest.clone(),
                ..action_to_proto(sequence, action)
            };
            storage.journal.append(&record)?;

            if storage.checkpoint_interval > 0 && sequence % storage.checkpoint_interval == 0 {
                if let Err(e) = snapshot::save_checkpoint(
                    &storage.checkpoint_dir(),
                    sequence,
                    next.state(),
                    &storage.ruleset_digest,
                ) {
                    warn!(session = %self.session_id, sequence, "checkpoint skipped: {e}");
                }
            }
        }

        self.engine = next;
        self.history.push(action.clone());
        debug!(
            session = %self.session_id,
            sequence,
            action = action.kind(),
            points = self.engine.points(),
            "session applied"
        );

        Ok((self.engine.snapshot(), outcome))
    }

    /// Rebuild the engine from the recorded history.
    pub fn replay_full(&mut self) -> Result<(BuildState, String), SessionError> {
        let mut engine = BuildEngine::new(&self.ruleset);
        engine.apply_sequence(&self.history)?;
        let replayed = (engine.state().clone(), engine.state_hash());
        self.engine = engine;
        Ok(replayed)
    }

    pub fn engine(&self) -> &BuildEngine {
        &self.engine
    }

    pub fn state(&self) -> &BuildState {
        self.engine.state()
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        self.engine.snapshot()
    }

    pub fn current_hash(&self) -> String {
        self.engine.state_hash()
    }

    /// Number of accepted actions in this session's history.
    pub fn current_sequence(&self) -> u64 {
        self.history.len() as u64
    }

    pub fn history(&self) -> &[BuildAction] {
        &self.history
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }
}

/// Restore from the newest usable checkpoint and replay the journal tail
/// after it. Any checkpoint problem falls back to a full replay.
fn resume(
    ruleset: &Ruleset,
    storage: &Storage,
    history: &[BuildAction],
) -> Result<BuildEngine, SessionError> {
    let checkpoint = snapshot::load_latest_checkpoint(&storage.checkpoint_dir())
        .unwrap_or_else(|e| {
            warn!("ignoring unreadable checkpoints: {e}");
            None
        });

    if let Some(checkpoint) = checkpoint.filter(|c| c.sequence <= history.len() as u64) {
        let tail = &history[checkpoint.sequence as usize..];
        let resumed = checkpoint
            .restore(&storage.ruleset_digest)
            .map_err(SessionError::from)
            .and_then(|state| replay_tail(state, tail));
        match resumed {
            Ok(engine) => return Ok(engine),
            Err(e) => warn!(
                sequence = checkpoint.sequence,
                "checkpoint unusable, replaying journal: {e}"
            ),
        }
    }

    let mut engine = BuildEngine::new(ruleset);
    engine.apply_sequence(history)?;
    Ok(engine)
}

fn replay_tail(state: BuildState, tail: &[BuildAction]) -> Result<BuildEngine, SessionError> {
    let mut engine = BuildEngine::from_state(state).map_err(SnapshotError::InvariantViolation)?;
    engine.apply_sequence(tail)?;
    Ok(engine)
}

/// Thread-safe session handle. Every call takes the session lock, so two
/// actions for the same session never interleave.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Run *f* with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R, SessionError> {
        let mut session = self.inner.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(f(&mut session))
    }

    pub fn apply(
        &self,
        request: &ActionRequest,
    ) -> Result<(BuildSnapshot, TransitionOutcome), SessionError> {
        self.with(|s| s.apply(request))?
    }

    pub fn apply_action(
        &self,
        action: &BuildAction,
    ) -> Result<(BuildSnapshot, TransitionOutcome), SessionError> {
        self.with(|s| s.apply_action(action))?
    }

    /// Read-only access to the engine, for `can_*` queries.
    pub fn query<R>(&self, f: impl FnOnce(&BuildEngine) -> R) -> Result<R, SessionError> {
        self.with(|s| f(s.engine()))
    }

    pub fn snapshot(&self) -> Result<BuildSnapshot, SessionError> {
        self.with(|s| s.snapshot())
    }

    pub fn current_hash(&self) -> Result<String, SessionError> {
        self.with(|s| s.current_hash())
    }

    pub fn current_sequence(&self) -> Result<u64, SessionError> {
        self.with(|s| s.current_sequence())
    }
}
