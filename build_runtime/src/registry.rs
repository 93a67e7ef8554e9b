//! Session registry: id → shared session.
//!
//! The map lock is held only for lookup and insertion; actions run under
//! each session's own lock, so sessions never block one another.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use build_engine::ruleset::Ruleset;

use crate::error::SessionError;
use crate::session::{Session, SharedSession};

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<String, Arc<SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_in_memory(
        &self,
        session_id: &str,
        ruleset: Ruleset,
    ) -> Result<Arc<SharedSession>, SessionError> {
        ruleset.validate()?;
        self.insert(session_id, || Ok(Session::in_memory(session_id, ruleset)))
    }

    /// Open a persistent session, recovering any journal already on disk.
    pub fn open(
        &self,
        base_dir: &Path,
        session_id: &str,
        ruleset: Ruleset,
        checkpoint_interval: u64,
    ) -> Result<Arc<SharedSession>, SessionError> {
        self.insert(session_id, || {
            Session::open(base_dir, session_id, ruleset, checkpoint_interval)
        })
    }

    fn insert(
        &self,
        session_id: &str,
        build: impl FnOnce() -> Result<Session, SessionError>,
    ) -> Result<Arc<SharedSession>, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        if sessions.contains_key(session_id) {
            return Err(SessionError::DuplicateSession(session_id.to_string()));
        }
        let session = build()?;
        let persistent = session.is_persistent();
        let shared = Arc::new(SharedSession::new(session));
        sessions.insert(session_id.to_string(), Arc::clone(&shared));
        info!(
            session = session_id,
            persistent,
            total = sessions.len(),
            "session registered"
        );
        Ok(shared)
    }

    pub fn get(&self, session_id: &str) -> Result<Arc<SharedSession>, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::Poisoned)?;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))
    }

    /// Drop a session from the registry. Files on disk are left in place.
    pub fn discard(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        sessions
            .remove(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        info!(session = session_id, "session discarded");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions
            .read()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }
}
