//! In-memory conversation sessions
//!
//! A `SessionStore` maps session ids to their message history. Clones share
//! the same underlying map, so one store can be handed to several agents.
//! The lock is only held for the duration of a map access, never across an
//! `.await`.

use agent_core::{Error, Result};
use agent_llm::Message;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Identifier of a conversation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Conversation state of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Full transcript, tool traffic included
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Completed turns
    pub turns: usize,
}

impl Session {
    fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            last_active: now,
            turns: 0,
        }
    }
}

/// Shared map of session id to session state
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SessionId, Session>>> {
        self.sessions
            .read()
            .map_err(|e| Error::Session(format!("Session store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionId, Session>>> {
        self.sessions
            .write()
            .map_err(|e| Error::Session(format!("Session store lock poisoned: {e}")))
    }

    /// Message history of a session; empty for an unknown id
    pub fn history(&self, id: &SessionId) -> Result<Vec<Message>> {
        Ok(self
            .read()?
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default())
    }

    /// Snapshot of a session
    pub fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Replace the transcript of a session after a completed turn
    ///
    /// The session is created on first commit.
    pub fn commit(&self, id: &SessionId, messages: Vec<Message>) -> Result<()> {
        let mut sessions = self.write()?;
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));
        session.messages = messages;
        session.last_active = Utc::now();
        session.turns += 1;
        debug!(
            session_id = %id,
            turns = session.turns,
            message_count = session.messages.len(),
            "Session committed"
        );
        Ok(())
    }

    /// Drop a session; returns whether it existed
    pub fn evict(&self, id: &SessionId) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    /// Drop every session
    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Ids of all known sessions, sorted
    pub fn session_ids(&self) -> Result<Vec<SessionId>> {
        let mut ids: Vec<SessionId> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Drop sessions inactive for longer than `max_idle`; returns how many were dropped
    pub fn evict_idle(&self, max_idle: Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
        Ok(evicted)
    }
}
