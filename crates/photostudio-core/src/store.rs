//! In-memory session storage.
//!
//! Sessions live only as long as the process. Each one sits behind its own
//! async mutex, so a handler owns its conversation for the whole round trip
//! while other conversations proceed untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use photostudio_proto::ConversationId;
use tracing::debug;

use crate::session::{Session, SessionState};

/// Shared handle to one conversation's session.
pub type SessionSlot = Arc<tokio::sync::Mutex<Session>>;

/// Per-conversation sessions keyed by [`ConversationId`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ConversationId, SessionSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `conversation`, creating an idle one on first use.
    pub fn open(&self, conversation: ConversationId) -> SessionSlot {
        let mut sessions = self.lock();
        sessions
            .entry(conversation)
            .or_insert_with(|| {
                debug!(chat = %conversation, "Opening session");
                Arc::new(tokio::sync::Mutex::new(Session::new(conversation)))
            })
            .clone()
    }

    /// Copy of the current session, waiting for any running handler to finish.
    pub async fn snapshot(&self, conversation: ConversationId) -> Option<Session> {
        let slot = self.lock().get(&conversation).cloned()?;
        let session = slot.lock().await;
        Some(session.clone())
    }

    /// State of the session, `Idle` when none is stored.
    pub async fn state(&self, conversation: ConversationId) -> SessionState {
        self.snapshot(conversation)
            .await
            .map_or(SessionState::Idle, |s| s.state())
    }

    /// Forgets the session for `conversation` if `slot` is the only handle
    /// outside the store.
    ///
    /// Another caller that opened the same slot and is waiting on its lock
    /// keeps the session stored, so its turn lands in the live session.
    /// Returns whether the session was removed.
    pub fn release(&self, conversation: ConversationId, slot: &SessionSlot) -> bool {
        let mut sessions = self.lock();
        let Some(stored) = sessions.get(&conversation) else {
            return false;
        };
        // One count for the map, one for the caller.
        if !Arc::ptr_eq(stored, slot) || Arc::strong_count(slot) > 2 {
            debug!(chat = %conversation, "Session still in use, keeping it");
            return false;
        }
        sessions.remove(&conversation);
        debug!(chat = %conversation, "Released session");
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationId, SessionSlot>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
