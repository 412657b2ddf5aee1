//! The session store: every player currently known to the server.
//!
//! # Lifecycle
//!
//! ```text
//! create_or_resume() ──→ [stored] ──→ remove()   (connection closed)
//!                           │  ↑
//!                           └──┘ create_or_resume(token) / resume(token)
//!                                (same session, new connection)
//! ```
//!
//! Sessions are removed outright when their connection closes. A token
//! is therefore only useful while the original connection is still
//! open, or to re-bind a second socket before the first one drops.

use std::collections::HashMap;

use rand::Rng;
use royale_game::PlayerScore;
use tracing::{debug, info};

use crate::{ConnectionHandle, Session, SessionError, SessionId};

/// How [`SessionStore::create_or_resume`] satisfied a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joined {
    /// A fresh session with a zeroed score.
    Created(SessionId),
    /// An existing session, now bound to the new connection.
    Resumed(SessionId),
}

impl Joined {
    pub fn id(self) -> SessionId {
        match self {
            Joined::Created(id) | Joined::Resumed(id) => id,
        }
    }
}

/// Arena of sessions keyed by monotonically allocated [`SessionId`]s.
///
/// Two indexes are kept in sync with `sessions`: resume token → id, and
/// username → id. The second enforces that a username is held by at most
/// one live session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    tokens: HashMap<String, SessionId>,
    usernames: HashMap<String, SessionId>,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `username` on `handle`.
    ///
    /// If `resume_token` names a stored session with the same username,
    /// that session is re-bound to `handle`. Otherwise a new session is
    /// created, unless the username already belongs to someone else.
    ///
    /// # Errors
    /// [`SessionError::UsernameTaken`] if another live session holds
    /// `username`.
    pub fn create_or_resume(
        &mut self,
        username: &str,
        handle: ConnectionHandle,
        resume_token: Option<&str>,
        now_ms: u64,
    ) -> Result<Joined, SessionError> {
        if let Some(id) = resume_token.and_then(|t| self.by_token(t)) {
            if let Some(session) = self.sessions.get_mut(&id) {
                if session.username == username {
                    session.handle = handle;
                    session.last_seen_ms = now_ms;
                    info!(session_id = %id, %username, conn_id = %session.handle.id(), "session resumed");
                    return Ok(Joined::Resumed(id));
                }
            }
            debug!(%username, "resume token belongs to another username, ignoring it");
        }

        if self.usernames.contains_key(username) {
            return Err(SessionError::UsernameTaken);
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let token = generate_token();
        let conn_id = handle.id();

        self.tokens.insert(token.clone(), id);
        self.usernames.insert(username.to_owned(), id);
        self.sessions.insert(
            id,
            Session {
                id,
                username: username.to_owned(),
                token,
                handle,
                last_seen_ms: now_ms,
                score: PlayerScore::new(username),
            },
        );

        info!(session_id = %id, %username, %conn_id, "session created");
        Ok(Joined::Created(id))
    }

    /// Re-binds the session owning `token` to `handle`, without a
    /// username check. Returns the handle it replaced.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] if no session owns `token`.
    pub fn resume(
        &mut self,
        token: &str,
        handle: ConnectionHandle,
    ) -> Result<(SessionId, ConnectionHandle), SessionError> {
        let id = self.by_token(token).ok_or(SessionError::InvalidToken)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::InvalidToken)?;

        let previous = std::mem::replace(&mut session.handle, handle);
        info!(session_id = %id, conn_id = %session.handle.id(), "session re-bound by token");
        Ok((id, previous))
    }

    /// Records activity from a session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session is gone.
    pub fn touch(&mut self, id: SessionId, now_ms: u64) -> Result<(), SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.last_seen_ms = now_ms;
        Ok(())
    }

    /// Deletes a session and frees its username and token.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        self.tokens.remove(&session.token);
        self.usernames.remove(&session.username);
        info!(session_id = %id, username = %session.username, "session removed");
        Some(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn by_token(&self, token: &str) -> Option<SessionId> {
        self.tokens.get(token).copied()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}

/// 32 lowercase hex characters (128 random bits).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
