//! Error types for the session layer.

use crate::SessionId;

/// Errors that can occur while creating, resuming, or looking up sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another live session already owns this username.
    #[error("Username already taken")]
    UsernameTaken,

    /// No session is stored under this id. It was never created, or it
    /// was removed when its connection closed.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The resume token doesn't belong to any stored session.
    #[error("invalid session token")]
    InvalidToken,
}
