//! Error types for the server.

use royale_game::MoveRejection;
use royale_protocol::ProtocolError;
use royale_session::SessionError;
use royale_transport::TransportError;

/// Top-level error that wraps the crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum RoyaleError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The coordinator task has stopped, so its channel is closed.
    #[error("match coordinator is unavailable")]
    Unavailable,
}

/// Why a client request was refused.
///
/// The `Display` text is exactly what the client receives in its `error`
/// event. None of these change server state.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Field out of range, e.g. a bad username or cell index.
    #[error("{0}")]
    Invalid(String),

    /// The connection has no session and presented no usable token.
    #[error("Must join queue first")]
    NotJoined,

    /// This connection is already bound to another username.
    #[error("Already joined as {0}")]
    AlreadyJoined(String),

    #[error("Not in a match")]
    NotInMatch,

    #[error(transparent)]
    Move(#[from] MoveRejection),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ProtocolError> for RequestError {
    fn from(err: ProtocolError) -> Self {
        RequestError::Invalid(err.client_message())
    }
}
