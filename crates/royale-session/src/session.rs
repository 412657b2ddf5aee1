//! Session types: a player's identity plus the connection currently
//! carrying their traffic.

use std::fmt;

use royale_game::PlayerScore;
use royale_protocol::ServerEvent;
use royale_transport::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Unique identifier for a session.
///
/// Allocated from a counter in [`SessionStore`](crate::SessionStore) and
/// never reused, so a stale id can only miss, never alias another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// The outbound side of one client connection.
///
/// Events pushed here are picked up by the connection's task and written
/// to the socket. Delivery is fire-and-forget: once the connection task
/// has gone away, sends are silently dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, tx }
    }

    /// Creates a handle together with the receiver its events arrive on.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an event for the client. Returns `false` if the connection
    /// is already gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One player's record on the server.
///
/// Lives from the first `join_queue` until its connection closes. A
/// client that reconnects with the token before that keeps the same
/// session, score included.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) username: String,
    pub(crate) token: String,

    /// Where events for this player are delivered. Replaced on resume.
    pub handle: ConnectionHandle,

    /// Clock millisecond of the last message from this player.
    pub last_seen_ms: u64,

    pub score: PlayerScore,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The 32-character hex resume token handed to the client.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Sends an event on the session's current connection.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.handle.send(event)
    }
}
