//! Sockets for Tic-Tac-Toe Royale.
//!
//! Everything above this crate talks in [`ConnectionId`]s and text frames.
//! A [`Transport`] hands out peers, and each peer is a [`Connection`] that
//! can be read and written from a single `select!` loop.
//!
//! With the default `websocket` feature the concrete types are
//! [`WebSocketTransport`] and [`WebSocketConnection`], built on
//! `tokio-tungstenite`.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-unique id of one accepted peer. Shown as `conn-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new peers.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves once the next peer has connected and finished its upgrade.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One peer, exchanging UTF-8 frames.
///
/// A handler races `recv` against its outbound queue, so a pending `recv`
/// must never hold up a `send` on the same connection.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Next frame from the peer, or `None` once it has said goodbye.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
