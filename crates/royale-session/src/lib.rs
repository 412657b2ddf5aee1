//! Player sessions and the matchmaking queue.
//!
//! 1. **Sessions** ([`SessionStore`]): who is connected, under which
//!    username, with which resume token and running score.
//! 2. **Queue** ([`Queue`]): who is waiting for an opponent, in arrival
//!    order.
//!
//! ```text
//! Coordinator (above)  ← pairs queued sessions, routes events to handles
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport (below)  ← ServerEvent, ConnectionId
//! ```
//!
//! Neither type is thread-safe on its own. Both are owned by the
//! coordinator task.

mod error;
mod queue;
mod session;
mod store;

pub use error::SessionError;
pub use queue::Queue;
pub use session::{ConnectionHandle, Session, SessionId};
pub use store::{Joined, SessionStore};
