//! Wire protocol for Tic-Tac-Toe Royale.
//!
//! - **Types** ([`ClientMessage`], [`ServerEvent`]): what travels on the
//!   socket, one JSON object per text frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): text to and from those
//!   types.
//! - **Errors** ([`ProtocolError`]): malformed frames and out-of-range
//!   fields.
//!
//! ```text
//! Transport (text) → Protocol (ClientMessage) → Coordinator
//! Coordinator → Protocol (ServerEvent) → Transport (text)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, ClockView, MAX_USERNAME_LEN, RemainingView, ServerEvent, is_valid_username,
};
