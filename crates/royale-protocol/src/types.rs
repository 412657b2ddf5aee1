//! Wire message types.
//!
//! Every frame is a JSON object with a `type` discriminator in snake_case
//! and camelCase fields:
//!
//! ```json
//! {"type":"make_move","cellIndex":4,"sessionToken":"9f3c..."}
//! {"type":"match_found","opponent":"bob","yourMark":"X","baseTimeMs":30000}
//! ```

use serde::{Deserialize, Serialize};

use royale_game::{Board, CELL_COUNT, GameResult, GameState, Mark};

use crate::ProtocolError;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 16;

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// A message sent by a client.
///
/// `session_token` is optional everywhere. A connection that already joined
/// is recognised without it; a fresh connection can present it to pick up
/// an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinQueue {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
    MakeMove {
        /// Signed so that `-1` parses and is rejected by [`validate`]
        /// rather than failing as a malformed frame.
        ///
        /// [`validate`]: ClientMessage::validate
        cell_index: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
    Resign {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
    Ready {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
}

impl ClientMessage {
    pub fn session_token(&self) -> Option<&str> {
        match self {
            ClientMessage::JoinQueue { session_token, .. }
            | ClientMessage::MakeMove { session_token, .. }
            | ClientMessage::Resign { session_token }
            | ClientMessage::Ready { session_token } => session_token.as_deref(),
        }
    }

    /// Checks field ranges that the JSON shape alone can't express.
    ///
    /// # Errors
    /// `ProtocolError::InvalidMessage` with a client-facing reason.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientMessage::JoinQueue { username, .. } => {
                if !is_valid_username(username) {
                    return Err(ProtocolError::InvalidMessage("Invalid username".into()));
                }
            }
            ClientMessage::MakeMove { cell_index, .. } => {
                if usize::try_from(*cell_index).map_or(true, |i| i >= CELL_COUNT) {
                    return Err(ProtocolError::InvalidMessage("Invalid cell index".into()));
                }
            }
            ClientMessage::Resign { .. } | ClientMessage::Ready { .. } => {}
        }
        Ok(())
    }
}

/// 1 to 16 ASCII letters or digits.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_USERNAME_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// A message pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Queue and match counts. Carries the session token only when sent in
    /// reply to the recipient's own `join_queue`.
    LobbyUpdate {
        players_in_queue: usize,
        active_matches: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
    MatchFound {
        opponent: String,
        your_mark: Mark,
        base_time_ms: u64,
    },
    StateUpdate {
        board: Board,
        current_player: Mark,
        turn_counter: u32,
        clock: ClockView,
        base_time_ms: u64,
        is_rematch: bool,
        rematch_count: u32,
    },
    GameResult {
        result: GameResult,
    },
    RematchStarted {
        base_time_ms: u64,
        rematch_count: u32,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Projects a game into the `state_update` clients render from.
    pub fn state_update(game: &GameState, is_rematch: bool, rematch_count: u32) -> Self {
        ServerEvent::StateUpdate {
            board: game.board,
            current_player: game.current_player,
            turn_counter: game.turn_counter,
            clock: ClockView {
                player_x: RemainingView {
                    remaining_ms: game.clock.player_x.remaining_ms,
                },
                player_o: RemainingView {
                    remaining_ms: game.clock.player_o.remaining_ms,
                },
            },
            base_time_ms: game.clock.base_time_ms,
            is_rematch,
            rematch_count,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

/// Both players' remaining time, without the internal bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    pub player_x: RemainingView,
    pub player_o: RemainingView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingView {
    pub remaining_ms: u64,
}
