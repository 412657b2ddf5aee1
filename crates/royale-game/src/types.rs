//! Board, clock, and result types shared by the engine, scoring, and the
//! wire protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Increment granted per move once the base time is at or below
/// [`INCREMENT_THRESHOLD_MS`].
pub const INCREMENT_MS: u64 = 1_000;

/// Base times at or below this value play with an increment.
pub const INCREMENT_THRESHOLD_MS: u64 = 5_000;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

// ---------------------------------------------------------------------------
// Mark
// ---------------------------------------------------------------------------

/// One of the two players' symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other mark.
    pub fn opposite(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// A board cell: empty (`None`) or holding a mark.
pub type Cell = Option<Mark>;

/// Row-major 3×3 board. Serializes as a 9-element array of `"X"`, `"O"`
/// or `null`.
pub type Board = [Cell; CELL_COUNT];

// ---------------------------------------------------------------------------
// GameResult
// ---------------------------------------------------------------------------

/// Outcome of a game at a point in time.
///
/// ```text
/// Ongoing ──→ Win { winner } | Draw | Timeout { winner }
/// ```
///
/// The three non-ongoing variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameResult {
    Ongoing,
    Win { winner: Mark },
    Draw,
    /// The loser's clock ran out (or they left); `winner` is the opponent.
    Timeout { winner: Mark },
}

impl GameResult {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, GameResult::Ongoing)
    }

    /// The winning mark for `Win` and `Timeout`, `None` otherwise.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            GameResult::Win { winner } | GameResult::Timeout { winner } => {
                Some(*winner)
            }
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// One side of the chess clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerClock {
    pub remaining_ms: u64,
    /// When this player last completed (or forfeited) a move. `None` until
    /// their first move, in which case the match start time is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move_at: Option<u64>,
}

/// Both sides of the clock plus the parameters they were started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub base_time_ms: u64,
    /// Either 0 or [`INCREMENT_MS`].
    pub increment_ms: u64,
    pub player_x: PlayerClock,
    pub player_o: PlayerClock,
}

impl ClockState {
    /// Starts both sides at `base_time_ms`, enabling the increment for
    /// short games.
    pub fn new(base_time_ms: u64) -> Self {
        let side = PlayerClock {
            remaining_ms: base_time_ms,
            last_move_at: None,
        };
        Self {
            base_time_ms,
            increment_ms: if base_time_ms <= INCREMENT_THRESHOLD_MS {
                INCREMENT_MS
            } else {
                0
            },
            player_x: side,
            player_o: side,
        }
    }

    pub fn side(&self, mark: Mark) -> &PlayerClock {
        match mark {
            Mark::X => &self.player_x,
            Mark::O => &self.player_o,
        }
    }

    pub(crate) fn side_mut(&mut self, mark: Mark) -> &mut PlayerClock {
        match mark {
            Mark::X => &mut self.player_x,
            Mark::O => &mut self.player_o,
        }
    }
}

// ---------------------------------------------------------------------------
// GameState and Move
// ---------------------------------------------------------------------------

/// Complete, immutable snapshot of one game.
///
/// The engine never mutates a `GameState` in place; every accepted move
/// yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub current_player: Mark,
    /// Counts accepted moves only; a forfeiting move does not advance it.
    pub turn_counter: u32,
    pub result: GameResult,
    pub clock: ClockState,
    pub started_at: u64,
}

/// A move request as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell_index: usize,
    pub mark: Mark,
    /// Clock milliseconds at which the server received the move.
    pub timestamp: u64,
}
