//! Game rules for Tic-Tac-Toe Royale.
//!
//! This crate has no I/O and no notion of time beyond the millisecond
//! timestamps callers pass in. It is split in three:
//!
//! - [`engine`]: the board/clock state machine
//! - [`scoring`]: converting a finished game into score deltas
//! - [`rematch`]: deriving the next game after a draw
//!
//! ```text
//! initialize ──→ apply_move* ──→ terminal GameResult
//!                                   │
//!                    ┌──────────────┴──────────────┐
//!                    ▼                             ▼
//!             scoring::apply_result      rematch::next_match (draws)
//! ```

pub mod engine;
pub mod rematch;
pub mod scoring;
mod types;

pub use engine::{MoveRejection, apply_move, evaluate, initialize};
pub use rematch::{next_base_time, next_match};
pub use scoring::{PlayerScore, ScoreTotals, apply_result, derive_totals};
pub use types::{
    Board, CELL_COUNT, Cell, ClockState, GameResult, GameState, INCREMENT_MS,
    INCREMENT_THRESHOLD_MS, Mark, Move, PlayerClock,
};
