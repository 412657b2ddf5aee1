//! Parameters for the next game in a draw-triggered rematch chain.

use crate::{GameState, Mark, engine};

/// Each rematch shortens the base time by this much.
pub const REMATCH_STEP_MS: u64 = 5_000;

/// Base time never drops below this.
pub const MIN_BASE_TIME_MS: u64 = 1_000;

/// The base time for the game after a draw played at `prev_ms`.
pub fn next_base_time(prev_ms: u64) -> u64 {
    prev_ms.saturating_sub(REMATCH_STEP_MS).max(MIN_BASE_TIME_MS)
}

/// Starts the rematch: shorter clock, and the other mark moves first.
pub fn next_match(prev_base_ms: u64, prev_first: Mark, now: u64) -> GameState {
    engine::initialize(prev_first.opposite(), next_base_time(prev_base_ms), now)
}
