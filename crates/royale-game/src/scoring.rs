//! Tournament scoring.
//!
//! A win is worth 1 point, a draw 0.5, and every win that used less than
//! half of the base time earns an extra 0.1 speed bonus. Losing eliminates
//! the player from the winners' rotation.

use serde::{Deserialize, Serialize};

use crate::{ClockState, GameResult, Mark};

/// Points per win.
const WIN_POINTS: f64 = 1.0;
/// Points per draw.
const DRAW_POINTS: f64 = 0.5;
/// Points per speed bonus.
const SPEED_BONUS_POINTS: f64 = 0.1;

/// The components of a total score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTotals {
    pub base: f64,
    pub bonus: f64,
    pub total: f64,
}

/// A player's cumulative record.
///
/// Fields are read-only outside this crate: only [`apply_result`] changes
/// a score, and it always recomputes the total from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    username: String,
    wins: u32,
    draws: u32,
    losses: u32,
    total_score: f64,
    speed_bonuses: u32,
    is_eliminated: bool,
}

impl PlayerScore {
    /// A zeroed score for a new player.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            wins: 0,
            draws: 0,
            losses: 0,
            total_score: 0.0,
            speed_bonuses: 0,
            is_eliminated: false,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn draws(&self) -> u32 {
        self.draws
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn speed_bonuses(&self) -> u32 {
        self.speed_bonuses
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn is_eliminated(&self) -> bool {
        self.is_eliminated
    }

    fn recompute_total(&mut self) {
        self.total_score =
            derive_totals(self.wins, self.draws, self.speed_bonuses).total;
    }
}

/// Splits a record into base points, bonus points, and their sum.
pub fn derive_totals(wins: u32, draws: u32, speed_bonuses: u32) -> ScoreTotals {
    let base = f64::from(wins) * WIN_POINTS + f64::from(draws) * DRAW_POINTS;
    let bonus = f64::from(speed_bonuses) * SPEED_BONUS_POINTS;
    ScoreTotals {
        base,
        bonus,
        total: base + bonus,
    }
}

/// Folds one finished game into `score` from the point of view of
/// `own_mark`.
///
/// `clock` is the final clock of that game and `base_time_ms` the base it
/// started with. An ongoing result leaves the score untouched.
pub fn apply_result(
    score: &PlayerScore,
    result: &GameResult,
    own_mark: Mark,
    clock: &ClockState,
    base_time_ms: u64,
) -> PlayerScore {
    let mut next = score.clone();

    match *result {
        GameResult::Ongoing => return next,
        GameResult::Draw => next.draws += 1,
        GameResult::Win { winner } if winner == own_mark => {
            next.wins += 1;
            if is_speed_win(clock.side(own_mark).remaining_ms, base_time_ms) {
                next.speed_bonuses += 1;
            }
        }
        GameResult::Timeout { winner } if winner == own_mark => {
            next.wins += 1;
        }
        GameResult::Win { .. } | GameResult::Timeout { .. } => {
            next.losses += 1;
            next.is_eliminated = true;
        }
    }

    next.recompute_total();
    next
}

/// Strictly less than half of the base time consumed.
fn is_speed_win(remaining_ms: u64, base_time_ms: u64) -> bool {
    // Remaining can exceed base when increments accrue; that counts as
    // nothing consumed.
    let used = base_time_ms.saturating_sub(remaining_ms);
    used.saturating_mul(2) < base_time_ms
}
