//! The game state machine: start a game, validate and apply moves, and
//! detect wins, draws, and clock forfeits.
//!
//! Everything here is a pure function of its arguments. Time enters only
//! through the `now`/`timestamp` parameters, which keeps the engine
//! trivially testable and lets the coordinator replay it deterministically.

use crate::{Board, CELL_COUNT, ClockState, GameResult, GameState, Mark, Move};

/// The eight winning lines, scanned in this order: rows, columns,
/// diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Why a move was refused. A rejection never changes the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid cell index")]
    InvalidCell,

    #[error("Cell already occupied")]
    CellOccupied,

    #[error("Game already finished")]
    GameFinished,
}

/// Creates a fresh game: empty board, `first` to move, both clocks at
/// `base_time_ms`.
pub fn initialize(first: Mark, base_time_ms: u64, now: u64) -> GameState {
    GameState {
        board: [None; CELL_COUNT],
        current_player: first,
        turn_counter: 0,
        result: GameResult::Ongoing,
        clock: ClockState::new(base_time_ms),
        started_at: now,
    }
}

/// Classifies a board as won, drawn, or still in play.
pub fn evaluate(board: &Board) -> GameResult {
    for [a, b, c] in LINES {
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return GameResult::Win { winner: mark };
            }
        }
    }

    if board.iter().all(Option::is_some) {
        GameResult::Draw
    } else {
        GameResult::Ongoing
    }
}

/// Validates `mv` against `state` and returns the successor state.
///
/// Checks run in a fixed order and the first failure wins: turn, cell
/// range, occupancy, then whether the game is still running.
///
/// If the mover's clock has run out by `mv.timestamp`, the move is not
/// placed: the game ends as [`GameResult::Timeout`] for the opponent and
/// only the mover's clock changes.
pub fn apply_move(state: &GameState, mv: Move) -> Result<GameState, MoveRejection> {
    if mv.mark != state.current_player {
        return Err(MoveRejection::NotYourTurn);
    }
    if mv.cell_index >= CELL_COUNT {
        return Err(MoveRejection::InvalidCell);
    }
    if state.board[mv.cell_index].is_some() {
        return Err(MoveRejection::CellOccupied);
    }
    if !state.result.is_ongoing() {
        return Err(MoveRejection::GameFinished);
    }

    let side = state.clock.side(mv.mark);
    let turn_started = side.last_move_at.unwrap_or(state.started_at);
    // A timestamp before the turn started must never credit time back.
    let elapsed = mv.timestamp.saturating_sub(turn_started);

    let mut next = state.clone();

    if elapsed >= side.remaining_ms {
        let forfeiting = next.clock.side_mut(mv.mark);
        forfeiting.remaining_ms = 0;
        forfeiting.last_move_at = Some(mv.timestamp);
        next.result = GameResult::Timeout {
            winner: mv.mark.opposite(),
        };
        return Ok(next);
    }

    let remaining = side.remaining_ms - elapsed + state.clock.increment_ms;

    next.board[mv.cell_index] = Some(mv.mark);
    next.result = evaluate(&next.board);
    next.current_player = mv.mark.opposite();
    next.turn_counter += 1;

    let mover = next.clock.side_mut(mv.mark);
    mover.remaining_ms = remaining;
    mover.last_move_at = Some(mv.timestamp);

    Ok(next)
}
