//! Active matches and the index from players to the match they are in.

use std::collections::HashMap;
use std::fmt;

use royale_game::{GameState, Mark};
use royale_protocol::ServerEvent;
use royale_session::SessionId;

/// Unique identifier for a match. Rematches get a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Two players and the game between them.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    pub player_x: SessionId,
    pub player_o: SessionId,
    pub game: GameState,
    pub created_at: u64,
    pub base_time_ms: u64,
    /// The mark that moved first in this game. The next rematch starts
    /// with the other one.
    pub first_mark: Mark,
    pub is_rematch: bool,
    pub rematch_count: u32,
}

impl Match {
    pub fn mark_of(&self, session: SessionId) -> Option<Mark> {
        if session == self.player_x {
            Some(Mark::X)
        } else if session == self.player_o {
            Some(Mark::O)
        } else {
            None
        }
    }

    pub fn player(&self, mark: Mark) -> SessionId {
        match mark {
            Mark::X => self.player_x,
            Mark::O => self.player_o,
        }
    }

    /// Both players, X first, each with their mark.
    pub fn seats(&self) -> [(SessionId, Mark); 2] {
        [(self.player_x, Mark::X), (self.player_o, Mark::O)]
    }

    pub fn state_update(&self) -> ServerEvent {
        ServerEvent::state_update(&self.game, self.is_rematch, self.rematch_count)
    }
}

/// Arena of matches plus a `SessionId → MatchId` index.
///
/// The index is what enforces that a session plays in at most one match:
/// [`insert`](Self::insert) refuses a match whose players are already
/// seated elsewhere.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: HashMap<MatchId, Match>,
    by_session: HashMap<SessionId, MatchId>,
    next_id: u64,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> MatchId {
        self.next_id += 1;
        MatchId(self.next_id)
    }

    /// Stores a match and seats both players in it. Gives the match back
    /// if either player is already seated.
    pub fn insert(&mut self, m: Match) -> Result<MatchId, Match> {
        if self.by_session.contains_key(&m.player_x) || self.by_session.contains_key(&m.player_o) {
            return Err(m);
        }
        let id = m.id;
        self.by_session.insert(m.player_x, id);
        self.by_session.insert(m.player_o, id);
        self.matches.insert(id, m);
        Ok(id)
    }

    /// Removes a match and unseats its players.
    pub fn remove(&mut self, id: MatchId) -> Option<Match> {
        let m = self.matches.remove(&id)?;
        for (session, _) in m.seats() {
            if self.by_session.get(&session) == Some(&id) {
                self.by_session.remove(&session);
            }
        }
        Some(m)
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(&id)
    }

    pub fn get_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.get_mut(&id)
    }

    /// The match `session` is currently seated in.
    pub fn of_session(&self, session: SessionId) -> Option<MatchId> {
        self.by_session.get(&session).copied()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
