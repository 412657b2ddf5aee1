//! The match coordinator: queue, pairing, routing moves, and everything
//! that happens when a game ends.
//!
//! `MatchCoordinator` is plain synchronous state. It never awaits; every
//! method runs to completion and leaves the registries consistent. The
//! [`actor`](crate::actor) module puts it behind a channel so one task
//! owns it, and tests drive it directly with a
//! [`ManualClock`](royale_timer::ManualClock).
//!
//! # Match lifecycle
//!
//! ```text
//!                 pair_next()
//!   [queued] ─────────────────→ [ONGOING] ──move/resign/disconnect──┐
//!      ↑                           ↑                                 │
//!      │                           └──── DRAW: rematch (new id) ─────┤
//!      │                                                             │
//!      └──── settle delay ←─── WIN / TIMEOUT (winner only) ──────────┘
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use royale_game::{GameResult, Mark, Move, PlayerScore, apply_move, apply_result, initialize, next_match};
use royale_protocol::{ClientMessage, ServerEvent};
use royale_session::{ConnectionHandle, Joined, Queue, Session, SessionId, SessionStore};
use royale_timer::{Clock, Timers};
use royale_transport::ConnectionId;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::matches::{Match, MatchId, MatchRegistry};
use crate::{MatchConfig, RequestError};

/// Work scheduled for later on the coordinator's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Put a winner back in the queue once the settle delay has passed.
    Requeue(SessionId),
}

/// A snapshot of the server for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub players_in_queue: usize,
    pub active_matches: usize,
    pub total_sessions: usize,
    pub leaderboard: Vec<PlayerScore>,
    pub uptime_ms: u64,
}

/// Owns sessions, the queue, active matches, and deferred requeues.
pub struct MatchCoordinator<C: Clock> {
    clock: C,
    config: MatchConfig,
    sessions: SessionStore,
    queue: Queue,
    matches: MatchRegistry,
    /// Which session each open connection speaks for.
    connections: HashMap<ConnectionId, SessionId>,
    timers: Timers<Deferred>,
    started_at: u64,
}

impl<C: Clock> MatchCoordinator<C> {
    pub fn new(clock: C, config: MatchConfig) -> Self {
        let started_at = clock.now_ms();
        Self {
            clock,
            config,
            sessions: SessionStore::new(),
            queue: Queue::new(),
            matches: MatchRegistry::new(),
            connections: HashMap::new(),
            timers: Timers::new(),
            started_at,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    // =====================================================================
    // Inbound
    // =====================================================================

    /// Handles one decoded client message arriving on `handle`.
    ///
    /// Refusals are reported to `handle` as an `error` event and change
    /// nothing.
    pub fn handle_message(&mut self, handle: &ConnectionHandle, msg: ClientMessage) {
        if let Err(err) = self.dispatch(handle, msg) {
            debug!(conn_id = %handle.id(), error = %err, "request refused");
            handle.send(ServerEvent::error(err.to_string()));
        }
    }

    /// Handles a closed connection.
    ///
    /// If the connection still spoke for a session, that session leaves
    /// the queue, forfeits any match in progress, and is deleted. The
    /// deleted session is returned with its final score. Closing a
    /// connection whose session has since moved to another connection
    /// does nothing.
    pub fn handle_close(&mut self, conn_id: ConnectionId) -> Option<Session> {
        let session_id = self.connections.remove(&conn_id)?;
        self.queue.remove(session_id);

        if let Some(match_id) = self.matches.of_session(session_id) {
            self.forfeit(match_id, session_id);
        }

        let removed = self.sessions.remove(session_id);
        info!(%conn_id, session_id = %session_id, "player disconnected");
        self.broadcast_lobby();
        removed
    }

    // =====================================================================
    // Deferred work
    // =====================================================================

    /// Runs every deferred task due at the current clock time.
    pub fn fire_due(&mut self) {
        let now = self.clock.now_ms();
        for task in self.timers.pop_due(now) {
            match task {
                Deferred::Requeue(session_id) => self.requeue(session_id),
            }
        }
    }

    /// Clock millisecond of the earliest pending task.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.timers.next_deadline()
    }

    // =====================================================================
    // Queries
    // =====================================================================

    pub fn status(&self) -> Status {
        Status {
            players_in_queue: self.queue.len(),
            active_matches: self.matches.len(),
            total_sessions: self.sessions.len(),
            leaderboard: self.leaderboard(self.config.leaderboard_limit),
            uptime_ms: self.clock.now_ms().saturating_sub(self.started_at),
        }
    }

    /// Scores of every live session, best first. Equal totals are ordered
    /// by username.
    pub fn leaderboard(&self, limit: usize) -> Vec<PlayerScore> {
        let mut scores: Vec<PlayerScore> = self.sessions.iter().map(|s| s.score.clone()).collect();
        scores.sort_by(rank);
        scores.truncate(limit);
        scores
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// The session a connection currently speaks for.
    pub fn session_for(&self, conn_id: ConnectionId) -> Option<SessionId> {
        self.connections.get(&conn_id).copied()
    }

    pub fn match_of(&self, session: SessionId) -> Option<&Match> {
        self.matches.of_session(session).and_then(|id| self.matches.get(id))
    }

    pub fn is_queued(&self, session: SessionId) -> bool {
        self.queue.contains(session)
    }

    // =====================================================================
    // Joining and pairing
    // =====================================================================

    fn dispatch(&mut self, handle: &ConnectionHandle, msg: ClientMessage) -> Result<(), RequestError> {
        msg.validate()?;

        match msg {
            ClientMessage::JoinQueue {
                username,
                session_token,
            } => self.join_queue(handle, &username, session_token.as_deref()),
            ClientMessage::MakeMove {
                cell_index,
                session_token,
            } => {
                let session = self.resolve(handle, session_token.as_deref())?;
                // Range already checked by `validate`.
                let cell_index = usize::try_from(cell_index).unwrap_or(usize::MAX);
                self.make_move(session, cell_index)
            }
            ClientMessage::Resign { session_token } => {
                let session = self.resolve(handle, session_token.as_deref())?;
                self.resign(session)
            }
            ClientMessage::Ready { session_token } => {
                let session = self.resolve(handle, session_token.as_deref())?;
                debug!(session_id = %session, "ready");
                Ok(())
            }
        }
    }

    fn join_queue(
        &mut self,
        handle: &ConnectionHandle,
        username: &str,
        token: Option<&str>,
    ) -> Result<(), RequestError> {
        let now = self.clock.now_ms();

        // A connection that already joined may re-send join_queue without
        // its token, but only under the same name.
        let bound = self.connections.get(&handle.id()).and_then(|&id| self.sessions.get(id));
        let token = match bound {
            Some(session) if session.username() != username => {
                return Err(RequestError::AlreadyJoined(session.username().to_owned()));
            }
            Some(session) => Some(token.unwrap_or(session.token()).to_owned()),
            None => token.map(str::to_owned),
        };

        let joined = self
            .sessions
            .create_or_resume(username, handle.clone(), token.as_deref(), now)?;
        let session_id = joined.id();
        self.bind(handle.id(), session_id);

        match (joined, self.matches.of_session(session_id)) {
            (Joined::Resumed(_), Some(match_id)) => self.resume_match(session_id, match_id),
            _ => {
                self.queue.enqueue(session_id);
                debug!(session_id = %session_id, queued = self.queue.len(), "enqueued");
                self.pair_waiting();
            }
        }

        let token = self.sessions.get(session_id).map(|s| s.token().to_owned());
        handle.send(ServerEvent::LobbyUpdate {
            players_in_queue: self.queue.len(),
            active_matches: self.matches.len(),
            session_token: token,
        });
        self.broadcast_lobby();
        Ok(())
    }

    /// Finds the session for a non-join message: the one bound to this
    /// connection, else the one owning `token`, which then moves to this
    /// connection.
    fn resolve(
        &mut self,
        handle: &ConnectionHandle,
        token: Option<&str>,
    ) -> Result<SessionId, RequestError> {
        let now = self.clock.now_ms();

        let session_id = match self.connections.get(&handle.id()).copied() {
            Some(id) => id,
            None => {
                let token = token.ok_or(RequestError::NotJoined)?;
                let (id, _previous) = self
                    .sessions
                    .resume(token, handle.clone())
                    .map_err(|_| RequestError::NotJoined)?;
                self.bind(handle.id(), id);
                id
            }
        };

        self.sessions.touch(session_id, now)?;
        Ok(session_id)
    }

    /// Points `conn_id` at `session_id`, dropping any other connection
    /// that spoke for it.
    fn bind(&mut self, conn_id: ConnectionId, session_id: SessionId) {
        self.connections.retain(|_, s| *s != session_id);
        self.connections.insert(conn_id, session_id);
    }

    fn pair_waiting(&mut self) {
        while let Some((x, o)) = self.queue.pair_next() {
            self.form_match(x, o);
        }
    }

    fn form_match(&mut self, player_x: SessionId, player_o: SessionId) {
        let now = self.clock.now_ms();
        let (Some(x), Some(o)) = (self.sessions.get(player_x), self.sessions.get(player_o)) else {
            warn!(%player_x, %player_o, "queued session vanished before pairing");
            return;
        };
        let (x_name, o_name) = (x.username().to_owned(), o.username().to_owned());

        let base_time_ms = self.config.base_time_ms;
        let m = Match {
            id: self.matches.allocate_id(),
            player_x,
            player_o,
            game: initialize(Mark::X, base_time_ms, now),
            created_at: now,
            base_time_ms,
            first_mark: Mark::X,
            is_rematch: false,
            rematch_count: 0,
        };
        let update = m.state_update();

        let match_id = match self.matches.insert(m) {
            Ok(id) => id,
            Err(m) => {
                warn!(match_id = %m.id, %player_x, %player_o, "player already seated, match dropped");
                return;
            }
        };
        info!(%match_id, %player_x, %player_o, base_time_ms, "match formed");

        self.send(player_x, ServerEvent::MatchFound {
            opponent: o_name,
            your_mark: Mark::X,
            base_time_ms,
        });
        self.send(player_o, ServerEvent::MatchFound {
            opponent: x_name,
            your_mark: Mark::O,
            base_time_ms,
        });
        self.send_both(match_id, update);
    }

    /// Re-sends the match to a player who came back on a new connection.
    fn resume_match(&mut self, session_id: SessionId, match_id: MatchId) {
        let Some(m) = self.matches.get(match_id) else {
            return;
        };
        let Some(mark) = m.mark_of(session_id) else {
            return;
        };
        let opponent = self
            .sessions
            .get(m.player(mark.opposite()))
            .map(|s| s.username().to_owned())
            .unwrap_or_default();

        info!(%match_id, session_id = %session_id, "player resumed match");
        let found = ServerEvent::MatchFound {
            opponent,
            your_mark: mark,
            base_time_ms: m.base_time_ms,
        };
        let update = m.state_update();
        self.send(session_id, found);
        self.send(session_id, update);
    }

    /// Fires when a winner's settle delay ends.
    ///
    /// A winner who disconnected during the delay is not re-enqueued.
    /// Disconnect deletes the session, so there is no id left to queue.
    /// A winner who re-joined and was already paired is left alone.
    fn requeue(&mut self, session_id: SessionId) {
        if !self.sessions.contains(session_id) {
            debug!(session_id = %session_id, "requeue skipped, session gone");
            return;
        }
        if self.matches.of_session(session_id).is_some() {
            debug!(session_id = %session_id, "requeue skipped, already in a match");
            return;
        }

        self.queue.enqueue(session_id);
        info!(session_id = %session_id, "winner re-enqueued");
        self.pair_waiting();
        self.broadcast_lobby();
    }

    // =====================================================================
    // Playing
    // =====================================================================

    fn make_move(&mut self, session_id: SessionId, cell_index: usize) -> Result<(), RequestError> {
        let now = self.clock.now_ms();
        let match_id = self
            .matches
            .of_session(session_id)
            .ok_or(RequestError::NotInMatch)?;
        let m = self.matches.get_mut(match_id).ok_or(RequestError::NotInMatch)?;
        let mark = m.mark_of(session_id).ok_or(RequestError::NotInMatch)?;

        m.game = apply_move(
            &m.game,
            Move {
                cell_index,
                mark,
                timestamp: now,
            },
        )?;
        let result = m.game.result;
        let update = m.state_update();
        debug!(%match_id, session_id = %session_id, %mark, cell_index, "move applied");

        self.send_both(match_id, update);
        if !result.is_ongoing() {
            self.send_both(match_id, ServerEvent::GameResult { result });
            self.end_game(match_id);
        }
        Ok(())
    }

    fn resign(&mut self, session_id: SessionId) -> Result<(), RequestError> {
        let match_id = self
            .matches
            .of_session(session_id)
            .ok_or(RequestError::NotInMatch)?;
        let m = self.matches.get_mut(match_id).ok_or(RequestError::NotInMatch)?;
        let mark = m.mark_of(session_id).ok_or(RequestError::NotInMatch)?;

        let result = GameResult::Win {
            winner: mark.opposite(),
        };
        m.game.result = result;
        info!(%match_id, session_id = %session_id, "player resigned");

        self.send_both(match_id, ServerEvent::GameResult { result });
        self.end_game(match_id);
        Ok(())
    }

    // =====================================================================
    // End of game
    // =====================================================================

    /// Scores a finished match, then either starts the rematch (draw) or
    /// retires the match and schedules the winner's return to the queue.
    fn end_game(&mut self, match_id: MatchId) {
        let Some(m) = self.matches.remove(match_id) else {
            return;
        };
        let result = m.game.result;
        self.score(&m, &result);

        match result.winner() {
            Some(winner) => {
                let winner = m.player(winner);
                info!(%match_id, %winner, ?result, "match ended");
                self.schedule_requeue(winner);
                self.broadcast_lobby();
            }
            None => self.start_rematch(m),
        }
    }

    fn start_rematch(&mut self, previous: Match) {
        let now = self.clock.now_ms();
        let game = next_match(previous.base_time_ms, previous.first_mark, now);
        let next = Match {
            id: self.matches.allocate_id(),
            player_x: previous.player_x,
            player_o: previous.player_o,
            base_time_ms: game.clock.base_time_ms,
            first_mark: game.current_player,
            game,
            created_at: now,
            is_rematch: true,
            rematch_count: previous.rematch_count + 1,
        };
        let started = ServerEvent::RematchStarted {
            base_time_ms: next.base_time_ms,
            rematch_count: next.rematch_count,
        };
        let update = next.state_update();

        let match_id = match self.matches.insert(next) {
            Ok(id) => id,
            Err(m) => {
                warn!(match_id = %m.id, "rematch players already seated, rematch dropped");
                return;
            }
        };
        info!(
            previous = %previous.id,
            %match_id,
            base_time_ms = previous.base_time_ms,
            rematch_count = previous.rematch_count + 1,
            "draw, rematch started"
        );

        self.send_both(match_id, started);
        self.send_both(match_id, update);
    }

    /// The player leaving `match_id` loses on time. Only the opponent is
    /// told; the leaver's connection is already gone.
    fn forfeit(&mut self, match_id: MatchId, leaver: SessionId) {
        let Some(mut m) = self.matches.remove(match_id) else {
            return;
        };
        let Some(leaver_mark) = m.mark_of(leaver) else {
            return;
        };
        let winner_mark = leaver_mark.opposite();
        let result = GameResult::Timeout { winner: winner_mark };
        m.game.result = result;

        self.score(&m, &result);

        let winner = m.player(winner_mark);
        info!(%match_id, %winner, %leaver, "match forfeited by disconnect");
        self.send(winner, ServerEvent::GameResult { result });
        self.schedule_requeue(winner);
    }

    fn score(&mut self, m: &Match, result: &GameResult) {
        for (session_id, mark) in m.seats() {
            if let Some(session) = self.sessions.get_mut(session_id) {
                session.score = apply_result(&session.score, result, mark, &m.game.clock, m.base_time_ms);
            }
        }
    }

    fn schedule_requeue(&mut self, session_id: SessionId) {
        let due = self.clock.now_ms() + self.config.settle_delay_ms;
        let timer = self.timers.schedule_at(due, Deferred::Requeue(session_id));
        debug!(session_id = %session_id, %timer, due, "requeue scheduled");
    }

    // =====================================================================
    // Outbound
    // =====================================================================

    fn send(&self, session_id: SessionId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(session_id) {
            session.send(event);
        }
    }

    fn send_both(&self, match_id: MatchId, event: ServerEvent) {
        if let Some(m) = self.matches.get(match_id) {
            self.send(m.player_x, event.clone());
            self.send(m.player_o, event);
        }
    }

    /// Queue and match counts to every live session.
    fn broadcast_lobby(&self) {
        let event = ServerEvent::LobbyUpdate {
            players_in_queue: self.queue.len(),
            active_matches: self.matches.len(),
            session_token: None,
        };
        for session in self.sessions.iter() {
            session.send(event.clone());
        }
    }
}

/// Descending total, then ascending username.
fn rank(a: &PlayerScore, b: &PlayerScore) -> Ordering {
    b.total_score()
        .total_cmp(&a.total_score())
        .then_with(|| a.username().cmp(b.username()))
}
