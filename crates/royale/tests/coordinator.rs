//! Integration tests for the match coordinator, driven synchronously with
//! a manual clock.

use royale::{MatchConfig, MatchCoordinator};
use royale_game::{Board, GameResult, Mark};
use royale_protocol::{ClientMessage, ServerEvent};
use royale_session::{ConnectionHandle, SessionId};
use royale_timer::{Clock, ManualClock};
use royale_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

/// One fake client: the handle the coordinator writes to and the
/// receiving end the test reads from.
struct Client {
    handle: ConnectionHandle,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Client {
    fn new(id: u64) -> Self {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId::new(id));
        Self { handle, rx }
    }

    fn conn_id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Everything received so far.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// The most recent `error` message, discarding everything else.
    fn last_error(&mut self) -> Option<String> {
        self.drain().into_iter().rev().find_map(|e| match e {
            ServerEvent::Error { message } => Some(message),
            _ => None,
        })
    }
}

struct Harness {
    clock: ManualClock,
    coordinator: MatchCoordinator<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let clock = ManualClock::new(0);
        let coordinator = MatchCoordinator::new(clock.clone(), MatchConfig::default());
        Self { clock, coordinator }
    }

    fn send(&mut self, client: &Client, msg: ClientMessage) {
        self.coordinator.handle_message(&client.handle, msg);
    }

    fn join(&mut self, client: &Client, name: &str) -> SessionId {
        self.send(client, join_msg(name, None));
        self.coordinator
            .session_for(client.conn_id())
            .expect("join should bind the connection")
    }

    fn play(&mut self, client: &Client, cell: i64) {
        self.send(client, ClientMessage::MakeMove {
            cell_index: cell,
            session_token: None,
        });
    }

    fn advance(&mut self, ms: u64) {
        self.clock.advance(ms);
        self.coordinator.fire_due();
    }

    fn token(&self, id: SessionId) -> String {
        self.coordinator.session(id).unwrap().token().to_owned()
    }
}

fn join_msg(name: &str, token: Option<String>) -> ClientMessage {
    ClientMessage::JoinQueue {
        username: name.into(),
        session_token: token,
    }
}

/// Joins alice then bob, so alice is X and bob is O.
fn paired() -> (Harness, Client, SessionId, Client, SessionId) {
    let mut h = Harness::new();
    let mut alice = Client::new(1);
    let mut bob = Client::new(2);
    let a = h.join(&alice, "alice");
    let b = h.join(&bob, "bob");
    alice.drain();
    bob.drain();
    (h, alice, a, bob, b)
}

/// Winning line 3-4-5 for X.
const X_WINS: [i64; 7] = [4, 0, 2, 6, 3, 1, 5];

/// Ends in a full board with no line: XOX / XOO / OXX.
const DRAW: [i64; 9] = [0, 1, 2, 4, 3, 5, 7, 6, 8];

fn play_alternating(h: &mut Harness, first: &Client, second: &Client, cells: &[i64]) {
    for (i, &cell) in cells.iter().enumerate() {
        let mover = if i % 2 == 0 { first } else { second };
        h.play(mover, cell);
    }
}

fn game_results(events: &[ServerEvent]) -> Vec<GameResult> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::GameResult { result } => Some(*result),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Pairing
// =========================================================================

#[test]
fn test_first_joiner_is_x_second_is_o() {
    let mut h = Harness::new();
    let mut alice = Client::new(1);
    let mut bob = Client::new(2);

    let a = h.join(&alice, "alice");
    assert!(h.coordinator.is_queued(a));
    let b = h.join(&bob, "bob");

    let m = h.coordinator.match_of(a).expect("paired");
    assert_eq!(m.player_x, a);
    assert_eq!(m.player_o, b);
    assert_eq!(m.base_time_ms, 30_000);
    assert_eq!(m.game.current_player, Mark::X);
    assert!(!m.is_rematch);
    assert!(!h.coordinator.is_queued(a));
    assert!(!h.coordinator.is_queued(b));

    let alice_events = alice.drain();
    assert!(matches!(
        &alice_events[0],
        ServerEvent::LobbyUpdate { players_in_queue: 1, active_matches: 0, session_token: Some(t) }
            if t.len() == 32
    ));
    assert!(alice_events.contains(&ServerEvent::MatchFound {
        opponent: "bob".into(),
        your_mark: Mark::X,
        base_time_ms: 30_000,
    }));

    let bob_events = bob.drain();
    assert_eq!(
        bob_events[0],
        ServerEvent::MatchFound {
            opponent: "alice".into(),
            your_mark: Mark::O,
            base_time_ms: 30_000,
        }
    );
    assert!(matches!(
        &bob_events[1],
        ServerEvent::StateUpdate { turn_counter: 0, current_player: Mark::X, .. }
    ));
    assert!(matches!(
        &bob_events[2],
        ServerEvent::LobbyUpdate { players_in_queue: 0, active_matches: 1, session_token: Some(_) }
    ));
}

#[test]
fn test_third_player_waits() {
    let (mut h, _alice, _a, _bob, _b) = paired();
    let carol = Client::new(3);

    let c = h.join(&carol, "carol");

    assert!(h.coordinator.is_queued(c));
    assert!(h.coordinator.match_of(c).is_none());
    let status = h.coordinator.status();
    assert_eq!(status.players_in_queue, 1);
    assert_eq!(status.active_matches, 1);
    assert_eq!(status.total_sessions, 3);
}

// =========================================================================
// Moves and results
// =========================================================================

#[test]
fn test_win_scores_and_requeues_winner_after_settle_delay() {
    let (mut h, mut alice, a, mut bob, b) = paired();

    play_alternating(&mut h, &alice, &bob, &X_WINS);

    let win = GameResult::Win { winner: Mark::X };
    assert_eq!(game_results(&alice.drain()), vec![win]);
    assert_eq!(game_results(&bob.drain()), vec![win]);
    assert!(h.coordinator.match_of(a).is_none());
    assert_eq!(h.coordinator.status().active_matches, 0);

    let alice_score = &h.coordinator.session(a).unwrap().score;
    assert_eq!(alice_score.wins(), 1);
    assert_eq!(alice_score.speed_bonuses(), 1, "no time was used");
    let bob_score = &h.coordinator.session(b).unwrap().score;
    assert_eq!(bob_score.losses(), 1);
    assert!(bob_score.is_eliminated());

    h.advance(1_999);
    assert!(!h.coordinator.is_queued(a));
    h.advance(1);
    assert!(h.coordinator.is_queued(a));
    assert!(!h.coordinator.is_queued(b), "loser is not re-enqueued");
}

#[test]
fn test_state_update_after_each_move() {
    let (mut h, mut alice, _a, mut bob, _b) = paired();

    h.clock.advance(1_200);
    h.play(&alice, 4);

    let expected_board = {
        let mut board: Board = [None; 9];
        board[4] = Some(Mark::X);
        board
    };
    for events in [alice.drain(), bob.drain()] {
        match &events[..] {
            [ServerEvent::StateUpdate { board, current_player, turn_counter, clock, .. }] => {
                assert_eq!(*board, expected_board);
                assert_eq!(*current_player, Mark::O);
                assert_eq!(*turn_counter, 1);
                assert_eq!(clock.player_x.remaining_ms, 28_800);
                assert_eq!(clock.player_o.remaining_ms, 30_000);
            }
            other => panic!("expected one state update, got {other:?}"),
        }
    }
}

#[test]
fn test_wrong_turn_is_rejected_to_mover_only() {
    let (mut h, mut alice, a, mut bob, _b) = paired();

    h.play(&bob, 4);

    assert_eq!(bob.last_error().as_deref(), Some("Not your turn"));
    assert!(alice.drain().is_empty());
    let m = h.coordinator.match_of(a).unwrap();
    assert_eq!(m.game.turn_counter, 0);
    let empty: Board = [None; 9];
    assert_eq!(m.game.board, empty);
}

#[test]
fn test_occupied_and_out_of_range_cells_are_rejected() {
    let (mut h, mut alice, _a, mut bob, _b) = paired();
    h.play(&alice, 4);
    alice.drain();

    h.play(&bob, 4);
    assert_eq!(bob.last_error().as_deref(), Some("Cell already occupied"));

    h.play(&bob, 9);
    assert_eq!(bob.last_error().as_deref(), Some("Invalid cell index"));

    h.play(&bob, -1);
    assert_eq!(bob.last_error().as_deref(), Some("Invalid cell index"));
}

#[test]
fn test_move_after_clock_runs_out_is_timeout() {
    let (mut h, mut alice, a, mut bob, b) = paired();

    h.clock.advance(30_000);
    h.play(&alice, 4);

    let timeout = GameResult::Timeout { winner: Mark::O };
    assert_eq!(game_results(&alice.drain()), vec![timeout]);
    assert_eq!(game_results(&bob.drain()), vec![timeout]);

    let bob_score = &h.coordinator.session(b).unwrap().score;
    assert_eq!(bob_score.wins(), 1);
    assert_eq!(bob_score.speed_bonuses(), 0, "timeouts never earn a bonus");
    assert!(h.coordinator.session(a).unwrap().score.is_eliminated());

    h.advance(2_000);
    assert!(h.coordinator.is_queued(b));
}

#[test]
fn test_resign_is_a_win_for_the_opponent() {
    let (mut h, mut alice, a, mut bob, b) = paired();

    h.send(&alice, ClientMessage::Resign { session_token: None });

    let win = GameResult::Win { winner: Mark::O };
    assert_eq!(game_results(&alice.drain()), vec![win]);
    assert_eq!(game_results(&bob.drain()), vec![win]);
    assert!(h.coordinator.match_of(b).is_none());

    let bob_score = &h.coordinator.session(b).unwrap().score;
    assert_eq!(bob_score.wins(), 1);
    assert_eq!(bob_score.speed_bonuses(), 1);
    assert_eq!(h.coordinator.session(a).unwrap().score.losses(), 1);

    h.advance(2_000);
    assert!(h.coordinator.is_queued(b));
    assert!(!h.coordinator.is_queued(a));
}

// =========================================================================
// Draws and rematches
// =========================================================================

#[test]
fn test_draw_starts_rematch_with_shorter_clock_and_other_mark() {
    let (mut h, mut alice, a, mut bob, b) = paired();
    let first_id = h.coordinator.match_of(a).unwrap().id;

    play_alternating(&mut h, &alice, &bob, &DRAW);

    let rematch = h.coordinator.match_of(a).expect("rematch replaces the match");
    assert_ne!(rematch.id, first_id);
    assert_eq!(rematch.player_x, a);
    assert_eq!(rematch.player_o, b);
    assert_eq!(rematch.base_time_ms, 25_000);
    assert_eq!(rematch.first_mark, Mark::O);
    assert_eq!(rematch.game.current_player, Mark::O);
    assert!(rematch.is_rematch);
    assert_eq!(rematch.rematch_count, 1);
    assert_eq!(h.coordinator.status().active_matches, 1);

    for events in [alice.drain(), bob.drain()] {
        assert_eq!(game_results(&events), vec![GameResult::Draw]);
        let tail = &events[events.len() - 2..];
        assert_eq!(
            tail[0],
            ServerEvent::RematchStarted {
                base_time_ms: 25_000,
                rematch_count: 1,
            }
        );
        assert!(matches!(
            &tail[1],
            ServerEvent::StateUpdate { is_rematch: true, rematch_count: 1, base_time_ms: 25_000, .. }
        ));
    }

    for id in [a, b] {
        let score = &h.coordinator.session(id).unwrap().score;
        assert_eq!(score.draws(), 1);
        assert!(!score.is_eliminated());
        assert_eq!(score.total_score(), 0.5);
    }

    // O opens the rematch.
    h.play(&alice, 0);
    assert_eq!(alice.last_error().as_deref(), Some("Not your turn"));
    h.play(&bob, 0);
    assert!(bob.last_error().is_none());
}

#[test]
fn test_rematch_chain_alternates_and_bottoms_out() {
    let (mut h, alice, a, bob, _b) = paired();

    // Game 1: X (alice) opens. Game 2: O (bob) opens, and so on.
    let expected_bases = [25_000, 20_000, 15_000, 10_000, 5_000, 1_000, 1_000];
    for (i, &base) in expected_bases.iter().enumerate() {
        let (first, second) = if i % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        play_alternating(&mut h, first, second, &DRAW);

        let m = h.coordinator.match_of(a).unwrap();
        assert_eq!(m.base_time_ms, base);
        assert_eq!(m.rematch_count, i as u32 + 1);
    }
    assert_eq!(h.coordinator.session(a).unwrap().score.draws(), 7);
}

// =========================================================================
// Disconnects
// =========================================================================

#[test]
fn test_disconnect_mid_match_forfeits_to_opponent() {
    let (mut h, mut alice, a, mut bob, b) = paired();
    h.play(&alice, 4);
    alice.drain();
    bob.drain();

    let leaver = h.coordinator.handle_close(bob.conn_id()).expect("bob had a session");

    assert_eq!(leaver.id(), b);
    assert_eq!(leaver.score.losses(), 1);
    assert!(leaver.score.is_eliminated());
    assert!(h.coordinator.session(b).is_none(), "leaver no longer resolvable");

    let events = alice.drain();
    assert_eq!(game_results(&events), vec![GameResult::Timeout { winner: Mark::X }]);
    assert!(matches!(
        events.last(),
        Some(ServerEvent::LobbyUpdate { players_in_queue: 0, active_matches: 0, session_token: None })
    ));
    assert!(bob.drain().is_empty(), "nothing is sent to the leaver");

    let alice_score = &h.coordinator.session(a).unwrap().score;
    assert_eq!(alice_score.wins(), 1);
    assert_eq!(alice_score.speed_bonuses(), 0);
    assert_eq!(alice_score.total_score(), 1.0);
    assert!(h.coordinator.match_of(a).is_none());

    assert!(!h.coordinator.is_queued(a));
    h.advance(2_000);
    assert!(h.coordinator.is_queued(a));
}

#[test]
fn test_disconnect_while_queued_leaves_queue() {
    let mut h = Harness::new();
    let alice = Client::new(1);
    let a = h.join(&alice, "alice");

    h.coordinator.handle_close(alice.conn_id());

    assert!(!h.coordinator.is_queued(a));
    assert_eq!(h.coordinator.status().total_sessions, 0);

    // Username is free again.
    let again = Client::new(2);
    let a2 = h.join(&again, "alice");
    assert_ne!(a, a2);
}

#[test]
fn test_winner_leaving_during_settle_delay_is_not_requeued() {
    let (mut h, alice, a, bob, _b) = paired();
    play_alternating(&mut h, &alice, &bob, &X_WINS);

    h.coordinator.handle_close(alice.conn_id());
    h.advance(2_000);

    assert!(!h.coordinator.is_queued(a));
    assert_eq!(h.coordinator.status().players_in_queue, 0);
}

#[test]
fn test_requeued_winner_pairs_with_waiting_player() {
    let (mut h, alice, a, bob, _b) = paired();
    let carol = Client::new(3);
    let c = h.join(&carol, "carol");

    play_alternating(&mut h, &alice, &bob, &X_WINS);
    h.advance(2_000);

    let m = h.coordinator.match_of(a).expect("alice paired again");
    assert_eq!(m.player_x, c, "carol waited longer");
    assert_eq!(m.player_o, a);
}

#[test]
fn test_unknown_connection_close_is_noop() {
    let (mut h, _alice, a, _bob, _b) = paired();
    assert!(h.coordinator.handle_close(ConnectionId::new(99)).is_none());
    assert!(h.coordinator.match_of(a).is_some());
}

// =========================================================================
// Reconnects
// =========================================================================

#[test]
fn test_rejoin_with_token_resumes_match_on_new_connection() {
    let (mut h, alice, a, mut bob, _b) = paired();
    h.play(&alice, 4);
    bob.drain();
    let token = h.token(a);

    let mut alice2 = Client::new(10);
    h.send(&alice2, join_msg("alice", Some(token.clone())));

    assert_eq!(h.coordinator.session_for(alice2.conn_id()), Some(a));
    let events = alice2.drain();
    assert_eq!(
        events[0],
        ServerEvent::MatchFound {
            opponent: "bob".into(),
            your_mark: Mark::X,
            base_time_ms: 30_000,
        }
    );
    assert!(matches!(&events[1], ServerEvent::StateUpdate { turn_counter: 1, .. }));
    assert!(matches!(
        &events[2],
        ServerEvent::LobbyUpdate { session_token: Some(t), .. } if *t == token
    ));

    // The old socket closing no longer affects the session.
    assert!(h.coordinator.handle_close(alice.conn_id()).is_none());
    assert!(h.coordinator.match_of(a).is_some());

    // Play continues on the new connection.
    h.play(&bob, 0);
    h.play(&alice2, 2);
    assert_eq!(h.coordinator.match_of(a).unwrap().game.turn_counter, 3);
}

#[test]
fn test_move_with_token_on_fresh_connection_rebinds() {
    let (mut h, _alice, a, _bob, _b) = paired();
    let token = h.token(a);

    let mut fresh = Client::new(20);
    h.send(&fresh, ClientMessage::MakeMove {
        cell_index: 4,
        session_token: Some(token),
    });

    assert!(fresh.last_error().is_none());
    assert_eq!(h.coordinator.session_for(fresh.conn_id()), Some(a));
    assert_eq!(h.coordinator.match_of(a).unwrap().game.board[4], Some(Mark::X));
}

#[test]
fn test_rejoin_on_same_connection_keeps_session() {
    let mut h = Harness::new();
    let alice = Client::new(1);
    let a = h.join(&alice, "alice");

    let again = h.join(&alice, "alice");

    assert_eq!(a, again);
    assert_eq!(h.coordinator.status().players_in_queue, 1);
}

// =========================================================================
// Request errors
// =========================================================================

#[test]
fn test_messages_before_join_are_refused() {
    let mut h = Harness::new();
    let mut stranger = Client::new(1);

    h.play(&stranger, 4);
    assert_eq!(stranger.last_error().as_deref(), Some("Must join queue first"));

    h.send(&stranger, ClientMessage::Resign {
        session_token: Some("not-a-token".into()),
    });
    assert_eq!(stranger.last_error().as_deref(), Some("Must join queue first"));
}

#[test]
fn test_move_while_queued_is_not_in_a_match() {
    let mut h = Harness::new();
    let mut alice = Client::new(1);
    h.join(&alice, "alice");

    h.play(&alice, 4);
    assert_eq!(alice.last_error().as_deref(), Some("Not in a match"));

    h.send(&alice, ClientMessage::Resign { session_token: None });
    assert_eq!(alice.last_error().as_deref(), Some("Not in a match"));
}

#[test]
fn test_duplicate_and_invalid_usernames() {
    let mut h = Harness::new();
    let alice = Client::new(1);
    h.join(&alice, "alice");

    let mut impostor = Client::new(2);
    h.send(&impostor, join_msg("alice", None));
    assert_eq!(impostor.last_error().as_deref(), Some("Username already taken"));
    assert_eq!(h.coordinator.session_for(impostor.conn_id()), None);

    h.send(&impostor, join_msg("not valid!", None));
    assert_eq!(impostor.last_error().as_deref(), Some("Invalid username"));
    assert_eq!(h.coordinator.status().total_sessions, 1);
}

#[test]
fn test_connection_cannot_switch_username() {
    let mut h = Harness::new();
    let mut alice = Client::new(1);
    h.join(&alice, "alice");

    h.send(&alice, join_msg("mallory", None));

    assert_eq!(alice.last_error().as_deref(), Some("Already joined as alice"));
    assert_eq!(h.coordinator.status().total_sessions, 1);
}

#[test]
fn test_ready_refreshes_activity_only() {
    let mut h = Harness::new();
    let mut alice = Client::new(1);
    let a = h.join(&alice, "alice");
    alice.drain();

    h.clock.advance(5_000);
    h.send(&alice, ClientMessage::Ready { session_token: None });

    assert!(alice.drain().is_empty());
    assert_eq!(h.coordinator.session(a).unwrap().last_seen_ms, 5_000);
    assert!(h.coordinator.is_queued(a));
}

// =========================================================================
// Status and leaderboard
// =========================================================================

#[test]
fn test_leaderboard_orders_by_total_then_username() {
    let mut h = Harness::new();
    let clients: Vec<Client> = (1..=4).map(Client::new).collect();
    for (client, name) in clients.iter().zip(["dave", "carol", "bob", "alice"]) {
        h.join(client, name);
    }
    // dave (X) beats carol; bob (X) and alice draw.
    play_alternating(&mut h, &clients[0], &clients[1], &X_WINS);
    play_alternating(&mut h, &clients[2], &clients[3], &DRAW);

    let names: Vec<String> = h
        .coordinator
        .leaderboard(10)
        .iter()
        .map(|s| s.username().to_owned())
        .collect();
    assert_eq!(names, ["dave", "alice", "bob", "carol"]);

    assert_eq!(h.coordinator.leaderboard(2).len(), 2);
}

#[test]
fn test_status_reports_uptime() {
    let mut h = Harness::new();
    h.clock.advance(12_345);

    let status = h.coordinator.status();
    assert_eq!(status.uptime_ms, 12_345);
    assert_eq!(h.clock.now_ms(), 12_345);
    assert!(status.leaderboard.is_empty());
}
