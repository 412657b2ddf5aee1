//! Coordinator actor: a Tokio task that owns the [`MatchCoordinator`].
//!
//! Connection tasks never touch coordinator state. They send commands on
//! a bounded channel and the actor applies them one at a time, so each
//! command's mutations are complete before the next one is read. Between
//! commands the actor sleeps until the next deferred requeue is due.

use royale_game::PlayerScore;
use royale_protocol::ClientMessage;
use royale_session::ConnectionHandle;
use royale_timer::TokioClock;
use royale_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::coordinator::{MatchCoordinator, Status};
use crate::{MatchConfig, RoyaleError};

/// Commands sent to the coordinator actor.
///
/// Variants with a `reply` field are queries; the caller awaits the
/// answer on the `oneshot` channel.
enum Command {
    /// A decoded message from a client.
    Message {
        handle: ConnectionHandle,
        msg: ClientMessage,
    },

    /// A connection closed.
    Closed { conn_id: ConnectionId },

    Status { reply: oneshot::Sender<Status> },

    Leaderboard {
        limit: usize,
        reply: oneshot::Sender<Vec<PlayerScore>>,
    },
}

/// Handle to the running coordinator actor.
///
/// Cheap to clone: it's an `mpsc::Sender` wrapper. Every connection task
/// holds one.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Starts a coordinator task on the current runtime.
    pub fn spawn(config: MatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.command_buffer.max(1));
        let actor = CoordinatorActor {
            coordinator: MatchCoordinator::new(TokioClock::new(), config),
            receiver,
        };
        tokio::spawn(actor.run());
        Self { sender }
    }

    /// Delivers a client message. Replies go out on `handle`.
    pub async fn message(
        &self,
        handle: ConnectionHandle,
        msg: ClientMessage,
    ) -> Result<(), RoyaleError> {
        self.sender
            .send(Command::Message { handle, msg })
            .await
            .map_err(|_| RoyaleError::Unavailable)
    }

    /// Reports that a connection has closed.
    pub async fn closed(&self, conn_id: ConnectionId) -> Result<(), RoyaleError> {
        self.sender
            .send(Command::Closed { conn_id })
            .await
            .map_err(|_| RoyaleError::Unavailable)
    }

    pub async fn status(&self) -> Result<Status, RoyaleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Command::Status { reply: reply_tx })
            .await
            .map_err(|_| RoyaleError::Unavailable)?;
        reply_rx.await.map_err(|_| RoyaleError::Unavailable)
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerScore>, RoyaleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Command::Leaderboard {
                limit,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoyaleError::Unavailable)?;
        reply_rx.await.map_err(|_| RoyaleError::Unavailable)
    }
}

struct CoordinatorActor {
    coordinator: MatchCoordinator<TokioClock>,
    receiver: mpsc::Receiver<Command>,
}

impl CoordinatorActor {
    /// Runs until every [`CoordinatorHandle`] has been dropped.
    async fn run(mut self) {
        info!("match coordinator started");

        loop {
            let deadline = self.coordinator.next_deadline();
            let clock = *self.coordinator.clock();
            let timer = async move {
                match deadline {
                    Some(ms) => tokio::time::sleep_until(clock.instant_at(ms)).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                () = timer => self.coordinator.fire_due(),
            }
        }

        info!("match coordinator stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Message { handle, msg } => {
                self.coordinator.handle_message(&handle, msg);
            }
            Command::Closed { conn_id } => {
                if self.coordinator.handle_close(conn_id).is_none() {
                    debug!(%conn_id, "closed connection had no session");
                }
            }
            Command::Status { reply } => {
                let _ = reply.send(self.coordinator.status());
            }
            Command::Leaderboard { limit, reply } => {
                let _ = reply.send(self.coordinator.leaderboard(limit));
            }
        }
    }
}
