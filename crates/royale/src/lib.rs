//! # Tic-Tac-Toe Royale
//!
//! A matchmaking server for timed tic-tac-toe. Players join a queue over
//! a WebSocket, are paired first come first served, and play games with
//! a chess clock. Winners go back in the queue after a short pause,
//! losers are eliminated, and draws turn into rematches on a shorter
//! clock.
//!
//! ```text
//! WebSocket ─→ handler task ─→ CoordinatorHandle ─→ CoordinatorActor
//!     ↑                                                  │ owns
//!     └──── ServerEvent (per-connection channel) ←── MatchCoordinator
//!                                                    (sessions, queue,
//!                                                     matches, timers)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use royale::RoyaleServer;
//!
//! # async fn start() -> Result<(), royale::RoyaleError> {
//! let server = RoyaleServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod actor;
mod config;
mod coordinator;
mod error;
mod handler;
mod matches;
mod server;

pub use actor::CoordinatorHandle;
pub use config::MatchConfig;
pub use coordinator::{MatchCoordinator, Status};
pub use error::{RequestError, RoyaleError};
pub use matches::{Match, MatchId, MatchRegistry};
pub use server::{RoyaleServer, RoyaleServerBuilder};
