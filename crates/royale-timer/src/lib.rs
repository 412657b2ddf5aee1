//! Time for Tic-Tac-Toe Royale: where "now" comes from, and work that
//! should happen later.
//!
//! # Clocks
//!
//! Everything downstream measures time as `u64` milliseconds from a
//! [`Clock`]. Production uses [`TokioClock`], which reads Tokio's
//! monotonic clock (so `tokio::time::pause()` freezes it too). Tests that
//! want full control use [`ManualClock`] and move time by hand.
//!
//! # Deferred work
//!
//! [`Timers`] is a passive queue of items due at a clock millisecond. It
//! never spawns or sleeps on its own; the owner asks for
//! [`next_deadline`](Timers::next_deadline), sleeps until then, and drains
//! [`pop_due`](Timers::pop_due):
//!
//! ```ignore
//! loop {
//!     let deadline = timers.next_deadline().map(|ms| clock.instant_at(ms));
//!     tokio::select! {
//!         Some(cmd) = rx.recv() => { /* handle command */ }
//!         _ = sleep_until_opt(deadline) => {
//!             for item in timers.pop_due(clock.now_ms()) { /* fire */ }
//!         }
//!     }
//! }
//! ```

mod clock;
mod timers;

pub use clock::{Clock, ManualClock, TokioClock};
pub use timers::{TimerId, Timers};
