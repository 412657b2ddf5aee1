//! Server tuning knobs.

/// Configuration for matchmaking and the coordinator task.
///
/// Override individual fields with struct update syntax:
///
/// ```rust
/// use royale::MatchConfig;
///
/// let fast = MatchConfig {
///     base_time_ms: 10_000,
///     ..MatchConfig::default()
/// };
/// assert_eq!(fast.settle_delay_ms, 2_000);
/// ```
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Starting clock for each player in a freshly paired match.
    pub base_time_ms: u64,

    /// How long a winner waits between the end of a game and re-entering
    /// the queue.
    pub settle_delay_ms: u64,

    /// How many entries `status()` includes in its leaderboard.
    pub leaderboard_limit: usize,

    /// Capacity of the coordinator's command channel.
    pub command_buffer: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            base_time_ms: 30_000,
            settle_delay_ms: 2_000,
            leaderboard_limit: 10,
            command_buffer: 256,
        }
    }
}
