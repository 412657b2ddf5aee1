//! FIFO matchmaking queue.

use std::collections::VecDeque;

use crate::SessionId;

/// Sessions waiting for an opponent, oldest first.
///
/// A session appears at most once. Enqueuing a session that is already
/// waiting moves it to the tail.
#[derive(Debug, Default)]
pub struct Queue {
    waiting: VecDeque<SessionId>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, id: SessionId) {
        self.remove(id);
        self.waiting.push_back(id);
    }

    /// Drops `id` from the queue. Returns whether it was waiting.
    pub fn remove(&mut self, id: SessionId) -> bool {
        match self.waiting.iter().position(|&s| s == id) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    /// Pops the two longest-waiting sessions as `(player_x, player_o)`.
    pub fn pair_next(&mut self) -> Option<(SessionId, SessionId)> {
        if self.waiting.len() < 2 {
            return None;
        }
        let x = self.waiting.pop_front()?;
        let o = self.waiting.pop_front()?;
        Some((x, o))
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.waiting.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
