//! A min-heap of deferred items keyed by due time.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use tracing::trace;

/// Handle to a scheduled item, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Items waiting for a clock millisecond.
///
/// Items due at the same millisecond come out in the order they were
/// scheduled. Cancellation is lazy: the heap entry stays behind and is
/// skipped once it reaches the top.
pub struct Timers<T> {
    /// (due_ms, seq). seq breaks ties in FIFO order and keys `items`.
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    items: HashMap<u64, T>,
    next_seq: u64,
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            items: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `item` to become due at `due_ms`.
    pub fn schedule_at(&mut self, due_ms: u64, item: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((due_ms, seq)));
        self.items.insert(seq, item);
        trace!(timer = %TimerId(seq), due_ms, "timer scheduled");
        TimerId(seq)
    }

    /// Removes a pending item. Returns it if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let item = self.items.remove(&id.0);
        if item.is_some() {
            trace!(timer = %id, "timer cancelled");
        }
        item
    }

    /// The earliest due time among live items.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((due, _))| *due)
    }

    /// Removes and returns every item due at or before `now_ms`, earliest
    /// first.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(&Reverse((at, seq))) = self.heap.peek() {
            if at > now_ms {
                break;
            }
            self.heap.pop();
            if let Some(item) = self.items.remove(&seq) {
                trace!(timer = %TimerId(seq), due_ms = at, now_ms, "timer fired");
                due.push(item);
            }
        }
        due
    }

    /// Number of live (not fired, not cancelled) items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn discard_cancelled(&mut self) {
        while let Some(&Reverse((_, seq))) = self.heap.peek() {
            if self.items.contains_key(&seq) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}
