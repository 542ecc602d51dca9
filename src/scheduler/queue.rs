//! Lookahead queue: earliest upcoming event first
//!
//! A binary min-heap on start time. Entries whose start has passed are
//! popped lazily by [`LookaheadQueue::peek_next`] and never come back.
//! Removing an arbitrary id filters and rebuilds the heap, O(n).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedEvent {
    start: DateTime<Utc>,
    seq: u64,
    event_id: String,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the earliest start, then the oldest push
        other
            .start
            .cmp(&self.start)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered queue of `(start, event_id)` pairs
#[derive(Debug, Default, Clone)]
pub struct LookaheadQueue {
    heap: BinaryHeap<QueuedEvent>,
    next_seq: u64,
}

impl LookaheadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, start: DateTime<Utc>, event_id: &str) {
        self.heap.push(QueuedEvent {
            start,
            seq: self.next_seq,
            event_id: event_id.to_string(),
        });
        self.next_seq += 1;
    }

    /// Drop every entry for `event_id`, returning the removed start times
    pub fn remove(&mut self, event_id: &str) -> Vec<DateTime<Utc>> {
        let mut removed = Vec::new();
        self.heap.retain(|queued| {
            if queued.event_id == event_id {
                removed.push(queued.start);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Earliest entry starting at or after `now`
    ///
    /// Entries starting strictly before `now` are discarded permanently.
    pub fn peek_next(&mut self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, String)> {
        while self.heap.peek().is_some_and(|queued| queued.start < now) {
            self.heap.pop();
        }
        self.heap
            .peek()
            .map(|queued| (queued.start, queued.event_id.clone()))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
