//! Interval index over half-open time ranges
//!
//! Intervals are kept in a `BTreeMap` ordered by start, alongside the length
//! of the longest interval ever inserted. Any interval intersecting
//! `[start, end)` must begin inside `(start - longest, end)`, so overlap
//! queries only walk that key range instead of the whole index. The
//! high-water mark is not lowered on removal; a stale value widens the scan
//! but never changes an answer.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use chrono::{DateTime, TimeDelta, Utc};

type Key = (DateTime<Utc>, u64);

#[derive(Debug, Clone)]
struct Slot {
    end: DateTime<Utc>,
    event_id: String,
}

/// Overlap index keyed by event id
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    by_start: BTreeMap<Key, Slot>,
    by_event: HashMap<String, Vec<Key>>,
    longest: TimeDelta,
    next_seq: u64,
}

impl Default for IntervalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self {
            by_start: BTreeMap::new(),
            by_event: HashMap::new(),
            longest: TimeDelta::zero(),
            next_seq: 0,
        }
    }

    /// Add `[start, end)` for `event_id`
    ///
    /// No overlap check happens here; callers verify first.
    pub fn insert(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, event_id: &str) {
        let key = (start, self.next_seq);
        self.next_seq += 1;

        let length = end - start;
        if length > self.longest {
            self.longest = length;
        }

        self.by_start.insert(
            key,
            Slot {
                end,
                event_id: event_id.to_string(),
            },
        );
        self.by_event
            .entry(event_id.to_string())
            .or_default()
            .push(key);
    }

    /// Whether any stored interval intersects `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.candidates(start, end).next().is_some()
    }

    /// Ids of every interval intersecting `[start, end)`, ordered by start
    pub fn find_overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
        self.candidates(start, end)
            .map(|(_, _, id)| id.to_string())
            .collect()
    }

    /// Earliest interval intersecting `[start, end)`, as `(start, end, event_id)`
    pub fn first_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>, &str)> {
        self.candidates(start, end).next()
    }

    /// Remove every interval tagged with `event_id`, returning them
    pub fn remove_by_event(&mut self, event_id: &str) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let Some(keys) = self.by_event.remove(event_id) else {
            return Vec::new();
        };
        keys.into_iter()
            .filter_map(|key| self.by_start.remove(&key).map(|slot| (key.0, slot.end)))
            .collect()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.by_event.contains_key(event_id)
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    /// All intervals ordered by start, as `(start, end, event_id)`
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>, &str)> {
        self.by_start
            .iter()
            .map(|(key, slot)| (key.0, slot.end, slot.event_id.as_str()))
    }

    fn candidates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>, &str)> {
        let lower = match start.checked_sub_signed(self.longest) {
            Some(t) => Bound::Included((t, 0)),
            None => Bound::Unbounded,
        };
        // an inverted query matches nothing; also keeps the range well-formed
        let upper = if end < start {
            Bound::Excluded((start, 0))
        } else {
            Bound::Excluded((end, 0))
        };
        let empty = end < start;

        self.by_start
            .range((lower, upper))
            .filter(move |(key, slot)| !empty && key.0 < end && slot.end > start)
            .map(|(key, slot)| (key.0, slot.end, slot.event_id.as_str()))
    }
}
