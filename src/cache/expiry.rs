//! Expiry Scheduling Module
//!
//! Pending deletions are kept in a deadline-ordered heap. Each scheduled
//! deletion carries the id of the [`ExpiryHandle`] that created it; when the
//! handle for a key is replaced or cancelled, the old heap entry no longer
//! matches and is discarded when popped. This keeps at most one live timer
//! per key without having to search the heap on cancellation.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::time::Instant;

// == Expiry Handle ==
/// Opaque reference to one scheduled deletion of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryHandle {
    id: u64,
    deadline: Instant,
}

impl ExpiryHandle {
    /// Point in time at which the key is deleted.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns true if the deadline has been reached at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline <= now
    }

    /// Remaining time until the deadline, zero once due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Returns true if the scheduled entry `id` was created for this handle.
    pub fn fires(&self, id: u64) -> bool {
        self.id == id
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Scheduled {
    deadline: Instant,
    id: u64,
    key: String,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// == Expiry Schedule ==
/// Deadline-ordered index of scheduled deletions.
#[derive(Debug, Default)]
pub struct ExpirySchedule {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_id: u64,
}

impl ExpirySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a deletion of `key` after `after` and returns its handle.
    pub fn schedule(&mut self, key: &str, after: Duration, now: Instant) -> ExpiryHandle {
        self.next_id += 1;
        let handle = ExpiryHandle {
            id: self.next_id,
            deadline: now + after,
        };

        self.heap.push(Reverse(Scheduled {
            deadline: handle.deadline,
            id: handle.id,
            key: key.to_string(),
        }));

        handle
    }

    /// Pops the next scheduled deletion whose deadline is reached at `now`.
    ///
    /// Entries are returned whether or not their handle is still live; the
    /// caller decides with [`ExpiryHandle::fires`].
    pub fn pop_due(&mut self, now: Instant) -> Option<(String, u64)> {
        match self.heap.peek() {
            Some(Reverse(next)) if next.deadline <= now => {}
            _ => return None,
        }
        self.heap.pop().map(|Reverse(entry)| (entry.key, entry.id))
    }

    /// Earliest deadline in the heap, live or stale.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(next)| next.deadline)
    }

    /// Number of heap entries, including stale ones.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every stale entry, keeping only those accepted by `is_live`.
    pub fn retain(&mut self, mut is_live: impl FnMut(&str, u64) -> bool) {
        self.heap
            .retain(|Reverse(entry)| is_live(&entry.key, entry.id));
    }

    /// Drops every scheduled deletion.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_deadline_order() {
        let now = Instant::now();
        let mut schedule = ExpirySchedule::new();
        schedule.schedule("late", Duration::from_millis(200), now);
        schedule.schedule("early", Duration::from_millis(100), now);

        assert!(schedule.pop_due(now).is_none());

        let later = now + Duration::from_millis(250);
        assert_eq!(schedule.pop_due(later).unwrap().0, "early");
        assert_eq!(schedule.pop_due(later).unwrap().0, "late");
        assert!(schedule.pop_due(later).is_none());
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_handles_are_distinct() {
        let now = Instant::now();
        let mut schedule = ExpirySchedule::new();
        let first = schedule.schedule("k", Duration::from_millis(10), now);
        let second = schedule.schedule("k", Duration::from_millis(10), now);

        assert_ne!(first, second);

        let (_, id) = schedule.pop_due(now + Duration::from_millis(10)).unwrap();
        assert!(first.fires(id));
        assert!(!second.fires(id));
    }

    #[test]
    fn test_handle_remaining() {
        let now = Instant::now();
        let mut schedule = ExpirySchedule::new();
        let handle = schedule.schedule("k", Duration::from_millis(500), now);

        assert_eq!(handle.remaining(now), Duration::from_millis(500));
        assert!(!handle.is_due(now));
        assert!(handle.is_due(now + Duration::from_millis(500)));
        assert_eq!(handle.remaining(now + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_retain_drops_stale_entries() {
        let now = Instant::now();
        let mut schedule = ExpirySchedule::new();
        let stale = schedule.schedule("k", Duration::from_millis(10), now);
        let live = schedule.schedule("k", Duration::from_millis(20), now);

        schedule.retain(|_, id| live.fires(id));

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.next_deadline(), Some(live.deadline()));
        assert_ne!(schedule.next_deadline(), Some(stale.deadline()));
    }
}
