//! Cache Store Module
//!
//! Main cache engine: the key/value map plus one optional expiry handle per
//! key. Every mutating operation first fires the expiries that are due, so a
//! key whose deadline has passed is never observed, whichever of the sweeper
//! or the next command gets to it first.

use std::collections::HashMap;
use std::time::Duration;

use rand::seq::IteratorRandom;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{parse_integer, CacheStats, CacheValue, ExpiryHandle, ExpirySchedule};
use crate::error::{CacheError, Result};

/// Acknowledgement returned by PING.
pub const PONG: &str = "PONG";

/// Stale heap entries tolerated before the schedule is compacted.
const SCHEDULE_SLACK: usize = 64;

#[derive(Debug, Clone, Copy)]
enum Adjust {
    Increment,
    Decrement,
}

impl Adjust {
    fn verb(self) -> &'static str {
        match self {
            Adjust::Increment => "increment",
            Adjust::Decrement => "decrement",
        }
    }

    fn apply(self, current: i64, delta: i64) -> Option<i64> {
        match self {
            Adjust::Increment => current.checked_add(delta),
            Adjust::Decrement => current.checked_sub(delta),
        }
    }
}

// == Cache Store ==
/// In-memory key/value store with per-key expiry.
///
/// Invariant: a key present in `expiries` is present in `values`.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    values: HashMap<String, CacheValue>,
    /// Active expiry handle per key, at most one
    expiries: HashMap<String, ExpiryHandle>,
    /// Deadline-ordered scheduled deletions
    schedule: ExpirySchedule,
    /// TTL applied by `set` to keys without an active expiry
    default_expiry: Option<Duration>,
    /// Activity counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// A zero `default_expiry` is treated as disabled.
    pub fn new(default_expiry: Option<Duration>) -> Self {
        Self {
            values: HashMap::new(),
            expiries: HashMap::new(),
            schedule: ExpirySchedule::new(),
            default_expiry: default_expiry.filter(|ttl| !ttl.is_zero()),
            stats: CacheStats::new(),
        }
    }

    // == Ping ==
    pub fn ping(&self) -> &'static str {
        debug!("PING");
        PONG
    }

    // == Set ==
    /// Overwrites the value for `key`.
    ///
    /// When a default expiry is configured and the key has no active expiry,
    /// one is scheduled. An existing expiry is left untouched.
    pub fn set(&mut self, key: &str, value: impl Into<CacheValue>) {
        let now = Instant::now();
        self.fire_due_at(now);

        let value = value.into();
        debug!(key, value = %value, "SET");
        self.insert(key, value, now);
    }

    // == Get ==
    /// Returns the value for `key`, or `None` if absent.
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        self.fire_due_at(Instant::now());
        debug!(key, "GET");

        let value = self.values.get(key).cloned();
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Delete ==
    /// Removes `key` and cancels its expiry. Absent keys are not an error.
    pub fn del(&mut self, key: &str) {
        self.fire_due_at(Instant::now());
        debug!(key, "DEL");

        self.values.remove(key);
        self.expiries.remove(key);
    }

    // == Keys ==
    /// Returns every present key, in no particular order.
    pub fn keys(&mut self) -> Vec<String> {
        self.fire_due_at(Instant::now());
        debug!("KEYS");

        self.values.keys().cloned().collect()
    }

    // == Increment / Decrement ==
    /// Adds `by` (default 1) to the integer value of `key` (default 0).
    pub fn incr(&mut self, key: &str, by: Option<&str>) -> Result<i64> {
        debug!(key, by, "INCR");
        self.adjust(key, by, Adjust::Increment)
    }

    /// Subtracts `by` (default 1) from the integer value of `key` (default 0).
    pub fn decr(&mut self, key: &str, by: Option<&str>) -> Result<i64> {
        debug!(key, by, "DECR");
        self.adjust(key, by, Adjust::Decrement)
    }

    fn adjust(&mut self, key: &str, by: Option<&str>, direction: Adjust) -> Result<i64> {
        let verb = direction.verb();

        let delta = match by.filter(|raw| !raw.trim().is_empty()) {
            None => 1,
            Some(raw) => parse_integer(raw).ok_or_else(|| {
                CacheError::Validation(format!(
                    "Invalid value [{}] to {} by, must be a number.",
                    raw, verb
                ))
            })?,
        };

        let now = Instant::now();
        self.fire_due_at(now);

        let current = match self.values.get(key) {
            None => 0,
            Some(value) => value.as_integer().ok_or_else(|| {
                CacheError::Validation(format!(
                    "Invalid cached value [{}] to {}, must be a number.",
                    value, verb
                ))
            })?,
        };

        let updated = direction.apply(current, delta).ok_or_else(|| {
            CacheError::Validation(format!(
                "Cannot {} [{}] by [{}] without overflow.",
                verb, current, delta
            ))
        })?;

        self.insert(key, CacheValue::Integer(updated), now);
        Ok(updated)
    }

    // == Expire ==
    /// Schedules deletion of `key` after `millis` milliseconds, replacing any
    /// pending expiry.
    ///
    /// Negative durations are clamped to zero. Returns `Ok(false)` when the
    /// key is absent, in which case nothing is scheduled.
    pub fn expire(&mut self, key: &str, millis: &str) -> Result<bool> {
        debug!(key, millis, "EXPIRE");

        let millis = parse_integer(millis).ok_or_else(|| {
            CacheError::Validation(format!(
                "Invalid timeInMillis passed to EXPIRE: {}",
                millis
            ))
        })?;

        Ok(self.expire_in(key, Duration::from_millis(millis.max(0) as u64)))
    }

    /// Typed form of [`CacheStore::expire`].
    pub fn expire_in(&mut self, key: &str, after: Duration) -> bool {
        let now = Instant::now();
        self.fire_due_at(now);

        if !self.values.contains_key(key) {
            return false;
        }
        self.install_expiry(key, after, now);
        true
    }

    // == Unexpire ==
    /// Cancels the pending expiry of `key`, if any.
    ///
    /// Returns true if an expiry was cancelled.
    pub fn unexpire(&mut self, key: &str) -> bool {
        self.fire_due_at(Instant::now());
        debug!(key, "UNEXPIRE");

        self.expiries.remove(key).is_some()
    }

    // == Random ==
    /// Returns a uniformly chosen present key, or `None` if empty.
    pub fn random(&mut self) -> Option<String> {
        self.fire_due_at(Instant::now());
        debug!("RANDOM");

        self.values.keys().choose(&mut rand::thread_rng()).cloned()
    }

    // == Flush ==
    /// Removes every key and cancels every expiry.
    pub fn flush(&mut self) {
        debug!(keys = self.values.len(), "FLUSH");

        self.values.clear();
        self.expiries.clear();
        self.schedule.clear();
        self.stats.record_reset();
    }

    // == Replace Contents ==
    /// Replaces the whole value map. No key of the new content has an expiry.
    pub fn replace_contents(&mut self, contents: HashMap<String, CacheValue>) {
        self.values = contents;
        self.expiries.clear();
        self.schedule.clear();
        self.stats.record_reset();
    }

    // == Snapshot ==
    /// Copies the live value map, without expiry metadata.
    pub fn snapshot(&self) -> HashMap<String, CacheValue> {
        let now = Instant::now();
        self.values
            .iter()
            .filter(|(key, _)| self.is_live(key, now))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    // == Inspection ==
    /// Returns true if `key` holds a value whose expiry has not been reached.
    pub fn contains(&self, key: &str) -> bool {
        self.is_live(key, Instant::now())
    }

    /// Returns the active expiry handle of `key`.
    pub fn expiry(&self, key: &str) -> Option<ExpiryHandle> {
        self.expiries.get(key).copied()
    }

    /// Number of live keys.
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.values.keys().filter(|key| self.is_live(key, now)).count()
    }

    /// Number of keys with an active expiry.
    pub fn pending_expiries(&self) -> usize {
        self.expiries.len()
    }

    /// Approximate bytes held by keys and values.
    pub fn approximate_bytes(&self) -> usize {
        self.values
            .iter()
            .map(|(key, value)| key.len() + value.byte_len())
            .sum()
    }

    /// Returns current activity counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.next_deadline()
    }

    // == Fire Due Expiries ==
    /// Deletes every key whose expiry deadline has been reached.
    ///
    /// Returns the number of keys removed.
    pub fn fire_due(&mut self) -> usize {
        self.fire_due_at(Instant::now())
    }

    fn fire_due_at(&mut self, now: Instant) -> usize {
        let mut fired = 0;

        while let Some((key, id)) = self.schedule.pop_due(now) {
            let live = self
                .expiries
                .get(&key)
                .is_some_and(|handle| handle.fires(id));
            if !live {
                continue;
            }

            // Deletes whatever value the key holds now.
            self.expiries.remove(&key);
            self.values.remove(&key);
            self.stats.record_expiration();
            fired += 1;
            debug!(key = %key, "EXPIRED");
        }

        fired
    }

    fn insert(&mut self, key: &str, value: CacheValue, now: Instant) {
        self.values.insert(key.to_string(), value);

        if let Some(ttl) = self.default_expiry {
            if !self.expiries.contains_key(key) {
                self.install_expiry(key, ttl, now);
            }
        }
    }

    fn install_expiry(&mut self, key: &str, after: Duration, now: Instant) {
        let handle = self.schedule.schedule(key, after, now);
        self.expiries.insert(key.to_string(), handle);

        if self.schedule.len() > self.expiries.len() * 2 + SCHEDULE_SLACK {
            let expiries = &self.expiries;
            self.schedule.retain(|key, id| {
                expiries
                    .get(key)
                    .is_some_and(|handle| handle.fires(id))
            });
        }
    }

    fn is_live(&self, key: &str, now: Instant) -> bool {
        self.values.contains_key(key)
            && !self
                .expiries
                .get(key)
                .is_some_and(|handle| handle.is_due(now))
    }

    // == Length ==
    /// Returns the number of stored values, including any due for expiry.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
