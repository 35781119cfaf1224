//! Cache Store Module
//!
//! Expiring key-value store. Storage is a sharded concurrent map; each
//! entry's lifetime comes from a pluggable `Expiry` policy and is checked
//! against an injected `Clock`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CacheValue, Clock, Expiry, StatsCounter, SystemClock};

/// Default clock time between sweeps triggered by writes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// == Expiring Store ==
/// Concurrent store with per-entry expiry.
///
/// Expired entries are removed lazily on access, by a sweep that writes
/// trigger once per sweep interval of clock time, or in bulk by
/// `cleanup_expired`.
pub struct ExpiringStore<E: Expiry> {
    /// Key-value storage
    entries: DashMap<String, CacheEntry>,
    /// Lifetime policy consulted on every write and read
    expiry: E,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Activity counters
    stats: StatsCounter,
    /// Clock reading at construction; sweep deadlines are offsets from it
    origin: Instant,
    sweep_interval: Duration,
    /// Nanoseconds after `origin` at which the next write sweeps
    next_sweep_nanos: AtomicU64,
}

/// What a read found under a key.
enum Lookup {
    Absent,
    Expired,
    Rejected,
    Live {
        value: Arc<CacheValue>,
        adjusted_ttl: Option<Duration>,
    },
}

impl<E: Expiry> ExpiringStore<E> {
    // == Constructor ==
    /// Creates a store that reads time from the system clock.
    pub fn new(expiry: E) -> Self {
        Self::with_clock(expiry, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    pub fn with_clock(expiry: E, clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now();
        Self {
            entries: DashMap::new(),
            expiry,
            clock,
            stats: StatsCounter::new(),
            origin,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            next_sweep_nanos: AtomicU64::new(nanos(DEFAULT_SWEEP_INTERVAL)),
        }
    }

    /// Sets how much clock time passes between write-triggered sweeps.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self.next_sweep_nanos = AtomicU64::new(nanos(interval));
        self
    }

    // == Insert ==
    /// Stores a value, replacing any previous value under the same key.
    ///
    /// A live entry goes through the update hook; a vacant or expired slot
    /// goes through the create hook. The write is atomic per key. Once per
    /// sweep interval a write also removes every expired entry.
    pub fn insert(&self, key: impl Into<String>, value: Arc<CacheValue>) {
        let now = self.clock.now();

        match self.entries.entry(key.into()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    let ttl = self
                        .expiry
                        .expire_after_create(occupied.key(), value.as_ref(), now);
                    occupied.insert(CacheEntry::new(value, now, ttl));
                    self.stats.record_expirations(1);
                    self.stats.record_insert();
                } else {
                    let current = occupied.get().ttl_remaining(now);
                    let ttl = self.expiry.expire_after_update(
                        occupied.key(),
                        value.as_ref(),
                        now,
                        current,
                    );
                    occupied.get_mut().replace(value, now, ttl);
                    self.stats.record_update();
                }
            }
            Entry::Vacant(vacant) => {
                let ttl = self
                    .expiry
                    .expire_after_create(vacant.key(), value.as_ref(), now);
                vacant.insert(CacheEntry::new(value, now, ttl));
                self.stats.record_insert();
            }
        }

        // The entry guard is released above; a sweep locks every shard
        self.sweep_if_due(now);
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed and counted as misses. The read hook may
    /// adjust the remaining lifetime; `PerKeyExpiry` never does.
    pub fn get(&self, key: &str) -> Option<Arc<CacheValue>> {
        self.get_if(key, |_| true)
    }

    /// Retrieves a live value by key if `accept` approves it.
    ///
    /// A rejected value is a miss: no hit is counted and the read hook does
    /// not run.
    pub fn get_if(
        &self,
        key: &str,
        accept: impl FnOnce(&CacheValue) -> bool,
    ) -> Option<Arc<CacheValue>> {
        let now = self.clock.now();

        let lookup = match self.entries.get(key) {
            None => Lookup::Absent,
            Some(entry) => {
                if entry.is_expired(now) {
                    Lookup::Expired
                } else if !accept(entry.value.as_ref()) {
                    Lookup::Rejected
                } else {
                    let current = entry.ttl_remaining(now);
                    let ttl = self
                        .expiry
                        .expire_after_read(key, entry.value.as_ref(), now, current);
                    Lookup::Live {
                        value: Arc::clone(&entry.value),
                        adjusted_ttl: (ttl != current).then_some(ttl),
                    }
                }
            }
        };

        match lookup {
            Lookup::Live { value, adjusted_ttl } => {
                if let Some(ttl) = adjusted_ttl {
                    self.apply_read_ttl(key, &value, now, ttl);
                }
                self.stats.record_hit();
                Some(value)
            }
            Lookup::Expired => {
                if self.remove_if_expired(key) {
                    debug!(key, "Removed expired entry on read");
                }
                self.stats.record_miss();
                None
            }
            Lookup::Rejected | Lookup::Absent => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Writes a read-hook TTL back, unless the entry was replaced meanwhile.
    fn apply_read_ttl(&self, key: &str, value: &Arc<CacheValue>, now: Instant, ttl: Duration) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if Arc::ptr_eq(&entry.value, value) {
                entry.set_ttl(now, ttl);
            }
        }
    }

    // == Remaining TTL ==
    /// Returns the remaining lifetime of a live entry without touching it.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    /// Returns true if a live entry exists under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.remaining_ttl(key).is_some()
    }

    // == Remove ==
    /// Removes an entry by key. Returns true if one was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose key satisfies `predicate`.
    pub fn remove_where(&self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if predicate(key.as_str()) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    // == Invalidate All ==
    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
        debug!("Cache invalidated");
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        self.stats.record_expirations(removed as u64);
        removed
    }

    /// Sweeps if the next sweep deadline has passed. Only the writer that
    /// moves the deadline forward sweeps.
    fn sweep_if_due(&self, now: Instant) {
        let elapsed = nanos(now.saturating_duration_since(self.origin));
        let deadline = self.next_sweep_nanos.load(Ordering::Acquire);
        if elapsed < deadline {
            return;
        }

        let next = elapsed.saturating_add(nanos(self.sweep_interval));
        if self
            .next_sweep_nanos
            .compare_exchange(deadline, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let removed = self.cleanup_expired();
            if removed > 0 {
                debug!(removed, "Write-triggered sweep removed expired entries");
            }
        }
    }

    fn remove_if_expired(&self, key: &str) -> bool {
        let now = self.clock.now();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some();
        if removed {
            self.stats.record_expirations(1);
        }
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones that
    /// have not been swept yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored, expired or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The expiry policy consulted by this store.
    pub fn expiry(&self) -> &E {
        &self.expiry
    }
}

impl<E: Expiry> fmt::Debug for ExpiringStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("entry_count", &self.entries.len())
            .field("sweep_interval", &self.sweep_interval)
            .field("clock", &self.clock)
            .finish()
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
