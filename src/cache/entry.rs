//! Cache Entry Module
//!
//! Defines the structure for individual cache entries: a type-erased value
//! plus the absolute instant at which it expires.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Type-erased cached value.
pub type CacheValue = dyn Any + Send + Sync;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Arc<CacheValue>,
    /// Instant of the first write under this key
    pub created_at: Instant,
    /// Instant of the most recent write
    pub updated_at: Instant,
    /// Expiration instant, None when `now + ttl` is not representable
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry written at `now` that lives for `ttl`.
    pub fn new(value: Arc<CacheValue>, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            created_at: now,
            updated_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    // == Replace ==
    /// Swaps in a new value, keeping the creation instant.
    pub fn replace(&mut self, value: Arc<CacheValue>, now: Instant, ttl: Duration) {
        self.value = value;
        self.updated_at = now;
        self.set_ttl(now, ttl);
    }

    /// Sets the expiry to `ttl` from `now`.
    pub fn set_ttl(&mut self, now: Instant, ttl: Duration) {
        self.expires_at = now.checked_add(ttl);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now` reaches its expiration instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired and
    /// `Duration::MAX` when the entry never expires.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        match self.expires_at {
            Some(expires) => expires.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
