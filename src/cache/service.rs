//! Cache Service Module
//!
//! Typed, two-level key API over the expiring store. Callers address values
//! by group and optional sub-key; the `group:subKey` joining scheme stays
//! internal.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{
    CacheStats, CacheValue, Clock, CompositeKey, ExpiringStore, Expiry, PerKeyExpiry, SystemClock,
    KEY_DELIMITER,
};
use crate::config::TtlConfig;
use crate::error::Result;

// == Cache Service ==
/// Hierarchical-key cache whose TTLs come from the expiry policy.
///
/// Reads return `None` for a missing key, an expired entry, or a value of a
/// different type than requested. These cases are indistinguishable.
pub struct CacheService<E: Expiry = PerKeyExpiry> {
    store: Arc<ExpiringStore<E>>,
}

impl CacheService<PerKeyExpiry> {
    /// Creates a service using the system clock.
    pub fn new(config: Arc<TtlConfig>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a service with an explicit time source.
    pub fn with_clock(config: Arc<TtlConfig>, clock: Arc<dyn Clock>) -> Self {
        let store = ExpiringStore::with_clock(PerKeyExpiry::new(config), clock);
        Self::from_store(Arc::new(store))
    }
}

impl<E: Expiry> CacheService<E> {
    /// Wraps an existing store.
    pub fn from_store(store: Arc<ExpiringStore<E>>) -> Self {
        Self { store }
    }

    // == Put ==
    /// Stores `value` under `group:sub_key`.
    ///
    /// Fails with `InvalidKey` if either part is empty or contains `:`.
    pub fn put<V>(&self, group: &str, sub_key: &str, value: V) -> Result<()>
    where
        V: Any + Send + Sync,
    {
        let key = CompositeKey::new(group, sub_key)?;
        self.store.insert(key.into_string(), Arc::new(value));
        Ok(())
    }

    /// Stores `value` under the bare group key.
    pub fn put_group<V>(&self, group: &str, value: V) -> Result<()>
    where
        V: Any + Send + Sync,
    {
        let key = CompositeKey::group(group)?;
        self.store.insert(key.into_string(), Arc::new(value));
        Ok(())
    }

    // == Get ==
    /// Returns a clone of the value under `group:sub_key` if it is live and a `T`.
    pub fn get<T>(&self, group: &str, sub_key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        let key = CompositeKey::new(group, sub_key).ok()?;
        self.read_as::<T>(&key)?.downcast_ref::<T>().cloned()
    }

    /// Returns a clone of the value under the bare group key if it is live and a `T`.
    pub fn get_group<T>(&self, group: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        let key = CompositeKey::group(group).ok()?;
        self.read_as::<T>(&key)?.downcast_ref::<T>().cloned()
    }

    /// Like `get`, but shares the stored value instead of cloning it.
    pub fn get_arc<T>(&self, group: &str, sub_key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let key = CompositeKey::new(group, sub_key).ok()?;
        self.read_as::<T>(&key)?.downcast::<T>().ok()
    }

    /// Like `get_group`, but shares the stored value instead of cloning it.
    pub fn get_group_arc<T>(&self, group: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let key = CompositeKey::group(group).ok()?;
        self.read_as::<T>(&key)?.downcast::<T>().ok()
    }

    /// Reads `key` only if it holds a `T`, so a mismatch counts as a miss.
    fn read_as<T: Any>(&self, key: &CompositeKey) -> Option<Arc<CacheValue>> {
        self.store.get_if(key.as_str(), |value| {
            let matches = value.is::<T>();
            if !matches {
                debug!(
                    key = key.as_str(),
                    requested = std::any::type_name::<T>(),
                    "Cached value has a different type"
                );
            }
            matches
        })
    }

    /// Remaining lifetime of `group:sub_key`, without counting as a read.
    pub fn remaining_ttl(&self, group: &str, sub_key: &str) -> Option<Duration> {
        let key = CompositeKey::new(group, sub_key).ok()?;
        self.store.remaining_ttl(key.as_str())
    }

    /// Remaining lifetime of the bare group key, without counting as a read.
    pub fn remaining_group_ttl(&self, group: &str) -> Option<Duration> {
        let key = CompositeKey::group(group).ok()?;
        self.store.remaining_ttl(key.as_str())
    }

    // == Invalidate ==
    /// Removes `group:sub_key`. Returns true if an entry was present.
    pub fn invalidate(&self, group: &str, sub_key: &str) -> bool {
        CompositeKey::new(group, sub_key)
            .map(|key| self.store.remove(key.as_str()))
            .unwrap_or(false)
    }

    /// Removes the bare group key and every `group:*` entry.
    pub fn invalidate_group(&self, group: &str) -> usize {
        if CompositeKey::group(group).is_err() {
            return 0;
        }

        let removed = self.store.remove_where(|key| match key.split_once(KEY_DELIMITER) {
            Some((prefix, _)) => prefix == group,
            None => key == group,
        });
        debug!(group, removed, "Group invalidated");
        removed
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
    }

    // == Introspection ==
    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Snapshot of hit, miss, write and expiration counters.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Shared handle to the underlying store, e.g. for the cleanup task.
    pub fn store(&self) -> &Arc<ExpiringStore<E>> {
        &self.store
    }
}

impl<E: Expiry> Clone for CacheService<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<E: Expiry> fmt::Debug for CacheService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("store", &self.store)
            .finish()
    }
}
