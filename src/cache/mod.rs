//! Cache Module
//!
//! Provides in-memory caching with per-key TTLs resolved from a hierarchical
//! key namespace.

mod clock;
mod entry;
mod expiry;
mod key;
mod service;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheValue};
pub use expiry::{resolve, resolve_ttl, Expiry, PerKeyExpiry, TtlTier};
pub use key::{to_property_path, CompositeKey, KEY_DELIMITER, PROPERTY_SEPARATOR};
pub use service::CacheService;
pub use stats::{CacheStats, StatsCounter};
pub use store::{ExpiringStore, DEFAULT_SWEEP_INTERVAL};
