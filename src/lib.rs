//! Tiered TTL Cache - an in-process object cache with per-key TTLs
//!
//! Entries are addressed by a group and an optional sub-key. Each write
//! resolves its TTL from configuration: a specific `group.subKey` override
//! wins over a `group` override, which wins over the global default.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{CacheService, Clock, ExpiringStore, ManualClock, PerKeyExpiry, SystemClock};
pub use config::TtlConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
