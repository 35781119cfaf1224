//! Expiry Policy Module
//!
//! The `Expiry` trait is the hook the store calls to decide how long an entry
//! lives. `PerKeyExpiry` resolves that duration from the TTL configuration in
//! three tiers: specific key, then group, then the global default.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::entry::CacheValue;
use crate::cache::key::{to_property_path, KEY_DELIMITER};
use crate::config::TtlConfig;

// == Expiry Trait ==
/// Decides entry lifetimes at creation, update and read.
///
/// Each hook returns the duration from `now` after which the entry expires.
pub trait Expiry: Send + Sync {
    fn expire_after_create(&self, key: &str, value: &CacheValue, now: Instant) -> Duration;

    fn expire_after_update(
        &self,
        key: &str,
        value: &CacheValue,
        now: Instant,
        current_ttl: Duration,
    ) -> Duration;

    /// Defaults to leaving the remaining lifetime untouched.
    fn expire_after_read(
        &self,
        _key: &str,
        _value: &CacheValue,
        _now: Instant,
        current_ttl: Duration,
    ) -> Duration {
        current_ttl
    }
}

// == TTL Tier ==
/// Which configuration tier produced a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlTier {
    /// Exact `group.subKey` (or bare key) override
    Specific,
    /// Override on the group portion of a composite key
    Group,
    /// Global default
    Default,
}

impl fmt::Display for TtlTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TtlTier::Specific => "specific",
            TtlTier::Group => "group",
            TtlTier::Default => "default",
        };
        f.write_str(name)
    }
}

/// Resolves the TTL for a storage key and reports the tier that matched.
pub fn resolve(composite_key: &str, config: &TtlConfig) -> (Duration, TtlTier) {
    if let Some(ttl) = config.key_ttl(&to_property_path(composite_key)) {
        return (ttl, TtlTier::Specific);
    }

    if let Some(index) = composite_key.find(KEY_DELIMITER) {
        if index > 0 {
            if let Some(ttl) = config.key_ttl(&composite_key[..index]) {
                return (ttl, TtlTier::Group);
            }
        }
    }

    (config.default_ttl, TtlTier::Default)
}

/// Resolves the TTL for a storage key.
pub fn resolve_ttl(composite_key: &str, config: &TtlConfig) -> Duration {
    resolve(composite_key, config).0
}

// == Per-Key Expiry ==
/// Expiry policy backed by the TTL configuration.
///
/// Creation and update both re-resolve the TTL; reads never extend it.
#[derive(Debug, Clone)]
pub struct PerKeyExpiry {
    config: Arc<TtlConfig>,
}

impl PerKeyExpiry {
    pub fn new(config: Arc<TtlConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TtlConfig {
        &self.config
    }
}

impl Expiry for PerKeyExpiry {
    fn expire_after_create(&self, key: &str, _value: &CacheValue, _now: Instant) -> Duration {
        let (ttl, tier) = resolve(key, &self.config);
        debug!(key, ?ttl, %tier, "Cache entry created");
        ttl
    }

    fn expire_after_update(
        &self,
        key: &str,
        _value: &CacheValue,
        _now: Instant,
        _current_ttl: Duration,
    ) -> Duration {
        let (ttl, tier) = resolve(key, &self.config);
        debug!(key, ?ttl, %tier, "Cache entry updated");
        ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TENANT_A: &str = "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d";
    const TENANT_B: &str = "cbec5243-e668-467e-8b67-d236510181b1";

    fn mins(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn sample_config() -> TtlConfig {
        TtlConfig::default()
            .with_key("tracing.matrix.otel", mins(3))
            .with_key("matrix.event.setting", mins(10))
            .with_key(format!("matrix.event.setting.{}", TENANT_B), mins(5))
    }

    #[test]
    fn test_specific_override() {
        let config = sample_config();
        assert_eq!(
            resolve("tracing:matrix.otel", &config),
            (mins(3), TtlTier::Specific)
        );
    }

    #[test]
    fn test_specific_beats_group() {
        let config = sample_config();
        let key = format!("matrix.event.setting:{}", TENANT_B);
        assert_eq!(resolve(&key, &config), (mins(5), TtlTier::Specific));
    }

    #[test]
    fn test_group_fallback() {
        let config = sample_config();
        let key = format!("matrix.event.setting:{}", TENANT_A);
        assert_eq!(resolve(&key, &config), (mins(10), TtlTier::Group));
    }

    #[test]
    fn test_default_fallback() {
        let config = sample_config();
        assert_eq!(
            resolve("some.other.group", &config),
            (mins(30), TtlTier::Default)
        );
        assert_eq!(resolve("tracing:other", &config), (mins(30), TtlTier::Default));
    }

    #[test]
    fn test_bare_group_key_is_specific_tier() {
        let config = sample_config();
        assert_eq!(
            resolve("matrix.event.setting", &config),
            (mins(10), TtlTier::Specific)
        );
    }

    #[test]
    fn test_group_lookup_is_not_normalized() {
        // The group portion keeps its dots; only the full key is normalized
        let config = TtlConfig::default().with_key("matrix", mins(1));
        assert_eq!(resolve_ttl("matrix.event.setting:tenant", &config), mins(30));
    }

    #[test]
    fn test_leading_delimiter_skips_group_tier() {
        let config = TtlConfig::default().with_key("", mins(1));
        assert_eq!(resolve(":tenant", &config), (mins(30), TtlTier::Default));
    }

    #[test]
    fn test_policy_hooks() {
        let expiry = PerKeyExpiry::new(Arc::new(sample_config()));
        let now = Instant::now();
        let value: &CacheValue = &true;

        assert_eq!(
            expiry.expire_after_create("tracing:matrix.otel", value, now),
            mins(3)
        );
        assert_eq!(
            expiry.expire_after_update("tracing:matrix.otel", value, now, Duration::from_secs(7)),
            mins(3)
        );
        assert_eq!(
            expiry.expire_after_read("tracing:matrix.otel", value, now, Duration::from_secs(7)),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(TtlTier::Specific.to_string(), "specific");
        assert_eq!(TtlTier::Group.to_string(), "group");
        assert_eq!(TtlTier::Default.to_string(), "default");
    }
}
