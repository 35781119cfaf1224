//! Configuration Module
//!
//! Holds the TTL configuration: a global default and a map of dotted key
//! paths (`group` or `group.subKey`) to override durations.
//!
//! The configuration is built once at startup, from environment variables
//! or a JSON document, and shared read-only afterwards.

pub mod duration;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CacheError, Result};

pub use duration::parse_duration;

/// TTL applied when neither a specific nor a group override matches.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Environment variable holding the default TTL (e.g. `30m`).
pub const DEFAULT_TTL_ENV: &str = "CACHE_TTL_DEFAULT";

/// Environment variable holding `key=duration` overrides separated by commas.
pub const KEYS_ENV: &str = "CACHE_TTL_KEYS";

/// TTL configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlConfig {
    /// TTL used when no override matches. Always positive.
    pub default_ttl: Duration,
    /// Overrides keyed by dotted property path.
    pub keys: HashMap<String, Duration>,
}

/// On-disk shape of the configuration document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TtlDocument {
    #[serde(default, alias = "defaultTtl")]
    default_ttl: Option<String>,
    #[serde(default)]
    keys: HashMap<String, String>,
}

impl TtlConfig {
    /// Creates a configuration with the given default and no overrides.
    pub fn new(default_ttl: Duration) -> Result<Self> {
        if default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default TTL must be positive".to_string(),
            ));
        }

        Ok(Self {
            default_ttl,
            keys: HashMap::new(),
        })
    }

    /// Adds an override for a dotted key path.
    pub fn with_key(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.keys.insert(key.into(), ttl);
        self
    }

    /// Returns the override configured for exactly `key`, if any.
    pub fn key_ttl(&self, key: &str) -> Option<Duration> {
        self.keys.get(key).copied()
    }

    /// Loads the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_DEFAULT` - Default TTL (default: 30m)
    /// - `CACHE_TTL_KEYS` - Overrides, e.g. `tracing.matrix.otel=3m,matrix.event.setting=10m`
    ///
    /// Unset variables fall back to defaults; malformed values are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var(DEFAULT_TTL_ENV).ok(), env::var(KEYS_ENV).ok())
    }

    fn from_vars(default_ttl: Option<String>, keys: Option<String>) -> Result<Self> {
        let default_ttl = match default_ttl {
            Some(text) => parse_duration(&text)?,
            None => DEFAULT_TTL,
        };

        let mut config = Self::new(default_ttl)?;
        if let Some(keys) = keys {
            for pair in keys.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (key, ttl) = pair.split_once('=').ok_or_else(|| {
                    CacheError::InvalidConfig(format!("expected key=duration, got '{}'", pair))
                })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(CacheError::InvalidConfig(format!(
                        "empty key in override '{}'",
                        pair
                    )));
                }
                config.keys.insert(key.to_string(), parse_duration(ttl)?);
            }
        }

        Ok(config)
    }

    /// Parses a JSON document such as
    /// `{"default_ttl": "30m", "keys": {"tracing.matrix.otel": "3m"}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: TtlDocument = serde_json::from_str(json)?;

        let default_ttl = match document.default_ttl {
            Some(text) => parse_duration(&text)?,
            None => DEFAULT_TTL,
        };

        let mut config = Self::new(default_ttl)?;
        for (key, text) in document.keys {
            let ttl = parse_duration(&text)?;
            config.keys.insert(key, ttl);
        }
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            keys: HashMap::new(),
        }
    }
}
