//! Tiered TTL Cache - usage demo
//!
//! Loads the TTL configuration, stores a few sample entries and logs what
//! TTL each one received.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_ttl_cache::models::{TenantEventSetting, TenantMapper};
use tiered_ttl_cache::{spawn_cleanup_task, CacheService, TtlConfig};

/// Environment variable naming a JSON configuration file.
const CONFIG_FILE_ENV: &str = "CACHE_TTL_FILE";
const DEFAULT_CONFIG_FILE: &str = "config/cache-ttl.json";
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

const SPECIFIC_TENANT_ID: &str = "cbec5243-e668-467e-8b67-d236510181b1";
const OTHER_TENANT_ID: &str = "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    info!(
        "Configuration loaded: default_ttl={:?}, overrides={}",
        config.default_ttl,
        config.keys.len()
    );

    let cache = CacheService::new(Arc::new(config));
    let cleanup_handle = spawn_cleanup_task(cache.store().clone(), CLEANUP_INTERVAL);

    run_demo(&cache)?;

    cleanup_handle.abort();
    info!("Demo finished, {} entries cached", cache.len());
    Ok(())
}

/// Configuration file from `CACHE_TTL_FILE`, else the bundled sample, else
/// environment variables.
fn load_config() -> anyhow::Result<TtlConfig> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        return TtlConfig::from_file(&path)
            .with_context(|| format!("failed to load TTL configuration from {}", path));
    }

    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return TtlConfig::from_file(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("failed to load TTL configuration from {}", DEFAULT_CONFIG_FILE));
    }

    warn!("No configuration file found, reading TTLs from the environment");
    TtlConfig::from_env().context("failed to load TTL configuration from the environment")
}

fn run_demo(cache: &CacheService) -> anyhow::Result<()> {
    info!("--- Cache Usage Example ---");

    // Simple flag with a specific sub-key override
    cache.put("tracing", "matrix.otel", true)?;
    log_ttl(cache, "tracing", "matrix.otel");

    // Tenant with its own override
    let specific_settings = TenantEventSetting::new(
        vec!["*".to_string()],
        vec!["dlpEventId1".to_string(), "dlpEventId2".to_string()],
    );
    cache.put("matrix.event.setting", SPECIFIC_TENANT_ID, specific_settings)?;
    log_ttl(cache, "matrix.event.setting", SPECIFIC_TENANT_ID);

    // Tenant falling back to the group override
    let other_settings = TenantEventSetting::new(vec!["ensEvent1".to_string()], vec![]);
    cache.put("matrix.event.setting", OTHER_TENANT_ID, other_settings)?;
    log_ttl(cache, "matrix.event.setting", OTHER_TENANT_ID);

    for (tenant_id, external_id, region) in [
        (SPECIFIC_TENANT_ID, "odsyqb939", "us-west-2"),
        (OTHER_TENANT_ID, "odsyId123", "us-east-1"),
    ] {
        let mapper = TenantMapper {
            tenant_id: tenant_id.to_string(),
            external_id: external_id.to_string(),
            region: region.to_string(),
            ingestion_url: format!(
                "https://{0}.qa.ingest.apps.example.com/ingest/{0}/events",
                external_id
            ),
            enabled: true,
        };
        cache.put("odyssey.tenant.mapper", tenant_id, mapper)?;
        log_ttl(cache, "odyssey.tenant.mapper", tenant_id);
    }

    // Bare group key with no override
    cache.put_group("some.other.group", "some-value".to_string())?;
    if let Some(ttl) = cache.remaining_group_ttl("some.other.group") {
        info!("Stored 'some.other.group' with TTL {:?}", ttl);
    }

    if let Some(flag) = cache.get::<bool>("tracing", "matrix.otel") {
        info!("Retrieved flag 'matrix.otel': {}", flag);
    }
    if let Some(settings) = cache.get::<TenantEventSetting>("matrix.event.setting", SPECIFIC_TENANT_ID) {
        info!("Retrieved settings for tenant '{}': {:?}", SPECIFIC_TENANT_ID, settings);
    }
    if cache.get::<String>("tracing", "matrix.otel").is_none() {
        info!("Reading 'matrix.otel' as a String returns nothing: type mismatch is a miss");
    }

    info!("Stats: {}", serde_json::to_string(&cache.stats())?);
    Ok(())
}

fn log_ttl(cache: &CacheService, group: &str, sub_key: &str) {
    if let Some(ttl) = cache.remaining_ttl(group, sub_key) {
        info!("Stored '{}' -> '{}' with TTL {:?}", group, sub_key, ttl);
    }
}
