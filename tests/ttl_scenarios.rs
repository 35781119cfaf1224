//! Integration Tests for TTL Resolution
//!
//! Drives the cache service through a manual clock with the sample
//! configuration and checks each tier expires when it should.

use std::sync::Arc;
use std::time::Duration;

use tiered_ttl_cache::models::{TenantEventSetting, TenantMapper};
use tiered_ttl_cache::{CacheService, ManualClock, TtlConfig};

// == Test Constants ==
const OTEL_GROUP: &str = "tracing";
const OTEL_SUBKEY: &str = "matrix.otel";
const EVENT_SETTING_GROUP: &str = "matrix.event.setting";
const TENANT_MAPPER_GROUP: &str = "odyssey.tenant.mapper";
const SPECIFIC_TENANT_ID: &str = "cbec5243-e668-467e-8b67-d236510181b1";
const OTHER_TENANT_ID: &str = "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d";
const DEFAULT_TTL_KEY: &str = "some.other.group";

const CONFIG_JSON: &str = include_str!("../config/cache-ttl.json");

// == Helper Functions ==

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

fn seconds(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn create_test_cache() -> (CacheService, Arc<ManualClock>) {
    let config = TtlConfig::from_json_str(CONFIG_JSON).unwrap();
    let clock = Arc::new(ManualClock::new());
    let cache = CacheService::with_clock(Arc::new(config), clock.clone());
    (cache, clock)
}

fn mapper(tenant_id: &str, region: &str) -> TenantMapper {
    TenantMapper {
        tenant_id: tenant_id.to_string(),
        external_id: "odsyId123".to_string(),
        region: region.to_string(),
        ingestion_url: "https://odsyId123.qa.ingest.apps.example.com/ingest/odsyId123/events"
            .to_string(),
        enabled: true,
    }
}

// == Specific Sub-Key TTL ==

#[test]
fn test_specific_subkey_ttl_before_expiry() {
    let (cache, clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    clock.advance(minutes(2) + seconds(55));

    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), Some(true));
}

#[test]
fn test_specific_subkey_ttl_after_expiry() {
    let (cache, clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    clock.advance(minutes(3) + seconds(1));

    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), None);
}

// == Group TTL ==

#[test]
fn test_event_setting_group_ttl_before_expiry() {
    let (cache, clock) = create_test_cache();
    let settings = TenantEventSetting::new(vec!["ensEvent1".to_string()], vec![]);
    cache
        .put(EVENT_SETTING_GROUP, OTHER_TENANT_ID, settings.clone())
        .unwrap();

    clock.advance(minutes(9) + seconds(55));

    assert_eq!(
        cache.get::<TenantEventSetting>(EVENT_SETTING_GROUP, OTHER_TENANT_ID),
        Some(settings)
    );
}

#[test]
fn test_event_setting_group_ttl_after_expiry() {
    let (cache, clock) = create_test_cache();
    let settings = TenantEventSetting::new(vec!["ensEvent1".to_string()], vec![]);
    cache.put(EVENT_SETTING_GROUP, OTHER_TENANT_ID, settings).unwrap();

    clock.advance(minutes(10) + seconds(2));

    assert_eq!(
        cache.get::<TenantEventSetting>(EVENT_SETTING_GROUP, OTHER_TENANT_ID),
        None
    );
}

#[test]
fn test_event_setting_specific_tenant_overrides_group() {
    let (cache, clock) = create_test_cache();
    let settings = TenantEventSetting::new(
        vec!["*".to_string()],
        vec!["dlpEventId1".to_string()],
    );
    cache
        .put(EVENT_SETTING_GROUP, SPECIFIC_TENANT_ID, settings)
        .unwrap();

    // Past the 5m specific TTL, well before the 10m group TTL
    clock.advance(minutes(5) + seconds(1));

    assert_eq!(
        cache.get::<TenantEventSetting>(EVENT_SETTING_GROUP, SPECIFIC_TENANT_ID),
        None
    );
}

#[test]
fn test_tenant_mapper_group_ttl_before_expiry() {
    let (cache, clock) = create_test_cache();
    let value = mapper(OTHER_TENANT_ID, "us-west-2");
    cache
        .put(TENANT_MAPPER_GROUP, OTHER_TENANT_ID, value.clone())
        .unwrap();

    clock.advance(minutes(11));

    assert_eq!(
        cache.get::<TenantMapper>(TENANT_MAPPER_GROUP, OTHER_TENANT_ID),
        Some(value)
    );
}

#[test]
fn test_tenant_mapper_group_ttl_after_expiry() {
    let (cache, clock) = create_test_cache();
    cache
        .put(TENANT_MAPPER_GROUP, OTHER_TENANT_ID, mapper(OTHER_TENANT_ID, "us-east-1"))
        .unwrap();

    clock.advance(minutes(12) + seconds(1));

    assert_eq!(
        cache.get::<TenantMapper>(TENANT_MAPPER_GROUP, OTHER_TENANT_ID),
        None
    );
}

#[test]
fn test_tenant_mapper_specific_tenant_overrides_group() {
    let (cache, clock) = create_test_cache();
    cache
        .put(TENANT_MAPPER_GROUP, SPECIFIC_TENANT_ID, mapper(SPECIFIC_TENANT_ID, "us-east-1"))
        .unwrap();

    // Past the 10m specific TTL, before the 12m group TTL
    clock.advance(minutes(11) + seconds(55));

    assert_eq!(
        cache.get::<TenantMapper>(TENANT_MAPPER_GROUP, SPECIFIC_TENANT_ID),
        None
    );
}

// == Default TTL ==

#[test]
fn test_default_ttl_before_expiry() {
    let (cache, clock) = create_test_cache();
    cache
        .put_group(DEFAULT_TTL_KEY, "some-value".to_string())
        .unwrap();

    clock.advance(minutes(29) + seconds(59));

    assert_eq!(
        cache.get_group::<String>(DEFAULT_TTL_KEY).as_deref(),
        Some("some-value")
    );
}

#[test]
fn test_default_ttl_after_expiry() {
    let (cache, clock) = create_test_cache();
    cache
        .put_group(DEFAULT_TTL_KEY, "some-value".to_string())
        .unwrap();

    clock.advance(minutes(30) + seconds(1));

    assert_eq!(cache.get_group::<String>(DEFAULT_TTL_KEY), None);
}

#[test]
fn test_bare_group_key_uses_its_own_override() {
    let (cache, clock) = create_test_cache();
    cache.put_group(EVENT_SETTING_GROUP, 1_u8).unwrap();

    clock.advance(minutes(10) + seconds(1));

    assert_eq!(cache.get_group::<u8>(EVENT_SETTING_GROUP), None);
}

// == Read Semantics ==

#[test]
fn test_reads_do_not_extend_lifetime() {
    let (cache, clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    for _ in 0..5 {
        clock.advance(seconds(30));
        assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), Some(true));
    }
    assert_eq!(cache.remaining_ttl(OTEL_GROUP, OTEL_SUBKEY), Some(seconds(30)));

    clock.advance(seconds(30));
    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), None);
}

#[test]
fn test_type_mismatch_reads_as_miss() {
    let (cache, _clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    assert_eq!(
        cache.get::<TenantEventSetting>(OTEL_GROUP, OTEL_SUBKEY),
        None
    );
    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), Some(true));
}

#[test]
fn test_type_mismatch_is_counted_as_miss() {
    let (cache, _clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    assert_eq!(cache.get::<String>(OTEL_GROUP, OTEL_SUBKEY), None);

    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_rotating_keys_do_not_accumulate() {
    let (cache, clock) = create_test_cache();

    for i in 0..1000 {
        cache.put(DEFAULT_TTL_KEY, &format!("tenant-{}", i), i).unwrap();
    }
    clock.advance(minutes(31));
    for i in 1000..2000 {
        cache.put(DEFAULT_TTL_KEY, &format!("tenant-{}", i), i).unwrap();
    }
    clock.advance(minutes(31));
    cache.put(DEFAULT_TTL_KEY, "tenant-last", 0).unwrap();

    // None of the expired keys were ever read back
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().expirations, 2000);
}

#[test]
fn test_overwrite_re_resolves_ttl_from_write_time() {
    let (cache, clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();

    clock.advance(minutes(2));
    cache.put(OTEL_GROUP, OTEL_SUBKEY, false).unwrap();
    clock.advance(minutes(2));

    // Four minutes after the first write, but only two after the second
    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), Some(false));
}

#[test]
fn test_invalidate_all_isolates_state() {
    let (cache, _clock) = create_test_cache();
    cache.put(OTEL_GROUP, OTEL_SUBKEY, true).unwrap();
    cache.put_group(DEFAULT_TTL_KEY, 1_u8).unwrap();

    cache.invalidate_all();

    assert!(cache.is_empty());
    assert_eq!(cache.get::<bool>(OTEL_GROUP, OTEL_SUBKEY), None);
}

#[test]
fn test_concurrent_puts_and_gets() {
    let (cache, _clock) = create_test_cache();

    std::thread::scope(|scope| {
        for worker in 0..4_u32 {
            let cache = cache.clone();
            scope.spawn(move || {
                for i in 0..100_u32 {
                    let tenant = format!("tenant-{}", i % 10);
                    cache.put(EVENT_SETTING_GROUP, &tenant, worker * 1000 + i).unwrap();
                    if let Some(value) = cache.get::<u32>(EVENT_SETTING_GROUP, &tenant) {
                        assert!(value < 4000);
                    }
                }
            });
        }
    });

    assert_eq!(cache.len(), 10);
}
