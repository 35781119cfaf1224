//! Tenant Payloads
//!
//! Per-tenant settings cached under the `matrix.event.setting` and
//! `odyssey.tenant.mapper` groups.

use serde::{Deserialize, Serialize};

/// Event subscriptions configured for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantEventSetting {
    pub ens_event_setting: Vec<String>,
    pub dlp_event_setting: Vec<String>,
}

impl TenantEventSetting {
    pub fn new(ens_event_setting: Vec<String>, dlp_event_setting: Vec<String>) -> Self {
        Self {
            ens_event_setting,
            dlp_event_setting,
        }
    }
}

/// Maps a tenant to its ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMapper {
    pub tenant_id: String,
    pub external_id: String,
    pub region: String,
    pub ingestion_url: String,
    pub enabled: bool,
}
