//! Sample payload models
//!
//! Value types cached by the demo binary and the integration tests.

mod tenant;

pub use tenant::{TenantEventSetting, TenantMapper};
