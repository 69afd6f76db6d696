//! IP pool models.
//!
//! The resource methods pass payloads through untouched, so these types are optional:
//! use them to build request bodies or to decode responses into something typed.
//! Fields the API adds later are kept in the flattened `extra` maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An IP pool as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpPool {
    /// Pool identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// DKIM signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_domain: Option<String>,
    /// Feedback-loop signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbl_signing_domain: Option<String>,
    /// Pool that takes overflow traffic during auto warmup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_warmup_overflow_pool: Option<String>,
    /// Sending IPs assigned to the pool.
    #[serde(default)]
    pub ips: Vec<IpPoolIp>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A sending IP within a pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpPoolIp {
    /// Public address.
    pub external_ip: String,
    /// Reverse DNS host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Whether auto warmup is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_warmup_enabled: Option<bool>,
    /// Current warmup stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_warmup_stage: Option<u32>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for creating an IP pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateIpPoolRequest {
    /// Display name.
    pub name: String,
    /// DKIM signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_domain: Option<String>,
    /// Feedback-loop signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbl_signing_domain: Option<String>,
    /// Overflow pool ID used during auto warmup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_warmup_overflow_pool: Option<String>,
}

impl CreateIpPoolRequest {
    /// Start a request with only the pool name set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signing_domain: None,
            fbl_signing_domain: None,
            auto_warmup_overflow_pool: None,
        }
    }

    /// Set the DKIM signing domain.
    #[must_use]
    pub fn with_signing_domain(mut self, domain: impl Into<String>) -> Self {
        self.signing_domain = Some(domain.into());
        self
    }

    /// Set the feedback-loop signing domain.
    #[must_use]
    pub fn with_fbl_signing_domain(mut self, domain: impl Into<String>) -> Self {
        self.fbl_signing_domain = Some(domain.into());
        self
    }

    /// Set the overflow pool.
    #[must_use]
    pub fn with_overflow_pool(mut self, pool_id: impl Into<String>) -> Self {
        self.auto_warmup_overflow_pool = Some(pool_id.into());
        self
    }
}

/// Body for updating an IP pool. Unset fields are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateIpPoolRequest {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// DKIM signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_domain: Option<String>,
    /// Feedback-loop signing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbl_signing_domain: Option<String>,
    /// Overflow pool ID used during auto warmup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_warmup_overflow_pool: Option<String>,
}

/// Result of a create call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedIpPool {
    /// ID of the new pool.
    pub id: String,
}
