//! Wire types for the traffic-management REST API
//!
//! Pool and LoadBalancer payloads plus the response envelope every call
//! comes wrapped in.

use common::{GeoCoordinate, Origin};
use serde::{Deserialize, Serialize};

/// Fixed load balancer knobs: the steering policy, proxied flag, and
/// DNS TTL are not configurable in this design.
pub const STEERING_POLICY: &str = "least_connections";
pub const PROXIED: bool = true;
pub const DNS_TTL: u32 = 30;

/// Standard response envelope: `success`, `errors`, `result`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    pub code: i64,
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    /// Flatten the error list into one loggable string.
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A pool as the remote API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub origins: Vec<Origin>,
}

/// Payload for creating a pool
#[derive(Debug, Serialize)]
pub struct PoolSpec {
    pub name: String,
    pub origins: Vec<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl PoolSpec {
    pub fn new(name: String, origins: Vec<Origin>, coordinate: Option<GeoCoordinate>) -> Self {
        Self {
            name,
            origins,
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
        }
    }
}

/// Payload for replacing a pool's origin set (full replace; the remote
/// API offers no finer granularity)
#[derive(Debug, Serialize)]
pub struct PoolUpdate {
    pub origins: Vec<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl PoolUpdate {
    pub fn new(origins: Vec<Origin>, coordinate: Option<GeoCoordinate>) -> Self {
        Self {
            origins,
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
        }
    }
}

/// A load balancer as the remote API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_pools: Vec<String>,
    pub fallback_pool: Option<String>,
}

/// Payload for creating or replacing a load balancer
#[derive(Debug, Serialize)]
pub struct LoadBalancerSpec {
    pub name: String,
    pub default_pools: Vec<String>,
    pub fallback_pool: String,
    pub steering_policy: &'static str,
    pub proxied: bool,
    pub ttl: u32,
}

impl LoadBalancerSpec {
    pub fn new(hostname: String, default_pools: Vec<String>, fallback_pool: String) -> Self {
        Self {
            name: hostname,
            default_pools,
            fallback_pool,
            steering_policy: STEERING_POLICY,
            proxied: PROXIED,
            ttl: DNS_TTL,
        }
    }
}
