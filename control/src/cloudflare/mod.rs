//! Traffic-management API integration
//!
//! The reconcilers talk to the remote service through the [`TrafficApi`]
//! trait so the merge logic can be driven against an in-memory fake in
//! tests; [`client::CloudflareClient`] is the real implementation with
//! the retry envelope.

pub mod client;
pub mod types;

use crate::error::ApiError;
use async_trait::async_trait;
use self::types::{LoadBalancer, LoadBalancerSpec, Pool, PoolSpec, PoolUpdate};

/// Remote operations the reconcilers depend on.
#[async_trait]
pub trait TrafficApi: Send + Sync {
    /// Look a pool up by name (the API only lists; filtering is ours).
    async fn find_pool(&self, name: &str) -> Result<Option<Pool>, ApiError>;

    /// Fetch one pool with its current origin set.
    async fn get_pool(&self, id: &str) -> Result<Pool, ApiError>;

    async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool, ApiError>;

    async fn update_pool(&self, id: &str, update: &PoolUpdate) -> Result<Pool, ApiError>;

    /// Look a load balancer up by the hostname it is bound to.
    async fn find_load_balancer(&self, hostname: &str) -> Result<Option<LoadBalancer>, ApiError>;

    async fn create_load_balancer(&self, spec: &LoadBalancerSpec)
        -> Result<LoadBalancer, ApiError>;

    async fn update_load_balancer(
        &self,
        id: &str,
        spec: &LoadBalancerSpec,
    ) -> Result<LoadBalancer, ApiError>;
}
