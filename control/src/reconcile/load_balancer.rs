//! Load balancer reconciliation
//!
//! Ensures exactly one load balancer exists for the configured hostname
//! and that its pool reference list contains this cluster's pool. The
//! reference merge follows the same preserve-others-append-self
//! discipline as the origin merge, at pool-reference granularity.

use crate::cloudflare::types::LoadBalancerSpec;
use crate::cloudflare::TrafficApi;
use crate::error::ApiError;
use crate::reconcile::Pipeline;
use common::merge_pool_reference;
use tracing::{debug, info};

impl<A: TrafficApi> Pipeline<A> {
    pub(crate) async fn reconcile_load_balancer(&self, pool_id: &str) -> Result<(), ApiError> {
        let Some(lb) = self.api.find_load_balancer(&self.lb_hostname).await? else {
            let spec = LoadBalancerSpec::new(
                self.lb_hostname.clone(),
                vec![pool_id.to_string()],
                pool_id.to_string(),
            );
            let lb = self.api.create_load_balancer(&spec).await?;
            info!(hostname = %self.lb_hostname, id = %lb.id, "Created load balancer");
            return Ok(());
        };

        match merge_pool_reference(&lb.default_pools, pool_id) {
            None => {
                debug!(
                    hostname = %self.lb_hostname,
                    pool = %pool_id,
                    "Load balancer already references pool"
                );
                Ok(())
            }
            Some(default_pools) => {
                // A sibling's fallback choice is never overwritten.
                let fallback_pool = lb
                    .fallback_pool
                    .clone()
                    .filter(|pool| !pool.is_empty())
                    .unwrap_or_else(|| pool_id.to_string());
                let count = default_pools.len();
                let spec =
                    LoadBalancerSpec::new(self.lb_hostname.clone(), default_pools, fallback_pool);
                self.api.update_load_balancer(&lb.id, &spec).await?;
                info!(
                    hostname = %self.lb_hostname,
                    pool = %pool_id,
                    pools = count,
                    "Merged pool reference into load balancer"
                );
                Ok(())
            }
        }
    }
}
