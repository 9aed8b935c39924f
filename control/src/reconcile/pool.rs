//! Pool reconciliation
//!
//! The cross-process-safe merge of one cluster's origin into a shared
//! remote pool. The fetch-then-write is not atomic: two agents updating
//! the same pool concurrently can race and one update can be lost. The
//! remote API exposes no version token, so that trade-off is accepted;
//! a later watch event reconverges.

use crate::cloudflare::types::{PoolSpec, PoolUpdate};
use crate::cloudflare::TrafficApi;
use crate::error::ApiError;
use crate::reconcile::Pipeline;
use common::{merge_origin, ClusterIdentity, MergeOutcome, Origin};
use tracing::{debug, info, warn};

impl<A: TrafficApi> Pipeline<A> {
    /// Upsert this agent's origin into the cluster's shared pool and
    /// return the pool id for the load balancer step.
    pub(crate) async fn reconcile_pool(
        &self,
        identity: &ClusterIdentity,
        address: &str,
    ) -> Result<String, ApiError> {
        let pool_name = self
            .pool_name
            .clone()
            .unwrap_or_else(|| identity.pool_name());
        let candidate = Origin::owned_by(&identity.geo, address, self.origin_weight);

        let Some(found) = self.api.find_pool(&pool_name).await? else {
            let spec = PoolSpec::new(pool_name.clone(), vec![candidate], self.coordinate);
            let pool = self.api.create_pool(&spec).await?;
            info!(pool = %pool_name, id = %pool.id, %address, "Created pool");
            return Ok(pool.id);
        };

        // Fetch by id for the authoritative origin set.
        let pool = self.api.get_pool(&found.id).await?;
        match merge_origin(&pool.origins, &candidate) {
            MergeOutcome::Unchanged => {
                debug!(pool = %pool_name, %address, "Pool already converged");
                Ok(pool.id)
            }
            MergeOutcome::AddressConflict {
                address,
                claimed_by,
            } => {
                warn!(
                    pool = %pool_name,
                    %address,
                    %claimed_by,
                    "Address already claimed by another identity; skipping insert"
                );
                Ok(pool.id)
            }
            MergeOutcome::Updated(origins) => {
                let count = origins.len();
                let update = PoolUpdate::new(origins, self.coordinate);
                self.api.update_pool(&pool.id, &update).await?;
                info!(
                    pool = %pool_name,
                    %address,
                    origins = count,
                    "Merged origin into pool"
                );
                Ok(pool.id)
            }
        }
    }
}
