//! Reconciliation pipeline
//!
//! One event at a time: derive the cluster identity, merge this agent's
//! origin into the shared pool, then merge the pool reference into the
//! load balancer. Every per-event failure is absorbed at this boundary
//! so the watch loop never dies on a bad event. There is no requeue:
//! convergence after a dropped event relies on a later watch event for
//! the same resource.

mod load_balancer;
mod pool;

use crate::apis::ingress::{EventKind, IngressEvent};
use crate::cloudflare::TrafficApi;
use crate::config::Settings;
use crate::metrics;
use common::{extract_target, ClusterIdentity, ExtractionSkip, GeoCoordinate};
use tracing::{debug, error, info, warn};

/// Per-process reconciliation context: the remote API handle plus the
/// fixed identity this agent writes under. Constructed once at startup
/// and passed explicitly, never ambient.
pub struct Pipeline<A> {
    api: A,
    geo_code: String,
    coordinate: Option<GeoCoordinate>,
    origin_weight: u32,
    pool_name: Option<String>,
    lb_hostname: String,
}

impl<A: TrafficApi> Pipeline<A> {
    pub fn new(api: A, settings: &Settings) -> Self {
        Self {
            api,
            geo_code: settings.geo_code.clone(),
            coordinate: settings.coordinate,
            origin_weight: settings.origin_weight,
            pool_name: settings.pool_name.clone(),
            lb_hostname: settings.lb_hostname.clone(),
        }
    }

    /// Process one ingress event end to end. Never returns an error:
    /// skips and failures are logged and counted here.
    pub async fn handle(&self, event: &IngressEvent) {
        match event.kind {
            EventKind::Deleted => {
                // Other ingresses may share the address; origins are
                // never removed on deletion.
                info!(
                    namespace = %event.namespace,
                    name = %event.name,
                    "Ingress deleted; leaving remote origins in place"
                );
                metrics::record_event("ignored");
                return;
            }
            EventKind::Added | EventKind::Modified => {}
        }

        let (cluster, address) = match extract_target(&event.labels, &event.addresses) {
            Ok(target) => target,
            Err(ExtractionSkip::MissingClusterLabel) => {
                warn!(
                    namespace = %event.namespace,
                    name = %event.name,
                    "No cluster-name label found; skipping"
                );
                metrics::record_event("skipped");
                return;
            }
            Err(ExtractionSkip::NoAddressAssigned) => {
                debug!(
                    namespace = %event.namespace,
                    name = %event.name,
                    "No load balancer address assigned yet; skipping"
                );
                metrics::record_event("skipped");
                return;
            }
        };

        let identity = ClusterIdentity {
            cluster: cluster.to_string(),
            geo: self.geo_code.clone(),
        };
        info!(
            namespace = %event.namespace,
            name = %event.name,
            cluster = %identity.cluster,
            %address,
            "Reconciling ingress"
        );

        let pool_id = match self.reconcile_pool(&identity, address).await {
            Ok(pool_id) => {
                metrics::record_reconciliation("pool", "success");
                pool_id
            }
            Err(e) => {
                error!(
                    namespace = %event.namespace,
                    name = %event.name,
                    cluster = %identity.cluster,
                    %address,
                    "Pool reconciliation failed, dropping event: {e}"
                );
                metrics::record_reconciliation("pool", "error");
                metrics::record_event("error");
                return;
            }
        };

        match self.reconcile_load_balancer(&pool_id).await {
            Ok(()) => {
                metrics::record_reconciliation("load_balancer", "success");
                metrics::record_event("processed");
            }
            Err(e) => {
                error!(
                    namespace = %event.namespace,
                    name = %event.name,
                    hostname = %self.lb_hostname,
                    "Load balancer reconciliation failed, dropping event: {e}"
                );
                metrics::record_reconciliation("load_balancer", "error");
                metrics::record_event("error");
            }
        }
    }
}
