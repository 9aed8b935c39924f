//! Ingress watcher
//!
//! Maintains a self-healing watch stream over Ingress resources, scoped
//! by the configured label selector. The loop is an explicit state
//! machine:
//!
//! ```text
//! CONNECTING -> STREAMING -> (stream ends/errors) -> BACKOFF -> CONNECTING
//!                        \-> FATAL (bad selector / bad credentials)
//! ```
//!
//! A server-side watch timeout forces a periodic restart even on a
//! healthy stream so the resource-version cursor never grows stale.
//! Per-event failures are caught at the event boundary inside the
//! pipeline; a single bad event never terminates the loop.

use crate::cloudflare::TrafficApi;
use crate::error::WatchError;
use crate::metrics;
use crate::reconcile::Pipeline;
use futures::TryStreamExt;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, ListParams, WatchParams};
use kube::core::WatchEvent;
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fixed delay before reconnecting after a stream failure
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Server-side watch timeout (seconds); bounds cursor staleness by
/// forcing a restart even on a healthy stream
const WATCH_TIMEOUT_SECS: u32 = 295;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

/// One observed ingress change, reduced to what reconciliation needs
#[derive(Debug, Clone)]
pub struct IngressEvent {
    pub namespace: String,
    pub name: String,
    pub kind: EventKind,
    pub labels: BTreeMap<String, String>,
    /// Addresses assigned by the ingress controller; each entry is an
    /// IP or, failing that, a hostname
    pub addresses: Vec<String>,
}

impl IngressEvent {
    pub fn from_ingress(kind: EventKind, ingress: &Ingress) -> Self {
        let addresses = ingress
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.ip.clone().or_else(|| entry.hostname.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            namespace: ingress.namespace().unwrap_or_else(|| "default".to_string()),
            name: ingress.name_any(),
            kind,
            labels: ingress.metadata.labels.clone().unwrap_or_default(),
            addresses,
        }
    }
}

/// Watch loop states. FATAL is terminal and carries the cause out of
/// the loop; everything else cycles forever.
#[derive(Debug)]
enum WatchState {
    Connecting,
    Streaming { resource_version: String },
    Backoff,
    Fatal(kube::Error),
}

pub struct IngressWatcher {
    api: Api<Ingress>,
    selector: String,
}

impl IngressWatcher {
    pub fn new(client: Client, selector: String) -> Self {
        Self {
            api: Api::all(client),
            selector,
        }
    }

    /// Drive the watch loop forever. Returns only on a FATAL
    /// classification; the caller exits with a nonzero status.
    pub async fn run<A: TrafficApi>(&self, pipeline: &Pipeline<A>) -> Result<(), WatchError> {
        let mut state = WatchState::Connecting;
        loop {
            state = match state {
                WatchState::Connecting => {
                    debug!(selector = %self.selector, "Connecting ingress watch");
                    match self.list_cursor(pipeline).await {
                        Ok(resource_version) => WatchState::Streaming { resource_version },
                        Err(e) if is_fatal(&e) => WatchState::Fatal(e),
                        Err(e) => {
                            warn!("Failed to list ingresses: {e}");
                            WatchState::Backoff
                        }
                    }
                }
                WatchState::Streaming { resource_version } => {
                    match self.stream(&resource_version, pipeline).await {
                        Ok(()) => {
                            debug!("Watch stream ended; restarting");
                            WatchState::Backoff
                        }
                        Err(e) if is_fatal(&e) => WatchState::Fatal(e),
                        Err(e) => {
                            warn!("Watch stream error: {e}");
                            WatchState::Backoff
                        }
                    }
                }
                WatchState::Backoff => {
                    info!("Reconnecting in {}s", RECONNECT_BACKOFF.as_secs());
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                    metrics::record_watch_reconnect();
                    WatchState::Connecting
                }
                WatchState::Fatal(e) => {
                    error!("Unrecoverable watch failure: {e}");
                    return Err(WatchError(e));
                }
            };
        }
    }

    /// List once to obtain a fresh resource-version cursor. Initial
    /// items replay through the pipeline as Added so a restart always
    /// reconverges.
    async fn list_cursor<A: TrafficApi>(
        &self,
        pipeline: &Pipeline<A>,
    ) -> Result<String, kube::Error> {
        let params = ListParams::default().labels(&self.selector);
        let list = self.api.list(&params).await?;
        info!(
            count = list.items.len(),
            selector = %self.selector,
            "Watching ingresses"
        );
        for ingress in &list.items {
            pipeline
                .handle(&IngressEvent::from_ingress(EventKind::Added, ingress))
                .await;
        }
        Ok(list.metadata.resource_version.unwrap_or_default())
    }

    async fn stream<A: TrafficApi>(
        &self,
        resource_version: &str,
        pipeline: &Pipeline<A>,
    ) -> Result<(), kube::Error> {
        let params = WatchParams::default()
            .labels(&self.selector)
            .timeout(WATCH_TIMEOUT_SECS);
        let mut stream = Box::pin(self.api.watch(&params, resource_version).await?);

        while let Some(event) = stream.try_next().await? {
            match event {
                WatchEvent::Added(ingress) => {
                    pipeline
                        .handle(&IngressEvent::from_ingress(EventKind::Added, &ingress))
                        .await;
                }
                WatchEvent::Modified(ingress) => {
                    pipeline
                        .handle(&IngressEvent::from_ingress(EventKind::Modified, &ingress))
                        .await;
                }
                WatchEvent::Deleted(ingress) => {
                    pipeline
                        .handle(&IngressEvent::from_ingress(EventKind::Deleted, &ingress))
                        .await;
                }
                WatchEvent::Bookmark(_) => {}
                WatchEvent::Error(status) => {
                    // 410 Gone and friends: the cursor is stale, re-list
                    warn!(
                        code = status.code,
                        "Watch stream returned an error status: {}", status.message
                    );
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

/// Configuration-level rejections (invalid selector syntax, bad or
/// missing credentials) stop the process; everything else stays in the
/// reconnect cycle indefinitely.
fn is_fatal(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(response) => matches!(response.code, 400 | 401 | 403),
        kube::Error::Auth(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::networking::v1::{
        IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressStatus,
    };
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} ({code})"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_configuration_level_rejections_are_fatal() {
        assert!(is_fatal(&api_error(400, "BadRequest")));
        assert!(is_fatal(&api_error(401, "Unauthorized")));
        assert!(is_fatal(&api_error(403, "Forbidden")));
    }

    #[test]
    fn test_infrastructure_failures_stay_in_the_retry_cycle() {
        assert!(!is_fatal(&api_error(404, "NotFound")));
        assert!(!is_fatal(&api_error(410, "Gone")));
        assert!(!is_fatal(&api_error(500, "InternalError")));
        assert!(!is_fatal(&api_error(503, "ServiceUnavailable")));
    }

    fn ingress_with_status(entries: Vec<IngressLoadBalancerIngress>) -> Ingress {
        let mut ingress = Ingress::default();
        ingress.metadata.namespace = Some("default".to_string());
        ingress.metadata.name = Some("api".to_string());
        ingress.metadata.labels = Some(
            [("cluster-name".to_string(), "prod-1".to_string())]
                .into_iter()
                .collect(),
        );
        ingress.status = Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(entries),
            }),
        });
        ingress
    }

    #[test]
    fn test_event_carries_assigned_ip() {
        let ingress = ingress_with_status(vec![IngressLoadBalancerIngress {
            ip: Some("203.0.113.5".to_string()),
            ..Default::default()
        }]);

        let event = IngressEvent::from_ingress(EventKind::Added, &ingress);
        assert_eq!(event.namespace, "default");
        assert_eq!(event.name, "api");
        assert_eq!(event.addresses, vec!["203.0.113.5"]);
        assert_eq!(event.labels.get("cluster-name").map(String::as_str), Some("prod-1"));
    }

    #[test]
    fn test_hostname_is_the_address_fallback() {
        let ingress = ingress_with_status(vec![IngressLoadBalancerIngress {
            hostname: Some("lb.example.net".to_string()),
            ..Default::default()
        }]);

        let event = IngressEvent::from_ingress(EventKind::Modified, &ingress);
        assert_eq!(event.addresses, vec!["lb.example.net"]);
    }

    #[test]
    fn test_missing_status_yields_no_addresses() {
        let mut ingress = Ingress::default();
        ingress.metadata.name = Some("api".to_string());

        let event = IngressEvent::from_ingress(EventKind::Added, &ingress);
        assert!(event.addresses.is_empty());
        assert_eq!(event.namespace, "default");
    }
}
