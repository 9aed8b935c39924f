//! Agent metrics
//!
//! Prometheus counters for watch/reconciliation activity, exposed as
//! text on the health listener.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Agent metrics registry
    pub static ref AGENT_METRICS_REGISTRY: Registry = Registry::new();

    /// Ingress events by outcome
    static ref INGRESS_EVENTS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "georoute_ingress_events_total",
            "Total number of observed ingress events",
        );
        let counter = IntCounterVec::new(opts, &["result"]).expect("Failed to create counter");
        AGENT_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Remote reconciliations by kind (pool / load_balancer) and result
    static ref RECONCILIATIONS_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "georoute_reconciliations_total",
            "Total number of remote reconciliation attempts",
        );
        let counter =
            IntCounterVec::new(opts, &["kind", "result"]).expect("Failed to create counter");
        AGENT_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };

    /// Watch stream reconnects (stream end or recoverable error)
    static ref WATCH_RECONNECTS_TOTAL: IntCounter = {
        let opts = Opts::new(
            "georoute_watch_reconnects_total",
            "Total number of ingress watch stream reconnects",
        );
        let counter = IntCounter::with_opts(opts).expect("Failed to create counter");
        AGENT_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };
}

pub fn record_event(result: &str) {
    INGRESS_EVENTS_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_reconciliation(kind: &str, result: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind, result]).inc();
}

pub fn record_watch_reconnect() {
    WATCH_RECONNECTS_TOTAL.inc();
}

/// Render the registry in prometheus text exposition format.
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&AGENT_METRICS_REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
