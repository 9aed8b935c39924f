//! Kubernetes API integrations
//!
//! This module contains the Ingress watcher driving the reconciliation
//! pipeline.

pub mod ingress;
