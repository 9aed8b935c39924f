//! GEOROUTE Common Types
//!
//! Core data structures and pure algorithms for geo-distributed load
//! balancing: cluster identity extraction, the geo coordinate table, and
//! the origin merge discipline that lets independent per-cluster agents
//! share one remote pool without clobbering each other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label keys checked for the owning cluster's name, in priority order.
/// The first key present on the ingress wins.
pub const CLUSTER_NAME_LABEL_KEYS: [&str; 2] = ["cluster-name", "cluster_name"];

/// Prefix for pool names derived from a cluster identity
pub const POOL_NAME_PREFIX: &str = "k8s-pool-";

/// Origin weight bounds (inclusive)
pub const MIN_ORIGIN_WEIGHT: u32 = 1;
pub const MAX_ORIGIN_WEIGHT: u32 = 100;

/// A single upstream endpoint inside a shared pool.
///
/// The name encodes the geo identity of the agent that wrote it
/// (`origin-{geo}`), which is what partitions a physically shared pool
/// into per-agent slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
    pub address: String,
    pub enabled: bool,
    pub weight: u32,
}

impl Origin {
    /// Build the origin this agent owns for the given address.
    pub fn owned_by(geo: &str, address: &str, weight: u32) -> Self {
        Self {
            name: format!("origin-{geo}"),
            address: address.to_string(),
            enabled: true,
            weight,
        }
    }
}

/// Identity of the cluster an ingress event belongs to, paired with the
/// fixed geo code of the agent processing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub cluster: String,
    pub geo: String,
}

impl ClusterIdentity {
    /// Derived name of the shared pool for this cluster.
    pub fn pool_name(&self) -> String {
        format!("{POOL_NAME_PREFIX}{}", self.cluster)
    }

    /// Name of the origin slice this agent owns inside the pool.
    pub fn origin_name(&self) -> String {
        format!("origin-{}", self.geo)
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One entry of the fixed geo table
#[derive(Debug, Clone, Copy)]
pub struct GeoLocation {
    pub code: &'static str,
    pub name: &'static str,
    pub coordinate: GeoCoordinate,
}

/// The closed set of geo codes an agent can be deployed under, each with
/// its reference coordinates. A code outside this table is a fatal
/// configuration error unless an explicit coordinate pair is supplied.
pub const GEO_LOCATIONS: [GeoLocation; 4] = [
    GeoLocation {
        code: "eu",
        name: "Europe",
        coordinate: GeoCoordinate {
            latitude: 50.1109,
            longitude: 8.6821,
        },
    },
    GeoLocation {
        code: "us_east",
        name: "United States East",
        coordinate: GeoCoordinate {
            latitude: 40.7128,
            longitude: -74.0060,
        },
    },
    GeoLocation {
        code: "us_west",
        name: "United States West",
        coordinate: GeoCoordinate {
            latitude: 34.0522,
            longitude: -118.2437,
        },
    },
    GeoLocation {
        code: "asia",
        name: "Asia",
        coordinate: GeoCoordinate {
            latitude: 35.6762,
            longitude: 139.6503,
        },
    },
];

/// Look up a geo location by code.
pub fn geo_location(code: &str) -> Option<&'static GeoLocation> {
    GEO_LOCATIONS.iter().find(|location| location.code == code)
}

/// All known geo codes, for error messages and validation.
pub fn geo_codes() -> Vec<&'static str> {
    GEO_LOCATIONS.iter().map(|location| location.code).collect()
}

/// Why an ingress event produced no reconciliation work.
///
/// Neither case is an error: a missing label means the ingress is not
/// participating, and a missing address means the ingress controller has
/// not assigned one yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSkip {
    MissingClusterLabel,
    NoAddressAssigned,
}

/// Read the owning cluster's name from an ingress label map, trying the
/// candidate keys in their documented order.
pub fn cluster_name(labels: &BTreeMap<String, String>) -> Option<&str> {
    CLUSTER_NAME_LABEL_KEYS
        .iter()
        .find_map(|key| labels.get(*key))
        .map(String::as_str)
}

/// Derive the reconciliation target from a raw event: the owning cluster
/// and the first assigned load-balancer address. Pure filter, no side
/// effects.
pub fn extract_target<'a>(
    labels: &'a BTreeMap<String, String>,
    addresses: &'a [String],
) -> Result<(&'a str, &'a str), ExtractionSkip> {
    let cluster = cluster_name(labels).ok_or(ExtractionSkip::MissingClusterLabel)?;
    let address = addresses
        .first()
        .map(String::as_str)
        .ok_or(ExtractionSkip::NoAddressAssigned)?;
    Ok((cluster, address))
}

/// Result of merging one agent's candidate origin into a shared pool.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The pool already holds exactly this origin; nothing to write.
    Unchanged,
    /// The full origin list to write back (other agents' entries intact).
    Updated(Vec<Origin>),
    /// Another identity already claims the candidate's address; the
    /// insert must be skipped rather than duplicated.
    AddressConflict { address: String, claimed_by: String },
}

/// Merge a candidate origin into the current origin set of a shared pool.
///
/// Only entries carrying the candidate's own name (a prior write by the
/// same geo identity) may be removed; every other entry passes through
/// untouched and in its original position. The candidate lands in the
/// slot of the entry it replaces, so reapplying an identical
/// (cluster, address) pair yields `Unchanged`.
pub fn merge_origin(existing: &[Origin], candidate: &Origin) -> MergeOutcome {
    let mut merged = Vec::with_capacity(existing.len() + 1);
    let mut own_slot = None;
    for origin in existing {
        if origin.name == candidate.name {
            if own_slot.is_none() {
                own_slot = Some(merged.len());
            }
            continue;
        }
        merged.push(origin.clone());
    }

    if let Some(claimed) = merged
        .iter()
        .find(|origin| origin.address == candidate.address)
    {
        return MergeOutcome::AddressConflict {
            address: candidate.address.clone(),
            claimed_by: claimed.name.clone(),
        };
    }

    match own_slot {
        Some(slot) => merged.insert(slot, candidate.clone()),
        None => merged.push(candidate.clone()),
    }

    if merged.as_slice() == existing {
        MergeOutcome::Unchanged
    } else {
        MergeOutcome::Updated(merged)
    }
}

/// Merge a pool id into a load balancer's reference list, preserving
/// every other cluster's reference. Returns `None` when the list already
/// contains the pool (no write needed).
pub fn merge_pool_reference(existing: &[String], pool_id: &str) -> Option<Vec<String>> {
    if existing.iter().any(|id| id == pool_id) {
        return None;
    }
    let mut merged = existing.to_vec();
    merged.push(pool_id.to_string());
    Some(merged)
}
