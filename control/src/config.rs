//! Configuration for the GEOROUTE agent
//!
//! Everything is environment-variable driven and validated up front;
//! any failure here is fatal before the watch loop starts. Parsing is
//! factored over a lookup closure so tests never touch process env.

use crate::error::ConfigError;
use common::{geo_codes, geo_location, GeoCoordinate, MAX_ORIGIN_WEIGHT, MIN_ORIGIN_WEIGHT};
use secrecy::SecretString;
use std::env;
use std::net::SocketAddr;
use tracing::{info, warn};

const DEFAULT_LB_HOSTNAME: &str = "app.example.com";
const DEFAULT_ORIGIN_WEIGHT: u32 = 33;
const DEFAULT_LABEL_SELECTOR: &str = "dns.external/geo-route=true";
const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:8080";

/// Validated agent configuration
#[derive(Debug)]
pub struct Settings {
    /// Bearer token for the traffic-management API
    pub api_token: SecretString,

    /// Account scope for pool resources
    pub account_id: String,

    /// Zone scope for load balancer resources
    pub zone_id: String,

    /// Fixed geo identity of this agent (tags the origins it owns)
    pub geo_code: String,

    /// Coordinates reported on pool writes. `None` when a partial
    /// manual pair was supplied and geographic fields are omitted.
    pub coordinate: Option<GeoCoordinate>,

    /// Hostname the load balancer is bound to
    pub lb_hostname: String,

    /// Weight assigned to this agent's origin (1-100)
    pub origin_weight: u32,

    /// Label selector scoping the ingress watch
    pub label_selector: String,

    /// Fixed pool name override; when unset the name is derived from
    /// the cluster identity on each event
    pub pool_name: Option<String>,

    /// Bind address for the liveness/metrics listener
    pub health_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_token = SecretString::new(required(&lookup, "CF_API_TOKEN")?);
        let account_id = required(&lookup, "CF_ACCOUNT_ID")?;
        let zone_id = required(&lookup, "CF_ZONE_ID")?;
        let geo_code = required(&lookup, "GEO_LOCATION")?;
        let coordinate = resolve_coordinate(&lookup, &geo_code)?;

        let lb_hostname =
            lookup("CF_LB_HOSTNAME").unwrap_or_else(|| DEFAULT_LB_HOSTNAME.to_string());
        let origin_weight = match lookup("CF_ORIGIN_WEIGHT") {
            Some(raw) => parse_weight(&raw)?,
            None => DEFAULT_ORIGIN_WEIGHT,
        };
        let label_selector =
            lookup("LABEL_SELECTOR").unwrap_or_else(|| DEFAULT_LABEL_SELECTOR.to_string());
        let pool_name = lookup("CF_POOL_NAME");

        let health_addr_raw =
            lookup("HEALTH_ADDR").unwrap_or_else(|| DEFAULT_HEALTH_ADDR.to_string());
        let health_addr = health_addr_raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "HEALTH_ADDR",
                value: health_addr_raw.clone(),
                reason: format!("{e}"),
            })?;

        Ok(Self {
            api_token,
            account_id,
            zone_id,
            geo_code,
            coordinate,
            lb_hostname,
            origin_weight,
            label_selector,
            pool_name,
            health_addr,
        })
    }

    pub fn log_summary(&self) {
        let region = geo_location(&self.geo_code)
            .map(|location| location.name)
            .unwrap_or("custom coordinates");
        info!(geo = %self.geo_code, %region, "Geo identity");
        info!(hostname = %self.lb_hostname, "Load balancer hostname");
        info!(selector = %self.label_selector, "Ingress label selector");
        info!(known = ?geo_codes(), "Supported geo locations");
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

fn parse_weight(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: "CF_ORIGIN_WEIGHT",
        value: raw.to_string(),
        reason,
    };
    let weight: u32 = raw.parse().map_err(|e| invalid(format!("{e}")))?;
    if !(MIN_ORIGIN_WEIGHT..=MAX_ORIGIN_WEIGHT).contains(&weight) {
        return Err(invalid(format!(
            "weight must be between {MIN_ORIGIN_WEIGHT} and {MAX_ORIGIN_WEIGHT}"
        )));
    }
    Ok(weight)
}

/// Resolve the coordinates this agent reports on pool writes.
///
/// A full manual pair overrides the table (and lets the geo code be an
/// arbitrary tag). A half pair is never applied partially: a warning is
/// logged and geographic fields are omitted, while the geo code itself
/// must still be a known one so the identity tag stays well-formed.
fn resolve_coordinate(
    lookup: &impl Fn(&str) -> Option<String>,
    geo_code: &str,
) -> Result<Option<GeoCoordinate>, ConfigError> {
    let latitude = parse_degrees(lookup("GEO_LATITUDE"), "GEO_LATITUDE")?;
    let longitude = parse_degrees(lookup("GEO_LONGITUDE"), "GEO_LONGITUDE")?;

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Some(GeoCoordinate {
            latitude,
            longitude,
        })),
        (None, None) => {
            let location =
                geo_location(geo_code).ok_or_else(|| ConfigError::UnknownGeoLocation {
                    code: geo_code.to_string(),
                    known: geo_codes(),
                })?;
            Ok(Some(location.coordinate))
        }
        _ => {
            warn!(
                "Only one of GEO_LATITUDE/GEO_LONGITUDE supplied; omitting geographic fields"
            );
            geo_location(geo_code).ok_or_else(|| ConfigError::UnknownGeoLocation {
                code: geo_code.to_string(),
                known: geo_codes(),
            })?;
            Ok(None)
        }
    }
}

fn parse_degrees(raw: Option<String>, var: &'static str) -> Result<Option<f64>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var,
                value: raw.clone(),
                reason: format!("{e}"),
            }),
    }
}
