/// Identity Extraction Tests
///
/// Extraction is a pure filter over an event's label map and assigned
/// address list; the candidate label key ordering is an explicit
/// contract.
use common::{
    cluster_name, extract_target, ClusterIdentity, ExtractionSkip, CLUSTER_NAME_LABEL_KEYS,
};
use std::collections::BTreeMap;

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_label_key_ordering_is_the_documented_contract() {
    assert_eq!(CLUSTER_NAME_LABEL_KEYS, ["cluster-name", "cluster_name"]);
}

#[test]
fn test_dashed_key_wins_when_both_present() {
    let labels = labels(&[("cluster-name", "prod-1"), ("cluster_name", "shadow")]);
    assert_eq!(cluster_name(&labels), Some("prod-1"));
}

#[test]
fn test_underscore_key_is_the_fallback() {
    let labels = labels(&[("cluster_name", "prod-2")]);
    assert_eq!(cluster_name(&labels), Some("prod-2"));
}

#[test]
fn test_unrelated_labels_yield_nothing() {
    let labels = labels(&[("app", "api"), ("watch", "true")]);
    assert_eq!(cluster_name(&labels), None);
}

#[test]
fn test_missing_label_skips_before_address_check() {
    let labels = labels(&[("app", "api")]);
    let addresses = vec!["203.0.113.5".to_string()];
    assert_eq!(
        extract_target(&labels, &addresses),
        Err(ExtractionSkip::MissingClusterLabel)
    );
}

#[test]
fn test_unassigned_address_skips() {
    let labels = labels(&[("cluster-name", "prod-1")]);
    assert_eq!(
        extract_target(&labels, &[]),
        Err(ExtractionSkip::NoAddressAssigned)
    );
}

#[test]
fn test_first_assigned_address_is_taken() {
    let labels = labels(&[("cluster-name", "prod-1")]);
    let addresses = vec!["203.0.113.5".to_string(), "203.0.113.6".to_string()];
    assert_eq!(
        extract_target(&labels, &addresses),
        Ok(("prod-1", "203.0.113.5"))
    );
}

#[test]
fn test_derived_names_encode_the_identity() {
    let identity = ClusterIdentity {
        cluster: "prod-1".to_string(),
        geo: "us_east".to_string(),
    };
    assert_eq!(identity.pool_name(), "k8s-pool-prod-1");
    assert_eq!(identity.origin_name(), "origin-us_east");
}
