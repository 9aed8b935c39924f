/// Origin Merge Discipline Tests
///
/// The merge is what lets N independent per-cluster agents share one
/// remote pool: each agent may only replace the slice named after its
/// own geo identity, and address claims are first-writer-wins.
use common::{merge_origin, merge_pool_reference, MergeOutcome, Origin};

fn origin(name: &str, address: &str) -> Origin {
    Origin {
        name: name.to_string(),
        address: address.to_string(),
        enabled: true,
        weight: 33,
    }
}

#[test]
fn test_insert_into_empty_pool() {
    let candidate = origin("origin-eu", "198.51.100.1");
    match merge_origin(&[], &candidate) {
        MergeOutcome::Updated(merged) => assert_eq!(merged, vec![candidate]),
        other => panic!("expected Updated, got {other:?}"),
    }
}

#[test]
fn test_reapply_is_idempotent() {
    let candidate = origin("origin-eu", "198.51.100.1");
    let existing = vec![origin("origin-asia", "198.51.100.9"), candidate.clone()];

    // Second application of the identical (cluster, ip) pair must not
    // produce a new payload.
    assert_eq!(merge_origin(&existing, &candidate), MergeOutcome::Unchanged);
}

#[test]
fn test_other_clusters_origins_pass_through_untouched() {
    let foreign = origin("origin-asia", "198.51.100.9");
    let existing = vec![foreign.clone()];

    let candidate = origin("origin-eu", "198.51.100.1");
    match merge_origin(&existing, &candidate) {
        MergeOutcome::Updated(merged) => {
            assert_eq!(merged.len(), 2);
            assert_eq!(merged[0], foreign, "foreign origin must be byte-identical");
            assert_eq!(merged[1], candidate);
        }
        other => panic!("expected Updated, got {other:?}"),
    }
}

#[test]
fn test_own_entry_replaced_in_place() {
    let existing = vec![
        origin("origin-eu", "198.51.100.1"),
        origin("origin-asia", "198.51.100.9"),
    ];

    // Same identity, new address: the stale entry is the only removal.
    let candidate = origin("origin-eu", "198.51.100.2");
    match merge_origin(&existing, &candidate) {
        MergeOutcome::Updated(merged) => {
            assert_eq!(merged[0], candidate, "candidate takes the replaced slot");
            assert_eq!(merged[1], existing[1]);
        }
        other => panic!("expected Updated, got {other:?}"),
    }
}

#[test]
fn test_duplicate_own_entries_collapse_to_one() {
    let existing = vec![
        origin("origin-eu", "198.51.100.1"),
        origin("origin-eu", "198.51.100.2"),
        origin("origin-asia", "198.51.100.9"),
    ];

    let candidate = origin("origin-eu", "198.51.100.3");
    match merge_origin(&existing, &candidate) {
        MergeOutcome::Updated(merged) => {
            assert_eq!(merged.len(), 2);
            assert_eq!(merged[0], candidate);
            assert_eq!(merged[1].name, "origin-asia");
        }
        other => panic!("expected Updated, got {other:?}"),
    }
}

#[test]
fn test_address_claimed_by_another_identity_is_a_conflict() {
    let existing = vec![origin("origin-asia", "198.51.100.9")];

    let candidate = origin("origin-eu", "198.51.100.9");
    assert_eq!(
        merge_origin(&existing, &candidate),
        MergeOutcome::AddressConflict {
            address: "198.51.100.9".to_string(),
            claimed_by: "origin-asia".to_string(),
        }
    );
}

#[test]
fn test_conflict_detected_after_own_entry_removal() {
    // The agent's stale entry is removed first, then the conflict with
    // the sibling's claim still holds.
    let existing = vec![
        origin("origin-eu", "198.51.100.1"),
        origin("origin-asia", "198.51.100.9"),
    ];

    let candidate = origin("origin-eu", "198.51.100.9");
    match merge_origin(&existing, &candidate) {
        MergeOutcome::AddressConflict { claimed_by, .. } => {
            assert_eq!(claimed_by, "origin-asia");
        }
        other => panic!("expected AddressConflict, got {other:?}"),
    }
}

#[test]
fn test_no_two_origins_share_an_address_after_merge() {
    let existing = vec![
        origin("origin-us_east", "203.0.113.5"),
        origin("origin-asia", "198.51.100.9"),
    ];

    let candidate = origin("origin-eu", "198.51.100.1");
    if let MergeOutcome::Updated(merged) = merge_origin(&existing, &candidate) {
        for (i, a) in merged.iter().enumerate() {
            for b in merged.iter().skip(i + 1) {
                assert_ne!(a.address, b.address);
            }
        }
    } else {
        panic!("expected Updated");
    }
}

#[test]
fn test_pool_reference_append_preserves_others() {
    let existing = vec!["pool-b".to_string(), "pool-c".to_string()];
    let merged = merge_pool_reference(&existing, "pool-a").expect("expected a changed list");
    assert_eq!(merged, vec!["pool-b", "pool-c", "pool-a"]);
}

#[test]
fn test_pool_reference_already_present_means_no_write() {
    let existing = vec!["pool-a".to_string(), "pool-b".to_string()];
    assert_eq!(merge_pool_reference(&existing, "pool-a"), None);
}

#[test]
fn test_pool_reference_into_empty_list() {
    let merged = merge_pool_reference(&[], "pool-a").expect("expected a changed list");
    assert_eq!(merged, vec!["pool-a"]);
}
