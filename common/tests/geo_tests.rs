/// Geo Table Tests
///
/// The coordinate table is a fixed contract: agents deployed under a
/// given code must all report identical coordinates to the remote API.
use common::{geo_codes, geo_location, GEO_LOCATIONS};

#[test]
fn test_table_has_exactly_the_documented_codes() {
    assert_eq!(geo_codes(), vec!["eu", "us_east", "us_west", "asia"]);
}

#[test]
fn test_documented_coordinates_are_exact() {
    let eu = geo_location("eu").expect("eu must exist");
    assert_eq!(eu.name, "Europe");
    assert_eq!(eu.coordinate.latitude, 50.1109);
    assert_eq!(eu.coordinate.longitude, 8.6821);

    let us_east = geo_location("us_east").expect("us_east must exist");
    assert_eq!(us_east.name, "United States East");
    assert_eq!(us_east.coordinate.latitude, 40.7128);
    assert_eq!(us_east.coordinate.longitude, -74.0060);

    let us_west = geo_location("us_west").expect("us_west must exist");
    assert_eq!(us_west.name, "United States West");
    assert_eq!(us_west.coordinate.latitude, 34.0522);
    assert_eq!(us_west.coordinate.longitude, -118.2437);

    let asia = geo_location("asia").expect("asia must exist");
    assert_eq!(asia.name, "Asia");
    assert_eq!(asia.coordinate.latitude, 35.6762);
    assert_eq!(asia.coordinate.longitude, 139.6503);
}

#[test]
fn test_unknown_code_resolves_to_nothing() {
    assert!(geo_location("atlantis").is_none());
    assert!(geo_location("").is_none());
    // Codes are case-sensitive
    assert!(geo_location("EU").is_none());
}

#[test]
fn test_codes_are_unique() {
    for (i, a) in GEO_LOCATIONS.iter().enumerate() {
        for b in GEO_LOCATIONS.iter().skip(i + 1) {
            assert_ne!(a.code, b.code);
        }
    }
}
