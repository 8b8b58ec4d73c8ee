//! Tests for query construction and validation.

use chrono::{TimeZone, Utc};
use geo_query::{BoundingBox, NumericRange, Query, QueryError, TimeRange};

fn base() -> &'static str {
    "https://data.example.org/thredds"
}

// ============================================================================
// Builder tests
// ============================================================================

#[test]
fn test_full_query() {
    let time = TimeRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    );
    let query = Query::builder(base(), "gfs/best")
        .bbox(BoundingBox::new(-10.0, 40.0, 5.0, 55.0))
        .time(time)
        .altitude(NumericRange::new(1000.0, 500.0))
        .parameters(["TMP", "UGRD"])
        .build()
        .unwrap();

    assert_eq!(query.dataset(), "gfs/best");
    assert_eq!(query.parameters(), &["TMP".to_string(), "UGRD".to_string()]);
    assert_eq!(query.bbox().unwrap().longitude_range().start, -10.0);
    assert_eq!(query.time(), Some(&time));
    assert!(query.is_subset());
}

#[test]
fn test_trailing_slash_trimmed() {
    let query = Query::builder(format!("{}/", base()), "gfs").build().unwrap();
    assert_eq!(query.base_url(), base());
    assert!(!query.dataset_key().contains('?'));
}

// ============================================================================
// Validation tests
// ============================================================================

#[test]
fn test_inverted_time_rejected() {
    let time = TimeRange::new(
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );
    let result = Query::builder(base(), "gfs").time(time).build();
    assert!(matches!(
        result,
        Err(QueryError::InvalidRange { axis: "time", .. })
    ));
}

#[test]
fn test_out_of_world_bbox_rejected() {
    let result = Query::builder(base(), "gfs")
        .bbox(BoundingBox::new(0.0, -95.0, 10.0, 10.0))
        .build();
    assert!(matches!(
        result,
        Err(QueryError::InvalidRange { axis: "bbox", .. })
    ));
}

#[test]
fn test_antimeridian_bbox_rejected() {
    let result = Query::builder(base(), "gfs")
        .bbox(BoundingBox::new(170.0, 0.0, -170.0, 10.0))
        .build();
    match result {
        Err(QueryError::InvalidRange { axis, message }) => {
            assert_eq!(axis, "bbox");
            assert!(message.contains("antimeridian"));
        }
        other => panic!("expected bbox range error, got {:?}", other),
    }
}

#[test]
fn test_non_finite_altitude_rejected() {
    let result = Query::builder(base(), "gfs")
        .altitude(NumericRange::new(f64::NAN, 10.0))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_query_in_base_url_rejected() {
    let result = Query::builder("http://host/thredds?x=1", "gfs").build();
    assert!(matches!(result, Err(QueryError::InvalidDatasetKey(_))));
}

#[test]
fn test_query_serializes() {
    let query = Query::builder(base(), "gfs")
        .altitude(NumericRange::point(850.0))
        .build()
        .unwrap();
    let json = serde_json::to_string(&query).unwrap();
    let back: Query = serde_json::from_str(&json).unwrap();
    assert_eq!(back, query);
}
