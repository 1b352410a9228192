//! Tests for BoundingBox parsing and geometry helpers.

use hrdem_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Parsing tests
// ============================================================================

#[test]
fn test_parse_bbox_with_spaces() {
    let bbox: BoundingBox = " -75.8, 45.3, -75.6, 45.5 ".parse().unwrap();
    assert_eq!(bbox, BoundingBox::new(-75.8, 45.3, -75.6, 45.5));
}

#[test]
fn test_parse_bbox_projected_meters() {
    let bbox: BoundingBox = "1500000.5,-250000,1510000,-240000.25".parse().unwrap();
    assert!((bbox.width() - 9999.5).abs() < 1e-9);
    assert!((bbox.height() - 9999.75).abs() < 1e-9);
}

#[test]
fn test_parse_bbox_too_few_parts() {
    let result = "0,0,100".parse::<BoundingBox>();
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_bbox_invalid_number() {
    let result = "abc,0,100,100".parse::<BoundingBox>();
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_bbox_inverted() {
    let result = "10,10,5,5".parse::<BoundingBox>();
    assert!(matches!(result, Err(BboxParseError::Inverted(_))));
}

#[test]
fn test_display_round_trips_through_parse() {
    let bbox = BoundingBox::new(-75.5, 45.25, -75.0, 45.75);
    let parsed: BoundingBox = bbox.to_string().parse().unwrap();
    assert_eq!(parsed, bbox);
}

// ============================================================================
// Containment tests
// ============================================================================

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(10.000001, 5.0));
}

#[test]
fn test_contains_box() {
    let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(outer.contains(&BoundingBox::new(2.0, 2.0, 8.0, 8.0)));
    assert!(outer.contains(&outer));
    assert!(!outer.contains(&BoundingBox::new(5.0, 5.0, 15.0, 8.0)));
}

#[test]
fn test_intersects() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
    assert!(!a.intersects(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)));
}

#[test]
fn test_is_valid() {
    assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_valid());
    assert!(!BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    assert!(!BoundingBox::new(2.0, 0.0, 1.0, 1.0).is_valid());
}
