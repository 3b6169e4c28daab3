//! Tests for loading region boundaries from GeoJSON files.

use aq_common::AqError;
use region::{Coordinate, Region, RegionGeometry, Regional};
use test_utils::{
    line_region_geojson, multipolygon_geojson, point_region_geojson, empty_collection_geojson,
    TestWorkspace, POINT_INSIDE, POINT_OUTSIDE,
};

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_polygon_feature_collection() {
    let ws = TestWorkspace::new().unwrap();
    let region = Region::load(ws.region_path()).unwrap();

    assert_eq!(region.geometry().kind(), "Polygon");
    assert_eq!(region.name(), "region");
    assert_eq!(region.source(), ws.region_path().as_path());

    let bbox = region.bounding_box();
    assert_eq!(bbox.min_x, 9.7);
    assert_eq!(bbox.max_y, 53.7);
}

#[test]
fn test_load_line_feature() {
    let ws = TestWorkspace::with_region(&line_region_geojson()).unwrap();
    let region = Region::load(ws.region_path()).unwrap();
    assert!(matches!(region.geometry(), RegionGeometry::LineString(_)));
}

#[test]
fn test_load_bare_point_geometry() {
    let ws = TestWorkspace::with_region(&point_region_geojson()).unwrap();
    let region = Region::load(ws.region_path()).unwrap();
    assert!(matches!(region.geometry(), RegionGeometry::Point(_)));
}

#[test]
fn test_multipolygon_is_unsupported() {
    let ws = TestWorkspace::with_region(&multipolygon_geojson()).unwrap();
    let err = Region::load(ws.region_path()).unwrap_err();
    assert!(matches!(err, AqError::UnsupportedGeometry(ref kind) if kind == "MultiPolygon"));
}

#[test]
fn test_empty_collection_is_an_error() {
    let ws = TestWorkspace::with_region(&empty_collection_geojson()).unwrap();
    let err = Region::load(ws.region_path()).unwrap_err();
    assert!(matches!(err, AqError::RegionLoad(_)));
}

#[test]
fn test_missing_file_is_an_error() {
    let ws = TestWorkspace::new().unwrap();
    let err = Region::load(ws.root().join("nope.geojson")).unwrap_err();
    assert!(err.to_string().contains("nope.geojson"));
}

#[test]
fn test_raw_document_is_kept_verbatim() {
    let ws = TestWorkspace::new().unwrap();
    let region = Region::load(ws.region_path()).unwrap();
    let on_disk = std::fs::read_to_string(ws.region_path()).unwrap();
    assert_eq!(region.raw_geojson(), on_disk);
}

// ============================================================================
// Point resolution
// ============================================================================

#[test]
fn test_resolve_without_point_uses_region() {
    let ws = TestWorkspace::new().unwrap();
    let region = Region::load(ws.region_path()).unwrap();
    match region.resolve(None) {
        Regional::InRegion(geometry) => assert_eq!(&geometry, region.geometry()),
        Regional::OutOfBounds => panic!("whole region must resolve"),
    }
}

#[test]
fn test_resolve_point_inside() {
    let ws = TestWorkspace::new().unwrap();
    let region = Region::load(ws.region_path()).unwrap();
    let resolved = region.resolve(Some(Coordinate::new(POINT_INSIDE.0, POINT_INSIDE.1)));
    assert!(matches!(resolved, Regional::InRegion(RegionGeometry::Point(_))));
}

#[test]
fn test_resolve_point_outside() {
    let ws = TestWorkspace::new().unwrap();
    let region = Region::load(ws.region_path()).unwrap().with_name("Hamburg");
    let resolved = region.resolve(Some(Coordinate::new(POINT_OUTSIDE.0, POINT_OUTSIDE.1)));
    assert!(resolved.is_out_of_bounds());
    assert_eq!(
        region.out_of_bounds_message(),
        "Points are out of Hamburg bounding box"
    );
}
