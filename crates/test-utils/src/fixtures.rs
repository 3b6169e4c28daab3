//! Common test fixtures for air-quality tests.
//!
//! The square region spans 9.7..10.3 E, 53.4..53.7 N (roughly the city of
//! Hamburg) and lines up exactly with [`grid::SQUARE_REGION_GRID`].

use serde_json::json;

/// Corners of the square test region.
pub const SQUARE_MIN_X: f64 = 9.7;
pub const SQUARE_MIN_Y: f64 = 53.4;
pub const SQUARE_MAX_X: f64 = 10.3;
pub const SQUARE_MAX_Y: f64 = 53.7;

/// A point well inside the square region, at the centre of pixel (3, 1) of
/// [`grid::SQUARE_REGION_GRID`].
pub const POINT_INSIDE: (f64, f64) = (10.05, 53.55);

/// A point well outside the square region.
pub const POINT_OUTSIDE: (f64, f64) = (12.5, 48.1);

/// Common grids for testing.
pub mod grid {
    use aq_common::GeoGrid;

    /// 0.1 degree grid covering the square region: 6 columns, 3 rows.
    pub const SQUARE_REGION_GRID: GeoGrid = GeoGrid {
        origin_x: 9.7,
        origin_y: 53.7,
        dx: 0.1,
        dy: 0.1,
        nx: 6,
        ny: 3,
    };
}

/// FeatureCollection with the square region polygon.
pub fn square_region_geojson() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "name": "Hamburg" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [SQUARE_MIN_X, SQUARE_MIN_Y],
                    [SQUARE_MAX_X, SQUARE_MIN_Y],
                    [SQUARE_MAX_X, SQUARE_MAX_Y],
                    [SQUARE_MIN_X, SQUARE_MAX_Y],
                    [SQUARE_MIN_X, SQUARE_MIN_Y]
                ]]
            }
        }]
    })
    .to_string()
}

/// A single Feature with a LineString crossing the square region west to east.
pub fn line_region_geojson() -> String {
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "LineString",
            "coordinates": [[9.75, 53.55], [10.25, 53.55]]
        }
    })
    .to_string()
}

/// A bare Point geometry.
pub fn point_region_geojson() -> String {
    json!({
        "type": "Point",
        "coordinates": [POINT_INSIDE.0, POINT_INSIDE.1]
    })
    .to_string()
}

/// A MultiPolygon, which the region loader does not support.
pub fn multipolygon_geojson() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                    [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]
                ]
            }
        }]
    })
    .to_string()
}

/// A FeatureCollection without any features.
pub fn empty_collection_geojson() -> String {
    json!({ "type": "FeatureCollection", "features": [] }).to_string()
}
