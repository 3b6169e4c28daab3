//! Raster to point-layer conversion.

use std::path::Path;

use aq_common::AqResult;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use tracing::info;

use crate::{read_geotiff, Raster};

/// Property name used by [`vectorize`].
pub const DEFAULT_PROPERTY: &str = "PM2.5";

/// One valid pixel as a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointValue {
    pub x: f64,
    pub y: f64,
    pub value: f32,
}

/// Convert a raster file into a GeoJSON point file, one point per valid
/// pixel, tagged with the [`DEFAULT_PROPERTY`] property.
pub fn vectorize(
    raster_path: impl AsRef<Path>,
    vector_path: impl AsRef<Path>,
) -> AqResult<Vec<PointValue>> {
    vectorize_as(raster_path, vector_path, DEFAULT_PROPERTY)
}

/// Like [`vectorize`] with a custom property name.
pub fn vectorize_as(
    raster_path: impl AsRef<Path>,
    vector_path: impl AsRef<Path>,
    property: &str,
) -> AqResult<Vec<PointValue>> {
    let raster_path = raster_path.as_ref();
    let vector_path = vector_path.as_ref();

    let raster = read_geotiff(raster_path)?;
    let points = raster_points(&raster);

    let collection = points_to_features(&points, property);
    if let Some(parent) = vector_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(vector_path, serde_json::to_vec(&collection)?)?;

    info!(
        raster = %raster_path.display(),
        vector = %vector_path.display(),
        points = points.len(),
        "Vectorized raster"
    );
    Ok(points)
}

/// Walk the raster row-major and emit the upper-left corner of every valid
/// pixel.
pub fn raster_points(raster: &Raster) -> Vec<PointValue> {
    let grid = &raster.grid;
    let mut points = Vec::with_capacity(raster.valid_count());
    for row in 0..grid.ny {
        for col in 0..grid.nx {
            let value = raster.values[grid.flat_index(col, row)];
            if !raster.is_valid(value) {
                continue;
            }
            let (x, y) = grid.pixel_to_coord(col as f64, row as f64);
            points.push(PointValue { x, y, value });
        }
    }
    points
}

/// Build a FeatureCollection of Point features carrying `property`.
pub fn points_to_features(points: &[PointValue], property: &str) -> FeatureCollection {
    let features = points
        .iter()
        .map(|p| {
            let mut properties = JsonObject::new();
            properties.insert(property.to_string(), serde_json::json!(p.value));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![p.x, p.y]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
