//! Loading a region boundary from a vector file.

use std::path::{Path, PathBuf};

use aq_common::{AqError, AqResult, BoundingBox};
use geo::Point;
use geojson::GeoJson;
use tracing::info;

use crate::{Coordinate, RegionGeometry, Regional};

/// An immutable region boundary, identified by its source file.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    source: PathBuf,
    geometry: RegionGeometry,
    raw: String,
}

impl Region {
    /// Load the first geometry of a GeoJSON file.
    ///
    /// The region is named after the file stem; use [`Region::with_name`]
    /// to override it.
    pub fn load(path: impl AsRef<Path>) -> AqResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AqError::RegionLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("region")
            .to_string();

        let region = Self::from_geojson_str(name, path, raw)?;
        info!(
            path = %path.display(),
            geometry = region.geometry.kind(),
            "Loaded region boundary"
        );
        Ok(region)
    }

    /// Build a region from an in-memory GeoJSON document.
    pub fn from_geojson_str(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        raw: String,
    ) -> AqResult<Self> {
        let geojson: GeoJson = raw
            .parse()
            .map_err(|e| AqError::RegionLoad(format!("invalid GeoJSON: {}", e)))?;

        let geometry = match &geojson {
            GeoJson::FeatureCollection(fc) => fc
                .features
                .first()
                .ok_or_else(|| AqError::RegionLoad("feature collection is empty".into()))?
                .geometry
                .as_ref(),
            GeoJson::Feature(feature) => feature.geometry.as_ref(),
            GeoJson::Geometry(geometry) => Some(geometry),
        }
        .ok_or_else(|| AqError::RegionLoad("feature has no geometry".into()))?;

        Ok(Self {
            name: name.into(),
            source: source.into(),
            geometry: RegionGeometry::from_geojson(&geometry.value)?,
            raw,
        })
    }

    /// Rename the region (used in user-facing messages).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn geometry(&self) -> &RegionGeometry {
        &self.geometry
    }

    /// The boundary document exactly as it was read.
    pub fn raw_geojson(&self) -> &str {
        &self.raw
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.geometry.bounding_box()
    }

    /// Check whether a coordinate is inside (or on) the boundary.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.geometry.covers(point.x, point.y)
    }

    /// Pick the area of interest for a query.
    ///
    /// Without a point the whole region is used; a point inside the region
    /// narrows the query to that point.
    pub fn resolve(&self, point: Option<Coordinate>) -> Regional<RegionGeometry> {
        match point {
            None => Regional::InRegion(self.geometry.clone()),
            Some(p) if self.contains(p) => {
                Regional::InRegion(RegionGeometry::Point(Point::new(p.x, p.y)))
            }
            Some(_) => Regional::OutOfBounds,
        }
    }

    /// Message returned to clients for points outside the region.
    pub fn out_of_bounds_message(&self) -> String {
        format!("Points are out of {} bounding box", self.name)
    }
}
