//! Raster file I/O for the air-quality pipeline.
//!
//! Rasters are single-band `f32` grids on a north-up lon/lat [`GeoGrid`].
//! They are written as GeoTIFF (pixel scale, tie point and GDAL no-data
//! tags) and can be turned into a GeoJSON point layer, one point per valid
//! pixel.

pub mod geotiff;
pub mod vectorize;

pub use geotiff::{export_geotiff, read_geotiff};
pub use vectorize::{
    points_to_features, raster_points, vectorize, vectorize_as, PointValue, DEFAULT_PROPERTY,
};

use aq_common::{AqError, AqResult, GeoGrid};

/// A single-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub grid: GeoGrid,
    /// Row-major values; `NaN` marks masked pixels in memory.
    pub values: Vec<f32>,
    /// Value written for masked pixels on disk.
    pub nodata: Option<f32>,
}

impl Raster {
    /// Create a raster, checking that the values fill the grid.
    pub fn new(grid: GeoGrid, values: Vec<f32>, nodata: Option<f32>) -> AqResult<Self> {
        if values.len() != grid.len() {
            return Err(AqError::GridMismatch(format!(
                "raster has {} values for a {}x{} grid",
                values.len(),
                grid.nx,
                grid.ny
            )));
        }
        Ok(Self {
            grid,
            values,
            nodata,
        })
    }

    pub fn width(&self) -> usize {
        self.grid.nx
    }

    pub fn height(&self) -> usize {
        self.grid.ny
    }

    /// Value at a pixel, `None` outside the grid.
    pub fn value_at(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.grid.nx || row >= self.grid.ny {
            return None;
        }
        self.values.get(self.grid.flat_index(col, row)).copied()
    }

    /// True when a value carries data (not NaN, not the no-data value).
    pub fn is_valid(&self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.nodata {
            Some(nodata) => value != nodata,
            None => true,
        }
    }

    /// Number of pixels that carry data.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| self.is_valid(**v)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_length_checked() {
        let grid = GeoGrid::new(0.0, 1.0, 0.5, 0.5, 2, 2);
        assert!(Raster::new(grid, vec![1.0; 3], None).is_err());
        assert!(Raster::new(grid, vec![1.0; 4], None).is_ok());
    }

    #[test]
    fn test_validity() {
        let grid = GeoGrid::new(0.0, 1.0, 0.5, 0.5, 2, 2);
        let raster = Raster::new(grid, vec![1.0, -9999.0, f32::NAN, 0.0], Some(-9999.0)).unwrap();
        assert_eq!(raster.valid_count(), 2);
        assert_eq!(raster.value_at(1, 1), Some(0.0));
        assert_eq!(raster.value_at(2, 0), None);
    }
}
