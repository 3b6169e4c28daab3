//! Multi-band images on a regular grid.

use aq_common::{AqError, AqResult, CalendarTags, GeoGrid};
use chrono::NaiveDate;
use raster_io::Raster;
use region::RegionGeometry;

/// A named band; `data` is row-major over the image grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub data: Vec<f32>,
}

/// A (possibly dated) raster with zero or more bands sharing one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: String,
    pub acquired: Option<NaiveDate>,
    pub grid: GeoGrid,
    pub bands: Vec<Band>,
}

impl Image {
    /// Create an image without bands.
    pub fn new(id: impl Into<String>, acquired: Option<NaiveDate>, grid: GeoGrid) -> Self {
        Self {
            id: id.into(),
            acquired,
            grid,
            bands: Vec::new(),
        }
    }

    /// The image with no bands, result of reducing an empty collection.
    pub fn empty() -> Self {
        Self::new("empty", None, GeoGrid::empty())
    }

    /// Add (or replace) a band.
    pub fn with_band(mut self, name: impl Into<String>, data: Vec<f32>) -> AqResult<Self> {
        let name = name.into();
        if data.len() != self.grid.len() {
            return Err(AqError::GridMismatch(format!(
                "band '{}' has {} values, image '{}' has {} pixels",
                name,
                data.len(),
                self.id,
                self.grid.len()
            )));
        }
        self.bands.retain(|b| b.name != name);
        self.bands.push(Band { name, data });
        Ok(self)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Band data, failing with [`AqError::BandNotFound`].
    pub fn band_data(&self, name: &str) -> AqResult<&[f32]> {
        self.band(name)
            .map(|b| b.data.as_slice())
            .ok_or_else(|| AqError::BandNotFound(format!("{} in image {}", name, self.id)))
    }

    /// Calendar tags derived from the acquisition date.
    pub fn tags(&self) -> Option<CalendarTags> {
        self.acquired.map(CalendarTags::from_date)
    }

    /// Keep only the named bands that exist, in the requested order.
    pub fn select(&self, names: &[&str]) -> Image {
        let bands = names
            .iter()
            .filter_map(|n| self.band(n).cloned())
            .collect();
        Image {
            id: self.id.clone(),
            acquired: self.acquired,
            grid: self.grid,
            bands,
        }
    }

    /// Stack the bands of `other` onto this image.
    ///
    /// An image without bands contributes nothing, so stacking onto the
    /// empty image yields the other operand.
    pub fn add_bands(self, other: Image) -> AqResult<Image> {
        if other.bands.is_empty() {
            return Ok(self);
        }
        if self.bands.is_empty() {
            return Ok(other);
        }
        if !self.grid.aligned_with(&other.grid) {
            return Err(AqError::GridMismatch(format!(
                "cannot stack image '{}' onto '{}': grids differ",
                other.id, self.id
            )));
        }
        let mut image = self;
        for band in other.bands {
            image = image.with_band(band.name, band.data)?;
        }
        Ok(image)
    }

    /// Mean of the valid pixels of `band` selected by `geometry`.
    ///
    /// Returns `None` when no selected pixel carries data.
    pub fn reduce_region_mean(&self, band: &str, geometry: &RegionGeometry) -> AqResult<Option<f64>> {
        let data = self.band_data(band)?;
        let mut sum = 0.0;
        let mut count = 0usize;
        for cell in self.grid.cells() {
            let value = data[self.grid.flat_index(cell.col, cell.row)];
            if value.is_finite() && geometry.selects(&cell) {
                sum += value as f64;
                count += 1;
            }
        }
        Ok(if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        })
    }

    /// Mask every pixel `geometry` does not select.
    pub fn clip(&self, geometry: &RegionGeometry) -> Image {
        let keep: Vec<bool> = self.grid.cells().map(|c| geometry.selects(&c)).collect();
        let bands = self
            .bands
            .iter()
            .map(|b| Band {
                name: b.name.clone(),
                data: b
                    .data
                    .iter()
                    .zip(&keep)
                    .map(|(v, k)| if *k { *v } else { f32::NAN })
                    .collect(),
            })
            .collect();
        Image {
            id: self.id.clone(),
            acquired: self.acquired,
            grid: self.grid,
            bands,
        }
    }

    /// Nearest-neighbour resample onto `target`; pixels outside the source
    /// grid are masked.
    pub fn resample(&self, target: &GeoGrid) -> Image {
        let lookup: Vec<Option<usize>> = target
            .cells()
            .map(|cell| {
                let (x, y) = cell.center();
                self.grid
                    .cell_of(x, y)
                    .map(|(col, row)| self.grid.flat_index(col, row))
            })
            .collect();

        let bands = self
            .bands
            .iter()
            .map(|b| Band {
                name: b.name.clone(),
                data: lookup
                    .iter()
                    .map(|idx| idx.map_or(f32::NAN, |i| b.data[i]))
                    .collect(),
            })
            .collect();

        Image {
            id: self.id.clone(),
            acquired: self.acquired,
            grid: *target,
            bands,
        }
    }

    /// Single-band raster view of a band for export.
    pub fn band_raster(&self, band: &str, nodata: Option<f32>) -> AqResult<Raster> {
        Raster::new(self.grid, self.band_data(band)?.to_vec(), nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point};

    fn grid() -> GeoGrid {
        GeoGrid::new(0.0, 2.0, 1.0, 1.0, 2, 2)
    }

    fn image(values: Vec<f32>) -> Image {
        Image::new("test", None, grid()).with_band("b", values).unwrap()
    }

    #[test]
    fn test_with_band_checks_length() {
        assert!(Image::new("x", None, grid()).with_band("b", vec![1.0]).is_err());
    }

    #[test]
    fn test_add_bands_empty_passthrough() {
        let stacked = Image::empty().add_bands(image(vec![1.0; 4])).unwrap();
        assert_eq!(stacked.band_count(), 1);

        let stacked = image(vec![1.0; 4]).add_bands(Image::empty()).unwrap();
        assert_eq!(stacked.band_count(), 1);
    }

    #[test]
    fn test_add_bands_rejects_misaligned_grids() {
        let other = Image::new("other", None, GeoGrid::new(5.0, 2.0, 1.0, 1.0, 2, 2))
            .with_band("c", vec![0.0; 4])
            .unwrap();
        assert!(matches!(
            image(vec![1.0; 4]).add_bands(other),
            Err(AqError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_reduce_point_picks_containing_pixel() {
        let img = image(vec![1.0, 2.0, 3.0, 4.0]);
        let mean = img
            .reduce_region_mean("b", &RegionGeometry::Point(Point::new(1.5, 0.5)))
            .unwrap();
        assert_eq!(mean, Some(4.0));
    }

    #[test]
    fn test_reduce_ignores_masked_pixels() {
        let img = image(vec![1.0, f32::NAN, 3.0, f32::NAN]);
        let line = RegionGeometry::LineString(LineString::from(vec![(0.1, 1.9), (1.9, 1.9)]));
        assert_eq!(img.reduce_region_mean("b", &line).unwrap(), Some(1.0));

        let masked = RegionGeometry::Point(Point::new(1.5, 1.5));
        assert_eq!(img.reduce_region_mean("b", &masked).unwrap(), None);
    }

    #[test]
    fn test_reduce_missing_band() {
        let err = image(vec![0.0; 4])
            .reduce_region_mean("nope", &RegionGeometry::Point(Point::new(0.5, 0.5)))
            .unwrap_err();
        assert!(matches!(err, AqError::BandNotFound(_)));
    }

    #[test]
    fn test_resample_nearest() {
        let img = image(vec![1.0, 2.0, 3.0, 4.0]);
        let target = GeoGrid::new(0.0, 2.0, 0.5, 0.5, 4, 4);
        let resampled = img.resample(&target);
        let data = resampled.band_data("b").unwrap();
        assert_eq!(data[target.flat_index(0, 0)], 1.0);
        assert_eq!(data[target.flat_index(3, 0)], 2.0);
        assert_eq!(data[target.flat_index(3, 3)], 4.0);
    }

    #[test]
    fn test_resample_outside_is_masked() {
        let img = image(vec![1.0; 4]);
        let target = GeoGrid::new(1.0, 2.0, 1.0, 1.0, 2, 1);
        let data = img.resample(&target).band_data("b").unwrap().to_vec();
        assert_eq!(data[0], 1.0);
        assert!(data[1].is_nan());
    }
}
