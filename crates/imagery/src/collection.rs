//! Ordered image collections and their temporal reductions.

use aq_common::{AqError, AqResult, BoundingBox, DateWindow};
use tracing::trace;

use crate::image::{Band, Image};

/// Calendar property an image can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarProperty {
    Day,
    Week,
    Month,
}

/// An ordered set of images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl From<Vec<Image>> for ImageCollection {
    fn from(images: Vec<Image>) -> Self {
        Self { images }
    }
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: Image) {
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.iter()
    }

    pub fn into_images(self) -> Vec<Image> {
        self.images
    }

    /// Keep images intersecting `bbox`.
    pub fn filter_bounds(self, bbox: &BoundingBox) -> Self {
        self.filter(|img| !img.grid.is_empty() && img.grid.bbox().intersects(bbox))
    }

    /// Keep dated images acquired inside `window`.
    pub fn filter_date(self, window: &DateWindow) -> Self {
        self.filter(|img| img.acquired.is_some_and(|d| window.contains(d)))
    }

    /// Keep images whose calendar property equals `value`.
    pub fn filter_tag(self, property: CalendarProperty, value: u32) -> Self {
        self.filter(|img| {
            img.tags().is_some_and(|tags| match property {
                CalendarProperty::Day => tags.day == value,
                CalendarProperty::Week => tags.week == value,
                CalendarProperty::Month => tags.month == value,
            })
        })
    }

    /// Keep images acquired in ISO week `week` of `year`.
    pub fn filter_iso_week(self, year: i32, week: u32) -> Self {
        self.filter(|img| {
            img.tags()
                .is_some_and(|tags| tags.week_year == year && tags.week == week)
        })
    }

    pub fn filter(self, keep: impl Fn(&Image) -> bool) -> Self {
        Self {
            images: self.images.into_iter().filter(|img| keep(img)).collect(),
        }
    }

    pub fn map(self, f: impl Fn(Image) -> Image) -> Self {
        Self {
            images: self.images.into_iter().map(f).collect(),
        }
    }

    /// Restrict every image to the named bands.
    pub fn select(self, names: &[&str]) -> Self {
        self.map(|img| img.select(names))
    }

    /// Per-pixel mean of every band across the collection.
    ///
    /// Masked pixels are ignored; a pixel masked in every image stays masked.
    /// Images lacking a band do not contribute to it. An empty collection
    /// reduces to [`Image::empty`].
    pub fn mean(&self) -> AqResult<Image> {
        let Some(first) = self.images.iter().find(|img| img.band_count() > 0) else {
            return Ok(Image::empty());
        };
        let grid = first.grid;

        let mut names: Vec<&str> = Vec::new();
        for img in &self.images {
            for band in &img.bands {
                if !names.contains(&band.name.as_str()) {
                    names.push(&band.name);
                }
            }
        }

        let mut bands = Vec::with_capacity(names.len());
        for name in names {
            let mut sum = vec![0.0f64; grid.len()];
            let mut count = vec![0u32; grid.len()];

            for img in &self.images {
                let Some(band) = img.band(name) else {
                    continue;
                };
                if !img.grid.aligned_with(&grid) {
                    return Err(AqError::GridMismatch(format!(
                        "image '{}' is not on the grid of '{}'",
                        img.id, first.id
                    )));
                }
                for (i, v) in band.data.iter().enumerate() {
                    if v.is_finite() {
                        sum[i] += *v as f64;
                        count[i] += 1;
                    }
                }
            }

            let data = sum
                .iter()
                .zip(&count)
                .map(|(s, c)| if *c == 0 { f32::NAN } else { (*s / *c as f64) as f32 })
                .collect();
            bands.push(Band {
                name: name.to_string(),
                data,
            });
        }

        trace!(images = self.images.len(), bands = bands.len(), "Reduced collection");

        Ok(Image {
            id: "mean".to_string(),
            acquired: None,
            grid,
            bands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::GeoGrid;
    use chrono::NaiveDate;

    fn grid() -> GeoGrid {
        GeoGrid::new(0.0, 1.0, 1.0, 1.0, 2, 1)
    }

    fn dated(y: i32, m: u32, d: u32, values: Vec<f32>) -> Image {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Image::new(date.to_string(), Some(date), grid())
            .with_band("b", values)
            .unwrap()
    }

    #[test]
    fn test_mean_of_empty_collection_has_no_bands() {
        let mean = ImageCollection::new().mean().unwrap();
        assert_eq!(mean.band_count(), 0);
    }

    #[test]
    fn test_mean_ignores_nan() {
        let collection = ImageCollection::from(vec![
            dated(2025, 1, 1, vec![1.0, f32::NAN]),
            dated(2025, 1, 2, vec![3.0, f32::NAN]),
        ]);
        let mean = collection.mean().unwrap();
        let data = mean.band_data("b").unwrap();
        assert_eq!(data[0], 2.0);
        assert!(data[1].is_nan());
    }

    #[test]
    fn test_filter_date_is_half_open() {
        let collection = ImageCollection::from(vec![
            dated(2025, 1, 1, vec![1.0, 1.0]),
            dated(2025, 1, 31, vec![1.0, 1.0]),
        ]);
        let window = DateWindow::parse("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(collection.filter_date(&window).len(), 1);
    }

    #[test]
    fn test_filter_tags() {
        let collection = ImageCollection::from(vec![
            dated(2025, 1, 6, vec![1.0, 1.0]),
            dated(2025, 2, 6, vec![1.0, 1.0]),
            dated(2025, 2, 7, vec![1.0, 1.0]),
        ]);
        assert_eq!(collection.clone().filter_tag(CalendarProperty::Day, 6).len(), 2);
        assert_eq!(collection.clone().filter_tag(CalendarProperty::Month, 2).len(), 2);
        // 2025-01-06 is the Monday of ISO week 2
        assert_eq!(collection.filter_tag(CalendarProperty::Week, 2).len(), 1);
    }

    #[test]
    fn test_filter_iso_week_checks_year() {
        // 2025-12-31 is in ISO week 1 of 2026
        let collection = ImageCollection::from(vec![
            dated(2025, 1, 2, vec![1.0, 1.0]),
            dated(2025, 12, 31, vec![1.0, 1.0]),
        ]);
        assert_eq!(collection.clone().filter_tag(CalendarProperty::Week, 1).len(), 2);
        let week = collection.clone().filter_iso_week(2025, 1);
        assert_eq!(week.len(), 1);
        assert_eq!(week.iter().next().unwrap().acquired, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(collection.filter_iso_week(2026, 1).len(), 1);
    }

    #[test]
    fn test_filter_bounds() {
        let collection = ImageCollection::from(vec![dated(2025, 1, 1, vec![1.0, 1.0])]);
        let far = BoundingBox::new(50.0, 50.0, 51.0, 51.0);
        let near = BoundingBox::new(1.5, 0.5, 3.0, 3.0);
        assert!(collection.clone().filter_bounds(&far).is_empty());
        assert_eq!(collection.filter_bounds(&near).len(), 1);
    }
}
