//! Test data generators for synthetic satellite bands.
//!
//! These generators create predictable, verifiable band values on a
//! [`GeoGrid`] in row-major order.

use aq_common::GeoGrid;
use chrono::NaiveDate;

/// A band where every pixel has the same value.
pub fn constant_band(grid: &GeoGrid, value: f32) -> Vec<f32> {
    vec![value; grid.len()]
}

/// A band whose value at (col, row) is `col * 10 + row`.
///
/// Makes it easy to verify pixel addressing after resampling or export.
pub fn indexed_band(grid: &GeoGrid) -> Vec<f32> {
    let mut data = Vec::with_capacity(grid.len());
    for row in 0..grid.ny {
        for col in 0..grid.nx {
            data.push((col * 10 + row) as f32);
        }
    }
    data
}

/// A constant band with the listed `(col, row)` pixels masked out (NaN).
pub fn masked_band(grid: &GeoGrid, value: f32, masked: &[(usize, usize)]) -> Vec<f32> {
    let mut data = constant_band(grid, value);
    for &(col, row) in masked {
        data[grid.flat_index(col, row)] = f32::NAN;
    }
    data
}

/// NO2 column density (mol/m²) that converts to exactly `ug_per_m3` µg/m³
/// with the default 1000 m column height and 46.0055 g/mol.
pub fn no2_column_for(ug_per_m3: f64) -> f32 {
    (ug_per_m3 * 1000.0 / (46.0055 * 1e6)) as f32
}

/// Shorthand for building a date in tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::grid::SQUARE_REGION_GRID;

    #[test]
    fn test_indexed_band() {
        let band = indexed_band(&SQUARE_REGION_GRID);
        assert_eq!(band.len(), 18);
        assert_eq!(band[0], 0.0);
        assert_eq!(band[1], 10.0);
        assert_eq!(band[6], 1.0);
    }

    #[test]
    fn test_masked_band() {
        let band = masked_band(&SQUARE_REGION_GRID, 2.0, &[(1, 2)]);
        assert!(band[SQUARE_REGION_GRID.flat_index(1, 2)].is_nan());
        assert_eq!(band.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_no2_column_roundtrip() {
        let column = no2_column_for(10.0) as f64;
        let ug = column / 1000.0 * 46.0055 * 1e6;
        assert!((ug - 10.0).abs() < 1e-3);
    }
}
