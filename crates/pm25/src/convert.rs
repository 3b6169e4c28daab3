//! Unit conversion and the PM2.5 formula.

use aq_common::{AqError, AqResult};
use imagery::Image;

use crate::settings::No2Conversion;

/// NO2 column density band (mol/m²).
pub const NO2_BAND: &str = "NO2_column_number_density";
/// NO2 surface concentration band (µg/m³).
pub const NO2_UG_BAND: &str = "NO2_in_µg_per_m3";
/// Absorbing Aerosol Index band (unitless).
pub const AAI_BAND: &str = "absorbing_aerosol_index";
/// Estimated PM2.5 band (µg/m³).
pub const PM25_BAND: &str = "PM25";

const NO2_WEIGHT: f64 = 5.0;
const AAI_WEIGHT: f64 = 30.0;

/// Convert a column density (mol/m²) to µg/m³.
pub fn no2_to_ug_m3(mol_m2: f64, conversion: &No2Conversion) -> f64 {
    mol_m2 / conversion.atmospheric_height_m * conversion.molecular_weight * 1e6
}

/// `5 × NO2 + 30 × AAI`.
pub fn pm25_estimate(no2_ug_m3: f64, aai: f64) -> f64 {
    NO2_WEIGHT * no2_ug_m3 + AAI_WEIGHT * aai
}

/// Replace the NO2 column band by its surface concentration.
pub fn convert_no2_image(image: Image, conversion: &No2Conversion) -> AqResult<Image> {
    let converted = image
        .band_data(NO2_BAND)?
        .iter()
        .map(|v| no2_to_ug_m3(*v as f64, conversion) as f32)
        .collect();
    image.with_band(NO2_UG_BAND, converted).map(|img| img.select(&[NO2_UG_BAND]))
}

/// Add the PM25 band to an image holding both source bands.
pub fn add_pm25_band(image: Image) -> AqResult<Image> {
    let no2 = image.band_data(NO2_UG_BAND)?;
    let aai = image.band_data(AAI_BAND)?;
    if no2.len() != aai.len() {
        return Err(AqError::GridMismatch(format!(
            "band lengths differ in image {}",
            image.id
        )));
    }
    let pm25 = no2
        .iter()
        .zip(aai)
        .map(|(n, a)| pm25_estimate(*n as f64, *a as f64) as f32)
        .collect();
    image.with_band(PM25_BAND, pm25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::GeoGrid;

    #[test]
    fn test_no2_conversion() {
        let ug = no2_to_ug_m3(1e-4, &No2Conversion::default());
        assert!((ug - 4.60055).abs() < 1e-9);
    }

    #[test]
    fn test_formula() {
        assert_eq!(pm25_estimate(10.0, 1.0), 80.0);
        assert_eq!(pm25_estimate(0.0, -0.5), -15.0);
    }

    #[test]
    fn test_pm25_band_propagates_masks() {
        let grid = GeoGrid::new(0.0, 1.0, 1.0, 1.0, 2, 1);
        let image = Image::new("x", None, grid)
            .with_band(AAI_BAND, vec![1.0, f32::NAN])
            .unwrap()
            .with_band(NO2_UG_BAND, vec![2.0, 2.0])
            .unwrap();
        let image = add_pm25_band(image).unwrap();
        let pm25 = image.band_data(PM25_BAND).unwrap();
        assert_eq!(pm25[0], 40.0);
        assert!(pm25[1].is_nan());
    }

    #[test]
    fn test_convert_selects_concentration_band() {
        let grid = GeoGrid::new(0.0, 1.0, 1.0, 1.0, 1, 1);
        let image = Image::new("x", None, grid).with_band(NO2_BAND, vec![1e-4]).unwrap();
        let converted = convert_no2_image(image, &No2Conversion::default()).unwrap();
        assert_eq!(converted.band_names(), vec![NO2_UG_BAND]);
    }
}
