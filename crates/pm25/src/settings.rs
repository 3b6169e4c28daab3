//! Pipeline configuration.
//!
//! Every constant of the estimation is configurable; the defaults reproduce
//! the Hamburg deployment.

use aq_common::{AqResult, DateWindow};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sentinel-5P processing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    /// Near-real-time stream, used for the current indicator
    Realtime,
    /// Offline (reprocessed) stream, used for averages and maps
    Archive,
}

/// Top-level pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub collections: CollectionSettings,
    pub no2: No2Conversion,
    pub lag: LagCorrection,
    pub export: ExportSettings,
    pub defaults: QueryDefaults,
}

/// Catalog naming: `{prefix}/{product}/L3_{dataset}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub prefix: String,
    pub realtime_product: String,
    pub archive_product: String,
    pub no2_dataset: String,
    pub aai_dataset: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            prefix: "COPERNICUS/S5P".to_string(),
            realtime_product: "NRTI".to_string(),
            archive_product: "OFFL".to_string(),
            no2_dataset: "NO2".to_string(),
            aai_dataset: "AER_AI".to_string(),
        }
    }
}

impl CollectionSettings {
    fn collection(&self, product: Product, dataset: &str) -> String {
        let product = match product {
            Product::Realtime => &self.realtime_product,
            Product::Archive => &self.archive_product,
        };
        format!("{}/{}/L3_{}", self.prefix, product, dataset)
    }

    pub fn no2(&self, product: Product) -> String {
        self.collection(product, &self.no2_dataset)
    }

    pub fn aai(&self, product: Product) -> String {
        self.collection(product, &self.aai_dataset)
    }
}

/// Column density to surface concentration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct No2Conversion {
    /// Assumed mixing height (m)
    pub atmospheric_height_m: f64,
    /// Molecular weight of NO2 (g/mol)
    pub molecular_weight: f64,
}

impl Default for No2Conversion {
    fn default() -> Self {
        Self {
            atmospheric_height_m: 1000.0,
            molecular_weight: 46.0055,
        }
    }
}

/// Compensation for the publication delay of near-real-time scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagCorrection {
    /// Days subtracted from the day of month
    pub day_lag: u32,
    /// Days of month left unchanged
    pub day_exempt: Vec<u32>,
    /// Weeks subtracted from the ISO week
    pub week_lag: u32,
    /// ISO weekdays (Monday = 1) on which the week is corrected
    pub week_lag_weekdays: Vec<u32>,
}

impl Default for LagCorrection {
    fn default() -> Self {
        Self {
            day_lag: 2,
            day_exempt: vec![1, 2],
            week_lag: 1,
            week_lag_weekdays: vec![2],
        }
    }
}

/// The calendar buckets queried for "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectedDate {
    pub day: u32,
    pub month: u32,
    pub week: u32,
    /// ISO year
    pub year: i32,
}

impl LagCorrection {
    pub fn apply(&self, today: NaiveDate) -> CorrectedDate {
        let iso = today.iso_week();
        let weekday = today.weekday().number_from_monday();

        let mut day = today.day();
        if !self.day_exempt.contains(&day) {
            day = day.saturating_sub(self.day_lag);
        }

        let mut week = iso.week();
        if self.week_lag_weekdays.contains(&weekday) {
            week = week.saturating_sub(self.week_lag);
        }

        CorrectedDate {
            day,
            month: today.month(),
            week,
            year: iso.year(),
        }
    }
}

/// Map export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Export resolution (m)
    pub scale_m: f64,
    /// Metres per degree used to express the scale in degrees
    pub meters_per_degree: f64,
    pub raster_path: String,
    pub vector_path: String,
    pub nodata: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale_m: 1113.2,
            meters_per_degree: 111_320.0,
            raster_path: "exports/pm25_map.tif".to_string(),
            vector_path: "exports/pm25_map.geojson".to_string(),
            nodata: -9999.0,
        }
    }
}

impl ExportSettings {
    /// Grid resolution in degrees.
    pub fn resolution_deg(&self) -> f64 {
        self.scale_m / self.meters_per_degree
    }
}

/// Parameters used when a request (or the precompute) does not give any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub map_start: String,
    pub map_end: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            week: 1,
            month: 1,
            year: 2025,
            map_start: "2025-01-01".to_string(),
            map_end: "2025-12-31".to_string(),
        }
    }
}

impl QueryDefaults {
    pub fn map_window(&self) -> AqResult<DateWindow> {
        DateWindow::parse(&self.map_start, &self.map_end)
    }
}
