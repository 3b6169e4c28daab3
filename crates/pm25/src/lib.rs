//! PM2.5 estimation for a region.
//!
//! Estimates combine the Sentinel-5P tropospheric NO2 column (converted to
//! a surface concentration) with the Absorbing Aerosol Index:
//!
//! ```text
//! PM25 = 5 × NO2[µg/m³] + 30 × AAI
//! ```
//!
//! Three products are computed by [`Pm25Engine`]: the current indicator
//! (day, week and year means plus their ratio to the yearly mean), period
//! averages for a chosen week, month and year, and a PM2.5 point map over
//! a date window.

pub mod convert;
pub mod documents;
pub mod engine;
pub mod query;
pub mod settings;

pub use convert::{no2_to_ug_m3, pm25_estimate, AAI_BAND, NO2_BAND, NO2_UG_BAND, PM25_BAND};
pub use documents::{AveragesDocument, AveragesRow, IndicatorDocument, IndicatorRow, MapDocument};
pub use engine::{AirQualityEngine, Pm25Engine};
pub use query::AveragesQuery;
pub use settings::{
    CollectionSettings, CorrectedDate, ExportSettings, LagCorrection, No2Conversion,
    PipelineSettings, Product, QueryDefaults,
};
