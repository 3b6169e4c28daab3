//! Result documents, serialized exactly as clients and the cache see them.

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// One row of the current indicator (day, week or year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    /// Day of month, ISO week or ISO year
    #[serde(rename = "Current_day_week_year")]
    pub period: i32,
    #[serde(rename = "Average_PM2.5")]
    pub average_pm25: f64,
    /// Percentage of the yearly mean (0 for the year row)
    #[serde(rename = "Air_quality_indicator_yearly_comparison")]
    pub yearly_comparison: f64,
}

/// Day, week and year rows, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorDocument(pub Vec<IndicatorRow>);

/// One row of the period averages (week, month or year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragesRow {
    #[serde(rename = "Average_week_month_year")]
    pub period: i32,
    /// `None` when no scene covered the area in that period
    #[serde(rename = "Average_PM2")]
    pub average_pm2: Option<f64>,
}

/// Week, month and year rows, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AveragesDocument(pub Vec<AveragesRow>);

/// PM2.5 point map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapDocument(pub FeatureCollection);

impl MapDocument {
    pub fn point_count(&self) -> usize {
        self.0.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indicator_wire_names() {
        let doc = IndicatorDocument(vec![IndicatorRow {
            period: 11,
            average_pm25: 20.0,
            yearly_comparison: 50.0,
        }]);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!([{
                "Current_day_week_year": 11,
                "Average_PM2.5": 20.0,
                "Air_quality_indicator_yearly_comparison": 50.0
            }])
        );
    }

    #[test]
    fn test_averages_null_value() {
        let doc = AveragesDocument(vec![AveragesRow { period: 2025, average_pm2: None }]);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!([{ "Average_week_month_year": 2025, "Average_PM2": null }])
        );
    }
}
