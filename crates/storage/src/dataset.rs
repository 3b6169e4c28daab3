//! The datasets kept in the cache.

use serde::{Deserialize, Serialize};

/// One precomputed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Indicator,
    Averages,
    Map,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Indicator, DatasetKind::Averages, DatasetKind::Map];

    /// File name inside the cache directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetKind::Indicator => "pm25_indicator.json",
            DatasetKind::Averages => "aggregated_pm25.json",
            DatasetKind::Map => "pm25_map.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Indicator => "indicator",
            DatasetKind::Averages => "averages",
            DatasetKind::Map => "map",
        }
    }

    /// Message served while the document is being computed.
    pub fn placeholder_message(&self) -> &'static str {
        match self {
            DatasetKind::Indicator => "Precomputing PM2.5 indicator, try again later.",
            DatasetKind::Averages => "Precomputing PM2.5 averages, try again later.",
            DatasetKind::Map => "Precomputing PM2.5 Map, try again later.",
        }
    }

    /// `{"message": ...}` placeholder body.
    pub fn placeholder(&self) -> serde_json::Value {
        serde_json::json!({ "message": self.placeholder_message() })
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<_> = DatasetKind::ALL.iter().map(|k| k.file_name()).collect();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_placeholder_body() {
        assert_eq!(
            DatasetKind::Averages.placeholder(),
            serde_json::json!({"message": "Precomputing PM2.5 averages, try again later."})
        );
    }
}
