//! Error types for the air-quality services.

use thiserror::Error;

/// Result type alias using AqError.
pub type AqResult<T> = Result<T, AqError>;

/// Primary error type for air-quality operations.
#[derive(Debug, Error)]
pub enum AqError {
    // === Validation Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Region Errors ===
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("Failed to load region: {0}")]
    RegionLoad(String),

    // === Data Errors ===
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Band not found: {0}")]
    BandNotFound(String),

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    // === External Service Errors ===
    #[error("Imagery service error: {0}")]
    Upstream(String),

    // === Raster / Storage Errors ===
    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Cache error: {0}")]
    Cache(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AqError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        AqError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, AqError::InvalidParameter { .. })
    }

    /// Get the HTTP status code for this error.
    ///
    /// Only validation failures are client errors; every computation failure
    /// is reported as a generic server error.
    pub fn http_status_code(&self) -> u16 {
        if self.is_validation() {
            400
        } else {
            500
        }
    }
}

impl From<std::io::Error> for AqError {
    fn from(err: std::io::Error) -> Self {
        AqError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AqError {
    fn from(err: serde_json::Error) -> Self {
        AqError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert_eq!(
            AqError::invalid("week_number", "must be between 1 and 53").http_status_code(),
            400
        );
    }

    #[test]
    fn test_computation_errors_are_server_errors() {
        assert_eq!(AqError::Upstream("timeout".into()).http_status_code(), 500);
        assert_eq!(AqError::DataNotAvailable("x".into()).http_status_code(), 500);
        assert_eq!(AqError::UnsupportedGeometry("MultiPoint".into()).http_status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = AqError::invalid("month_number", "Month number must be between 1 and 12.");
        let display = err.to_string();
        assert!(display.contains("month_number"));
        assert!(display.contains("between 1 and 12"));
    }
}
