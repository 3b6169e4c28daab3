//! PM2.5 document handlers.
//!
//! `GET` endpoints serve the precomputed documents; `POST` endpoints compute
//! on demand and bypass the cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use aq_common::DateWindow;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use pm25::{AveragesDocument, AveragesQuery, IndicatorDocument, MapDocument};
use region::{Coordinate, Regional};
use serde::{Deserialize, Serialize};
use storage::{DatasetKind, DatasetStatus};
use tracing::{debug, info};

use super::ApiError;
use crate::state::AppState;

const RECOMPUTE_SUCCESS: &str = "PM2.5 data recomputed successfully";

/// Body of `POST /pm25/indicator`.
#[derive(Debug, Default, Deserialize)]
pub struct IndicatorRequest {
    pub point_x: Option<f64>,
    pub point_y: Option<f64>,
}

/// Body of `POST /pm25/averages`.
#[derive(Debug, Default, Deserialize)]
pub struct AveragesRequest {
    pub point_x: Option<f64>,
    pub point_y: Option<f64>,
    pub week_number: Option<i32>,
    pub month_number: Option<i32>,
    pub year: Option<i32>,
}

/// Body of `POST /pm25/map-data`.
#[derive(Debug, Default, Deserialize)]
pub struct MapRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub recompute_running: bool,
    pub datasets: BTreeMap<&'static str, DatasetStatus>,
}

/// Serve a stored document verbatim, or schedule a recompute and answer
/// with the dataset's placeholder.
async fn cached_document(state: &Arc<AppState>, kind: DatasetKind) -> Result<Response, ApiError> {
    match state.store.read(kind).await? {
        Some(body) => {
            counter!("aq_cache_hits_total", "dataset" => kind.label()).increment(1);
            Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        None => {
            counter!("aq_cache_misses_total", "dataset" => kind.label()).increment(1);
            debug!(dataset = %kind, "Cache miss, scheduling recompute");
            state.precomputer.schedule();
            Ok(Json(kind.placeholder()).into_response())
        }
    }
}

/// Both coordinates, neither, or a 400.
fn optional_point(x: Option<f64>, y: Option<f64>) -> Result<Option<Coordinate>, ApiError> {
    match (x, y) {
        (Some(x), Some(y)) => Ok(Some(Coordinate::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(ApiError::bad_request("Please input both latitude and longitude.")),
    }
}

fn in_region<T>(state: &AppState, result: Regional<T>) -> Result<T, ApiError> {
    match result {
        Regional::InRegion(value) => Ok(value),
        Regional::OutOfBounds => Err(ApiError::out_of_bounds(state.region.out_of_bounds_message())),
    }
}

/// GET /pm25/indicator
pub async fn get_indicator_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    cached_document(&state, DatasetKind::Indicator).await
}

/// GET /pm25/averages
pub async fn get_averages_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    cached_document(&state, DatasetKind::Averages).await
}

/// GET /pm25/map-data
pub async fn get_map_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    cached_document(&state, DatasetKind::Map).await
}

/// POST /pm25/indicator - Indicator for one point
pub async fn post_indicator_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<IndicatorRequest>, JsonRejection>,
) -> Result<Json<IndicatorDocument>, ApiError> {
    let Json(request) = payload?;
    let point = match optional_point(request.point_x, request.point_y)? {
        Some(point) => point,
        None => return Err(ApiError::bad_request("Please input both latitude and longitude.")),
    };

    let result = state.engine.indicator(Some(point)).await?;
    Ok(Json(in_region(&state, result)?))
}

/// POST /pm25/averages - Averages for custom periods and an optional point
pub async fn post_averages_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<AveragesRequest>, JsonRejection>,
) -> Result<Json<AveragesDocument>, ApiError> {
    let Json(request) = payload?;
    let query = AveragesQuery {
        point: optional_point(request.point_x, request.point_y)?,
        week: request.week_number.unwrap_or(state.defaults.week),
        month: request.month_number.unwrap_or(state.defaults.month),
        year: request.year.unwrap_or(state.defaults.year),
    };
    query.validate()?;

    let result = state.engine.averages(&query).await?;
    Ok(Json(in_region(&state, result)?))
}

/// POST /pm25/map-data - Point map for a custom date window
pub async fn post_map_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<MapRequest>, JsonRejection>,
) -> Result<Json<MapDocument>, ApiError> {
    let Json(request) = payload?;
    let start = request
        .start_date
        .unwrap_or_else(|| state.defaults.map_start.clone());
    let end = request
        .end_date
        .unwrap_or_else(|| state.defaults.map_end.clone());
    let window = DateWindow::parse(&start, &end)?;

    let document = state.engine.map(&window).await?;
    Ok(Json(document))
}

/// POST /pm25/recompute - Recompute every document and wait
pub async fn recompute_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let report = state.precomputer.run_and_wait().await;
    if report.is_success() {
        info!(
            duration_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Recompute requested and completed"
        );
        Ok(Json(MessageResponse {
            message: RECOMPUTE_SUCCESS.to_string(),
        }))
    } else {
        Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            report.failures().join("; "),
        ))
    }
}

/// GET /pm25/status - Per-dataset recompute status
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        recompute_running: state.precomputer.is_running(),
        datasets: state.board.snapshot().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::AqError;

    #[test]
    fn test_optional_point() {
        assert_eq!(optional_point(None, None).unwrap(), None);
        assert_eq!(
            optional_point(Some(10.0), Some(53.5)).unwrap(),
            Some(Coordinate::new(10.0, 53.5))
        );
        let err = optional_point(Some(10.0), None).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Please input both latitude and longitude.");
    }

    #[test]
    fn test_averages_request_fields_optional() {
        let request: AveragesRequest = serde_json::from_str(r#"{"week_number": 7}"#).unwrap();
        assert_eq!(request.week_number, Some(7));
        assert!(request.point_x.is_none());
        assert!(request.year.is_none());
    }

    #[test]
    fn test_cache_error_is_server_error() {
        let err = ApiError::from(AqError::Cache("disk full".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
