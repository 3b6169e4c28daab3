//! Static region boundary.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// GET /{region}/map-data - The boundary file as loaded
pub async fn boundary_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/geo+json")],
        state.region.raw_geojson().to_string(),
    )
        .into_response()
}
