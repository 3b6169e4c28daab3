//! Route table and middleware.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the application router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let boundary_path = format!("/{}/map-data", state.region_slug);

    Router::new()
        // Cached documents, on-demand queries
        .route(
            "/pm25/indicator",
            get(handlers::pm25::get_indicator_handler).post(handlers::pm25::post_indicator_handler),
        )
        .route(
            "/pm25/averages",
            get(handlers::pm25::get_averages_handler).post(handlers::pm25::post_averages_handler),
        )
        .route(
            "/pm25/map-data",
            get(handlers::pm25::get_map_handler).post(handlers::pm25::post_map_handler),
        )
        .route("/pm25/recompute", post(handlers::pm25::recompute_handler))
        .route("/pm25/status", get(handlers::pm25::status_handler))
        // Region boundary
        .route(&boundary_path, get(handlers::region::boundary_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
