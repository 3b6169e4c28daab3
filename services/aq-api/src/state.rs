//! Application state for the air-quality API.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use pm25::{AirQualityEngine, Pm25Engine, QueryDefaults};
use region::Region;
use storage::{CacheStore, StatusBoard};
use tracing::info;

use crate::config::ServiceConfig;
use crate::precompute::Precomputer;

/// Shared application state.
pub struct AppState {
    /// On-demand computations.
    pub engine: Arc<dyn AirQualityEngine>,

    /// Precomputed documents.
    pub store: CacheStore,

    pub board: Arc<StatusBoard>,

    pub precomputer: Arc<Precomputer>,

    /// Served region and its raw boundary.
    pub region: Arc<Region>,

    /// Path segment of the boundary endpoint.
    pub region_slug: String,

    /// Parameters for requests that omit them.
    pub defaults: QueryDefaults,

    /// Prometheus recorder, when installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create the state from configuration: load the region and build the pipeline.
    pub async fn new(config: &ServiceConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let region = Region::load(&config.region.boundary_path)
            .with_context(|| {
                format!(
                    "Failed to load region boundary {}",
                    config.region.boundary_path.display()
                )
            })?
            .with_name(config.region.name.clone());
        let region = Arc::new(region);

        let source = config.imagery.build_source()?;
        info!(
            source = source.name(),
            region = region.name(),
            "Scene source configured"
        );

        let engine: Arc<dyn AirQualityEngine> = Arc::new(Pm25Engine::new(
            source,
            Arc::clone(&region),
            config.pipeline.clone(),
        ));

        let store = CacheStore::new(config.cache.dir.clone());
        store
            .ensure_dir()
            .await
            .with_context(|| format!("Failed to create cache dir {}", config.cache.dir.display()))?;

        Ok(Self::from_parts(
            engine,
            region,
            config.region.slug.trim_matches('/'),
            store,
            config.pipeline.defaults.clone(),
            prometheus,
        )
        .await)
    }

    /// Assemble the state around an existing engine; documents already on
    /// disk are marked ready.
    pub async fn from_parts(
        engine: Arc<dyn AirQualityEngine>,
        region: Arc<Region>,
        region_slug: &str,
        store: CacheStore,
        defaults: QueryDefaults,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let board = Arc::new(StatusBoard::new());
        board.seed_from(&store).await;

        let precomputer = Arc::new(Precomputer::new(
            Arc::clone(&engine),
            store.clone(),
            Arc::clone(&board),
            defaults.clone(),
        ));

        Self {
            engine,
            store,
            board,
            precomputer,
            region,
            region_slug: region_slug.to_string(),
            defaults,
            prometheus,
        }
    }
}
