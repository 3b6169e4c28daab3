//! Air-quality API server
//!
//! PM2.5 indicators, period averages and maps for one region.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use aq_api::config::ServiceConfig;
use aq_api::router::build_router;
use aq_api::state::AppState;

/// Air-quality API server
#[derive(Parser, Debug)]
#[command(name = "aq-api")]
#[command(about = "PM2.5 air-quality API backed by precomputed documents")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "AQ_LISTEN_ADDR")]
    listen: String,

    /// Configuration file
    #[arg(short, long, default_value = "config/aq-api.yaml", env = "AQ_CONFIG")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "AQ_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting air-quality API server");

    let prometheus = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    let config = ServiceConfig::load(&args.config)?;
    let state = Arc::new(AppState::new(&config, prometheus).await?);
    info!(
        region = state.region.name(),
        cache_dir = %state.store.dir().display(),
        "Application state initialized"
    );

    if config.precompute.on_startup {
        // Runs in the background; reads serve placeholders until it lands
        state.precomputer.schedule();
    }
    if let Some(interval) = config.precompute.refresh_interval() {
        info!(interval_secs = interval.as_secs(), "Periodic recompute enabled");
        state.precomputer.spawn_refresh(interval);
    }

    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Air-quality API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
