//! Background recompute of the cached documents.
//!
//! At most one run is in flight: every trigger while a run is active joins
//! it. Runs are spawned on the runtime, so a caller that stops waiting does
//! not cancel them.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use aq_common::{AqError, AqResult};
use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use metrics::{counter, histogram};
use pm25::{AirQualityEngine, AveragesQuery, QueryDefaults};
use region::Regional;
use storage::{CacheStore, DatasetKind, StatusBoard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A shared handle on one recompute run.
pub type RecomputeRun = Shared<BoxFuture<'static, Arc<RunReport>>>;

/// Result of one dataset within a run.
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub kind: DatasetKind,
    pub error: Option<String>,
}

/// Result of a recompute run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<DatasetOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    /// `dataset: message` for each failed dataset.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {}", o.kind, e)))
            .collect()
    }
}

/// Recomputes the three documents with the default parameters and stores them.
pub struct Precomputer {
    engine: Arc<dyn AirQualityEngine>,
    store: CacheStore,
    board: Arc<StatusBoard>,
    defaults: QueryDefaults,
    in_flight: Mutex<Option<RecomputeRun>>,
    runs: AtomicU64,
}

impl Precomputer {
    pub fn new(
        engine: Arc<dyn AirQualityEngine>,
        store: CacheStore,
        board: Arc<StatusBoard>,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            engine,
            store,
            board,
            defaults,
            in_flight: Mutex::new(None),
            runs: AtomicU64::new(0),
        }
    }

    /// Number of runs started since creation.
    pub fn runs_started(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// The active run, if any.
    pub fn current_run(&self) -> Option<RecomputeRun> {
        let slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().filter(|run| run.peek().is_none()).cloned()
    }

    pub fn is_running(&self) -> bool {
        self.current_run().is_some()
    }

    /// Join the active run or start a new one.
    pub fn trigger(self: &Arc<Self>) -> RecomputeRun {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(run) = slot.as_ref().filter(|run| run.peek().is_none()) {
            return run.clone();
        }

        self.runs.fetch_add(1, Ordering::SeqCst);
        let this = Arc::clone(self);
        let run = async move {
            let started_at = Utc::now();
            let outcomes = match AssertUnwindSafe(this.run_all()).catch_unwind().await {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    error!("Recompute run panicked");
                    let mut outcomes = Vec::new();
                    for kind in DatasetKind::ALL {
                        this.board.mark_failed(kind, "recompute panicked").await;
                        outcomes.push(DatasetOutcome {
                            kind,
                            error: Some("recompute panicked".to_string()),
                        });
                    }
                    outcomes
                }
            };
            Arc::new(RunReport {
                started_at,
                finished_at: Utc::now(),
                outcomes,
            })
        }
        .boxed()
        .shared();

        *slot = Some(run.clone());
        tokio::spawn(run.clone());
        run
    }

    /// Start a run unless one is active, without waiting for it.
    pub fn schedule(self: &Arc<Self>) {
        let _ = self.trigger();
    }

    /// Trigger and wait for the run to finish.
    pub async fn run_and_wait(self: &Arc<Self>) -> Arc<RunReport> {
        self.trigger().await
    }

    /// Trigger a run every `interval`, starting one interval from now.
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = this.run_and_wait().await;
                if !report.is_success() {
                    warn!(failures = ?report.failures(), "Scheduled recompute finished with failures");
                }
            }
        })
    }

    async fn run_all(&self) -> Vec<DatasetOutcome> {
        counter!("aq_recompute_runs_total").increment(1);
        let start = Instant::now();
        info!("Starting PM2.5 recompute");

        let outcomes = join_all(DatasetKind::ALL.map(|kind| self.refresh(kind))).await;

        let elapsed = start.elapsed();
        histogram!("aq_recompute_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!(
            duration_ms = elapsed.as_millis() as u64,
            failed,
            "PM2.5 recompute finished"
        );
        outcomes
    }

    async fn refresh(&self, kind: DatasetKind) -> DatasetOutcome {
        self.board.mark_in_progress(kind).await;
        match self.compute(kind).await {
            Ok(()) => {
                self.board.mark_ready(kind).await;
                info!(dataset = %kind, "Dataset recomputed");
                DatasetOutcome { kind, error: None }
            }
            Err(e) => {
                counter!("aq_recompute_failures_total", "dataset" => kind.label()).increment(1);
                error!(dataset = %kind, error = %e, "Dataset recompute failed");
                let message = e.to_string();
                self.board.mark_failed(kind, message.clone()).await;
                DatasetOutcome {
                    kind,
                    error: Some(message),
                }
            }
        }
    }

    async fn compute(&self, kind: DatasetKind) -> AqResult<()> {
        match kind {
            DatasetKind::Indicator => {
                let document = region_wide(self.engine.indicator(None).await?)?;
                self.store.write_json(kind, &document).await
            }
            DatasetKind::Averages => {
                let query = AveragesQuery {
                    point: None,
                    week: self.defaults.week,
                    month: self.defaults.month,
                    year: self.defaults.year,
                };
                let document = region_wide(self.engine.averages(&query).await?)?;
                self.store.write_json(kind, &document).await
            }
            DatasetKind::Map => {
                let window = self.defaults.map_window()?;
                let document = self.engine.map(&window).await?;
                self.store.write_json(kind, &document).await
            }
        }
    }
}

fn region_wide<T>(result: Regional<T>) -> AqResult<T> {
    result
        .into_option()
        .ok_or_else(|| AqError::Internal("region-wide query reported out of bounds".to_string()))
}
