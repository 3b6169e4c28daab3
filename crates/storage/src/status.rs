//! Per-dataset recompute status.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{CacheStore, DatasetKind};

/// Lifecycle of a cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Never computed and nothing on disk
    Absent,
    InProgress,
    Ready,
    /// The last attempt failed; an older document may still be served
    Failed,
}

/// A recorded recompute failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Status of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatus {
    pub phase: Phase,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure: Option<FailureRecord>,
}

impl Default for DatasetStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Absent,
            last_success_at: None,
            last_failure: None,
        }
    }
}

/// Status of every dataset, shared between the recompute task and readers.
#[derive(Debug, Default)]
pub struct StatusBoard {
    entries: RwLock<HashMap<DatasetKind, DatasetStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark documents already present in `store` as ready.
    pub async fn seed_from(&self, store: &CacheStore) {
        let mut entries = self.entries.write().await;
        for kind in DatasetKind::ALL {
            if store.exists(kind) {
                entries.entry(kind).or_default().phase = Phase::Ready;
            }
        }
    }

    pub async fn get(&self, kind: DatasetKind) -> DatasetStatus {
        self.entries
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn mark_in_progress(&self, kind: DatasetKind) {
        self.entries.write().await.entry(kind).or_default().phase = Phase::InProgress;
    }

    pub async fn mark_ready(&self, kind: DatasetKind) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(kind).or_default();
        entry.phase = Phase::Ready;
        entry.last_success_at = Some(Utc::now());
    }

    pub async fn mark_failed(&self, kind: DatasetKind, message: impl Into<String>) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(kind).or_default();
        entry.phase = Phase::Failed;
        entry.last_failure = Some(FailureRecord {
            at: Utc::now(),
            message: message.into(),
        });
    }

    /// Status of all datasets keyed by label.
    pub async fn snapshot(&self) -> BTreeMap<&'static str, DatasetStatus> {
        let entries = self.entries.read().await;
        DatasetKind::ALL
            .iter()
            .map(|kind| (kind.label(), entries.get(kind).cloned().unwrap_or_default()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle() {
        let board = StatusBoard::new();
        assert_eq!(board.get(DatasetKind::Map).await.phase, Phase::Absent);

        board.mark_in_progress(DatasetKind::Map).await;
        assert_eq!(board.get(DatasetKind::Map).await.phase, Phase::InProgress);

        board.mark_failed(DatasetKind::Map, "no scenes").await;
        let status = board.get(DatasetKind::Map).await;
        assert_eq!(status.phase, Phase::Failed);
        assert_eq!(status.last_failure.unwrap().message, "no scenes");

        board.mark_ready(DatasetKind::Map).await;
        let status = board.get(DatasetKind::Map).await;
        assert_eq!(status.phase, Phase::Ready);
        assert!(status.last_success_at.is_some());
        // Failure history survives a later success
        assert!(status.last_failure.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_lists_every_dataset() {
        let board = StatusBoard::new();
        board.mark_ready(DatasetKind::Averages).await;
        let snapshot = board.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot["averages"].phase, Phase::Ready);
        assert_eq!(snapshot["indicator"].phase, Phase::Absent);
    }
}
