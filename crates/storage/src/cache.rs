//! File-backed document cache.
//!
//! A document is valid as long as its file exists; there is no expiry.
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so readers never observe a partial document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aq_common::{AqError, AqResult};
use bytes::Bytes;
use serde::Serialize;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::DatasetKind;

/// Handle to the cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of a dataset's document.
    pub fn path(&self, kind: DatasetKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Create the cache directory if needed.
    pub async fn ensure_dir(&self) -> AqResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AqError::Cache(format!("cannot create {}: {}", self.dir.display(), e))
        })
    }

    pub fn exists(&self, kind: DatasetKind) -> bool {
        self.path(kind).is_file()
    }

    /// Read a stored document byte-for-byte; `None` when absent.
    pub async fn read(&self, kind: DatasetKind) -> AqResult<Option<Bytes>> {
        let path = self.path(kind);
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AqError::Cache(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Replace a document.
    pub async fn write(&self, kind: DatasetKind, data: &[u8]) -> AqResult<()> {
        self.ensure_dir().await?;
        let path = self.path(kind);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", kind.file_name(), Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp, data).await {
            return Err(AqError::Cache(format!("cannot write {}: {}", tmp.display(), e)));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AqError::Cache(format!(
                "cannot move document into {}: {}",
                path.display(),
                e
            )));
        }

        debug!(dataset = %kind, path = %path.display(), bytes = data.len(), "Stored document");
        Ok(())
    }

    /// Serialize and store a document.
    pub async fn write_json<T: Serialize + ?Sized>(&self, kind: DatasetKind, document: &T) -> AqResult<()> {
        let data = serde_json::to_vec(document)?;
        self.write(kind, &data).await
    }
}
