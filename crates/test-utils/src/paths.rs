//! Scratch directories for tests that touch the filesystem.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::fixtures::square_region_geojson;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// A temporary directory laid out like a deployment:
/// `region.geojson`, `cache/` and `exports/`.
///
/// Everything is removed when the value is dropped.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create a workspace holding the square test region.
    pub fn new() -> std::io::Result<Self> {
        Self::with_region(&square_region_geojson())
    }

    /// Create a workspace with a custom region document.
    pub fn with_region(geojson: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("region.geojson"), geojson)?;
        std::fs::create_dir_all(dir.path().join("exports"))?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn region_path(&self) -> PathBuf {
        self.dir.path().join("region.geojson")
    }

    /// Cache directory; not created, so tests can exercise first start.
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.dir.path().join("exports")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_layout() {
        let ws = TestWorkspace::new().unwrap();
        assert!(ws.region_path().exists());
        assert!(ws.export_dir().is_dir());
        assert!(!ws.cache_dir().exists());
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
