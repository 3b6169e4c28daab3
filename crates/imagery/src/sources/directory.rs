use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aq_common::{time::DATE_FORMAT, AqError, AqResult};
use raster_io::read_geotiff;
use tracing::{debug, instrument, warn};

use super::{restrict, CollectionQuery, SceneSource};
use crate::{Image, ImageCollection};

/// Local archive of single-band GeoTIFF scenes laid out as
/// `{root}/{collection_id}/{YYYY-MM-DD}.tif`.
///
/// Each file holds the band named in the query; no-data pixels become
/// masked pixels.
pub struct DirectorySceneSource {
    root: PathBuf,
}

impl DirectorySceneSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the scene of `collection_id` acquired on `date`.
    pub fn scene_path(&self, collection_id: &str, date: chrono::NaiveDate) -> PathBuf {
        self.root
            .join(collection_id)
            .join(format!("{}.tif", date.format(DATE_FORMAT)))
    }
}

fn load_scenes(source_root: PathBuf, query: CollectionQuery) -> AqResult<Vec<Image>> {
    let dir = source_root.join(&query.collection_id);
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Scene directory does not exist");
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for date in query.window.dates() {
        let path = dir.join(format!("{}.tif", date.format(DATE_FORMAT)));
        if !path.exists() {
            continue;
        }
        let raster = read_geotiff(&path)?;
        let data = raster
            .values
            .iter()
            .map(|v| if raster.is_valid(*v) { *v } else { f32::NAN })
            .collect();
        let image = Image::new(
            format!("{}/{}", query.collection_id, date.format(DATE_FORMAT)),
            Some(date),
            raster.grid,
        )
        .with_band(query.band.clone(), data)?;
        images.push(image);
    }
    debug!(collection = %query.collection_id, scenes = images.len(), "Loaded scenes");
    Ok(images)
}

#[async_trait]
impl SceneSource for DirectorySceneSource {
    fn name(&self) -> &str {
        "directory"
    }

    #[instrument(skip(self, query), fields(collection = %query.collection_id))]
    async fn fetch(&self, query: &CollectionQuery) -> AqResult<ImageCollection> {
        let root = self.root.clone();
        let owned = query.clone();
        let images = tokio::task::spawn_blocking(move || load_scenes(root, owned))
            .await
            .map_err(|e| AqError::Internal(format!("scene loader panicked: {}", e)))??;
        Ok(restrict(ImageCollection::from(images), query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::DateWindow;
    use chrono::NaiveDate;

    #[test]
    fn test_scene_path_layout() {
        let source = DirectorySceneSource::new("/data/scenes");
        let path = source.scene_path(
            "COPERNICUS/S5P/OFFL/L3_NO2",
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        );
        assert_eq!(
            path,
            PathBuf::from("/data/scenes/COPERNICUS/S5P/OFFL/L3_NO2/2025-03-07.tif")
        );
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySceneSource::new(dir.path());
        let query = CollectionQuery::new(
            "NOPE",
            "b",
            aq_common::BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            DateWindow::year(2025).unwrap(),
        );
        assert!(source.fetch(&query).await.unwrap().is_empty());
    }
}
