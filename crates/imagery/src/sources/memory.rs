use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use aq_common::{AqError, AqResult};

use super::{restrict, CollectionQuery, SceneSource};
use crate::{Image, ImageCollection};

/// In-process scene catalog.
#[derive(Default)]
pub struct MemorySceneSource {
    collections: RwLock<HashMap<String, Vec<Image>>>,
    fetches: AtomicUsize,
}

impl MemorySceneSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemorySceneSource::insert`].
    pub fn with_images(self, collection_id: &str, images: Vec<Image>) -> Self {
        self.insert(collection_id, images);
        self
    }

    /// Append images to a collection.
    pub fn insert(&self, collection_id: &str, images: Vec<Image>) {
        if let Ok(mut collections) = self.collections.write() {
            collections
                .entry(collection_id.to_string())
                .or_default()
                .extend(images);
        }
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SceneSource for MemorySceneSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, query: &CollectionQuery) -> AqResult<ImageCollection> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let images = self
            .collections
            .read()
            .map_err(|_| AqError::Internal("scene catalog lock poisoned".into()))?
            .get(&query.collection_id)
            .cloned()
            .unwrap_or_default();
        Ok(restrict(ImageCollection::from(images), query))
    }
}
