//! Scene sources: where image collections come from.

mod directory;
mod http;
mod memory;

pub use directory::DirectorySceneSource;
pub use http::HttpSceneSource;
pub use memory::MemorySceneSource;

use async_trait::async_trait;
use aq_common::{AqResult, BoundingBox, DateWindow};
use serde::{Deserialize, Serialize};

use crate::ImageCollection;

/// A request for one band of a named collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    /// Catalog identifier, e.g. `COPERNICUS/S5P/OFFL/L3_NO2`
    pub collection_id: String,
    pub band: String,
    pub bounds: BoundingBox,
    pub window: DateWindow,
}

impl CollectionQuery {
    pub fn new(
        collection_id: impl Into<String>,
        band: impl Into<String>,
        bounds: BoundingBox,
        window: DateWindow,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            band: band.into(),
            bounds,
            window,
        }
    }
}

/// Trait for catalogs that can serve dated scenes.
///
/// Implementations return only images acquired inside the query window that
/// intersect the query bounds, each holding just the requested band. A
/// window without scenes is an empty collection, not an error.
#[async_trait]
pub trait SceneSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the matching scenes.
    async fn fetch(&self, query: &CollectionQuery) -> AqResult<ImageCollection>;
}

/// Narrow a collection to what a query asked for.
pub(crate) fn restrict(collection: ImageCollection, query: &CollectionQuery) -> ImageCollection {
    collection
        .filter_date(&query.window)
        .filter_bounds(&query.bounds)
        .select(&[query.band.as_str()])
        .filter(|img| img.band_count() > 0)
}
