//! Satellite imagery model for the air-quality pipeline.
//!
//! An [`Image`] is a dated raster with named `f32` bands on a [`GeoGrid`];
//! `NaN` marks masked pixels. An [`ImageCollection`] is filtered by bounds,
//! date and calendar tags, then reduced per pixel with [`ImageCollection::mean`].
//! Collections come from a [`SceneSource`].
//!
//! [`GeoGrid`]: aq_common::GeoGrid

pub mod collection;
pub mod image;
pub mod sources;

pub use collection::{CalendarProperty, ImageCollection};
pub use image::{Band, Image};
pub use sources::{
    CollectionQuery, DirectorySceneSource, HttpSceneSource, MemorySceneSource, SceneSource,
};
