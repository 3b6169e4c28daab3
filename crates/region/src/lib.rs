//! Region boundaries for air-quality queries.
//!
//! A region is loaded once from a GeoJSON file and is immutable afterwards.
//! Queries either cover the whole region or a single point that must lie
//! inside it; [`Regional`] carries the outcome of that check.

pub mod geometry;
pub mod loader;

pub use geometry::RegionGeometry;
pub use loader::Region;

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Result of a computation that only makes sense inside the region.
#[derive(Debug, Clone, PartialEq)]
pub enum Regional<T> {
    /// The query area lies within the region.
    InRegion(T),
    /// The requested point lies outside the region.
    OutOfBounds,
}

impl<T> Regional<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Regional<U> {
        match self {
            Regional::InRegion(value) => Regional::InRegion(f(value)),
            Regional::OutOfBounds => Regional::OutOfBounds,
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Regional::OutOfBounds)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Regional::InRegion(value) => Some(value),
            Regional::OutOfBounds => None,
        }
    }
}
