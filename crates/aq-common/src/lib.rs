//! Common types and utilities shared across all air-quality crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{AqError, AqResult};
pub use grid::{GeoGrid, GridCell};
pub use time::{CalendarTags, DateWindow};
