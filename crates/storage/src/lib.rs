//! Storage for precomputed air-quality documents.
//!
//! Provides:
//! - [`CacheStore`]: path-addressed JSON documents in one directory
//! - [`StatusBoard`]: per-dataset recompute status

pub mod cache;
pub mod dataset;
pub mod status;

pub use cache::CacheStore;
pub use dataset::DatasetKind;
pub use status::{DatasetStatus, FailureRecord, Phase, StatusBoard};
