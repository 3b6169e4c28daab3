//! PM2.5 air-quality API service library.
//!
//! HTTP endpoints over a precomputed document cache, with on-demand point
//! queries and a single-flight background recompute.

pub mod config;
pub mod handlers;
pub mod precompute;
pub mod router;
pub mod state;
