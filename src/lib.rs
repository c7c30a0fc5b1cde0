//! metrod - a standalone metrics-exposition endpoint
//!
//! This crate provides:
//! - A concurrency-safe registry of counters and gauges
//! - A deterministic text exposition writer (format version 0.0.4)
//! - An HTTP scrape server for monitoring collectors
//! - YAML configuration with validation

pub mod config;
pub mod exposition;
pub mod registry;
pub mod server;
pub mod util;

pub use config::Config;
pub use registry::{LabelSet, Registry};
