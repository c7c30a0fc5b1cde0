//! Concurrency-safe in-memory metric registry.

mod name;
mod sample;
mod store;

pub use name::MetricName;
pub use sample::{LabelSet, MetricKind, MetricValue, Sample};
pub use store::{Registry, RegistryError, Snapshot};
