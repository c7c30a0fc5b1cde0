//! The registry: a concurrency-safe store of named samples.

use super::{LabelSet, MetricKind, MetricName, MetricValue, Sample};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::SystemTime;
use thiserror::Error;

/// Errors returned to producers on invalid mutations.
///
/// These are caller programming errors: they are reported synchronously and
/// never change registry state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The metric name violates `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid metric name '{name}'")]
    InvalidName { name: String },

    /// A label key appears more than once in one label set.
    #[error("duplicate label key '{key}'")]
    DuplicateLabel { key: String },

    /// The metric name already exists with a different kind.
    #[error("metric '{name}' is a {existing}, not a {requested}")]
    KindMismatch {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },
}

/// A point-in-time, internally consistent copy of all samples.
pub type Snapshot = Vec<Sample>;

/// In-memory store of counters and gauges.
///
/// Safe for concurrent mutation from many producer tasks and concurrent
/// reads by exposition. A single `RwLock` protects the sample map: mutations
/// hold the write lock for O(1), [`Registry::snapshot`] holds the read lock
/// only for the O(n) copy. Each sample's value and timestamp are written
/// together under the lock, so a snapshot never sees a torn pair.
///
/// The registry owns all samples for the process lifetime; there is no
/// deletion or reset API.
pub struct Registry {
    inner: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    /// Kind per metric name, fixed on first use.
    kinds: HashMap<MetricName, MetricKind>,
    /// Current value and last-update time per (name, labels) series.
    samples: HashMap<(MetricName, LabelSet), (MetricValue, SystemTime)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Store::default()),
        }
    }

    /// Add `delta` to a counter, creating it at zero if absent.
    ///
    /// Counters are `u64`, so they are monotonically non-decreasing by
    /// construction. Fails if the name is invalid or already used by a gauge.
    pub fn inc_counter(
        &self,
        name: &str,
        labels: LabelSet,
        delta: u64,
    ) -> Result<(), RegistryError> {
        let name = parse_name(name)?;
        let mut store = self.inner.write();
        store.check_kind(&name, MetricKind::Counter)?;

        let entry = store
            .samples
            .entry((name, labels))
            .or_insert((MetricValue::Counter(0), SystemTime::now()));
        match &mut entry.0 {
            MetricValue::Counter(v) => *v = v.saturating_add(delta),
            // Unreachable: check_kind holds the name/kind invariant.
            MetricValue::Gauge(_) => unreachable!("kind checked above"),
        }
        entry.1 = SystemTime::now();
        Ok(())
    }

    /// Set a gauge to `value`, creating the sample if absent.
    ///
    /// Fails if the name is invalid or already used by a counter.
    pub fn set_gauge(
        &self,
        name: &str,
        labels: LabelSet,
        value: f64,
    ) -> Result<(), RegistryError> {
        let name = parse_name(name)?;
        let mut store = self.inner.write();
        store.check_kind(&name, MetricKind::Gauge)?;

        store
            .samples
            .insert((name, labels), (MetricValue::Gauge(value), SystemTime::now()));
        Ok(())
    }

    /// Take an immutable point-in-time copy of all samples.
    ///
    /// Producers are blocked only for the duration of the copy itself.
    pub fn snapshot(&self) -> Snapshot {
        let store = self.inner.read();
        store
            .samples
            .iter()
            .map(|((name, labels), (value, updated_at))| Sample {
                name: name.clone(),
                labels: labels.clone(),
                value: *value,
                updated_at: *updated_at,
            })
            .collect()
    }

    /// Number of distinct (name, labels) series currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().samples.len()
    }

    /// Whether the registry holds no samples.
    pub fn is_empty(&self) -> bool {
        self.inner.read().samples.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Pin the metric name to `requested` on first use, reject a mismatch after.
    fn check_kind(
        &mut self,
        name: &MetricName,
        requested: MetricKind,
    ) -> Result<(), RegistryError> {
        match self.kinds.get(name) {
            Some(existing) if *existing != requested => Err(RegistryError::KindMismatch {
                name: name.to_string(),
                existing: existing.as_str(),
                requested: requested.as_str(),
            }),
            Some(_) => Ok(()),
            None => {
                self.kinds.insert(name.clone(), requested);
                Ok(())
            }
        }
    }
}

fn parse_name(name: &str) -> Result<MetricName, RegistryError> {
    MetricName::parse(name).ok_or_else(|| RegistryError::InvalidName {
        name: name.to_string(),
    })
}
