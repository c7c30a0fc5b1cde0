//! Samples and label sets.

use super::MetricName;
use crate::registry::RegistryError;
use std::fmt;
use std::time::SystemTime;

/// An ordered set of label key/value pairs attached to a sample.
///
/// Pairs are normalized by sorting on key at construction, so
/// `{a="1", b="2"}` and `{b="2", a="1"}` address the same sample. Keys are
/// unique within one set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    /// The empty label set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a label set from key/value pairs.
    ///
    /// Pairs are sorted by key; a duplicate key is rejected rather than
    /// silently overwritten.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, RegistryError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(RegistryError::DuplicateLabel {
                    key: window[0].0.clone(),
                });
            }
        }

        Ok(Self { pairs })
    }

    /// Whether the set has no labels.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for LabelSet {
    /// Canonical string form: `k1="v1",k2="v2"` in key order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}=\"{value}\"")?;
        }
        Ok(())
    }
}

/// The current value of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Monotonically non-decreasing count.
    Counter(u64),
    /// Arbitrary value, may move in either direction.
    Gauge(f64),
}

impl MetricValue {
    /// The kind of metric this value belongs to.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter(_) => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
        }
    }
}

/// Metric kind, fixed per metric name for the life of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    /// Kind name as it appears in `# TYPE` lines and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (name, labels) series with its current value.
///
/// Value and timestamp are always written together under the registry lock,
/// so a snapshot never observes a torn pair.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Metric name.
    pub name: MetricName,
    /// Label set, normalized to key order.
    pub labels: LabelSet,
    /// Current value.
    pub value: MetricValue,
    /// Wall-clock time of the last mutation.
    pub updated_at: SystemTime,
}
