//! Metric name validation.

use std::fmt;

/// A validated metric name.
///
/// Names match `[A-Za-z_][A-Za-z0-9_]*` and are unique within a registry.
/// Construction is the only place validation happens; everything downstream
/// can rely on the invariant holding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricName(String);

impl MetricName {
    /// Parse and validate a metric name.
    pub fn parse(name: &str) -> Option<Self> {
        if Self::is_valid(name) {
            Some(Self(name.to_string()))
        } else {
            None
        }
    }

    /// Check whether a string is a valid metric name.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["http_requests_total", "up", "_internal", "Node1_load"] {
            assert!(MetricName::is_valid(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["1bad", "", "has-dash", "has.dot", "spa ce", "naïve"] {
            assert!(!MetricName::is_valid(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let name = MetricName::parse("scrapes_total").unwrap();
        assert_eq!(name.as_str(), "scrapes_total");
        assert_eq!(name.to_string(), "scrapes_total");
    }

    #[test]
    fn test_parse_rejects_leading_digit() {
        assert!(MetricName::parse("1bad").is_none());
    }
}
