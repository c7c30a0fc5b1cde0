//! Text exposition rendering.

use crate::registry::{MetricKind, MetricName, MetricValue, Registry, Snapshot};
use bytes::Bytes;
use std::fmt::Write;
use thiserror::Error;

/// Content type of the rendered exposition body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Internal invariant violations detected while rendering.
///
/// These should be unreachable given the registry's validation; when one
/// fires, the scrape gets a 500-equivalent instead of partial output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpositionError {
    #[error("corrupt registry: {detail}")]
    CorruptRegistry { detail: String },
}

impl ExpositionError {
    fn corrupt(detail: impl Into<String>) -> Self {
        Self::CorruptRegistry {
            detail: detail.into(),
        }
    }
}

/// Render a snapshot into exposition text.
///
/// Samples are stably sorted by metric name, then by label-set string form,
/// so output is byte-identical across calls on the same snapshot. Each
/// family is one block: a `# TYPE` line followed by its sample lines,
/// `name{k1="v1",k2="v2"} value` with the label block omitted when the
/// label set is empty.
pub fn render(snapshot: &Snapshot) -> Result<String, ExpositionError> {
    let mut samples: Vec<&_> = snapshot.iter().collect();
    samples.sort_by_cached_key(|s| (s.name.clone(), s.labels.to_string()));

    let mut out = String::new();
    let mut current_family: Option<(&MetricName, MetricKind)> = None;

    for sample in samples {
        if !MetricName::is_valid(sample.name.as_str()) {
            return Err(ExpositionError::corrupt(format!(
                "sample name '{}' violates the name invariant",
                sample.name
            )));
        }

        let kind = sample.value.kind();
        match current_family {
            Some((name, family_kind)) if name == &sample.name => {
                if family_kind != kind {
                    return Err(ExpositionError::corrupt(format!(
                        "metric '{}' mixes {} and {} samples",
                        sample.name, family_kind, kind
                    )));
                }
            }
            _ => {
                // Writing to a String cannot fail.
                let _ = writeln!(out, "# TYPE {} {}", sample.name, kind);
                current_family = Some((&sample.name, kind));
            }
        }

        out.push_str(sample.name.as_str());
        if !sample.labels.is_empty() {
            out.push('{');
            for (i, (key, value)) in sample.labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push_str("=\"");
                escape_label_value(&mut out, value);
                out.push('"');
            }
            out.push('}');
        }
        out.push(' ');
        match sample.value {
            MetricValue::Counter(v) => {
                let _ = write!(out, "{v}");
            }
            MetricValue::Gauge(v) => write_f64(&mut out, v),
        }
        out.push('\n');
    }

    Ok(out)
}

/// Snapshot the registry and render it for one scrape.
///
/// Returns the response body and its content type.
pub fn render_metrics(registry: &Registry) -> Result<(Bytes, &'static str), ExpositionError> {
    let body = render(&registry.snapshot())?;
    Ok((Bytes::from(body), CONTENT_TYPE))
}

/// Escape a label value per the exposition format: backslash, double
/// quote, and newline.
fn escape_label_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
}

/// Write a gauge value with round-trip precision, spelling the
/// non-finite values the way the exposition format does.
fn write_f64(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value == f64::INFINITY {
        out.push_str("+Inf");
    } else if value == f64::NEG_INFINITY {
        out.push_str("-Inf");
    } else {
        let _ = write!(out, "{value}");
    }
}
