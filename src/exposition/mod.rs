//! Text exposition format (version 0.0.4).

mod writer;

pub use writer::{render, render_metrics, ExpositionError, CONTENT_TYPE};
