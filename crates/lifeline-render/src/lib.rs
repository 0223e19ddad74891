#![forbid(unsafe_code)]

//! Text renderers for `lifeline` traces.
//!
//! The renderer consumes a finished [`Trace`] in order and never inspects the session that
//! produced it, so traces loaded from JSON render the same way as freshly built ones.

pub mod config;
pub mod plantuml;

pub use config::RenderConfig;
pub use plantuml::{PlantUmlOptions, render_plantuml};

use lifeline_core::Trace;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid trace at action {index}: {message}")]
    InvalidTrace { index: usize, message: String },
    #[error("trace JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parses a JSON trace and renders it with options read from `config`.
pub fn render_trace_json(text: &str, config: &RenderConfig) -> Result<String> {
    let trace = Trace::from_json(text)?;
    render_plantuml(&trace, &PlantUmlOptions::from_config(config))
}
