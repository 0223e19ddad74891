#![forbid(unsafe_code)]

//! `lifeline` describes sequence diagrams with nested Rust scopes.
//!
//! Scopes opened on a [`Diagram`] (calls, returns, `opt`/`loop`/`alt` fragments, object creation
//! and destruction) are recorded as a flat [`Trace`], which the `render` feature turns into
//! PlantUML text.
//!
//! # Features
//!
//! - `render`: PlantUML output (`lifeline::render`)

pub use lifeline_core::*;

pub mod demo;

#[cfg(feature = "render")]
pub mod render {
    pub use lifeline_render::{
        PlantUmlOptions, RenderConfig, render_plantuml, render_trace_json,
    };

    use lifeline_core::Diagram;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Build(#[from] lifeline_core::Error),
        #[error(transparent)]
        Render(#[from] lifeline_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Runs `define` in a fresh diagram session and renders the finished trace.
    ///
    /// Every call builds its own session, so independent diagrams never share state.
    pub fn generate_plantuml<F>(define: F, options: &PlantUmlOptions) -> Result<String>
    where
        F: FnOnce(&Diagram) -> lifeline_core::Result<()>,
    {
        let trace = Diagram::build(define)?;
        Ok(render_plantuml(&trace, options)?)
    }

    /// [`generate_plantuml`] with options taken from a [`RenderConfig`].
    pub fn generate_plantuml_with_config<F>(define: F, config: &RenderConfig) -> Result<String>
    where
        F: FnOnce(&Diagram) -> lifeline_core::Result<()>,
    {
        generate_plantuml(define, &PlantUmlOptions::from_config(config))
    }
}
