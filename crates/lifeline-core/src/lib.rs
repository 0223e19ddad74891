#![forbid(unsafe_code)]

//! Sequence-diagram action recorder (headless).
//!
//! A diagram is described by nesting scopes: object calls, returns and fragments such as `opt`,
//! `loop` or `alt`. The [`Engine`] turns those nested scope entries and exits into a flat,
//! ordered [`Trace`] of [`Action`]s, inferring implicit returns and balancing fragment
//! boundaries. [`Diagram`] is the guard-based builder most callers use.
//!
//! Rendering a trace into diagram text lives in `lifeline-render`.

pub mod action;
pub mod actor;
pub mod diagram;
pub mod engine;
pub mod error;
pub mod params;
pub mod trace;

pub use action::Action;
pub use actor::{Actor, SessionId};
pub use diagram::{BranchGuard, CallGuard, Diagram, FocusGuard, FragmentGuard, Object};
pub use engine::{Engine, ScopeHandle, ScopeKind};
pub use error::{Error, Result};
pub use params::Params;
pub use trace::{Marker, Trace};

#[cfg(test)]
mod tests;
