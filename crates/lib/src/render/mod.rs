//! Template rendering and change application.
//!
//! A [`RenderUnit`] binds one template to one destination file and an optional
//! action. On every snapshot it renders the template, and only when the digest
//! of the output differs from what it last wrote does it touch the destination
//! and run the action. A [`RenderUnitSet`] applies every unit, in spec order,
//! to each snapshot.
//!
//! # Failure handling
//!
//! Nothing in here is fatal. Render, write and action failures are logged and
//! reported through [`ApplyOutcome`], and the remaining units still run.

pub mod action;
pub mod funcs;
pub mod set;
pub mod spec;
pub mod unit;

use std::path::PathBuf;

pub use action::{ActionError, run_action};
pub use set::{ApplySummary, RenderUnitSet};
pub use spec::{RenderSpec, SpecError, load_all};
pub use unit::{ActionStatus, ApplyOutcome, RenderUnit};

/// Errors from rendering a template or writing its output.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
  #[error("failed to read template {path}: {source}")]
  ReadTemplate {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to render template {name}: {source}")]
  Template {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
