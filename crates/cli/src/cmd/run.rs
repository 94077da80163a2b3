//! Implementation of the `stacktmpl run` command.
//!
//! Watches the metadata service and re-renders every template whenever the
//! topology changes, until a signal arrives.

use anyhow::{Context, Result};
use tracing::info;

use stacktmpl_lib::pipeline::{Coordinator, Interrupts};
use stacktmpl_lib::provider::Watcher;

use crate::settings::Settings;

/// Execute the run command.
///
/// Fails when the specs cannot be loaded, the provider cannot be reached, or
/// the pipeline aborts. A signal-driven shutdown is a success.
pub fn cmd_run(settings: &Settings) -> Result<()> {
  let units = settings.load_units()?;
  info!(units = units.len(), templates = %settings.templates, "loaded render specs");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(async {
    let interrupts = Interrupts::from_os_signals().context("Failed to install signal handlers")?;
    let watcher = Watcher::new(settings.client()?, settings.watch_options());
    let coordinator = Coordinator::new(watcher, units);
    coordinator.run(interrupts).await.context("Pipeline failed")
  })?;

  info!(outcome = %report.outcome, "stacktmpl stopped");
  Ok(())
}
