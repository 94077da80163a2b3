//! Implementation of the `stacktmpl once` command.
//!
//! Fetches a single snapshot, applies every render unit to it and reports what
//! happened per unit.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use stacktmpl_lib::provider::Watcher;
use stacktmpl_lib::render::{ActionStatus, ApplyOutcome, ApplySummary};

use crate::output::{
  OutputFormat, format_duration, print_failure, print_info, print_json, print_stat, print_success, print_warning,
  symbols,
};
use crate::settings::Settings;

#[derive(Serialize)]
struct UnitReport<'a> {
  name: &'a str,
  destination: &'a Path,
  outcome: ApplyOutcome,
}

#[derive(Serialize)]
struct OnceReport<'a> {
  stacks: usize,
  units: Vec<UnitReport<'a>>,
  summary: ApplySummary,
}

/// Execute the once command.
///
/// Exits with an error when any unit failed to render or write. Failed actions
/// are reported but do not fail the command.
pub fn cmd_once(settings: &Settings, format: OutputFormat) -> Result<()> {
  let mut units = settings.load_units()?;
  let started = Instant::now();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let (stacks, outcomes) = rt.block_on(async {
    let watcher = Watcher::new(settings.client()?, settings.watch_options());
    watcher.connect().await.context("Failed to connect to metadata provider")?;
    let snapshot = watcher.fetch().await.context("Failed to fetch topology")?;
    let outcomes = units.apply_all(&snapshot).await;
    anyhow::Ok((snapshot.len(), outcomes))
  })?;

  let summary = ApplySummary::from_outcomes(&outcomes);

  if format.is_json() {
    let report = OnceReport {
      stacks,
      units: units
        .units()
        .iter()
        .zip(&outcomes)
        .map(|(unit, outcome)| UnitReport {
          name: unit.name(),
          destination: unit.destination(),
          outcome: *outcome,
        })
        .collect(),
      summary,
    };
    print_json(&report)?;
  } else {
    for (unit, outcome) in units.units().iter().zip(&outcomes) {
      let line = format!("{} {} {}", unit.name(), symbols::ARROW, unit.destination().display());
      match outcome {
        ApplyOutcome::Unchanged => print_info(&format!("{line} (unchanged)")),
        ApplyOutcome::Written { action: None } => print_success(&format!("{line} (written)")),
        ApplyOutcome::Written {
          action: Some(ActionStatus::Succeeded),
        } => print_success(&format!("{line} (written, action ran)")),
        ApplyOutcome::Written {
          action: Some(ActionStatus::Failed),
        } => print_warning(&format!("{line} (written, action failed)")),
        ApplyOutcome::RenderFailed => print_failure(&format!("{line} (render failed)")),
        ApplyOutcome::WriteFailed => print_failure(&format!("{line} (write failed)")),
      }
    }

    println!();
    print_stat("Stacks", &stacks.to_string());
    print_stat("Written", &summary.written.to_string());
    print_stat("Unchanged", &summary.unchanged.to_string());
    print_stat("Failed", &summary.failed.to_string());
    print_stat("Actions failed", &summary.actions_failed.to_string());
    print_stat("Took", &format_duration(started.elapsed()));
  }

  if summary.failed > 0 {
    bail!("{} of {} render unit(s) failed", summary.failed, outcomes.len());
  }

  Ok(())
}
