//! Implementation of the `stacktmpl check` command.
//!
//! Loads the render specs and lists them without contacting the provider.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, symbols};
use crate::settings::Settings;

#[derive(Serialize)]
struct SpecReport<'a> {
  name: &'a str,
  source: &'a Path,
  destination: &'a Path,
  action: Option<&'a str>,
  digest: Option<&'a str>,
}

/// Execute the check command.
///
/// Digests are seeded from the current destination contents, so a unit with a
/// digest will skip its write until the rendered output differs.
pub fn cmd_check(settings: &Settings, format: OutputFormat) -> Result<()> {
  let units = settings.load_units()?;

  if format.is_json() {
    let reports: Vec<_> = units
      .units()
      .iter()
      .map(|unit| SpecReport {
        name: unit.name(),
        source: unit.source(),
        destination: unit.destination(),
        action: unit.action(),
        digest: unit.digest().map(|d| d.0.as_str()),
      })
      .collect();
    return print_json(&reports);
  }

  print_success(&format!("{} render spec(s) loaded from {}", units.len(), settings.templates));
  for unit in units.units() {
    println!();
    print_info(&format!(
      "{} {} {}",
      unit.name(),
      symbols::ARROW,
      unit.destination().display()
    ));
    print_stat("Source", &unit.source().display().to_string());
    print_stat("Action", unit.action().unwrap_or("none"));
    let digest = match unit.digest() {
      Some(digest) => digest.short(12).to_string(),
      None => "none".if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
    };
    print_stat("Digest", &digest);
  }

  Ok(())
}
