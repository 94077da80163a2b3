//! Global options shared by every subcommand.
//!
//! Each option can also come from a `STACKTMPL_*` environment variable; a flag
//! on the command line wins over the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use stacktmpl_lib::consts::{
  CONNECT_INITIAL_DELAY_SECS, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_METADATA_PREFIX, DEFAULT_METADATA_URL,
  DEFAULT_REFRESH_SECS, DEFAULT_TEMPLATES_GLOB,
};
use stacktmpl_lib::provider::{MetadataClient, WatchOptions};
use stacktmpl_lib::render::{RenderUnitSet, load_all};

#[derive(Debug, Clone, Args)]
pub struct Settings {
  /// Metadata service base URL
  #[arg(long, global = true, env = "STACKTMPL_URL", default_value = DEFAULT_METADATA_URL)]
  pub url: String,

  /// Metadata API version prefix
  #[arg(long, global = true, env = "STACKTMPL_PREFIX", default_value = DEFAULT_METADATA_PREFIX)]
  pub prefix: String,

  /// Glob matching the render spec files
  #[arg(long, global = true, env = "STACKTMPL_TEMPLATES", default_value = DEFAULT_TEMPLATES_GLOB)]
  pub templates: String,

  /// Long-poll window in seconds, also the retry delay after a failed poll
  #[arg(
    long,
    global = true,
    env = "STACKTMPL_REFRESH",
    default_value_t = DEFAULT_REFRESH_SECS,
    value_parser = clap::value_parser!(u64).range(1..)
  )]
  pub refresh: u64,

  /// Only watch the stack this process runs in
  #[arg(long = "self", global = true, env = "STACKTMPL_SELF")]
  pub self_only: bool,

  /// Also write logs to this file
  #[arg(long, global = true, env = "STACKTMPL_LOGFILE")]
  pub logfile: Option<PathBuf>,

  /// Log at debug level
  #[arg(long, global = true, env = "STACKTMPL_DEBUG")]
  pub debug: bool,

  /// Connection attempts before giving up at startup
  #[arg(
    long,
    global = true,
    env = "STACKTMPL_CONNECT_ATTEMPTS",
    default_value_t = DEFAULT_CONNECT_ATTEMPTS,
    value_parser = clap::value_parser!(u32).range(1..)
  )]
  pub connect_attempts: u32,
}

impl Settings {
  pub fn watch_options(&self) -> WatchOptions {
    WatchOptions {
      refresh: Duration::from_secs(self.refresh),
      self_only: self.self_only,
      connect_attempts: self.connect_attempts,
      connect_delay: Duration::from_secs(CONNECT_INITIAL_DELAY_SECS),
    }
  }

  pub fn client(&self) -> Result<MetadataClient> {
    MetadataClient::new(&self.url, &self.prefix).context("Failed to create metadata client")
  }

  pub fn load_units(&self) -> Result<RenderUnitSet> {
    let specs =
      load_all(&self.templates).with_context(|| format!("Failed to load render specs from {}", self.templates))?;
    Ok(RenderUnitSet::from_specs(specs))
  }
}
