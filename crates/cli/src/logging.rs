//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the level is `debug` with `--debug` and
//! `info` without. Console logs go to stdout, or to stderr when stdout carries
//! JSON output, and also to `--logfile` when given.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// The returned guard flushes the log file on drop and must be held until exit.
pub fn init(debug: bool, logfile: Option<&Path>, console_to_stderr: bool) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

  let (file_layer, guard) = match logfile {
    Some(path) => {
      let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
      let layer = fmt::layer().with_ansi(false).with_writer(writer);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  let console = if console_to_stderr {
    BoxMakeWriter::new(std::io::stderr)
  } else {
    BoxMakeWriter::new(std::io::stdout)
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(console))
    .with(file_layer)
    .try_init()
    .context("Failed to initialize logging")?;

  Ok(guard)
}

fn default_level(debug: bool) -> &'static str {
  if debug { "debug" } else { "info" }
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
  let file_name = path
    .file_name()
    .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  RollingFileAppender::builder()
    .rotation(Rotation::NEVER)
    .filename_prefix(file_name.to_string_lossy())
    .build(dir)
    .with_context(|| format!("Failed to open log file {}", path.display()))
}
