//! Render spec files.
//!
//! A render spec is a small YAML document binding one template to one
//! destination:
//!
//! ```yaml
//! source: /etc/stacktmpl/templates/haproxy.cfg.j2
//! destination: /etc/haproxy/haproxy.cfg
//! action: systemctl reload haproxy
//! ```
//!
//! Spec files are discovered with a glob pattern and loaded in sorted path
//! order. That order becomes the order render units run in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
  #[error("invalid spec pattern {pattern:?}: {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to read spec {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse spec {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("spec {path} has an empty `{field}`")]
  EmptyField { path: PathBuf, field: &'static str },

  #[error("no spec files match {pattern:?}")]
  NoFiles { pattern: String },

  #[error("none of the spec files matching {pattern:?} could be loaded")]
  NoValidSpecs { pattern: String },
}

/// One template-to-destination binding, as written in a spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSpec {
  /// Template file rendered on every snapshot.
  pub source: PathBuf,
  /// File the rendered output is written to.
  pub destination: PathBuf,
  /// Shell command run after the destination changed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<String>,
}

impl RenderSpec {
  /// Load a single spec file.
  pub fn load(path: &Path) -> Result<Self, SpecError> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// Parse spec YAML; `path` is only used in error messages.
  pub fn parse(content: &str, path: &Path) -> Result<Self, SpecError> {
    let spec: RenderSpec = serde_yaml::from_str(content).map_err(|source| SpecError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if spec.source.as_os_str().is_empty() {
      return Err(SpecError::EmptyField {
        path: path.to_path_buf(),
        field: "source",
      });
    }
    if spec.destination.as_os_str().is_empty() {
      return Err(SpecError::EmptyField {
        path: path.to_path_buf(),
        field: "destination",
      });
    }

    Ok(spec)
  }
}

/// Find spec files matching a glob pattern, sorted by path.
///
/// Directories and unreadable entries are skipped.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>, SpecError> {
  let paths = glob::glob(pattern).map_err(|source| SpecError::Pattern {
    pattern: pattern.to_string(),
    source,
  })?;

  let mut files = Vec::new();
  for entry in paths {
    match entry {
      Ok(path) if path.is_file() => files.push(path),
      Ok(path) => debug!(path = %path.display(), "skipping non-file spec match"),
      Err(e) => warn!(error = %e, "skipping unreadable spec match"),
    }
  }
  files.sort();

  Ok(files)
}

/// Discover and load every spec matching `pattern`.
///
/// Files that fail to load are logged and skipped. It is an error for the
/// pattern to match nothing, or for every match to be invalid.
pub fn load_all(pattern: &str) -> Result<Vec<RenderSpec>, SpecError> {
  let files = discover(pattern)?;
  if files.is_empty() {
    return Err(SpecError::NoFiles {
      pattern: pattern.to_string(),
    });
  }

  let mut specs = Vec::with_capacity(files.len());
  for file in &files {
    match RenderSpec::load(file) {
      Ok(spec) => {
        debug!(file = %file.display(), source = %spec.source.display(), "loaded render spec");
        specs.push(spec);
      }
      Err(e) => warn!(file = %file.display(), error = %e, "skipping invalid render spec"),
    }
  }

  if specs.is_empty() {
    return Err(SpecError::NoValidSpecs {
      pattern: pattern.to_string(),
    });
  }

  Ok(specs)
}
