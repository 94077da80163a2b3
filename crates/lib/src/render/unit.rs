//! A single template → destination → action binding.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::RenderError;
use super::action::run_action;
use super::funcs;
use super::spec::RenderSpec;
use crate::snapshot::Snapshot;
use crate::util::hash::{ContentHash, hash_bytes, hash_file};

/// How a post-write action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
  Succeeded,
  Failed,
}

/// What one [`RenderUnit::apply`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ApplyOutcome {
  /// The template could not be read or rendered. Nothing was written.
  RenderFailed,
  /// The rendered output matches what is already at the destination.
  Unchanged,
  /// The destination could not be written. The digest was left as is.
  WriteFailed,
  /// The destination was rewritten; `action` is `None` when none is configured.
  Written { action: Option<ActionStatus> },
}

impl ApplyOutcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, ApplyOutcome::RenderFailed | ApplyOutcome::WriteFailed)
  }
}

/// One template binding with its own change-detection state.
///
/// The stored digest is seeded from the destination file at construction, so a
/// restart does not rewrite a destination that is already up to date. After
/// that it only changes when a write succeeds.
#[derive(Debug)]
pub struct RenderUnit {
  name: String,
  source: PathBuf,
  destination: PathBuf,
  action: Option<String>,
  digest: Option<ContentHash>,
}

impl RenderUnit {
  pub fn new(spec: RenderSpec) -> Self {
    let RenderSpec {
      source,
      destination,
      action,
    } = spec;

    let name = source
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| source.display().to_string());
    let action = action.filter(|a| !a.trim().is_empty());
    let digest = seed_digest(&destination);

    Self {
      name,
      source,
      destination,
      action,
      digest,
    }
  }

  /// File name of the template source; used to identify the unit in logs.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn source(&self) -> &Path {
    &self.source
  }

  pub fn destination(&self) -> &Path {
    &self.destination
  }

  pub fn action(&self) -> Option<&str> {
    self.action.as_deref()
  }

  /// Digest of the content last written to (or found at) the destination.
  pub fn digest(&self) -> Option<&ContentHash> {
    self.digest.as_ref()
  }

  /// Render the template against `snapshot` without touching the destination.
  ///
  /// The template is read from disk on every call so edits are picked up
  /// without a restart.
  pub async fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError> {
    let template = tokio::fs::read_to_string(&self.source)
      .await
      .map_err(|source| RenderError::ReadTemplate {
        path: self.source.clone(),
        source,
      })?;

    funcs::render_str(&self.name, &template, snapshot).map_err(|source| RenderError::Template {
      name: self.name.clone(),
      source,
    })
  }

  /// Render, and if the output changed, write it and run the action.
  pub async fn apply(&mut self, snapshot: &Snapshot) -> ApplyOutcome {
    debug!(unit = %self.name, file = %self.source.display(), "rendering template");

    let rendered = match self.render(snapshot).await {
      Ok(rendered) => rendered,
      Err(e) => {
        error!(unit = %self.name, error = %e, "failed rendering template");
        return ApplyOutcome::RenderFailed;
      }
    };

    let digest = hash_bytes(rendered.as_bytes());
    if self.digest.as_ref() == Some(&digest) {
      debug!(unit = %self.name, digest = %digest.short(12), "rendered output unchanged");
      return ApplyOutcome::Unchanged;
    }

    if let Err(e) = write_destination(&self.destination, rendered.as_bytes()).await {
      error!(unit = %self.name, error = %e, "failed writing destination");
      return ApplyOutcome::WriteFailed;
    }

    debug!(
      unit = %self.name,
      old = %self.digest.as_ref().map(|d| d.short(12)).unwrap_or("-"),
      new = %digest.short(12),
      "updating digest"
    );
    self.digest = Some(digest);
    info!(unit = %self.name, file = %self.destination.display(), "template has been updated");

    let action = match &self.action {
      None => None,
      Some(cmd) => {
        info!(unit = %self.name, action = %cmd, "executing action");
        match run_action(cmd).await {
          Ok(_) => Some(ActionStatus::Succeeded),
          Err(e) => {
            error!(unit = %self.name, error = %e, "failed executing action");
            Some(ActionStatus::Failed)
          }
        }
      }
    };

    ApplyOutcome::Written { action }
  }
}

/// Digest of whatever is currently at `destination`, if it can be read.
fn seed_digest(destination: &Path) -> Option<ContentHash> {
  match hash_file(destination) {
    Ok(digest) => {
      debug!(file = %destination.display(), digest = %digest.short(12), "seeded digest from destination");
      Some(digest)
    }
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
    Err(e) => {
      warn!(file = %destination.display(), error = %e, "could not read destination, it will be rewritten");
      None
    }
  }
}

/// Overwrite `path` with `content` and reset its permissions.
async fn write_destination(path: &Path, content: &[u8]) -> Result<(), RenderError> {
  let map_err = |source| RenderError::Write {
    path: path.to_path_buf(),
    source,
  };

  tokio::fs::write(path, content).await.map_err(map_err)?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(crate::consts::DESTINATION_MODE);
    tokio::fs::set_permissions(path, perms).await.map_err(map_err)?;
  }

  Ok(())
}
