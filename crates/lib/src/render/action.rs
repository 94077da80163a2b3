//! Post-write actions.
//!
//! An action is a shell command string run after a render unit wrote a new
//! destination file, typically to reload the service that reads it
//! (`nginx -s reload`, `kill -HUP ...`). Actions inherit the daemon's
//! environment and working directory. Their stdio is detached, so an action
//! that leaves a daemon running in the background (`pkill x; x &`) returns as
//! soon as the shell exits.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Errors from running an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  /// The shell could not be spawned.
  #[error("failed to spawn action `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// The command ran but exited unsuccessfully.
  #[error("action `{cmd}` failed with exit code {code:?}")]
  Failed { cmd: String, code: Option<i32> },
}

/// Run `cmd` through the platform shell and wait for the shell to exit.
pub async fn run_action(cmd: &str) -> Result<(), ActionError> {
  let (shell, shell_args) = get_shell();

  debug!(shell = %shell, cmd = %cmd, "spawning action");

  let status = Command::new(&shell)
    .args(&shell_args)
    .arg(cmd)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .await
    .map_err(|source| ActionError::Spawn {
      cmd: cmd.to_string(),
      source,
    })?;

  debug!(status = %status, "action exited");

  if !status.success() {
    return Err(ActionError::Failed {
      cmd: cmd.to_string(),
      code: status.code(),
    });
  }

  Ok(())
}

/// Get the shell command and arguments for the current platform.
///
/// Always `/bin/sh -c` on Unix, never `$SHELL`.
fn get_shell() -> (String, Vec<String>) {
  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}
