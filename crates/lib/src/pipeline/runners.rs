//! Cooperative stop handles for the pipeline's long-lived tasks.

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Every task the coordinator may need to stop, one token each.
///
/// Stopping drains the registry, so a second [`RunnerRegistry::stop_all`] is a
/// no-op.
#[derive(Debug, Default)]
pub struct RunnerRegistry {
  runners: Vec<(&'static str, CancellationToken)>,
}

impl RunnerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a runner and hand back the token it must watch.
  pub fn register(&mut self, name: &'static str) -> CancellationToken {
    let token = CancellationToken::new();
    self.runners.push((name, token.clone()));
    token
  }

  /// Cancel every registered runner. Returns how many were stopped.
  pub fn stop_all(&mut self) -> usize {
    let stopped = self.runners.len();
    for (name, token) in self.runners.drain(..) {
      debug!(runner = name, "stopping runner");
      token.cancel();
    }
    stopped
  }

  pub fn len(&self) -> usize {
    self.runners.len()
  }

  pub fn is_empty(&self) -> bool {
    self.runners.is_empty()
  }
}
