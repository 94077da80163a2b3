//! Test utilities for stacktmpl-lib.
//!
//! Topology builders and cross-platform shell snippets shared by unit tests.

use std::collections::BTreeMap;

use crate::snapshot::{Service, Stack};

/// A service with only its name set.
pub fn service(name: &str) -> Service {
  Service {
    name: name.to_string(),
    ..Default::default()
  }
}

/// A service with a name and a lifecycle state.
pub fn service_with_state(name: &str, state: &str) -> Service {
  Service {
    name: name.to_string(),
    state: state.to_string(),
    ..Default::default()
  }
}

/// A stack holding the given services, in the given (unsorted) order.
pub fn stack(name: &str, services: Vec<Service>) -> Stack {
  Stack {
    name: name.to_string(),
    services,
    ..Default::default()
  }
}

/// Service labels from string pairs.
pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
  pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Returns a shell command that appends a line to `path`.
#[cfg(unix)]
pub fn append_line(path: &std::path::Path, line: &str) -> String {
  format!("echo {} >> '{}'", line, path.display())
}

#[cfg(windows)]
pub fn append_line(path: &std::path::Path, line: &str) -> String {
  format!("echo {}>> \"{}\"", line, path.display())
}

/// Returns a shell command that exits with the given status.
pub fn exit_with(code: i32) -> String {
  format!("exit {}", code)
}

pub use fake::FakeProvider;

mod fake {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
  use std::time::Duration;

  use async_trait::async_trait;
  use tokio::sync::watch;

  use crate::provider::{Provider, ProviderError};
  use crate::snapshot::Stack;

  /// In-memory provider whose topology tests can replace at will.
  ///
  /// Every [`FakeProvider::publish`] bumps the version, waking any pending
  /// `wait_version` long-poll.
  pub struct FakeProvider {
    topology: watch::Sender<(u64, Vec<Stack>)>,
    connect_failures: AtomicU32,
    fail_fetches: AtomicBool,
    closed: AtomicBool,
    connects: AtomicU32,
    fetches: AtomicU32,
  }

  impl FakeProvider {
    pub fn new(stacks: Vec<Stack>) -> Arc<Self> {
      let (topology, _) = watch::channel((1, stacks));
      Arc::new(Self {
        topology,
        connect_failures: AtomicU32::new(0),
        fail_fetches: AtomicBool::new(false),
        closed: AtomicBool::new(false),
        connects: AtomicU32::new(0),
        fetches: AtomicU32::new(0),
      })
    }

    /// Replace the topology and bump the version.
    pub fn publish(&self, stacks: Vec<Stack>) {
      self.topology.send_modify(|(version, current)| {
        *version += 1;
        *current = stacks;
      });
    }

    /// Stop reporting changes. Pending long-polls finish with `Closed` once
    /// any unseen version has been handed out.
    pub fn close(&self) {
      self.closed.store(true, Ordering::SeqCst);
      self.topology.send_modify(|_| {});
    }

    /// Make the next `n` connect probes fail.
    pub fn fail_connects(&self, n: u32) {
      self.connect_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
      self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> u32 {
      self.connects.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> u32 {
      self.fetches.load(Ordering::SeqCst)
    }

    fn fetch(&self) -> Result<Vec<Stack>, ProviderError> {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      if self.fail_fetches.load(Ordering::SeqCst) {
        return Err(ProviderError::Unavailable("fetch disabled".into()));
      }
      Ok(self.topology.borrow().1.clone())
    }
  }

  #[async_trait]
  impl Provider for FakeProvider {
    async fn connect(&self) -> Result<(), ProviderError> {
      self.connects.fetch_add(1, Ordering::SeqCst);
      let remaining = self.connect_failures.load(Ordering::SeqCst);
      if remaining > 0 {
        self.connect_failures.store(remaining - 1, Ordering::SeqCst);
        return Err(ProviderError::Unavailable("connection refused".into()));
      }
      Ok(())
    }

    async fn wait_version(&self, current: &str, max_wait: Duration) -> Result<String, ProviderError> {
      let mut rx = self.topology.subscribe();
      loop {
        let version = rx.borrow_and_update().0.to_string();
        if version != current {
          return Ok(version);
        }
        if self.closed.load(Ordering::SeqCst) {
          return Err(ProviderError::Closed);
        }
        tokio::select! {
          changed = rx.changed() => {
            if changed.is_err() {
              return Ok(version);
            }
          }
          _ = tokio::time::sleep(max_wait) => return Ok(version),
        }
      }
    }

    async fn stacks(&self) -> Result<Vec<Stack>, ProviderError> {
      self.fetch()
    }

    async fn self_stack(&self) -> Result<Stack, ProviderError> {
      self
        .fetch()?
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Unavailable("no stacks".into()))
    }
  }
}
