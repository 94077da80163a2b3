//! Topology providers and the watch loop that turns them into snapshots.
//!
//! A [`Provider`] knows how to reach the metadata service: probe it, long-poll
//! its topology version, and fetch stacks. The [`Watcher`] drives a provider:
//! it fetches an initial snapshot, waits for version changes, and publishes a
//! sorted [`Snapshot`](crate::snapshot::Snapshot) for every change.

pub mod metadata;
pub mod watcher;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::consts::{CONNECT_INITIAL_DELAY_SECS, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_REFRESH_SECS};
use crate::snapshot::Stack;

pub use metadata::MetadataClient;
pub use watcher::{SnapshotReceiver, SnapshotSender, Watcher};

/// Errors raised while talking to a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("request to {url} returned {status}")]
  Status { url: String, status: reqwest::StatusCode },

  #[error("failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("provider unreachable after {attempts} attempt(s): {source}")]
  Unreachable {
    attempts: u32,
    #[source]
    source: Box<ProviderError>,
  },

  #[error("provider unavailable: {0}")]
  Unavailable(String),

  /// The provider will not report any further changes.
  #[error("provider closed its change stream")]
  Closed,
}

/// Source of topology data and change notifications.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
  /// Probe the provider once.
  async fn connect(&self) -> Result<(), ProviderError>;

  /// Return the provider's current topology version, waiting up to `max_wait`
  /// for it to become different from `current`.
  ///
  /// Returning `current` unchanged means the wait timed out.
  /// [`ProviderError::Closed`] ends the watch loop for good.
  async fn wait_version(&self, current: &str, max_wait: Duration) -> Result<String, ProviderError>;

  /// Fetch every stack in the environment.
  async fn stacks(&self) -> Result<Vec<Stack>, ProviderError>;

  /// Fetch only the stack this process runs in.
  async fn self_stack(&self) -> Result<Stack, ProviderError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
  async fn connect(&self) -> Result<(), ProviderError> {
    (**self).connect().await
  }

  async fn wait_version(&self, current: &str, max_wait: Duration) -> Result<String, ProviderError> {
    (**self).wait_version(current, max_wait).await
  }

  async fn stacks(&self) -> Result<Vec<Stack>, ProviderError> {
    (**self).stacks().await
  }

  async fn self_stack(&self) -> Result<Stack, ProviderError> {
    (**self).self_stack().await
  }
}

/// How the [`Watcher`] talks to its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
  /// Long-poll window for version changes; also the back-off after a failed poll.
  pub refresh: Duration,
  /// Fetch only the stack this process runs in instead of every stack.
  pub self_only: bool,
  /// Connect probes before giving up at startup.
  pub connect_attempts: u32,
  /// Delay after the first failed probe; doubles after each further failure.
  pub connect_delay: Duration,
}

impl Default for WatchOptions {
  fn default() -> Self {
    Self {
      refresh: Duration::from_secs(DEFAULT_REFRESH_SECS),
      self_only: false,
      connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
      connect_delay: Duration::from_secs(CONNECT_INITIAL_DELAY_SECS),
    }
  }
}
