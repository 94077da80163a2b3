//! The producer side of the pipeline.
//!
//! A [`Watcher`] owns a provider and publishes snapshots into a single-slot
//! `watch` channel. The channel only ever holds the latest snapshot: if the
//! consumer is still busy when a newer one arrives, the older one is replaced
//! rather than queued.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{Provider, ProviderError, WatchOptions};
use crate::consts::INIT_VERSION;
use crate::snapshot::Snapshot;

/// Sending half of the snapshot slot. `None` until the first snapshot lands.
pub type SnapshotSender = watch::Sender<Option<Arc<Snapshot>>>;

/// Receiving half of the snapshot slot.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Snapshot>>>;

/// Drives a [`Provider`] and turns its changes into sorted snapshots.
#[derive(Debug)]
pub struct Watcher<P> {
  provider: P,
  options: WatchOptions,
}

impl<P: Provider> Watcher<P> {
  pub fn new(provider: P, options: WatchOptions) -> Self {
    Self { provider, options }
  }

  /// Probe the provider until it answers, backing off exponentially.
  ///
  /// Gives up after `connect_attempts` probes.
  pub async fn connect(&self) -> Result<(), ProviderError> {
    let attempts = self.options.connect_attempts.max(1);
    let mut delay = self.options.connect_delay;
    let mut attempt = 1;

    loop {
      match self.provider.connect().await {
        Ok(()) => {
          info!(attempt, "connected to metadata provider");
          return Ok(());
        }
        Err(e) if attempt >= attempts => {
          error!(attempts, error = %e, "failed connecting to metadata provider");
          return Err(ProviderError::Unreachable {
            attempts,
            source: Box::new(e),
          });
        }
        Err(e) => {
          warn!(attempt, error = %e, retry_in = ?delay, "metadata provider not reachable yet");
          tokio::time::sleep(delay).await;
          delay *= 2;
          attempt += 1;
        }
      }
    }
  }

  /// Fetch the current topology as a sorted snapshot.
  ///
  /// In self-only mode the snapshot holds just the stack this process runs in.
  pub async fn fetch(&self) -> Result<Snapshot, ProviderError> {
    let stacks = if self.options.self_only {
      vec![self.provider.self_stack().await?]
    } else {
      self.provider.stacks().await?
    };
    Ok(Snapshot::new(stacks))
  }

  /// Publish snapshots until `stop` is cancelled, the provider closes, or
  /// every receiver is gone.
  ///
  /// One snapshot is fetched eagerly so the consumer does not wait a full
  /// refresh interval for its first render. After that a snapshot is fetched
  /// each time the provider reports a new version. Poll and fetch failures are
  /// logged and retried; the last good snapshot stays in effect meanwhile.
  pub async fn run(self, sender: SnapshotSender, stop: CancellationToken) {
    info!(refresh = ?self.options.refresh, self_only = self.options.self_only, "listening for topology changes");

    let mut stale = match self.publish(&sender, &stop, INIT_VERSION).await {
      Publish::Sent => false,
      Publish::Failed => true,
      Publish::Stop => return,
    };

    let mut version = INIT_VERSION.to_string();
    loop {
      let next = tokio::select! {
        _ = stop.cancelled() => break,
        next = self.provider.wait_version(&version, self.options.refresh) => next,
      };

      match next {
        Ok(next) if next == version && !stale => debug!(version = %version, "no change in topology version"),
        Ok(next) => {
          if next == version {
            debug!(version = %version, "retrying failed topology refresh");
          } else {
            debug!(old = %version, new = %next, "topology version changed");
            version = next;
          }
          stale = match self.publish(&sender, &stop, &version).await {
            Publish::Sent => false,
            Publish::Failed => true,
            Publish::Stop => break,
          };
        }
        Err(ProviderError::Closed) => {
          info!("provider closed, no further snapshots");
          break;
        }
        Err(e) => {
          error!(error = %e, retry_in = ?self.options.refresh, "failed waiting for topology version");
          tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(self.options.refresh) => {}
          }
        }
      }
    }

    info!("stopped listening for topology changes");
  }

  /// Fetch and publish one snapshot.
  async fn publish(&self, sender: &SnapshotSender, stop: &CancellationToken, version: &str) -> Publish {
    debug!(version = %version, "refreshing topology");

    let fetched = tokio::select! {
      _ = stop.cancelled() => return Publish::Stop,
      fetched = self.fetch() => fetched,
    };

    match fetched {
      Ok(snapshot) => {
        debug!(stacks = snapshot.len(), services = snapshot.service_count(), "publishing snapshot");
        if sender.send(Some(Arc::new(snapshot))).is_err() {
          warn!("snapshot consumer is gone");
          return Publish::Stop;
        }
        Publish::Sent
      }
      Err(e) => {
        error!(error = %e, retry_in = ?self.options.refresh, "failed fetching topology, keeping previous snapshot");
        Publish::Failed
      }
    }
  }
}

/// Result of one fetch-and-publish attempt.
enum Publish {
  Sent,
  /// The fetch failed; the version that triggered it still needs a snapshot.
  Failed,
  Stop,
}
