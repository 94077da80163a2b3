//! The pipeline coordinator: one producer, one consumer, one slot between them.
//!
//! The producer is a [`Watcher`] publishing snapshots into a `watch` channel.
//! The consumer takes the latest snapshot whenever it is free and hands it to a
//! [`SnapshotSink`]. At most one `apply` is ever in flight, and a snapshot the
//! consumer had no time for is simply replaced by the next one.
//!
//! A run ends in one of three ways:
//!
//! - the producer finishes: the consumer drains what is buffered and exits
//! - the consumer dies first: every runner is stopped and the run is aborted
//! - an interrupt arrives: every runner is stopped and the in-flight apply is
//!   allowed to finish
//!
//! In every case the coordinator waits for both tasks before reporting
//! [`PipelineState::Stopped`].

pub mod runners;
pub mod signals;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::provider::{Provider, ProviderError, SnapshotReceiver, Watcher};
use crate::render::RenderUnitSet;
use crate::snapshot::Snapshot;

pub use runners::RunnerRegistry;
pub use signals::{Interrupt, Interrupts};

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
  #[error("failed to connect to metadata provider: {0}")]
  Connect(#[from] ProviderError),

  #[error("snapshot sink failed: {0}")]
  Sink(String),

  #[error("pipeline aborted: {0}")]
  Aborted(String),
}

/// Lifecycle of a [`Coordinator`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  /// Connecting to the provider.
  Starting,
  Running,
  /// Stopping; waiting for in-flight work.
  Draining,
  Stopped,
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineState::Starting => write!(f, "starting"),
      PipelineState::Running => write!(f, "running"),
      PipelineState::Draining => write!(f, "draining"),
      PipelineState::Stopped => write!(f, "stopped"),
    }
  }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The producer ran out of changes and everything buffered was applied.
  Completed,
  /// An external interrupt stopped the run.
  Interrupted,
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Outcome::Completed => write!(f, "completed"),
      Outcome::Interrupted => write!(f, "interrupted"),
    }
  }
}

/// Result of a run that did not abort.
#[derive(Debug)]
pub struct RunReport<S> {
  pub outcome: Outcome,
  /// The sink, handed back once the consumer has let go of it.
  pub sink: S,
}

/// Something that consumes snapshots one at a time.
#[async_trait]
pub trait SnapshotSink: Send + 'static {
  /// Apply one snapshot. An error ends the run.
  async fn apply(&mut self, snapshot: &Snapshot) -> Result<(), PipelineError>;
}

#[async_trait]
impl SnapshotSink for RenderUnitSet {
  async fn apply(&mut self, snapshot: &Snapshot) -> Result<(), PipelineError> {
    // Per-unit failures are logged by the units and never end the run.
    self.apply_all(snapshot).await;
    Ok(())
  }
}

/// Owns the watcher, the sink and the runner registry for one run.
pub struct Coordinator<P, S> {
  watcher: Watcher<P>,
  sink: S,
  runners: RunnerRegistry,
  state: watch::Sender<PipelineState>,
}

enum FirstExit<S> {
  Producer(Result<(), JoinError>),
  Consumer(Result<Result<S, PipelineError>, JoinError>),
  Interrupted(Interrupt),
}

impl<P: Provider, S: SnapshotSink> Coordinator<P, S> {
  pub fn new(watcher: Watcher<P>, sink: S) -> Self {
    let (state, _) = watch::channel(PipelineState::Starting);
    Self {
      watcher,
      sink,
      runners: RunnerRegistry::new(),
      state,
    }
  }

  /// Observe state transitions.
  pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
    self.state.subscribe()
  }

  /// Connect, then run producer and consumer until one of the exit paths.
  ///
  /// A connect failure or a consumer that dies first is an error; a drained
  /// producer or an interrupt is a normal end.
  pub async fn run(self, mut interrupts: Interrupts) -> Result<RunReport<S>, PipelineError> {
    let Coordinator {
      watcher,
      sink,
      mut runners,
      state,
    } = self;

    set_state(&state, PipelineState::Starting);
    let connected = tokio::select! {
      connected = watcher.connect() => Some(connected),
      interrupt = interrupts.recv() => {
        info!(signal = %interrupt, "interrupted while connecting");
        None
      }
    };
    match connected {
      Some(Ok(())) => {}
      Some(Err(e)) => {
        set_state(&state, PipelineState::Stopped);
        return Err(PipelineError::Connect(e));
      }
      None => {
        set_state(&state, PipelineState::Stopped);
        return Ok(RunReport {
          outcome: Outcome::Interrupted,
          sink,
        });
      }
    }

    let (tx, rx) = watch::channel(None);
    let producer_stop = runners.register("producer");
    let consumer_stop = runners.register("consumer");
    let mut producer = tokio::spawn(watcher.run(tx, producer_stop));
    let mut consumer = tokio::spawn(consume(rx, sink, consumer_stop));
    set_state(&state, PipelineState::Running);

    let first = tokio::select! {
      joined = &mut producer => FirstExit::Producer(joined),
      joined = &mut consumer => FirstExit::Consumer(joined),
      interrupt = interrupts.recv() => FirstExit::Interrupted(interrupt),
    };

    let result = match first {
      FirstExit::Producer(joined) => {
        if let Err(e) = joined {
          error!(error = %e, "snapshot producer panicked");
        }
        info!("snapshot producer finished, draining");
        set_state(&state, PipelineState::Draining);
        drain(consumer, &mut interrupts, &mut runners)
          .await
          .map(|sink| RunReport {
            outcome: Outcome::Completed,
            sink,
          })
      }
      FirstExit::Consumer(joined) => match consumer_result(joined) {
        Ok(sink) => {
          // Only reachable once the producer has already dropped the channel.
          set_state(&state, PipelineState::Draining);
          await_producer(producer).await;
          Ok(RunReport {
            outcome: Outcome::Completed,
            sink,
          })
        }
        Err(e) => {
          error!(error = %e, "snapshot consumer stopped unexpectedly, aborting");
          set_state(&state, PipelineState::Draining);
          runners.stop_all();
          await_producer(producer).await;
          Err(PipelineError::Aborted(e.to_string()))
        }
      },
      FirstExit::Interrupted(interrupt) => {
        info!(signal = %interrupt, "interrupt received, shutting down");
        set_state(&state, PipelineState::Draining);
        runners.stop_all();
        let drained = drain(consumer, &mut interrupts, &mut runners).await;
        await_producer(producer).await;
        drained.map(|sink| RunReport {
          outcome: Outcome::Interrupted,
          sink,
        })
      }
    };

    set_state(&state, PipelineState::Stopped);
    result
  }
}

/// Apply snapshots from `rx` until the channel closes or `stop` fires.
///
/// `stop` is only checked between applies; an apply already running always
/// completes. A closed channel still yields its last unseen snapshot first.
async fn consume<S: SnapshotSink>(
  mut rx: SnapshotReceiver,
  mut sink: S,
  stop: CancellationToken,
) -> Result<S, PipelineError> {
  loop {
    tokio::select! {
      biased;
      _ = stop.cancelled() => break,
      changed = rx.changed() => {
        if changed.is_err() {
          break;
        }
      }
    }

    let snapshot: Option<Arc<Snapshot>> = rx.borrow_and_update().clone();
    if let Some(snapshot) = snapshot {
      debug!(stacks = snapshot.len(), "applying snapshot");
      sink.apply(&snapshot).await?;
    }
  }

  debug!("snapshot consumer finished");
  Ok(sink)
}

/// Wait for the consumer, logging interrupts that arrive meanwhile.
async fn drain<S>(
  mut consumer: JoinHandle<Result<S, PipelineError>>,
  interrupts: &mut Interrupts,
  runners: &mut RunnerRegistry,
) -> Result<S, PipelineError> {
  loop {
    tokio::select! {
      joined = &mut consumer => return consumer_result(joined),
      interrupt = interrupts.recv() => {
        if runners.stop_all() == 0 {
          warn!(signal = %interrupt, "already shutting down, waiting for in-flight work");
        } else {
          info!(signal = %interrupt, "interrupt received while draining, stopping runners");
        }
      }
    }
  }
}

async fn await_producer(producer: JoinHandle<()>) {
  if let Err(e) = producer.await {
    error!(error = %e, "snapshot producer panicked");
  }
}

fn consumer_result<S>(joined: Result<Result<S, PipelineError>, JoinError>) -> Result<S, PipelineError> {
  match joined {
    Ok(result) => result,
    Err(e) => Err(PipelineError::Aborted(format!("snapshot consumer panicked: {e}"))),
  }
}

fn set_state(state: &watch::Sender<PipelineState>, next: PipelineState) {
  let previous = state.send_replace(next);
  if previous != next {
    debug!(from = %previous, to = %next, "pipeline state changed");
  }
}
