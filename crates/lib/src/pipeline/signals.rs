//! External interrupts fed into the coordinator.
//!
//! OS signals are forwarded into an unbounded channel so the coordinator can
//! `select!` on them next to its tasks. Tests drive the same channel by hand.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

/// An external request to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
  /// SIGINT or Ctrl-C.
  Int,
  /// SIGTERM.
  Term,
  /// SIGABRT.
  Abort,
}

impl fmt::Display for Interrupt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Interrupt::Int => write!(f, "SIGINT"),
      Interrupt::Term => write!(f, "SIGTERM"),
      Interrupt::Abort => write!(f, "SIGABRT"),
    }
  }
}

/// Stream of interrupts.
#[derive(Debug)]
pub struct Interrupts {
  rx: mpsc::UnboundedReceiver<Interrupt>,
}

impl Interrupts {
  /// A manually driven stream.
  pub fn channel() -> (mpsc::UnboundedSender<Interrupt>, Self) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Self { rx })
  }

  /// A stream that never yields.
  pub fn never() -> Self {
    let (_, interrupts) = Self::channel();
    interrupts
  }

  /// Forward process signals into a new stream.
  ///
  /// Must be called from within a tokio runtime.
  pub fn from_os_signals() -> std::io::Result<Self> {
    let (tx, interrupts) = Self::channel();
    forward_os_signals(tx)?;
    Ok(interrupts)
  }

  /// Wait for the next interrupt. Pends forever once every sender is gone.
  pub async fn recv(&mut self) -> Interrupt {
    match self.rx.recv().await {
      Some(interrupt) => interrupt,
      None => std::future::pending().await,
    }
  }
}

#[cfg(unix)]
fn forward_os_signals(tx: mpsc::UnboundedSender<Interrupt>) -> std::io::Result<()> {
  use tokio::signal::unix::{SignalKind, signal};

  let mut int = signal(SignalKind::interrupt())?;
  let mut term = signal(SignalKind::terminate())?;
  let mut abrt = signal(SignalKind::from_raw(libc::SIGABRT))?;

  tokio::spawn(async move {
    loop {
      let interrupt = tokio::select! {
        Some(()) = int.recv() => Interrupt::Int,
        Some(()) = term.recv() => Interrupt::Term,
        Some(()) = abrt.recv() => Interrupt::Abort,
        else => break,
      };
      debug!(signal = %interrupt, "signal received");
      if tx.send(interrupt).is_err() {
        break;
      }
    }
  });

  Ok(())
}

#[cfg(not(unix))]
fn forward_os_signals(tx: mpsc::UnboundedSender<Interrupt>) -> std::io::Result<()> {
  tokio::spawn(async move {
    while tokio::signal::ctrl_c().await.is_ok() {
      debug!("ctrl-c received");
      if tx.send(Interrupt::Int).is_err() {
        break;
      }
    }
  });

  Ok(())
}
