//! Canonical, order-stable view of the topology.
//!
//! A [`Snapshot`] can only be built through [`Snapshot::new`], which sorts the
//! stacks by name and every stack's services by name. Two snapshots holding the
//! same entities therefore serialize identically no matter what order the
//! provider returned them in, which is what makes digest-based change detection
//! on the rendered output sound.

mod types;

pub use types::{Container, Service, Stack};

use serde::Serialize;

/// Sorted, immutable topology handed from the producer to the consumer.
///
/// Serializes as `{"stacks": [...]}`; that object is the template context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
  stacks: Vec<Stack>,
}

impl Snapshot {
  /// Build a snapshot, sorting stacks and each stack's services by name.
  ///
  /// The sort is stable, so entries sharing a name keep provider order.
  pub fn new(mut stacks: Vec<Stack>) -> Self {
    stacks.sort_by(|a, b| a.name.cmp(&b.name));
    for stack in &mut stacks {
      stack.services.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Self { stacks }
  }

  pub fn stacks(&self) -> &[Stack] {
    &self.stacks
  }

  pub fn stack(&self, name: &str) -> Option<&Stack> {
    self.stacks.iter().find(|s| s.name == name)
  }

  pub fn len(&self) -> usize {
    self.stacks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stacks.is_empty()
  }

  /// Total number of services across all stacks.
  pub fn service_count(&self) -> usize {
    self.stacks.iter().map(|s| s.services.len()).sum()
  }
}
