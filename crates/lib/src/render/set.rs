//! The ordered collection of render units applied to every snapshot.

use serde::Serialize;
use tracing::{debug, info};

use super::spec::RenderSpec;
use super::unit::{ActionStatus, ApplyOutcome, RenderUnit};
use crate::snapshot::Snapshot;

/// Counts of what happened across one [`RenderUnitSet::apply_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
  pub written: usize,
  pub unchanged: usize,
  pub failed: usize,
  pub actions_failed: usize,
}

impl ApplySummary {
  pub fn from_outcomes(outcomes: &[ApplyOutcome]) -> Self {
    let mut summary = Self::default();
    for outcome in outcomes {
      match outcome {
        ApplyOutcome::Unchanged => summary.unchanged += 1,
        ApplyOutcome::RenderFailed | ApplyOutcome::WriteFailed => summary.failed += 1,
        ApplyOutcome::Written { action } => {
          summary.written += 1;
          if *action == Some(ActionStatus::Failed) {
            summary.actions_failed += 1;
          }
        }
      }
    }
    summary
  }
}

/// Render units in spec discovery order.
///
/// The order is significant: when a snapshot changes several destinations, their
/// actions fire in this order.
#[derive(Debug, Default)]
pub struct RenderUnitSet {
  units: Vec<RenderUnit>,
}

impl RenderUnitSet {
  pub fn new(units: Vec<RenderUnit>) -> Self {
    Self { units }
  }

  pub fn from_specs(specs: impl IntoIterator<Item = RenderSpec>) -> Self {
    Self::new(specs.into_iter().map(RenderUnit::new).collect())
  }

  pub fn units(&self) -> &[RenderUnit] {
    &self.units
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  /// Apply every unit to `snapshot`, one after another.
  ///
  /// Returns one outcome per unit, in unit order. A failing unit never stops
  /// the units after it.
  pub async fn apply_all(&mut self, snapshot: &Snapshot) -> Vec<ApplyOutcome> {
    debug!(units = self.units.len(), stacks = snapshot.len(), "applying snapshot");

    let mut outcomes = Vec::with_capacity(self.units.len());
    for unit in &mut self.units {
      outcomes.push(unit.apply(snapshot).await);
    }

    let summary = ApplySummary::from_outcomes(&outcomes);
    if summary.written > 0 || summary.failed > 0 {
      info!(
        written = summary.written,
        unchanged = summary.unchanged,
        failed = summary.failed,
        actions_failed = summary.actions_failed,
        "snapshot applied"
      );
    } else {
      debug!(unchanged = summary.unchanged, "snapshot applied, nothing changed");
    }

    outcomes
  }
}
