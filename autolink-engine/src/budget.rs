//! Link budget accounting for a single processing run.
use std::collections::HashMap;

use crate::utils::normalize_target;

/// Running link counters with their ceilings.
///
/// A ceiling of `0` means unlimited. Counters only ever grow: there is no way
/// to take back a recorded insertion.
#[derive(Debug, Clone, Default)]
pub struct LinkBudget {
  max_total:      usize,
  max_per_target: usize,
  total_inserted: usize,
  per_target:     HashMap<String, usize>,
}

impl LinkBudget {
  /// Create a budget with the given ceilings (`0` = unlimited).
  #[must_use]
  pub fn new(max_total: usize, max_per_target: usize) -> Self {
    Self {
      max_total,
      max_per_target,
      ..Self::default()
    }
  }

  /// Links inserted so far in this run.
  #[must_use]
  pub const fn total_inserted(&self) -> usize {
    self.total_inserted
  }

  /// Links inserted so far pointing at `target`.
  #[must_use]
  pub fn inserted_for(&self, target: &str) -> usize {
    self
      .per_target
      .get(&normalize_target(target))
      .copied()
      .unwrap_or(0)
  }

  /// Whether the global ceiling has been reached.
  #[must_use]
  pub const fn is_exhausted(&self) -> bool {
    self.max_total > 0 && self.total_inserted >= self.max_total
  }

  /// Whether at least one more link to `target` may be inserted.
  #[must_use]
  pub fn can_insert(&self, target: &str) -> bool {
    self.cap_for(target, None) != Some(0)
  }

  /// Links left under the global ceiling, `None` when unlimited.
  #[must_use]
  pub const fn remaining_total(&self) -> Option<usize> {
    if self.max_total == 0 {
      None
    } else {
      Some(self.max_total.saturating_sub(self.total_inserted))
    }
  }

  /// Links left for `target` under the per-target ceiling, `None` when
  /// unlimited.
  #[must_use]
  pub fn remaining_for(&self, target: &str) -> Option<usize> {
    if self.max_per_target == 0 {
      None
    } else {
      Some(self.max_per_target.saturating_sub(self.inserted_for(target)))
    }
  }

  /// The strictest of the per-rule cap, the remaining global budget and the
  /// remaining per-target budget. `None` when nothing limits the insertion.
  #[must_use]
  pub fn cap_for(&self, target: &str, per_rule: Option<usize>) -> Option<usize> {
    [per_rule, self.remaining_total(), self.remaining_for(target)]
      .into_iter()
      .flatten()
      .min()
  }

  /// Record `count` substitutions actually made for `target`.
  pub fn record(&mut self, target: &str, count: usize) {
    if count == 0 {
      return;
    }
    self.total_inserted += count;
    *self.per_target.entry(normalize_target(target)).or_insert(0) += count;
  }
}
