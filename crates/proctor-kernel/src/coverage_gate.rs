//! [`CoverageGate`] – releases an onboarding check once every required label
//! has been observed at least once.
//!
//! Labels outside the required set are ignored; re-observing a label is a
//! no-op; order of appearance does not matter. The covered set only grows
//! for the lifetime of a gate, and a new stage gets a new gate.
//!
//! A gate has no timeout and no attempt limit. It stays open until coverage
//! is reached or the session is cancelled.
//!
//! # Example
//!
//! ```
//! use proctor_kernel::coverage_gate::{CoverageGate, EYE_CHECK_LABELS};
//! use proctor_types::GazeLabel;
//!
//! let mut gate = CoverageGate::new(EYE_CHECK_LABELS);
//! assert!(gate.observe(GazeLabel::Left).is_none());
//! assert!(gate.observe(GazeLabel::Other).is_none()); // not required, ignored
//! assert!(gate.observe(GazeLabel::Center).is_none());
//! let covered = gate.observe(GazeLabel::Right).expect("released");
//! assert_eq!(covered.len(), 3);
//!
//! // Success is reported only once.
//! assert!(gate.observe(GazeLabel::Right).is_none());
//! ```

use std::collections::BTreeSet;
use std::fmt::Debug;

use proctor_types::{GazeLabel, HeadLabel};
use tracing::{debug, info};

/// Gaze directions the eye check must see.
pub const EYE_CHECK_LABELS: [GazeLabel; 3] = [GazeLabel::Left, GazeLabel::Right, GazeLabel::Center];

/// Head directions the head check must see.
pub const HEAD_CHECK_LABELS: [HeadLabel; 4] =
    [HeadLabel::Up, HeadLabel::Down, HeadLabel::Left, HeadLabel::Right];

#[derive(Debug, Clone)]
pub struct CoverageGate<L> {
    required: BTreeSet<L>,
    covered: BTreeSet<L>,
    released: bool,
}

impl<L: Ord + Copy + Debug> CoverageGate<L> {
    pub fn new(required: impl IntoIterator<Item = L>) -> Self {
        Self {
            required: required.into_iter().collect(),
            covered: BTreeSet::new(),
            released: false,
        }
    }

    /// Record one classified label.
    ///
    /// Returns the covered set on the single call that completes coverage,
    /// and `None` on every other call, including all calls after release.
    pub fn observe(&mut self, label: L) -> Option<BTreeSet<L>> {
        if self.released {
            return None;
        }
        if self.required.contains(&label) && self.covered.insert(label) {
            debug!(
                ?label,
                covered = self.covered.len(),
                required = self.required.len(),
                "coverage grew"
            );
        }
        if self.required.is_subset(&self.covered) {
            self.released = true;
            info!(covered = ?self.covered, "coverage gate released");
            return Some(self.covered.clone());
        }
        None
    }

    /// Current partial coverage, for display only.
    pub fn snapshot(&self) -> &BTreeSet<L> {
        &self.covered
    }

    pub fn required(&self) -> &BTreeSet<L> {
        &self.required
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
