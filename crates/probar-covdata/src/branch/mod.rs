//! Branch Records
//!
//! A branch record owns the per-outcome counters of one decision point.
//! Counters are atomics, so instrumented call sites increment them without
//! taking the owning line's lock.

mod jump;
mod switch;

pub use jump::JumpRecord;
pub use switch::{CaseIndex, SwitchRecord};

use crate::rate;

/// Coverage arithmetic shared by branch records and lines
pub trait BranchCoverage {
    /// Outcomes that statically exist, whether or not they ran
    fn valid_branch_count(&self) -> usize;

    /// Valid outcomes with at least one recorded hit
    fn covered_branch_count(&self) -> usize;

    /// `covered / valid`, or `1.0` when there are no valid outcomes
    fn branch_coverage_rate(&self) -> f64 {
        rate::branch_rate(self.covered_branch_count(), self.valid_branch_count())
    }

    /// Fold `other`'s counters into `self`; `other` is left unchanged
    fn merge(&self, other: &Self);
}
