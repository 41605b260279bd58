//! Two-outcome jump branch.

use super::BranchCoverage;
use crate::ids::ConditionId;
use crate::snapshot::JumpSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a conditional jump with a true and a false outcome
#[derive(Debug)]
pub struct JumpRecord {
    condition_id: ConditionId,
    true_hits: AtomicU64,
    false_hits: AtomicU64,
}

impl JumpRecord {
    /// Both outcomes of a jump are always counted as valid
    pub const VALID_BRANCHES: usize = 2;

    /// Create a record with zeroed counters
    #[must_use]
    pub const fn new(condition_id: ConditionId) -> Self {
        Self {
            condition_id,
            true_hits: AtomicU64::new(0),
            false_hits: AtomicU64::new(0),
        }
    }

    /// Rebuild a record from stored counters
    #[must_use]
    pub const fn from_snapshot(snapshot: &JumpSnapshot) -> Self {
        Self {
            condition_id: snapshot.condition_id,
            true_hits: AtomicU64::new(snapshot.true_hits),
            false_hits: AtomicU64::new(snapshot.false_hits),
        }
    }

    /// Condition id assigned by the instrumenter
    #[inline]
    #[must_use]
    pub const fn condition_id(&self) -> ConditionId {
        self.condition_id
    }

    /// Record `delta` evaluations of the given outcome
    #[inline]
    pub fn touch(&self, outcome: bool, delta: u64) {
        let counter = if outcome {
            &self.true_hits
        } else {
            &self.false_hits
        };
        counter.fetch_add(delta, Ordering::Relaxed);
    }

    /// Times the condition evaluated true
    #[inline]
    #[must_use]
    pub fn true_hits(&self) -> u64 {
        self.true_hits.load(Ordering::Relaxed)
    }

    /// Times the condition evaluated false
    #[inline]
    #[must_use]
    pub fn false_hits(&self) -> u64 {
        self.false_hits.load(Ordering::Relaxed)
    }

    /// Copy the current counters into plain data
    #[must_use]
    pub fn snapshot(&self) -> JumpSnapshot {
        JumpSnapshot {
            condition_id: self.condition_id,
            true_hits: self.true_hits(),
            false_hits: self.false_hits(),
        }
    }
}

impl BranchCoverage for JumpRecord {
    fn valid_branch_count(&self) -> usize {
        Self::VALID_BRANCHES
    }

    fn covered_branch_count(&self) -> usize {
        usize::from(self.true_hits() > 0) + usize::from(self.false_hits() > 0)
    }

    fn merge(&self, other: &Self) {
        // Read other first so merging a record into itself doubles it
        let (t, f) = (other.true_hits(), other.false_hits());
        self.true_hits.fetch_add(t, Ordering::Relaxed);
        self.false_hits.fetch_add(f, Ordering::Relaxed);
    }
}

impl Clone for JumpRecord {
    fn clone(&self) -> Self {
        Self::from_snapshot(&self.snapshot())
    }
}

impl PartialEq for JumpRecord {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for JumpRecord {}
