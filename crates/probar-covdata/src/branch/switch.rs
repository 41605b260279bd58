//! N-outcome switch branch.

use super::BranchCoverage;
use crate::ids::SwitchId;
use crate::result::{CoverageError, CoverageResult};
use crate::snapshot::SwitchSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome selected by a switch evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseIndex {
    /// An explicit case, numbered from zero
    Case(u32),
    /// No case matched
    Default,
}

impl CaseIndex {
    /// Decode the instrumenter's raw index, where a negative value
    /// (conventionally `-1`) means the default outcome.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        u32::try_from(raw).map_or(Self::Default, Self::Case)
    }
}

/// Counters for a switch with a fixed set of cases plus a default slot
#[derive(Debug)]
pub struct SwitchRecord {
    switch_id: SwitchId,
    case_hits: Box<[AtomicU64]>,
    default_hits: AtomicU64,
}

impl SwitchRecord {
    /// Create a record with `case_count` explicit cases
    #[must_use]
    pub fn new(switch_id: SwitchId, case_count: u32) -> Self {
        Self {
            switch_id,
            case_hits: (0..case_count).map(|_| AtomicU64::new(0)).collect(),
            default_hits: AtomicU64::new(0),
        }
    }

    /// Rebuild a record from stored counters
    #[must_use]
    pub fn from_snapshot(snapshot: &SwitchSnapshot) -> Self {
        Self {
            switch_id: snapshot.switch_id,
            case_hits: snapshot.case_hits.iter().copied().map(AtomicU64::new).collect(),
            default_hits: AtomicU64::new(snapshot.default_hits),
        }
    }

    /// Switch id assigned by the instrumenter
    #[inline]
    #[must_use]
    pub const fn switch_id(&self) -> SwitchId {
        self.switch_id
    }

    /// Number of explicit cases, excluding default
    #[inline]
    #[must_use]
    pub fn case_count(&self) -> u32 {
        self.case_hits.len() as u32
    }

    /// Record `delta` selections of `case`.
    ///
    /// An out-of-range case leaves every counter untouched.
    #[inline]
    pub fn touch(&self, case: CaseIndex, delta: u64) -> CoverageResult<()> {
        self.counter(case)?.fetch_add(delta, Ordering::Relaxed);
        Ok(())
    }

    /// Hits recorded for `case`, or `None` if the switch has no such case
    #[must_use]
    pub fn hits(&self, case: CaseIndex) -> Option<u64> {
        self.counter(case).ok().map(|c| c.load(Ordering::Relaxed))
    }

    /// Hits on the default outcome
    #[inline]
    #[must_use]
    pub fn default_hits(&self) -> u64 {
        self.default_hits.load(Ordering::Relaxed)
    }

    /// Copy the current counters into plain data
    #[must_use]
    pub fn snapshot(&self) -> SwitchSnapshot {
        SwitchSnapshot {
            switch_id: self.switch_id,
            case_hits: self
                .case_hits
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            default_hits: self.default_hits(),
        }
    }

    fn counter(&self, case: CaseIndex) -> CoverageResult<&AtomicU64> {
        match case {
            CaseIndex::Default => Ok(&self.default_hits),
            CaseIndex::Case(n) => {
                self.case_hits
                    .get(n as usize)
                    .ok_or_else(|| CoverageError::CaseOutOfRange {
                        switch: self.switch_id,
                        case: n,
                        cases: self.case_count(),
                    })
            }
        }
    }
}

impl BranchCoverage for SwitchRecord {
    fn valid_branch_count(&self) -> usize {
        self.case_hits.len() + 1
    }

    fn covered_branch_count(&self) -> usize {
        self.case_hits
            .iter()
            .chain(std::iter::once(&self.default_hits))
            .filter(|c| c.load(Ordering::Relaxed) > 0)
            .count()
    }

    fn merge(&self, other: &Self) {
        if self.case_hits.len() != other.case_hits.len() {
            tracing::warn!(
                switch = %self.switch_id,
                cases = self.case_hits.len(),
                other_cases = other.case_hits.len(),
                "merging switches with different case counts, folding overlapping cases only"
            );
        }

        // Snapshot other first so merging a record into itself doubles it
        let incoming = other.snapshot();
        for (mine, hits) in self.case_hits.iter().zip(incoming.case_hits) {
            mine.fetch_add(hits, Ordering::Relaxed);
        }
        self.default_hits
            .fetch_add(incoming.default_hits, Ordering::Relaxed);
    }
}

impl Clone for SwitchRecord {
    fn clone(&self) -> Self {
        Self::from_snapshot(&self.snapshot())
    }
}

impl PartialEq for SwitchRecord {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for SwitchRecord {}
