//! Per-Line Coverage Record
//!
//! One `LineRecord` exists per instrumented source line. It is hammered from
//! many threads by instrumented call sites and occasionally merged with a
//! record collected by another run.
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────┬─────────────────────────────────────┐
//! │ Operation                    │ Synchronization                     │
//! ├──────────────────────────────┼─────────────────────────────────────┤
//! │ touch                        │ record lock (short)                 │
//! │ register_jump/register_switch│ map insert-if-absent, no record lock│
//! │ touch_jump/touch_switch      │ map lookup + branch atomics         │
//! │ aggregate queries            │ record lock for the whole read      │
//! │ merge/equals                 │ both record locks via `lock_both`   │
//! └──────────────────────────────┴─────────────────────────────────────┘
//! ```
//!
//! There is no ordering between different counters outside the record lock:
//! a lock-free branch touch may or may not be visible to a concurrent query.

use crate::branch::{BranchCoverage, CaseIndex, JumpRecord, SwitchRecord};
use crate::config::PairLockConfig;
use crate::ids::{BranchRef, ConditionId, LineNumber, SwitchId};
use crate::pair_lock;
use crate::rate;
use crate::result::{CoverageError, CoverageResult};
use crate::snapshot::{JumpSnapshot, LineSnapshot, SwitchSnapshot};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Line-level coverage queries
pub trait LineCoverage {
    /// `1.0` if the line ran at all, else `0.0`
    fn line_coverage_rate(&self) -> f64;

    /// Lines this data describes
    fn valid_line_count(&self) -> usize;

    /// Lines with at least one hit
    fn covered_line_count(&self) -> usize;

    /// The line ran and every valid branch outcome on it was taken
    fn is_covered(&self) -> bool;
}

/// Hit and branch counters for one source line
#[derive(Debug)]
pub struct LineRecord {
    line_number: LineNumber,
    /// Line hits. This mutex is also the record lock for joint reads,
    /// merges and equality checks.
    hits: Mutex<u64>,
    jumps: DashMap<ConditionId, Arc<JumpRecord>>,
    switches: DashMap<SwitchId, Arc<SwitchRecord>>,
}

#[derive(Debug, Default)]
struct BranchTotals {
    valid: usize,
    covered: usize,
}

impl LineRecord {
    /// Create an empty record for a line
    #[must_use]
    pub fn new(line_number: LineNumber) -> Self {
        Self {
            line_number,
            hits: Mutex::new(0),
            jumps: DashMap::new(),
            switches: DashMap::new(),
        }
    }

    /// Line number this record describes
    #[inline]
    #[must_use]
    pub const fn line_number(&self) -> LineNumber {
        self.line_number
    }

    /// Current line hit count
    #[must_use]
    pub fn hits(&self) -> u64 {
        *self.hits.lock()
    }

    /// Record `delta` executions of the line
    pub fn touch(&self, delta: u64) {
        let mut hits = self.hits.lock();
        *hits = hits.saturating_add(delta);
    }

    // ========================================================================
    // Branch registration and hot-path touches
    // ========================================================================

    /// Register a jump, returning the canonical record for its condition id.
    ///
    /// If the id is already registered the candidate is discarded and the
    /// existing record is returned, so repeated instrumentation setup is
    /// harmless.
    pub fn register_jump(&self, record: JumpRecord) -> Arc<JumpRecord> {
        match self.jumps.entry(record.condition_id()) {
            Entry::Occupied(existing) => {
                tracing::trace!(
                    line = %self.line_number,
                    condition = %record.condition_id(),
                    "jump already registered, keeping canonical record"
                );
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(record)).value()),
        }
    }

    /// Register a switch, returning the canonical record for its switch id
    pub fn register_switch(&self, record: SwitchRecord) -> Arc<SwitchRecord> {
        match self.switches.entry(record.switch_id()) {
            Entry::Occupied(existing) => {
                tracing::trace!(
                    line = %self.line_number,
                    switch = %record.switch_id(),
                    "switch already registered, keeping canonical record"
                );
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(record)).value()),
        }
    }

    /// Canonical jump record for `condition`, if registered
    #[must_use]
    pub fn jump(&self, condition: ConditionId) -> Option<Arc<JumpRecord>> {
        self.jumps.get(&condition).map(|entry| Arc::clone(entry.value()))
    }

    /// Canonical switch record for `switch`, if registered
    #[must_use]
    pub fn switch(&self, switch: SwitchId) -> Option<Arc<SwitchRecord>> {
        self.switches.get(&switch).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered jumps
    #[must_use]
    pub fn jump_count(&self) -> usize {
        self.jumps.len()
    }

    /// Number of registered switches
    #[must_use]
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    /// Record `delta` evaluations of a jump outcome without taking the
    /// record lock.
    pub fn touch_jump(&self, condition: ConditionId, outcome: bool, delta: u64) -> CoverageResult<()> {
        let Some(jump) = self.jumps.get(&condition) else {
            return Err(self.missing(BranchRef::Jump(condition)));
        };
        jump.touch(outcome, delta);
        Ok(())
    }

    /// Record `delta` selections of a switch case without taking the
    /// record lock.
    pub fn touch_switch(&self, switch: SwitchId, case: CaseIndex, delta: u64) -> CoverageResult<()> {
        let Some(record) = self.switches.get(&switch) else {
            return Err(self.missing(BranchRef::Switch(switch)));
        };
        record.touch(case, delta).map_err(|err| {
            tracing::warn!(line = %self.line_number, error = %err, "switch touch rejected");
            err
        })
    }

    fn missing(&self, branch: BranchRef) -> CoverageError {
        tracing::warn!(line = %self.line_number, %branch, "touch on unregistered branch");
        CoverageError::MissingInstrumentation {
            line: self.line_number,
            branch,
        }
    }

    // ========================================================================
    // Aggregate queries (record lock held)
    // ========================================================================

    /// Valid branch outcomes over every jump and switch on the line
    #[must_use]
    pub fn valid_branch_count(&self) -> usize {
        let hits = self.hits.lock();
        self.branch_totals(&hits).valid
    }

    /// Branch outcomes with at least one hit
    #[must_use]
    pub fn covered_branch_count(&self) -> usize {
        let hits = self.hits.lock();
        self.branch_totals(&hits).covered
    }

    /// `covered / valid`, `1.0` for a line without branches
    #[must_use]
    pub fn branch_coverage_rate(&self) -> f64 {
        let hits = self.hits.lock();
        let totals = self.branch_totals(&hits);
        rate::branch_rate(totals.covered, totals.valid)
    }

    /// The line ran and its branch rate is 100% (within rounding)
    #[must_use]
    pub fn is_covered(&self) -> bool {
        let hits = self.hits.lock();
        if *hits == 0 {
            return false;
        }
        let totals = self.branch_totals(&hits);
        totals.valid == 0 || rate::is_fully_covered(rate::branch_rate(totals.covered, totals.valid))
    }

    /// `1.0` if the line ran at all, else `0.0`
    #[must_use]
    pub fn line_coverage_rate(&self) -> f64 {
        rate::line_rate(self.hits())
    }

    /// A line record always describes exactly one line
    #[must_use]
    pub const fn valid_line_count(&self) -> usize {
        1
    }

    /// `1` if the line ran, else `0`
    #[must_use]
    pub fn covered_line_count(&self) -> usize {
        usize::from(self.hits() > 0)
    }

    /// Sum branch counts. Taking the guard proves the record lock is held.
    fn branch_totals(&self, _held: &MutexGuard<'_, u64>) -> BranchTotals {
        let mut totals = BranchTotals::default();
        for jump in &self.jumps {
            totals.valid += jump.value().valid_branch_count();
            totals.covered += jump.value().covered_branch_count();
        }
        for switch in &self.switches {
            totals.valid += switch.value().valid_branch_count();
            totals.covered += switch.value().covered_branch_count();
        }
        totals
    }

    // ========================================================================
    // Merge and equality (both record locks held)
    // ========================================================================

    /// Fold `other` into `self` with the default lock-pair policy.
    ///
    /// Both records are assumed to describe the same line; the line numbers
    /// are not checked.
    pub fn merge(&self, other: &Self) {
        self.merge_with(other, &PairLockConfig::default());
    }

    /// Fold `other` into `self`. Only `self` is mutated.
    ///
    /// Branches missing from `self` are adopted as copies, never shared, so
    /// later touches on `other` do not leak into `self`.
    pub fn merge_with(&self, other: &Self, config: &PairLockConfig) {
        if std::ptr::eq(self, other) {
            self.merge_into_self();
            return;
        }

        let (mut mine, theirs) = pair_lock::lock_both(&self.hits, &other.hits, config);
        *mine = mine.saturating_add(*theirs);

        // Collect first so no shard of other's maps is held while self's are written
        let incoming_jumps: Vec<Arc<JumpRecord>> = other
            .jumps
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let incoming_switches: Vec<Arc<SwitchRecord>> = other
            .switches
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut adopted = 0usize;
        let mut folded = 0usize;

        for jump in &incoming_jumps {
            match self.jumps.entry(jump.condition_id()) {
                Entry::Occupied(existing) => {
                    existing.get().merge(jump);
                    folded += 1;
                }
                Entry::Vacant(slot) => {
                    let _ = slot.insert(Arc::new(JumpRecord::clone(jump)));
                    adopted += 1;
                }
            }
        }

        for switch in &incoming_switches {
            match self.switches.entry(switch.switch_id()) {
                Entry::Occupied(existing) => {
                    existing.get().merge(switch);
                    folded += 1;
                }
                Entry::Vacant(slot) => {
                    let _ = slot.insert(Arc::new(SwitchRecord::clone(switch)));
                    adopted += 1;
                }
            }
        }

        drop(theirs);
        drop(mine);

        tracing::debug!(
            line = %self.line_number,
            adopted,
            folded,
            "merged line record"
        );
    }

    /// Merging a record with itself doubles every counter
    fn merge_into_self(&self) {
        let mut hits = self.hits.lock();
        *hits = hits.saturating_mul(2);
        for jump in &self.jumps {
            jump.value().merge(jump.value());
        }
        for switch in &self.switches {
            switch.value().merge(switch.value());
        }
        drop(hits);

        tracing::debug!(line = %self.line_number, "merged line record into itself");
    }

    /// Structural equality under both record locks, default policy
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.equals_with(other, &PairLockConfig::default())
    }

    /// Compare line number, hits and both branch maps as one joint view
    #[must_use]
    pub fn equals_with(&self, other: &Self, config: &PairLockConfig) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.line_number != other.line_number {
            return false;
        }

        let (mine, theirs) = pair_lock::lock_both(&self.hits, &other.hits, config);
        *mine == *theirs
            && self.jump_snapshots() == other.jump_snapshots()
            && self.switch_snapshots() == other.switch_snapshots()
    }

    /// Ascending order by line number, independent of locking
    #[must_use]
    pub fn cmp_by_line(a: &Self, b: &Self) -> Ordering {
        a.line_number.cmp(&b.line_number)
    }

    // ========================================================================
    // Persistence boundary
    // ========================================================================

    /// Copy the record into plain data under the record lock
    #[must_use]
    pub fn snapshot(&self) -> LineSnapshot {
        let hits = self.hits.lock();
        LineSnapshot {
            line_number: self.line_number,
            hits: *hits,
            jumps: self.jump_snapshots(),
            switches: self.switch_snapshots(),
        }
    }

    /// Rebuild a record from stored data with a fresh, unlocked lock
    pub fn from_snapshot(snapshot: &LineSnapshot) -> CoverageResult<Self> {
        let line = snapshot.line_number;

        let jumps = DashMap::with_capacity(snapshot.jumps.len());
        for (id, jump) in &snapshot.jumps {
            if *id != jump.condition_id {
                return Err(CoverageError::CorruptSnapshot {
                    line,
                    message: format!("jump key {id} holds condition {}", jump.condition_id),
                });
            }
            let _ = jumps.insert(*id, Arc::new(JumpRecord::from_snapshot(jump)));
        }

        let switches = DashMap::with_capacity(snapshot.switches.len());
        for (id, switch) in &snapshot.switches {
            if *id != switch.switch_id {
                return Err(CoverageError::CorruptSnapshot {
                    line,
                    message: format!("switch key {id} holds switch {}", switch.switch_id),
                });
            }
            let _ = switches.insert(*id, Arc::new(SwitchRecord::from_snapshot(switch)));
        }

        Ok(Self {
            line_number: line,
            hits: Mutex::new(snapshot.hits),
            jumps,
            switches,
        })
    }

    fn jump_snapshots(&self) -> BTreeMap<ConditionId, JumpSnapshot> {
        self.jumps
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect()
    }

    fn switch_snapshots(&self) -> BTreeMap<SwitchId, SwitchSnapshot> {
        self.switches
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect()
    }
}

impl BranchCoverage for LineRecord {
    fn valid_branch_count(&self) -> usize {
        Self::valid_branch_count(self)
    }

    fn covered_branch_count(&self) -> usize {
        Self::covered_branch_count(self)
    }

    fn branch_coverage_rate(&self) -> f64 {
        Self::branch_coverage_rate(self)
    }

    fn merge(&self, other: &Self) {
        Self::merge(self, other);
    }
}

impl LineCoverage for LineRecord {
    fn line_coverage_rate(&self) -> f64 {
        Self::line_coverage_rate(self)
    }

    fn valid_line_count(&self) -> usize {
        Self::valid_line_count(self)
    }

    fn covered_line_count(&self) -> usize {
        Self::covered_line_count(self)
    }

    fn is_covered(&self) -> bool {
        Self::is_covered(self)
    }
}

impl PartialEq for LineRecord {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for LineRecord {}

/// Hashes the line number only, so the hash stays stable while counters
/// change under a hash-keyed collection.
impl Hash for LineRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.line_number.hash(state);
    }
}

/// Deep copy with its own lock; branch records are not shared.
impl Clone for LineRecord {
    fn clone(&self) -> Self {
        let hits = self.hits.lock();
        Self {
            line_number: self.line_number,
            hits: Mutex::new(*hits),
            jumps: self
                .jumps
                .iter()
                .map(|entry| (*entry.key(), Arc::new(JumpRecord::clone(entry.value()))))
                .collect(),
            switches: self
                .switches
                .iter()
                .map(|entry| (*entry.key(), Arc::new(SwitchRecord::clone(entry.value()))))
                .collect(),
        }
    }
}

impl Serialize for LineRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LineRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = LineSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(&snapshot).map_err(serde::de::Error::custom)
    }
}
