//! Persisted Coverage Snapshots
//!
//! Plain data only: no locks, no atomics. A runtime record is rebuilt from
//! a snapshot with fresh synchronization state, so a restored record never
//! inherits lock state from the process that wrote it.

use crate::ids::{ConditionId, LineNumber, SwitchId};
use crate::result::CoverageResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored counters of a jump branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpSnapshot {
    /// Condition id
    pub condition_id: ConditionId,
    /// Times the condition evaluated true
    pub true_hits: u64,
    /// Times the condition evaluated false
    pub false_hits: u64,
}

/// Stored counters of a switch branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSnapshot {
    /// Switch id
    pub switch_id: SwitchId,
    /// Hits per case, indexed by case number
    pub case_hits: Vec<u64>,
    /// Hits on the default (no match) outcome
    pub default_hits: u64,
}

/// Stored state of one source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Line number
    pub line_number: LineNumber,
    /// Line hit count
    pub hits: u64,
    /// Jump branches keyed by condition id
    #[serde(default)]
    pub jumps: BTreeMap<ConditionId, JumpSnapshot>,
    /// Switch branches keyed by switch id
    #[serde(default)]
    pub switches: BTreeMap<SwitchId, SwitchSnapshot>,
}

impl LineSnapshot {
    /// Create an empty snapshot for a line
    #[must_use]
    pub fn new(line_number: LineNumber) -> Self {
        Self {
            line_number,
            hits: 0,
            jumps: BTreeMap::new(),
            switches: BTreeMap::new(),
        }
    }

    /// Encode as JSON
    pub fn to_json(&self) -> CoverageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json_pretty(&self) -> CoverageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> CoverageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode in the compact binary form
    pub fn to_bytes(&self) -> CoverageResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from the compact binary form
    pub fn from_bytes(bytes: &[u8]) -> CoverageResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
