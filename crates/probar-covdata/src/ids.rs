//! Type-Safe Coverage Identifiers (Poka-Yoke)
//!
//! Line numbers, jump condition ids and switch ids are all plain integers in
//! the instrumentation metadata. Wrapping them keeps a condition id from
//! being passed where a switch id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source line number, the identity key of a `LineRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineNumber(u32);

impl LineNumber {
    /// Create a new line number
    #[inline]
    #[must_use]
    pub const fn new(line: u32) -> Self {
        Self(line)
    }

    /// Get the inner value
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a two-outcome jump assigned by the instrumenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(u32);

impl ConditionId {
    /// Create a new condition id
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an N-outcome switch assigned by the instrumenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(u32);

impl SwitchId {
    /// Create a new switch id
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a branch on a line, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchRef {
    /// A jump branch
    Jump(ConditionId),
    /// A switch branch
    Switch(SwitchId),
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jump(id) => write!(f, "jump {id}"),
            Self::Switch(id) => write!(f, "switch {id}"),
        }
    }
}
