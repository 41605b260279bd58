//! Result and error types for coverage data.

use crate::ids::{BranchRef, LineNumber, SwitchId};
use thiserror::Error;

/// Result type for coverage data operations
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Errors that can occur while recording or restoring coverage data
#[derive(Debug, Error)]
pub enum CoverageError {
    /// A touch referenced a branch that was never registered on the line.
    ///
    /// The instrumentation metadata and the executing code disagree, so the
    /// counters for this line can no longer be trusted.
    #[error("No instrument data for line {line} {branch}")]
    MissingInstrumentation {
        /// Line that received the touch
        line: LineNumber,
        /// Branch the caller tried to touch
        branch: BranchRef,
    },

    /// A switch touch selected a case slot the switch does not have
    #[error("Switch {switch} has {cases} cases, case {case} is out of range")]
    CaseOutOfRange {
        /// Switch that received the touch
        switch: SwitchId,
        /// Requested case index
        case: u32,
        /// Number of non-default cases on the switch
        cases: u32,
    },

    /// A stored snapshot is internally inconsistent
    #[error("Corrupt snapshot for line {line}: {message}")]
    CorruptSnapshot {
        /// Line the snapshot describes
        line: LineNumber,
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encoding error
    #[error("Binary encoding error: {0}")]
    Binary(#[from] bincode::Error),
}

impl CoverageError {
    /// Whether this error means instrumentation and runtime are out of sync.
    ///
    /// These faults are never retried at this layer.
    #[must_use]
    pub const fn is_instrumentation_fault(&self) -> bool {
        matches!(
            self,
            Self::MissingInstrumentation { .. } | Self::CaseOutOfRange { .. }
        )
    }
}
