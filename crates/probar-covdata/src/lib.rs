//! Probar Coverage Data: Concurrent Line and Branch Counters
//!
//! Runtime store behind instrumented code. Every instrumented line owns a
//! [`LineRecord`] that counts line hits plus the outcomes of its jumps and
//! switches. Records are updated from many threads at once and later merged
//! with records from other runs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  PROBAR COVERAGE DATA                                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Instrumented code ──touch/touch_jump/touch_switch──► LineRecord│
//! │                                                        │        │
//! │         ┌──────────────────────┬───────────────────────┤        │
//! │         ▼                      ▼                       ▼        │
//! │   hits (record lock)   JumpRecord atomics   SwitchRecord atomics│
//! │                                                                 │
//! │  Report layer ──merge/equals──► lock_both (try both or neither) │
//! │  Storage layer ◄──snapshot/from_snapshot──► LineSnapshot        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use probar_covdata::{ConditionId, JumpRecord, LineNumber, LineRecord};
//!
//! let line = LineRecord::new(LineNumber::new(42));
//! let _ = line.register_jump(JumpRecord::new(ConditionId::new(0)));
//!
//! line.touch(1);
//! line.touch_jump(ConditionId::new(0), true, 1).unwrap();
//!
//! assert_eq!(line.branch_coverage_rate(), 0.5);
//! assert!(!line.is_covered());
//! ```

#![warn(missing_docs)]

mod branch;
mod config;
mod ids;
mod line;
pub mod pair_lock;
pub mod rate;
mod result;
mod snapshot;

pub use branch::{BranchCoverage, CaseIndex, JumpRecord, SwitchRecord};
pub use config::{PairLockConfig, PairLockConfigBuilder};
pub use ids::{BranchRef, ConditionId, LineNumber, SwitchId};
pub use line::{LineCoverage, LineRecord};
pub use result::{CoverageError, CoverageResult};
pub use snapshot::{JumpSnapshot, LineSnapshot, SwitchSnapshot};
