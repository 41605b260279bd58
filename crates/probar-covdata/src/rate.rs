//! Coverage ratio arithmetic shared by lines and branches.

/// Tolerance used when deciding whether a branch rate counts as 100%.
///
/// Absorbs floating-point rounding in `covered / valid`; it is not a
/// partial-coverage allowance.
pub const FULL_COVERAGE_EPSILON: f64 = 1e-4;

/// Branch coverage ratio, `1.0` when there is nothing to cover
#[inline]
#[must_use]
pub fn branch_rate(covered: usize, valid: usize) -> f64 {
    if valid == 0 {
        return 1.0;
    }
    covered as f64 / valid as f64
}

/// Line coverage is binary: any hit covers the line
#[inline]
#[must_use]
pub const fn line_rate(hits: u64) -> f64 {
    if hits > 0 {
        1.0
    } else {
        0.0
    }
}

/// Whether a branch rate is within [`FULL_COVERAGE_EPSILON`] of 1.0
#[inline]
#[must_use]
pub fn is_fully_covered(rate: f64) -> bool {
    1.0 - rate < FULL_COVERAGE_EPSILON
}
