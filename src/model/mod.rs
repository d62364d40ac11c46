//! Local polynomial models fit on a single box.

mod chebyshev;

pub use chebyshev::ChebyshevBasis;
pub(crate) use chebyshev::evaluate_in_box;

use crate::config::ErrorCriterion;

/// Worst-case deviation between a target function and its local model on the test grid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorEstimate {
    /// Largest absolute deviation over all test points.
    pub max_abs_error: f64,

    /// Largest relative deviation over test points where the target exceeds
    /// [`NOISE_FLOOR`][crate::constants::NOISE_FLOOR] in magnitude.
    pub max_rel_error: f64,

    /// Largest absolute deviation over the remaining, near-zero test points.
    pub max_near_zero_error: f64,
}

impl ErrorEstimate {
    pub(crate) fn infinite() -> Self {
        Self {
            max_abs_error: f64::INFINITY,
            max_rel_error: f64::INFINITY,
            max_near_zero_error: f64::INFINITY,
        }
    }

    /// Returns `true` if this estimate is acceptable under `criterion` at `tolerance`.
    ///
    /// With [`ErrorCriterion::Relative`], points where the target is near zero are held to
    /// `tolerance` in absolute terms instead, so a box that is zero throughout is judged on
    /// absolute error alone.
    pub fn satisfies(&self, criterion: ErrorCriterion, tolerance: f64) -> bool {
        match criterion {
            ErrorCriterion::Relative => {
                self.max_rel_error <= tolerance && self.max_near_zero_error <= tolerance
            }
            ErrorCriterion::Absolute => self.max_abs_error <= tolerance,
        }
    }
}
