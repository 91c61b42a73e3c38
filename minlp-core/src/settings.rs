//! Configuration of relaxation construction and problem classification.
//!
//! Numerical tolerances are fixed constants; only structural choices are
//! exposed as settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute feasibility tolerance.
pub const ABS_TOL: f64 = 1e-5;

/// Relative feasibility tolerance.
pub const REL_TOL: f64 = 1e-4;

/// Width at which the golden-section search for a tangent point stops.
pub const GOLDEN_STOP: f64 = 1e-4;

/// Ratio used by the golden-section search.
pub const GOLDEN_RATIO: f64 = 0.618;

/// A variable whose bounds are closer than this is counted as fixed.
pub const FIXED_VAR_TOL: f64 = 1e-9;

/// Integrality tolerance.
pub const INT_TOL: f64 = 1e-6;

/// Settings used when a [`crate::Relaxation`] is built from a problem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelaxationSettings {
    /// Share the original nonlinear expression when rebinding its variables
    /// fails. When false the failure is returned as an error.
    pub share_nonlinear_on_clone_failure: bool,
}

impl Default for RelaxationSettings {
    fn default() -> Self {
        Self {
            share_nonlinear_on_clone_failure: true,
        }
    }
}

impl RelaxationSettings {
    /// Refuse to share expressions that cannot be rebound.
    pub fn strict() -> Self {
        Self {
            share_nonlinear_on_clone_failure: false,
        }
    }
}

/// Settings for [`crate::Problem::find_type`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifySettings {
    /// Report POLYP/MIPOLYP for problems whose every function has a finite
    /// polynomial degree. Off by default, in which case such problems are
    /// reported as NLP/MINLP.
    pub detect_polynomial: bool,
}

impl ClassifySettings {
    /// Enable POLYP detection.
    pub fn with_polynomial_detection(mut self) -> Self {
        self.detect_polynomial = true;
        self
    }
}
