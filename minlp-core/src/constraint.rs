//! Constraints `lb <= f(x) <= ub`.

use std::fmt;

use crate::function::{Function, LinearFunction};
use crate::types::{ConsState, FunctionType};

/// A constraint of a [`crate::Problem`]. `lb == ub` is an equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Stable identifier.
    pub id: u32,
    /// Position in the owning problem.
    pub index: usize,
    /// The constrained function.
    pub function: Function,
    /// Lower bound, may be `-inf`.
    pub lb: f64,
    /// Upper bound, may be `+inf`.
    pub ub: f64,
    /// Life-cycle state.
    pub state: ConsState,
    /// Display name.
    pub name: String,
}

impl Constraint {
    pub fn function_type(&self) -> FunctionType {
        self.function.function_type()
    }

    pub fn linear(&self) -> Option<&LinearFunction> {
        self.function.linear.as_ref()
    }

    pub fn is_equality(&self) -> bool {
        self.lb == self.ub
    }

    /// Activity `f(x)`; nonlinear evaluation errors yield `NaN`.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.function.eval(x).unwrap_or(f64::NAN)
    }

    /// Amount by which `x` violates the bounds (zero when satisfied).
    pub fn violation(&self, x: &[f64]) -> f64 {
        let a = self.activity(x);
        if a.is_nan() {
            return f64::INFINITY;
        }
        (self.lb - a).max(a - self.ub).max(0.0)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        if self.lb > f64::NEG_INFINITY && self.lb != self.ub {
            write!(f, "{} <= ", self.lb)?;
        }
        write!(f, "{}", self.function)?;
        if self.lb == self.ub {
            write!(f, " = {}", self.ub)
        } else if self.ub < f64::INFINITY {
            write!(f, " <= {}", self.ub)
        } else {
            Ok(())
        }
    }
}
