//! Objective functions. Always minimized internally.

use std::fmt;

use crate::function::Function;
use crate::types::{FunctionType, ObjectiveSense};

/// `minimize f(x) + constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Objective function without the constant.
    pub function: Function,
    /// Constant offset.
    pub constant: f64,
    /// Always [`ObjectiveSense::Minimize`]; maximization is negated on entry.
    pub sense: ObjectiveSense,
    /// Display name.
    pub name: String,
}

impl Objective {
    pub fn function_type(&self) -> FunctionType {
        self.function.function_type()
    }

    /// `f(x) + constant`; nonlinear evaluation errors yield `NaN`.
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.function.eval(x).map_or(f64::NAN, |v| v + self.constant)
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min {}: {}", self.name, self.function)?;
        if self.constant != 0.0 {
            write!(f, " + {}", self.constant)?;
        }
        Ok(())
    }
}
