//! Decision variables.

use std::fmt;

use crate::types::{FunctionType, VarState, VariableType};

/// A variable of a [`crate::Problem`].
///
/// `id` is assigned once and never reused; `index` is the current position
/// in the owning problem and changes when deleted variables are compacted.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Stable identifier.
    pub id: u32,
    /// Position in the owning problem.
    pub index: usize,
    /// Lower bound, may be `-inf`.
    pub lb: f64,
    /// Upper bound, may be `+inf`.
    pub ub: f64,
    /// Domain.
    pub vtype: VariableType,
    /// How the variable enters the constraints and objective.
    pub fun_type: FunctionType,
    /// Life-cycle state.
    pub state: VarState,
    /// Display name.
    pub name: String,
}

impl Variable {
    pub fn new(id: u32, index: usize, lb: f64, ub: f64, vtype: VariableType, name: String) -> Self {
        Self {
            id,
            index,
            lb,
            ub,
            vtype,
            fun_type: FunctionType::Unknown,
            state: VarState::Normal,
            name,
        }
    }

    pub fn is_fixed(&self, tol: f64) -> bool {
        (self.ub - self.lb).abs() < tol
    }

    pub fn is_free(&self) -> bool {
        self.lb == f64::NEG_INFINITY && self.ub == f64::INFINITY
    }

    pub fn is_integer(&self) -> bool {
        self.vtype.is_integer()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.vtype {
            VariableType::Binary => "bin",
            VariableType::Integer => "int",
            VariableType::ImplBin => "implbin",
            VariableType::ImplInt => "implint",
            VariableType::Continuous => "cont",
        };
        write!(f, "{} {} in [{}, {}]", kind, self.name, self.lb, self.ub)
    }
}
