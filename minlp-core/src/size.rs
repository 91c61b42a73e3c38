//! Cached counts that drive problem classification.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::FunctionType;

/// Summary of a problem, recomputed lazily by
/// [`crate::Problem::calculate_size`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProblemSize {
    pub vars: usize,
    pub cons: usize,
    pub objs: usize,
    pub bins: usize,
    pub ints: usize,
    pub conts: usize,
    pub fixed: usize,
    /// Constant constraints are counted as linear.
    pub lin_cons: usize,
    pub bilin_cons: usize,
    pub multilin_cons: usize,
    pub quad_cons: usize,
    pub nonlin_cons: usize,
    pub cons_with_lin: usize,
    pub cons_with_bilin: usize,
    pub cons_with_multilin: usize,
    pub cons_with_quad: usize,
    pub cons_with_nonlin: usize,
    pub lin_terms: usize,
    pub multilin_terms: usize,
    pub quad_terms: usize,
    pub obj_lin_terms: usize,
    pub obj_quad_terms: usize,
    pub obj_type: FunctionType,
}

impl Default for ProblemSize {
    fn default() -> Self {
        Self {
            vars: 0,
            cons: 0,
            objs: 0,
            bins: 0,
            ints: 0,
            conts: 0,
            fixed: 0,
            lin_cons: 0,
            bilin_cons: 0,
            multilin_cons: 0,
            quad_cons: 0,
            nonlin_cons: 0,
            cons_with_lin: 0,
            cons_with_bilin: 0,
            cons_with_multilin: 0,
            cons_with_quad: 0,
            cons_with_nonlin: 0,
            lin_terms: 0,
            multilin_terms: 0,
            quad_terms: 0,
            obj_lin_terms: 0,
            obj_quad_terms: 0,
            obj_type: FunctionType::Constant,
        }
    }
}

impl ProblemSize {
    pub fn num_integers(&self) -> usize {
        self.bins + self.ints
    }
}

impl fmt::Display for ProblemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem size:")?;
        let rows: [(&str, usize); 22] = [
            ("variables", self.vars),
            ("binary variables", self.bins),
            ("general integer variables", self.ints),
            ("continuous variables", self.conts),
            ("fixed variables", self.fixed),
            ("constraints", self.cons),
            ("linear constraints", self.lin_cons),
            ("bilinear constraints", self.bilin_cons),
            ("multilinear constraints", self.multilin_cons),
            ("quadratic constraints", self.quad_cons),
            ("nonlinear constraints", self.nonlin_cons),
            ("constraints with linear terms", self.cons_with_lin),
            ("constraints with bilinear terms", self.cons_with_bilin),
            ("constraints with multilinear terms", self.cons_with_multilin),
            ("constraints with quadratic terms", self.cons_with_quad),
            ("constraints with nonlinear terms", self.cons_with_nonlin),
            ("linear terms in constraints", self.lin_terms),
            ("multilinear terms in constraints", self.multilin_terms),
            ("quadratic terms in constraints", self.quad_terms),
            ("objectives", self.objs),
            ("linear terms in objective", self.obj_lin_terms),
            ("quadratic terms in objective", self.obj_quad_terms),
        ];
        for (what, n) in rows {
            writeln!(f, " Number of {} = {}", what, n)?;
        }
        writeln!(f, " Type of objective = {}", self.obj_type)
    }
}
