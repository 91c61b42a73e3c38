//! Functions of constraints and objectives: a sum of an optional linear,
//! quadratic and general nonlinear part.

mod linear;
mod nonlinear;
mod quadratic;

use std::collections::BTreeSet;
use std::fmt;

pub use linear::LinearFunction;
pub use nonlinear::{Expr, NonlinearFunction};
pub use quadratic::QuadraticFunction;

use crate::error::ModelResult;
use crate::types::FunctionType;

/// `linear(x) + quadratic(x) + nonlinear(x)`, each part optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Function {
    /// Linear part.
    pub linear: Option<LinearFunction>,
    /// Quadratic part.
    pub quadratic: Option<QuadraticFunction>,
    /// General nonlinear part.
    pub nonlinear: Option<NonlinearFunction>,
}

impl Function {
    pub fn new(
        linear: Option<LinearFunction>,
        quadratic: Option<QuadraticFunction>,
        nonlinear: Option<NonlinearFunction>,
    ) -> Self {
        Self {
            linear,
            quadratic,
            nonlinear,
        }
    }

    pub fn from_linear(lf: LinearFunction) -> Self {
        Self::new(Some(lf), None, None)
    }

    pub fn from_quadratic(lf: Option<LinearFunction>, qf: QuadraticFunction) -> Self {
        Self::new(lf, Some(qf), None)
    }

    pub fn from_nonlinear(lf: Option<LinearFunction>, nlf: NonlinearFunction) -> Self {
        Self::new(lf, None, Some(nlf))
    }

    /// Largest type among the parts.
    pub fn function_type(&self) -> FunctionType {
        let mut t = FunctionType::Constant;
        if let Some(lf) = &self.linear {
            if !lf.is_empty() {
                t = t.add(FunctionType::Linear);
            }
        }
        if let Some(qf) = &self.quadratic {
            t = t.add(qf.function_type());
        }
        if let Some(nlf) = &self.nonlinear {
            t = t.add(nlf.function_type());
        }
        t
    }

    /// Every variable referenced by any part, in increasing order.
    pub fn vars(&self) -> BTreeSet<usize> {
        let mut s = BTreeSet::new();
        if let Some(lf) = &self.linear {
            s.extend(lf.vars());
        }
        if let Some(qf) = &self.quadratic {
            s.extend(qf.vars());
        }
        if let Some(nlf) = &self.nonlinear {
            s.extend(nlf.vars());
        }
        s
    }

    pub fn has_var(&self, v: usize) -> bool {
        self.linear.as_ref().is_some_and(|lf| lf.has_var(v))
            || self.quadratic.as_ref().is_some_and(|qf| qf.has_var(v))
            || self.nonlinear.as_ref().is_some_and(|nlf| nlf.has_var(v))
    }

    /// How `v` enters this function.
    pub fn var_fun_type(&self, v: usize) -> FunctionType {
        let mut t = FunctionType::Constant;
        if self.linear.as_ref().is_some_and(|lf| lf.has_var(v)) {
            t = FunctionType::Linear;
        }
        if let Some(qf) = &self.quadratic {
            t = t.add(qf.var_fun_type(v));
        }
        if let Some(nlf) = &self.nonlinear {
            if nlf.has_var(v) {
                t = t.add(nlf.function_type().max(FunctionType::Linear));
            }
        }
        t
    }

    pub fn num_linear_terms(&self) -> usize {
        self.linear.as_ref().map_or(0, LinearFunction::num_terms)
    }

    pub fn num_quadratic_terms(&self) -> usize {
        self.quadratic.as_ref().map_or(0, QuadraticFunction::num_terms)
    }

    pub fn eval(&self, x: &[f64]) -> ModelResult<f64> {
        let mut v = 0.0;
        if let Some(lf) = &self.linear {
            v += lf.eval(x);
        }
        if let Some(qf) = &self.quadratic {
            v += qf.eval(x);
        }
        if let Some(nlf) = &self.nonlinear {
            v += nlf.eval(x)?;
        }
        Ok(v)
    }

    /// Copy with variables renumbered through `map`. The nonlinear part
    /// is rebuilt and may fail; linear and quadratic parts must map.
    pub fn clone_with_vars(&self, map: &[Option<usize>]) -> ModelResult<Function> {
        let linear = match &self.linear {
            Some(lf) => Some(remap_or_fail(lf.remap(map), lf.vars(), map)?),
            None => None,
        };
        let quadratic = match &self.quadratic {
            Some(qf) => Some(remap_or_fail(qf.remap(map), qf.vars(), map)?),
            None => None,
        };
        let nonlinear = match &self.nonlinear {
            Some(nlf) => Some(nlf.clone_with_vars(map)?),
            None => None,
        };
        Ok(Function::new(linear, quadratic, nonlinear))
    }

    /// Fix `x_v = val` in every part. Returns the constant the variable
    /// contributed, which the caller folds into bounds.
    pub fn del_fixed_var(&mut self, v: usize, val: f64) -> f64 {
        let mut c = 0.0;
        if let Some(lf) = &mut self.linear {
            c += lf.remove_var(v, val);
        }
        if let Some(qf) = &mut self.quadratic {
            let lf = self.linear.get_or_insert_with(LinearFunction::new);
            c += qf.remove_var(v, val, lf);
            if qf.is_empty() {
                self.quadratic = None;
            }
        }
        if let Some(nlf) = &mut self.nonlinear {
            if nlf.has_var(v) {
                nlf.fix_var(v, val);
                if let Some(k) = nlf.as_constant() {
                    c += k;
                    self.nonlinear = None;
                }
            }
        }
        c
    }

    /// Replace `x_out` by `ratio * x_in`. Returns true if `x_in` still
    /// appears afterwards.
    pub fn subst(&mut self, out: usize, inn: usize, ratio: f64) -> bool {
        if let Some(lf) = &mut self.linear {
            lf.subst(out, inn, ratio);
        }
        if let Some(qf) = &mut self.quadratic {
            qf.subst(out, inn, ratio);
        }
        if let Some(nlf) = &mut self.nonlinear {
            nlf.subst(out, inn, ratio);
        }
        self.has_var(inn)
    }

    /// `self += lf`.
    pub fn add_linear(&mut self, lf: &LinearFunction) {
        self.linear.get_or_insert_with(LinearFunction::new).add(lf);
    }

    /// `self *= -1`.
    pub fn negate(&mut self) {
        if let Some(lf) = &mut self.linear {
            lf.scale(-1.0);
        }
        if let Some(qf) = &mut self.quadratic {
            qf.scale(-1.0);
        }
        if let Some(nlf) = &mut self.nonlinear {
            *nlf = NonlinearFunction::new(Expr::neg(nlf.root().clone()));
        }
    }
}

fn remap_or_fail<T>(
    mapped: Option<T>,
    vars: impl IntoIterator<Item = usize>,
    map: &[Option<usize>],
) -> ModelResult<T> {
    match mapped {
        Some(t) => Ok(t),
        None => {
            let v = vars
                .into_iter()
                .find(|&v| map.get(v).copied().flatten().is_none())
                .unwrap_or(0);
            Err(crate::error::ModelError::UnmappedVariable(v))
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(lf) = &self.linear {
            if !lf.is_empty() {
                parts.push(lf.to_string());
            }
        }
        if let Some(qf) = &self.quadratic {
            if !qf.is_empty() {
                parts.push(qf.to_string());
            }
        }
        if let Some(nlf) = &self.nonlinear {
            parts.push(nlf.to_string());
        }
        if parts.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", parts.join(" + "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bilinear_row() -> Function {
        // y - x0*x1 with y = x2
        Function::from_nonlinear(
            Some(LinearFunction::from_terms([(2, 1.0)])),
            NonlinearFunction::product(-1.0, 0, 1),
        )
    }

    #[test]
    fn test_function_type() {
        let f = bilinear_row();
        assert_eq!(f.function_type(), FunctionType::Bilinear);
        assert_eq!(f.var_fun_type(2), FunctionType::Linear);
        assert_eq!(f.var_fun_type(0), FunctionType::Bilinear);
        assert_eq!(f.var_fun_type(5), FunctionType::Constant);
        assert_eq!(Function::default().function_type(), FunctionType::Constant);
    }

    #[test]
    fn test_eval() {
        let f = bilinear_row();
        assert_eq!(f.eval(&[2.0, 3.0, 6.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_del_fixed_var() {
        let mut f = bilinear_row();
        assert_eq!(f.del_fixed_var(0, 2.0), 0.0);
        assert_eq!(f.function_type(), FunctionType::Linear);
        assert_eq!(f.del_fixed_var(1, 3.0), -6.0);
        assert!(f.nonlinear.is_none());
        assert_eq!(f.vars().into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_del_fixed_var_quadratic() {
        let mut f = Function::from_quadratic(None, QuadraticFunction::from_terms([(0, 0, 1.0)]));
        assert_eq!(f.del_fixed_var(0, 3.0), 9.0);
        assert!(f.quadratic.is_none());
    }

    #[test]
    fn test_subst_stayin() {
        let mut f = Function::from_linear(LinearFunction::from_terms([(0, 1.0), (1, 1.0)]));
        assert!(!f.subst(0, 1, -1.0));
        assert!(!f.has_var(1));
        assert!(!f.has_var(0));
        let mut g = Function::from_linear(LinearFunction::from_terms([(0, 1.0), (1, 1.0)]));
        assert!(g.subst(0, 1, 1.0));
        assert_eq!(g.num_linear_terms(), 1);
    }

    #[test]
    fn test_clone_with_vars_reports_unmapped() {
        let f = bilinear_row();
        assert!(f.clone_with_vars(&[Some(0), Some(1), Some(2)]).is_ok());
        assert!(f.clone_with_vars(&[Some(0), Some(1)]).is_err());
    }
}
