//! Relaxations: structurally independent copies of a problem.

use std::ops::{Deref, DerefMut};

use log::warn;

use crate::error::ModelResult;
use crate::function::Function;
use crate::problem::Problem;
use crate::settings::RelaxationSettings;
use crate::types::ObjectiveSense;

/// A [`Problem`] built variable-for-variable and constraint-for-constraint
/// from another problem.
///
/// Relaxation variable `i` corresponds to original variable `i` for every
/// variable that existed at construction. Variables added to the relaxation
/// afterwards (auxiliaries, cuts) have no counterpart.
///
/// The originating problem is not stored. Callers that pass a problem
/// alongside must pass the one the relaxation was built from, with no
/// variable added or deleted since; [`Relaxation::is_relaxation_of`] checks
/// the variable count.
#[derive(Debug, Clone)]
pub struct Relaxation {
    problem: Problem,
    mapped_vars: usize,
}

impl Relaxation {
    pub fn new(original: &Problem) -> ModelResult<Self> {
        Self::with_settings(original, &RelaxationSettings::default())
    }

    pub fn with_settings(original: &Problem, settings: &RelaxationSettings) -> ModelResult<Self> {
        let mut problem = Problem::new();
        problem.new_variables(original.variables());
        let n = original.num_vars();
        let map: Vec<Option<usize>> = (0..n).map(Some).collect();

        for c in original.constraints() {
            let f = clone_function(&c.function, &map, settings)?;
            problem.new_constraint_named(f, c.lb, c.ub, c.name.clone());
        }
        if let Some(o) = original.objective() {
            let f = clone_function(&o.function, &map, settings)?;
            problem.new_objective_named(f, o.constant, ObjectiveSense::Minimize, o.name.clone());
        }
        if let Some(x) = original.initial_point() {
            problem.set_initial_point(x);
        }
        Ok(Self {
            problem,
            mapped_vars: n,
        })
    }

    /// Number of variables with a counterpart in the original problem.
    pub fn mapped_vars(&self) -> usize {
        self.mapped_vars
    }

    /// True if `p` still has exactly the variables this relaxation maps.
    pub fn is_relaxation_of(&self, p: &Problem) -> bool {
        p.num_vars() == self.mapped_vars && self.problem.num_vars() >= self.mapped_vars
    }

    /// Original variable for relaxation variable `r`.
    pub fn original_var(&self, r: usize) -> Option<usize> {
        (r < self.mapped_vars).then_some(r)
    }

    /// Relaxation variable for original variable `p`.
    pub fn relaxation_var(&self, p: usize) -> Option<usize> {
        (p < self.mapped_vars).then_some(p)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    pub fn into_problem(self) -> Problem {
        self.problem
    }
}

impl Deref for Relaxation {
    type Target = Problem;

    fn deref(&self) -> &Problem {
        &self.problem
    }
}

impl DerefMut for Relaxation {
    fn deref_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }
}

/// Rebind `f` through `map`. If only the nonlinear part fails to rebind,
/// the original graph is shared when `settings` allow it.
fn clone_function(
    f: &Function,
    map: &[Option<usize>],
    settings: &RelaxationSettings,
) -> ModelResult<Function> {
    let stripped = Function::new(f.linear.clone(), f.quadratic.clone(), None);
    let mut g = stripped.clone_with_vars(map)?;
    if let Some(nlf) = &f.nonlinear {
        g.nonlinear = Some(match nlf.clone_with_vars(map) {
            Ok(n) => n,
            Err(e) if settings.share_nonlinear_on_clone_failure => {
                warn!("Relaxation: sharing nonlinear expression after rebinding failed: {}", e);
                nlf.clone()
            }
            Err(e) => return Err(e),
        });
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::function::{LinearFunction, NonlinearFunction};
    use crate::types::VariableType;

    fn bilinear_problem() -> Problem {
        let mut p = Problem::new();
        let x0 = p.new_variable(0.0, 2.0, VariableType::Continuous);
        let x1 = p.new_variable(0.0, 3.0, VariableType::Continuous);
        let y = p.new_variable(f64::NEG_INFINITY, f64::INFINITY, VariableType::Continuous);
        p.new_constraint(
            Function::from_nonlinear(
                Some(LinearFunction::from_terms([(y, 1.0)])),
                NonlinearFunction::product(-1.0, x0, x1),
            ),
            0.0,
            0.0,
        );
        p.new_objective(
            Function::from_linear(LinearFunction::from_terms([(y, 1.0)])),
            0.0,
            ObjectiveSense::Maximize,
        );
        p
    }

    #[test]
    fn test_structure_is_copied() {
        let p = bilinear_problem();
        let r = Relaxation::new(&p).unwrap();
        assert_eq!(r.num_vars(), 3);
        assert_eq!(r.num_cons(), 1);
        assert_eq!(r.constraint(0).function, p.constraint(0).function);
        assert_eq!(r.objective(), p.objective());
        assert_eq!(r.check_con_vars(), 0);
    }

    #[test]
    fn test_is_relaxation_of() {
        let mut p = bilinear_problem();
        let mut r = Relaxation::new(&p).unwrap();
        assert!(r.is_relaxation_of(&p));

        // auxiliaries in the relaxation keep the link
        r.new_variable(0.0, 1.0, VariableType::Continuous);
        assert!(r.is_relaxation_of(&p));

        p.new_variable(0.0, 1.0, VariableType::Continuous);
        assert!(!r.is_relaxation_of(&p));
    }

    #[test]
    fn test_var_mapping_stops_at_construction() {
        let p = bilinear_problem();
        let mut r = Relaxation::new(&p).unwrap();
        let extra = r.new_variable(0.0, 1.0, VariableType::Continuous);
        assert_eq!(r.original_var(1), Some(1));
        assert_eq!(r.original_var(extra), None);
        assert_eq!(r.relaxation_var(5), None);
    }

    #[test]
    fn test_bounds_are_independent() {
        let p = bilinear_problem();
        let mut r = Relaxation::new(&p).unwrap();
        r.change_bounds(0, 1.0, 1.5);
        assert_eq!(p.variable(0).ub, 2.0);
    }

    #[test]
    fn test_share_on_failure() {
        let f = Function::from_nonlinear(
            Some(LinearFunction::from_terms([(0, 1.0)])),
            NonlinearFunction::product(1.0, 0, 4),
        );
        let map = [Some(0)];
        let g = clone_function(&f, &map, &RelaxationSettings::default()).unwrap();
        let (a, b) = (g.nonlinear.unwrap(), f.nonlinear.clone().unwrap());
        assert!(a.shares_graph(&b));

        let strict = clone_function(&f, &map, &RelaxationSettings::strict());
        assert_eq!(strict, Err(ModelError::UnmappedVariable(4)));
    }
}
