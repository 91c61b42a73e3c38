//! The interface to external LP/NLP/QP solvers.

use crate::constraint::Constraint;
use crate::function::{Function, LinearFunction};
use crate::problem::Problem;
use crate::solution::Solution;
use crate::types::{BoundType, EngineStatus};

/// An external solver.
///
/// While an engine is attached to a [`Problem`], the problem forwards every
/// change it is still allowed to make through these hooks so that both
/// representations stay in sync. The hooks default to no-ops for engines
/// that reload the whole problem on every solve.
pub trait Engine {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Solve `problem` and remember the resulting point.
    fn solve(&mut self, problem: &Problem) -> EngineStatus;

    /// The point found by the last successful [`Engine::solve`].
    fn solution(&self) -> Option<&Solution>;

    fn add_constraint(&mut self, _con: &Constraint) {}

    fn change_var_bound(&mut self, _index: usize, _lu: BoundType, _value: f64) {}

    fn change_var_bounds(&mut self, _index: usize, _lb: f64, _ub: f64) {}

    fn change_cons_bound(&mut self, _index: usize, _lu: BoundType, _value: f64) {}

    /// Called before the problem replaces the linear part and bounds of
    /// `con`, so `con` still holds the old data.
    fn change_constraint(&mut self, _con: &Constraint, _lf: &LinearFunction, _lb: f64, _ub: f64) {}

    fn change_obj(&mut self, _f: &Function, _constant: f64) {}

    /// Called with the constraints about to be removed, before the problem
    /// forgets them.
    fn remove_cons(&mut self, _cons: &[&Constraint]) {}

    fn negate_obj(&mut self) {}

    /// Drop any loaded problem.
    fn clear(&mut self) {}
}
