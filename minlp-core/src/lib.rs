//! Problem data model for a spatial branch-and-bound MINLP solver.
//!
//! A [`Problem`] owns variables, constraints and an objective, referenced
//! by dense indices. A [`Relaxation`] is an independent copy of a problem
//! that handlers tighten with envelope rows and cuts. [`Modification`]s
//! record reversible changes made while branching.

pub mod constraint;
pub mod engine;
pub mod error;
pub mod function;
pub mod incidence;
pub mod interval;
pub mod jacobian;
pub mod modification;
pub mod objective;
pub mod problem;
pub mod relaxation;
pub mod settings;
pub mod size;
pub mod solution;
pub mod types;
pub mod variable;

pub use constraint::Constraint;
pub use engine::Engine;
pub use error::{ModelError, ModelResult};
pub use function::{Expr, Function, LinearFunction, NonlinearFunction, QuadraticFunction};
pub use jacobian::Jacobian;
pub use modification::Modification;
pub use objective::Objective;
pub use problem::Problem;
pub use relaxation::Relaxation;
pub use settings::{ClassifySettings, RelaxationSettings};
pub use size::ProblemSize;
pub use solution::Solution;
pub use types::*;
pub use variable::Variable;
