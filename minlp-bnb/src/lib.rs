//! Spatial branch-and-bound for nonconvex mixed-integer QCQPs.
//!
//! Quadratic terms enter the problem as auxiliary relations `y = x^2` and
//! `y = x0 * x1`. A [`QuadHandler`] relaxes them with secants, tangent cuts
//! and McCormick envelopes, tightens bounds around them, and proposes
//! branching variables when the relaxation point violates them.
//! [`IntVarHandler`] does the same for integrality. [`BranchAndBound`]
//! drives any set of [`Handler`]s with an external LP [`minlp_core::Engine`].
//!
//! # Example
//!
//! ```ignore
//! use minlp_bnb::{BnbSettings, BranchAndBound, QuadSettings};
//!
//! // y = x0 * x1 with x0 in [0, 2], x1 in [0, 3]; minimize -y
//! let mut bnb = BranchAndBound::with_default_handlers(problem, QuadSettings::default(), BnbSettings::default());
//! let sol = bnb.solve(&mut engine)?;
//! println!("Status: {} obj: {}", sol.status, sol.obj_val);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod handler;
pub mod search;
pub mod settings;
pub mod solution;

pub use error::{BnbError, BnbResult};
pub use handler::{Handler, IntVarHandler, LinBil, LinSqr, QuadHandler};
pub use search::{Branch, BranchAndBound, BrVarCand, MaxVioBrancher, NodeQueue, SearchNode};
pub use settings::{BnbSettings, QuadSettings};
pub use solution::{BnbSolution, BnbStatus, IncumbentTracker, TreeStats};
