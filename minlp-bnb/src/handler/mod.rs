//! Constraint handlers.
//!
//! A handler takes charge of a class of constraints of the original
//! problem. It relaxes them, checks whether a relaxation point satisfies
//! them, separates cuts, tightens bounds and proposes branches. The driver
//! calls every handler through the same [`Handler`] interface.

mod intvar;
mod linbil;
mod quad;
mod tangent;

pub use intvar::IntVarHandler;
pub use linbil::{mccormick_row, LinBil, LinSqr};
pub use quad::QuadHandler;
pub use tangent::find_lin_pt;

use minlp_core::{
    BranchDirection, Modification, Problem, Relaxation, SeparationStatus, SolveStatus,
};

use crate::search::{Branch, BrVarCand};

/// The interface between the branch-and-bound driver and a constraint class.
///
/// Variable indices in points and candidates are relaxation indices. The
/// relaxation maps its first variables one-to-one onto the original
/// problem, so handlers index both with the same numbers.
pub trait Handler {
    /// Handler name for logs.
    fn name(&self) -> &str;

    /// Constraints of the original problem that this handler relaxes
    /// itself. The driver leaves them out of the relaxation.
    fn constraints(&self) -> &[usize] {
        &[]
    }

    /// Add the relaxation of the handled constraints at the root. Returns
    /// true if the handler finds the problem infeasible.
    fn relax_init_full(&mut self, p: &Problem, rel: &mut Relaxation) -> bool;

    fn relax_init_inc(&mut self, p: &Problem, rel: &mut Relaxation) -> bool {
        self.relax_init_full(p, rel)
    }

    /// Bring the relaxation up to date with the current bounds.
    fn relax_node_full(&mut self, _p: &Problem, _rel: &mut Relaxation) -> bool {
        false
    }

    fn relax_node_inc(&mut self, _p: &Problem, _rel: &mut Relaxation) -> bool {
        false
    }

    /// True if `x` satisfies every handled constraint.
    fn is_feasible(&self, x: &[f64], p: &Problem, rel: &Relaxation) -> bool;

    /// Add cuts to `rel` that cut off `x`. Returns the status and the
    /// number of cuts added.
    fn separate(
        &mut self,
        _x: &[f64],
        _p: &Problem,
        _rel: &mut Relaxation,
    ) -> (SeparationStatus, usize) {
        (SeparationStatus::SepaNone, 0)
    }

    /// Variables whose branching would remove the violation at `x`, one
    /// candidate per variable.
    fn branching_candidates(&self, x: &[f64], p: &Problem, rel: &Relaxation) -> Vec<BrVarCand>;

    /// The children of branching on `cand` at `x`.
    fn branches(&self, cand: &BrVarCand, x: &[f64], p: &Problem, rel: &Relaxation) -> Vec<Branch>;

    /// The relaxation change of one child of `cand`, for callers that
    /// evaluate a branch before committing to it.
    fn br_mod(
        &self,
        cand: &BrVarCand,
        x: &[f64],
        rel: &Relaxation,
        dir: BranchDirection,
    ) -> Modification;

    /// Tighten the original problem before the search. Returns the outcome
    /// and whether anything changed.
    fn presolve(&mut self, _p: &mut Problem) -> (SolveStatus, bool) {
        (SolveStatus::Finished, false)
    }

    /// Tighten bounds at a node. Every change is applied and recorded in
    /// `p_mods` (original problem) or `r_mods` (relaxation) so the caller
    /// can undo it. Returns true if the node is infeasible.
    fn presolve_node(
        &mut self,
        _p: &mut Problem,
        _rel: &mut Relaxation,
        _p_mods: &mut Vec<Modification>,
        _r_mods: &mut Vec<Modification>,
    ) -> bool {
        false
    }
}
