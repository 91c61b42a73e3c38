//! Choice of the branching variable.

use minlp_core::Relaxation;

use super::BrVarCand;

/// Distance from a bound under which a variable is not branched on.
const BOUND_TOL: f64 = 1e-8;

/// A candidate together with the handler that proposed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchChoice {
    /// Position of the handler in the driver's handler list.
    pub handler: usize,
    pub cand: BrVarCand,
}

/// Picks the candidate with the largest [`BrVarCand::score`].
///
/// Candidates at (or within a hair of) a bound of the relaxation are
/// skipped, since splitting there would leave an empty side. Ties keep the
/// earliest candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxVioBrancher;

impl MaxVioBrancher {
    pub fn new() -> Self {
        Self
    }

    pub fn select<I>(&self, cands: I, x: &[f64], rel: &Relaxation) -> Option<BranchChoice>
    where
        I: IntoIterator<Item = (usize, BrVarCand)>,
    {
        let mut best: Option<BranchChoice> = None;
        for (handler, cand) in cands {
            let var = rel.variable(cand.var);
            let val = x[cand.var];
            if val <= var.lb + BOUND_TOL || val >= var.ub - BOUND_TOL {
                log::debug!("MaxVio: skipping x{} = {} at its bounds", cand.var, val);
                continue;
            }
            if best.map_or(true, |b| cand.score() > b.cand.score()) {
                best = Some(BranchChoice { handler, cand });
            }
        }
        if let Some(b) = &best {
            log::debug!("MaxVio: branching on x{} with score {}", b.cand.var, b.cand.score());
        }
        best
    }
}
