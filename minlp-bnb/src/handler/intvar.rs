//! Handler for integrality of variables.

use minlp_core::settings::INT_TOL;
use minlp_core::{BoundType, BranchDirection, Modification, Problem, Relaxation, SolveStatus};

use super::Handler;
use crate::search::{Branch, BrVarCand};

/// Enforces integrality by branching on fractional variables.
#[derive(Debug, Clone)]
pub struct IntVarHandler {
    vars: Vec<usize>,
    modify_problem: bool,
    modify_relaxation: bool,
}

impl IntVarHandler {
    /// Handle every binary and integer variable of `p`.
    pub fn new(p: &Problem) -> Self {
        let vars = p
            .variables()
            .iter()
            .filter(|v| v.is_integer())
            .map(|v| v.index)
            .collect();
        Self {
            vars,
            modify_problem: true,
            modify_relaxation: true,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn fractional(val: f64) -> bool {
        (val - val.round()).abs() > INT_TOL
    }
}

/// The integer hull of `[lb, ub]`, or `None` if it holds no integer.
fn rounded(lb: f64, ub: f64) -> Option<(f64, f64)> {
    let (nlb, nub) = ((lb - INT_TOL).ceil(), (ub + INT_TOL).floor());
    (nlb <= nub).then_some((nlb.max(lb), nub.min(ub)))
}

/// Round the bounds of `v` in `p` inwards, recording the change. Returns
/// true if no integer is left.
fn round_var(p: &mut Problem, v: usize, mods: &mut Vec<Modification>) -> bool {
    let (lb, ub) = (p.variable(v).lb, p.variable(v).ub);
    let Some((nlb, nub)) = rounded(lb, ub) else {
        return true;
    };
    if nlb > lb || nub < ub {
        let mut m = Modification::var_bounds(v, nlb, nub);
        m.apply(p);
        mods.push(m);
    }
    false
}

impl Handler for IntVarHandler {
    fn name(&self) -> &str {
        "IntVarHandler"
    }

    fn relax_init_full(&mut self, _p: &Problem, _rel: &mut Relaxation) -> bool {
        false
    }

    fn is_feasible(&self, x: &[f64], _p: &Problem, _rel: &Relaxation) -> bool {
        self.vars.iter().all(|&v| !Self::fractional(x[v]))
    }

    fn branching_candidates(&self, x: &[f64], _p: &Problem, _rel: &Relaxation) -> Vec<BrVarCand> {
        self.vars
            .iter()
            .filter(|&&v| Self::fractional(x[v]))
            .map(|&v| BrVarCand::new(v, x[v] - x[v].floor(), x[v].ceil() - x[v]))
            .collect()
    }

    fn branches(&self, cand: &BrVarCand, x: &[f64], _p: &Problem, rel: &Relaxation) -> Vec<Branch> {
        let v = cand.var;
        let value = x[v];
        let mut out = Vec::with_capacity(2);
        for (lu, bound) in [(BoundType::Upper, value.floor()), (BoundType::Lower, value.ceil())] {
            let mut br = Branch::new(value);
            if self.modify_problem {
                if let Some(pv) = rel.original_var(v) {
                    br.add_p_mod(Modification::var_bound(pv, lu, bound));
                }
            }
            if self.modify_relaxation {
                br.add_r_mod(Modification::var_bound(v, lu, bound));
            }
            out.push(br);
        }
        out
    }

    fn br_mod(
        &self,
        cand: &BrVarCand,
        x: &[f64],
        _rel: &Relaxation,
        dir: BranchDirection,
    ) -> Modification {
        let value = x[cand.var];
        match dir {
            BranchDirection::DownBranch => {
                Modification::var_bound(cand.var, BoundType::Upper, value.floor())
            }
            BranchDirection::UpBranch => {
                Modification::var_bound(cand.var, BoundType::Lower, value.ceil())
            }
        }
    }

    /// Round fractional bounds of integer variables inwards.
    fn presolve(&mut self, p: &mut Problem) -> (SolveStatus, bool) {
        let mut changed = false;
        for &v in &self.vars {
            let (lb, ub) = (p.variable(v).lb, p.variable(v).ub);
            let Some((nlb, nub)) = rounded(lb, ub) else {
                log::debug!("IntVarHandler: x{} has no integer in [{}, {}]", v, lb, ub);
                return (SolveStatus::SolvedInfeasible, changed);
            };
            if nlb > lb || nub < ub {
                p.change_bounds(v, nlb, nub);
                changed = true;
            }
        }
        (SolveStatus::Finished, changed)
    }

    /// Spatial branching on other terms can leave fractional bounds on an
    /// integer variable; round them before the node is solved.
    fn presolve_node(
        &mut self,
        p: &mut Problem,
        rel: &mut Relaxation,
        p_mods: &mut Vec<Modification>,
        r_mods: &mut Vec<Modification>,
    ) -> bool {
        for &v in &self.vars {
            if self.modify_problem && round_var(p, v, p_mods) {
                return true;
            }
            if self.modify_relaxation {
                if let Some(r) = rel.relaxation_var(v) {
                    if round_var(rel.problem_mut(), r, r_mods) {
                        return true;
                    }
                }
            }
        }
        false
    }
}
