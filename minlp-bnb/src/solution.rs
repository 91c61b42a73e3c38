//! Branch-and-bound results.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a branch-and-bound solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BnbStatus {
    /// Every open node was resolved and the incumbent is optimal.
    Optimal,

    /// Every open node was resolved without a feasible point.
    Infeasible,

    /// Node limit reached, best solution returned.
    NodeLimit,

    /// Time limit reached, best solution returned.
    TimeLimit,

    /// Gap limit reached (solution within gap_tol of optimal).
    GapLimit,

    /// The tree is exhausted, but some nodes were dropped without a usable
    /// relaxation and their bound is below the incumbent.
    NumericalError,
}

impl BnbStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BnbStatus::Optimal => "optimal",
            BnbStatus::Infeasible => "infeasible",
            BnbStatus::NodeLimit => "node limit",
            BnbStatus::TimeLimit => "time limit",
            BnbStatus::GapLimit => "gap limit",
            BnbStatus::NumericalError => "numerical error",
        }
    }

    /// Returns true if optimality was proven.
    pub fn is_optimal(self) -> bool {
        matches!(self, BnbStatus::Optimal | BnbStatus::GapLimit)
    }
}

impl fmt::Display for BnbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected during the search.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeStats {
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    /// Nodes dropped because the engine gave no usable answer or no
    /// handler could branch.
    pub nodes_unresolved: u64,
    pub nodes_open: u64,
    pub cuts_added: u64,
    pub incumbent_updates: u64,
    pub elapsed_ms: u64,
}

/// Result of a branch-and-bound solve.
///
/// Objective values are in the minimization form the problem stores, so a
/// maximization problem reports the negated objective.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BnbSolution {
    pub status: BnbStatus,

    /// Best point found, indexed like the original problem. Empty without
    /// an incumbent.
    pub x: Vec<f64>,

    /// Objective value of `x` (primal bound).
    pub obj_val: f64,

    /// Lower bound on the optimal value.
    pub bound: f64,

    /// Relative optimality gap: |obj_val - bound| / |obj_val|.
    pub gap: f64,

    pub stats: TreeStats,
}

impl Default for BnbSolution {
    fn default() -> Self {
        Self {
            status: BnbStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::INFINITY,
            bound: f64::INFINITY,
            gap: f64::INFINITY,
            stats: TreeStats::default(),
        }
    }
}

impl BnbSolution {
    /// Returns true if a feasible point was found.
    pub fn has_solution(&self) -> bool {
        !self.x.is_empty()
    }

    /// Compute relative gap.
    pub fn compute_gap(primal: f64, dual: f64) -> f64 {
        if primal.is_infinite() || dual.is_infinite() {
            return f64::INFINITY;
        }
        let denom = primal.abs().max(1e-10);
        (primal - dual).abs() / denom
    }
}

/// Tracks the best known feasible solution (incumbent).
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    pub solution: Option<Vec<f64>>,

    /// Objective value of the incumbent, +inf before the first one.
    pub obj_val: f64,

    pub update_count: u64,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentTracker {
    pub fn new() -> Self {
        Self {
            solution: None,
            obj_val: f64::INFINITY,
            update_count: 0,
        }
    }

    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Accept `x` if it is strictly better. Returns true if it was.
    pub fn update(&mut self, x: &[f64], obj: f64) -> bool {
        if obj < self.obj_val - 1e-9 {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
            true
        } else {
            false
        }
    }

    pub fn gap(&self, dual_bound: f64) -> f64 {
        BnbSolution::compute_gap(self.obj_val, dual_bound)
    }
}
