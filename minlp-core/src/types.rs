//! Tags and status enums shared by the model, the handlers and the search.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classes of problems, from the tightest to the most general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProblemType {
    Lp,
    Milp,
    Qp,
    Miqp,
    Qcqp,
    Miqcqp,
    Polyp,
    Mipolyp,
    Nlp,
    Minlp,
    Unknown,
}

impl ProblemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemType::Lp => "LP",
            ProblemType::Milp => "MILP",
            ProblemType::Qp => "QP",
            ProblemType::Miqp => "MIQP",
            ProblemType::Qcqp => "QCQP",
            ProblemType::Miqcqp => "MIQCQP",
            ProblemType::Polyp => "POLYP",
            ProblemType::Mipolyp => "MIPOLYP",
            ProblemType::Nlp => "NLP",
            ProblemType::Minlp => "MINLP",
            ProblemType::Unknown => "UnknownProblem",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a function (or a variable inside a function) behaves algebraically.
///
/// The declaration order is the severity order used when parts of a function
/// are combined: `Constant < Linear < Bilinear < Multilinear < Quadratic <
/// Nonlinear < Polynomial < Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FunctionType {
    Constant,
    Linear,
    Bilinear,
    Multilinear,
    Quadratic,
    Nonlinear,
    Polynomial,
    Unknown,
}

impl FunctionType {
    /// Type of `f1 + f2`.
    pub fn add(self, other: FunctionType) -> FunctionType {
        self.max(other)
    }

    /// Type of `f1 * f2`.
    pub fn mult(self, other: FunctionType) -> FunctionType {
        use FunctionType::*;
        match (self, other) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Constant, t) | (t, Constant) => t,
            (Nonlinear, _) | (_, Nonlinear) => Nonlinear,
            (Linear, Linear) => Quadratic,
            (Linear, Bilinear) | (Bilinear, Linear) => Multilinear,
            (Linear, Multilinear) | (Multilinear, Linear) => Multilinear,
            _ => Polynomial,
        }
    }

    /// True for types that have a finite polynomial degree.
    pub fn is_polynomial(self) -> bool {
        !matches!(self, FunctionType::Nonlinear | FunctionType::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionType::Constant => "constant",
            FunctionType::Linear => "linear",
            FunctionType::Bilinear => "bilinear",
            FunctionType::Multilinear => "multilinear",
            FunctionType::Quadratic => "quadratic",
            FunctionType::Nonlinear => "nonlinear",
            FunctionType::Polynomial => "polynomial",
            FunctionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableType {
    /// Constrained to {0, 1}.
    Binary,
    /// Constrained to the integers.
    Integer,
    /// Continuous, but only takes binary values at any feasible point.
    ImplBin,
    /// Continuous, but only takes integer values at any feasible point.
    ImplInt,
    Continuous,
}

impl VariableType {
    pub fn is_integer(self) -> bool {
        matches!(self, VariableType::Binary | VariableType::Integer)
    }
}

/// Which side of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundType {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VarState {
    Normal,
    /// Marked for deletion by `Problem::mark_delete_var`.
    DeletedVar,
    Fixed,
    /// No finite bounds.
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConsState {
    Normal,
    /// Marked for deletion by `Problem::mark_delete_cons`.
    DeletedCons,
    /// No finite bounds, hence redundant.
    Free,
}

/// Objective sense as given by the caller. Internally everything minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// States of an algorithm (presolve, branch-and-bound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveStatus {
    NotStarted,
    Started,
    Restarted,
    SolvedOptimal,
    SolvedInfeasible,
    SolvedUnbounded,
    SolvedGapLimit,
    SolvedSolsLimit,
    IterationLimitReached,
    Interrupted,
    TimeLimitReached,
    Finished,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::NotStarted => "not started",
            SolveStatus::Started => "started",
            SolveStatus::Restarted => "restarted",
            SolveStatus::SolvedOptimal => "optimal solution found",
            SolveStatus::SolvedInfeasible => "detected infeasibility",
            SolveStatus::SolvedUnbounded => "detected unboundedness",
            SolveStatus::SolvedGapLimit => "reached gap limit",
            SolveStatus::SolvedSolsLimit => "reached solution limit",
            SolveStatus::IterationLimitReached => "reached iteration limit",
            SolveStatus::Interrupted => "interrupted",
            SolveStatus::TimeLimitReached => "reached time limit",
            SolveStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by an external engine after solving a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineStatus {
    ProvenOptimal,
    ProvenLocalOptimal,
    ProvenInfeasible,
    /// Can happen with NLPs.
    ProvenLocalInfeasible,
    ProvenUnbounded,
    ProvenObjectiveCutOff,
    EngineIterationLimit,
    ProvenFailedCqFeas,
    ProvenFailedCqInfeas,
    FailedFeas,
    FailedInfeas,
    EngineError,
    EngineUnknownStatus,
}

impl EngineStatus {
    /// True if the engine returned a point that can be used as a bound.
    pub fn is_usable(self) -> bool {
        matches!(self, EngineStatus::ProvenOptimal | EngineStatus::ProvenLocalOptimal)
    }

    /// True if the engine proved that no point (better than the cutoff) exists.
    pub fn is_proven_infeasible(self) -> bool {
        matches!(
            self,
            EngineStatus::ProvenInfeasible
                | EngineStatus::ProvenLocalInfeasible
                | EngineStatus::ProvenObjectiveCutOff
        )
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BranchDirection {
    DownBranch,
    UpBranch,
}

/// What a separation routine asks of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SeparationStatus {
    /// Separation routine wants nothing.
    SepaContinue,
    /// Cuts were added; the relaxation should be resolved.
    SepaResolve,
    /// No need to solve the subproblem further.
    SepaPrune,
    /// No separation found.
    SepaNone,
    SepaError,
}

/// Order in which open nodes are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TreeSearchOrder {
    DepthFirst,
    #[default]
    BestFirst,
    /// First find the best bound, then dive until pruned.
    BestThenDive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type_order() {
        assert!(FunctionType::Constant < FunctionType::Linear);
        assert!(FunctionType::Linear < FunctionType::Bilinear);
        assert!(FunctionType::Multilinear < FunctionType::Quadratic);
        assert!(FunctionType::Quadratic < FunctionType::Nonlinear);
        assert!(FunctionType::Nonlinear < FunctionType::Polynomial);
        assert!(FunctionType::Polynomial < FunctionType::Unknown);
    }

    #[test]
    fn test_function_type_add() {
        use FunctionType::*;
        assert_eq!(Constant.add(Linear), Linear);
        assert_eq!(Bilinear.add(Linear), Bilinear);
        assert_eq!(Quadratic.add(Bilinear), Quadratic);
        assert_eq!(Nonlinear.add(Quadratic), Nonlinear);
    }

    #[test]
    fn test_function_type_mult() {
        use FunctionType::*;
        assert_eq!(Constant.mult(Linear), Linear);
        assert_eq!(Linear.mult(Linear), Quadratic);
        assert_eq!(Linear.mult(Bilinear), Multilinear);
        assert_eq!(Quadratic.mult(Quadratic), Polynomial);
        assert_eq!(Nonlinear.mult(Polynomial), Nonlinear);
        assert_eq!(Unknown.mult(Constant), Unknown);
    }

    #[test]
    fn test_engine_status() {
        assert!(EngineStatus::ProvenOptimal.is_usable());
        assert!(!EngineStatus::EngineIterationLimit.is_usable());
        assert!(EngineStatus::ProvenInfeasible.is_proven_infeasible());
        assert!(!EngineStatus::EngineError.is_proven_infeasible());
    }
}
