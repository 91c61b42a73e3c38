//! Error types for the problem data model.

use thiserror::Error;

/// Recoverable errors raised while building or evaluating a model.
///
/// Misuse of the mutation API (mutating while an engine is attached, passing
/// indices that do not exist) is a contract violation and panics instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Lower bound above upper bound
    #[error("Invalid bounds [{lb}, {ub}] for {what}")]
    InvalidBounds {
        /// Name of the offending variable or constraint.
        what: String,
        /// Lower bound.
        lb: f64,
        /// Upper bound.
        ub: f64,
    },

    /// A nonlinear expression could not be evaluated at the given point
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Rebinding an expression referred to a variable missing from the map
    #[error("Variable {0} has no counterpart in the target problem")]
    UnmappedVariable(usize),

    /// Fallible lookup outside of the valid range
    #[error("Index {index} out of range (size {size})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of valid entries.
        size: usize,
    },

    /// Point length does not match the number of variables
    #[error("Point has {got} entries, expected {expected}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
