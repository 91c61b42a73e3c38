//! Error types for the branch-and-bound driver.

use minlp_core::ModelError;
use thiserror::Error;

/// Errors that stop a branch-and-bound solve.
///
/// Infeasibility of a node is not an error; it prunes the node.
#[derive(Error, Debug)]
pub enum BnbError {
    /// The problem cannot be handled by the given handlers.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The engine failed on the root relaxation.
    #[error("Engine failure: {0}")]
    EngineFailure(String),

    /// Building or evaluating the model failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Internal solver error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for branch-and-bound operations.
pub type BnbResult<T> = Result<T, BnbError>;
