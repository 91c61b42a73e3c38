//! Branch-and-bound search tree management.

mod branch;
mod brancher;
mod node;
mod queue;
mod tree;

pub use branch::{BrVarCand, Branch};
pub use brancher::{BranchChoice, MaxVioBrancher};
pub use node::{NodeStatus, SearchNode};
pub use queue::NodeQueue;
pub use tree::BranchAndBound;
