//! Configuration settings for the handlers and the search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use minlp_core::TreeSearchOrder;

/// What a [`crate::QuadHandler`] changes when it tightens bounds or branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadSettings {
    /// Record changes against the original problem.
    pub modify_problem: bool,

    /// Record changes against the relaxation.
    pub modify_relaxation: bool,
}

impl Default for QuadSettings {
    fn default() -> Self {
        Self {
            modify_problem: true,
            modify_relaxation: true,
        }
    }
}

/// Branch-and-bound settings.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BnbSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap tolerance.
    pub gap_tol: f64,

    /// Absolute optimality gap tolerance.
    pub gap_abs_tol: f64,

    // === Search strategy ===
    /// Order in which open nodes are processed.
    pub tree_search: TreeSearchOrder,

    /// Resolves after cuts at a single node.
    pub max_separation_rounds: usize,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for BnbSettings {
    fn default() -> Self {
        Self {
            max_nodes: 100_000,
            time_limit_ms: None,
            gap_tol: 1e-4,
            gap_abs_tol: 1e-6,
            tree_search: TreeSearchOrder::default(),
            max_separation_rounds: 20,
            verbose: false,
            log_freq: 100,
        }
    }
}

impl BnbSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set relative gap tolerance.
    pub fn with_gap_tol(mut self, gap: f64) -> Self {
        self.gap_tol = gap;
        self
    }

    pub fn with_tree_search(mut self, order: TreeSearchOrder) -> Self {
        self.tree_search = order;
        self
    }
}
