//! Search node representation.

use std::fmt;

use minlp_core::Modification;

/// Status of a search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Node is waiting to be processed.
    Pending,

    /// Node is currently being processed.
    Processing,

    /// Node was pruned (bound >= incumbent).
    Pruned,

    /// The node has no feasible point.
    Infeasible,

    /// The relaxation point satisfies every handler.
    Feasible,

    /// Node was branched (children created).
    Branched,

    /// Dropped without a usable relaxation or branching candidate.
    Unresolved,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Processing => "processing",
            NodeStatus::Pruned => "pruned",
            NodeStatus::Infeasible => "infeasible",
            NodeStatus::Feasible => "feasible",
            NodeStatus::Branched => "branched",
            NodeStatus::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the search tree.
///
/// A node stores every change from the root to itself, not yet applied,
/// so it can be processed after any other node.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Unique node identifier.
    pub id: u64,

    /// Parent node ID (None for root).
    pub parent_id: Option<u64>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Changes to the original problem, in application order.
    pub p_mods: Vec<Modification>,

    /// Changes to the relaxation, in application order.
    pub r_mods: Vec<Modification>,

    /// Lower bound on the objective in this subtree.
    pub dual_bound: f64,

    /// Value of the branching expression that created the node.
    pub activity: f64,

    /// Node processing status.
    pub status: NodeStatus,
}

impl SearchNode {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            parent_id: None,
            depth: 0,
            p_mods: Vec::new(),
            r_mods: Vec::new(),
            dual_bound: f64::NEG_INFINITY,
            activity: f64::NAN,
            status: NodeStatus::Pending,
        }
    }

    /// Create a child carrying the complete change lists from the root.
    pub fn child(&self, id: u64, p_mods: Vec<Modification>, r_mods: Vec<Modification>) -> Self {
        Self {
            id,
            parent_id: Some(self.id),
            depth: self.depth + 1,
            p_mods,
            r_mods,
            dual_bound: self.dual_bound, // Inherit parent's bound initially
            activity: self.activity,
            status: NodeStatus::Pending,
        }
    }

    /// A node can be pruned if its dual bound >= incumbent objective.
    pub fn can_prune(&self, incumbent_obj: f64) -> bool {
        self.dual_bound >= incumbent_obj - 1e-9
    }
}
