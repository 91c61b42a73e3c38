//! Open nodes, ordered by the tree search strategy.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use minlp_core::TreeSearchOrder;

use super::SearchNode;

/// Entry in the node queue with priority.
struct QueuedNode {
    node: SearchNode,
    priority: f64, // Higher = selected first
    seq: u64,
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Ties go to the newest node
        self.priority
            .total_cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Open nodes of the search tree.
///
/// With [`TreeSearchOrder::BestThenDive`] the children of the node being
/// dived on are kept on a stack and explored first. [`NodeQueue::end_dive`]
/// returns them to the heap, after which the best-bound node is next.
pub struct NodeQueue {
    strategy: TreeSearchOrder,

    /// Priority queue (max-heap by priority).
    heap: BinaryHeap<QueuedNode>,

    /// Children of the current dive, last one on top.
    dive: Vec<SearchNode>,

    nodes_added: u64,
    nodes_popped: u64,
    next_seq: u64,
}

impl NodeQueue {
    pub fn new(strategy: TreeSearchOrder) -> Self {
        Self {
            strategy,
            heap: BinaryHeap::new(),
            dive: Vec::new(),
            nodes_added: 0,
            nodes_popped: 0,
            next_seq: 0,
        }
    }

    /// Add a node to the heap.
    pub fn push(&mut self, node: SearchNode) {
        self.nodes_added += 1;
        self.enqueue(node);
    }

    fn enqueue(&mut self, node: SearchNode) {
        let priority = self.compute_priority(&node);
        self.heap.push(QueuedNode {
            node,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Add the children of one branching, the first child to be explored
    /// first among them.
    pub fn push_children(&mut self, children: Vec<SearchNode>) {
        if self.strategy == TreeSearchOrder::BestThenDive {
            self.nodes_added += children.len() as u64;
            self.dive.extend(children.into_iter().rev());
        } else {
            for child in children.into_iter().rev() {
                self.push(child);
            }
        }
    }

    /// Stop the current dive. Its remaining nodes join the heap.
    pub fn end_dive(&mut self) {
        let rest: Vec<SearchNode> = self.dive.drain(..).collect();
        for node in rest {
            self.enqueue(node);
        }
    }

    /// Get the next node to process.
    pub fn pop(&mut self) -> Option<SearchNode> {
        let node = match self.dive.pop() {
            Some(node) => node,
            None => self.heap.pop()?.node,
        };
        self.nodes_popped += 1;
        Some(node)
    }

    /// Lowest dual bound over all open nodes, +inf when empty.
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .map(|q| &q.node)
            .chain(&self.dive)
            .map(|n| n.dual_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop nodes dominated by the incumbent.
    ///
    /// Returns the number of pruned nodes.
    pub fn prune_by_bound(&mut self, incumbent_obj: f64) -> usize {
        let before = self.len();

        let remaining: Vec<QueuedNode> = self
            .heap
            .drain()
            .filter(|q| !q.node.can_prune(incumbent_obj))
            .collect();
        self.heap = remaining.into_iter().collect();
        self.dive.retain(|n| !n.can_prune(incumbent_obj));

        before - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty() && self.dive.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len() + self.dive.len()
    }

    pub fn total_added(&self) -> u64 {
        self.nodes_added
    }

    pub fn total_popped(&self) -> u64 {
        self.nodes_popped
    }

    fn compute_priority(&self, node: &SearchNode) -> f64 {
        match self.strategy {
            TreeSearchOrder::DepthFirst => node.depth as f64,
            // Lowest dual bound first (negate for max-heap)
            TreeSearchOrder::BestFirst | TreeSearchOrder::BestThenDive => -node.dual_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, depth: usize, bound: f64) -> SearchNode {
        let mut n = SearchNode::root();
        n.id = id;
        n.depth = depth;
        n.dual_bound = bound;
        n
    }

    #[test]
    fn test_best_first_selection() {
        let mut queue = NodeQueue::new(TreeSearchOrder::BestFirst);
        queue.push(node(1, 0, 10.0));
        queue.push(node(2, 0, 5.0));
        queue.push(node(3, 0, 15.0));

        assert_eq!(queue.best_bound(), 5.0);
        assert_eq!(queue.pop().unwrap().id, 2);
        assert_eq!(queue.pop().unwrap().id, 1);
        assert_eq!(queue.pop().unwrap().id, 3);
        assert!(queue.is_empty());
        assert_eq!(queue.best_bound(), f64::INFINITY);
    }

    #[test]
    fn test_depth_first_selection() {
        let mut queue = NodeQueue::new(TreeSearchOrder::DepthFirst);
        queue.push(node(1, 0, 0.0));
        queue.push(node(2, 2, 0.0));
        queue.push(node(3, 1, 0.0));
        queue.push_children(vec![node(4, 2, 0.0), node(5, 2, 0.0)]);

        // first child of the newest branching, then its sibling
        assert_eq!(queue.pop().unwrap().id, 4);
        assert_eq!(queue.pop().unwrap().id, 5);
        assert_eq!(queue.pop().unwrap().id, 2);
        assert_eq!(queue.pop().unwrap().id, 3);
        assert_eq!(queue.pop().unwrap().id, 1);
    }

    #[test]
    fn test_best_then_dive() {
        let mut queue = NodeQueue::new(TreeSearchOrder::BestThenDive);
        queue.push(node(1, 0, 1.0));
        queue.push(node(2, 0, 2.0));
        assert_eq!(queue.pop().unwrap().id, 1);

        // worse children are still explored first while diving
        queue.push_children(vec![node(3, 1, 7.0), node(4, 1, 8.0)]);
        assert_eq!(queue.best_bound(), 2.0);
        assert_eq!(queue.pop().unwrap().id, 3);

        queue.end_dive();
        assert_eq!(queue.pop().unwrap().id, 2);
        assert_eq!(queue.pop().unwrap().id, 4);
        assert!(queue.pop().is_none());
        assert_eq!(queue.total_added(), 4);
        assert_eq!(queue.total_popped(), 4);
    }

    #[test]
    fn test_pruning() {
        let mut queue = NodeQueue::new(TreeSearchOrder::BestThenDive);
        for i in 0..4 {
            queue.push(node(i, 0, i as f64 * 10.0)); // 0, 10, 20, 30
        }
        queue.push_children(vec![node(4, 1, 40.0), node(5, 1, 5.0)]);
        assert_eq!(queue.len(), 6);

        // Prune nodes with bound >= 25
        let pruned = queue.prune_by_bound(25.0);
        assert_eq!(pruned, 2);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop().unwrap().id, 5);
    }
}
