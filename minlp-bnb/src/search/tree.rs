//! Branch-and-bound tree controller.

use std::time::Instant;

use minlp_core::{
    Engine, FunctionType, Modification, Problem, Relaxation, SeparationStatus, SolveStatus,
};

use super::{Branch, MaxVioBrancher, NodeQueue, NodeStatus, SearchNode};
use crate::error::{BnbError, BnbResult};
use crate::handler::{Handler, IntVarHandler, QuadHandler};
use crate::settings::{BnbSettings, QuadSettings};
use crate::solution::{BnbSolution, BnbStatus, IncumbentTracker, TreeStats};

/// Passes of handler presolve over the original problem.
const MAX_PRESOLVE_ROUNDS: usize = 10;

/// Passes of node presolve over all handlers.
const MAX_NODE_PRESOLVE_ROUNDS: usize = 5;

/// Result of processing one node.
enum NodeOutcome {
    Pruned,
    Infeasible,
    /// The relaxation point satisfies every handler.
    Feasible { x: Vec<f64>, obj: f64 },
    Branched { bound: f64, branches: Vec<Branch> },
    Unresolved { bound: f64 },
}

/// Spatial branch-and-bound over a set of constraint handlers.
///
/// The driver owns the original problem and builds one relaxation from it.
/// Each node replays its changes on both, asks the handlers to tighten,
/// solves the relaxation with the engine and then separates, accepts the
/// point or branches. All changes are undone before the next node.
pub struct BranchAndBound {
    problem: Problem,
    handlers: Vec<Box<dyn Handler>>,
    queue: NodeQueue,
    brancher: MaxVioBrancher,

    /// Incumbent solution tracker.
    pub incumbent: IncumbentTracker,

    /// Next node ID to assign.
    next_node_id: u64,

    nodes_explored: u64,
    nodes_pruned: u64,
    nodes_unresolved: u64,

    /// Lowest bound among nodes dropped without being resolved.
    dropped_bound: f64,

    cuts_added: u64,
    start_time: Option<Instant>,
    settings: BnbSettings,
}

impl BranchAndBound {
    /// Create a driver. Handlers are consulted in the given order.
    pub fn new(problem: Problem, handlers: Vec<Box<dyn Handler>>, settings: BnbSettings) -> Self {
        Self {
            problem,
            handlers,
            queue: NodeQueue::new(settings.tree_search),
            brancher: MaxVioBrancher::new(),
            incumbent: IncumbentTracker::new(),
            next_node_id: 1, // 0 reserved for root
            nodes_explored: 0,
            nodes_pruned: 0,
            nodes_unresolved: 0,
            dropped_bound: f64::INFINITY,
            cuts_added: 0,
            start_time: None,
            settings,
        }
    }

    /// A driver with an [`IntVarHandler`] and a [`QuadHandler`] for every
    /// constraint of `problem` it accepts.
    pub fn with_default_handlers(problem: Problem, quad: QuadSettings, settings: BnbSettings) -> Self {
        let handlers: Vec<Box<dyn Handler>> = vec![
            Box::new(IntVarHandler::new(&problem)),
            Box::new(QuadHandler::from_problem(&problem, quad)),
        ];
        Self::new(problem, handlers, settings)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn handlers(&self) -> &[Box<dyn Handler>] {
        &self.handlers
    }

    /// Solve the problem, using `engine` for every relaxation.
    pub fn solve(&mut self, engine: &mut dyn Engine) -> BnbResult<BnbSolution> {
        self.start_time = Some(Instant::now());

        if self.presolve() {
            if self.settings.verbose {
                log::info!("Presolve: problem is infeasible");
            }
            return Ok(self.finalize(BnbStatus::Infeasible));
        }

        let mut rel = self.build_relaxation()?;
        for h in self.handlers.iter_mut() {
            if h.relax_init_full(&self.problem, &mut rel) {
                log::debug!("{} found the root relaxation infeasible", h.name());
                return Ok(self.finalize(BnbStatus::Infeasible));
            }
        }
        if self.settings.verbose {
            log::info!(
                "Relaxation: {} variables, {} constraints, engine {}",
                rel.num_vars(),
                rel.num_cons(),
                engine.name()
            );
        }

        self.initialize(f64::NEG_INFINITY);
        let status = loop {
            if let Some(status) = self.check_termination() {
                break status;
            }
            let Some(node) = self.next_node() else {
                break self.exhausted_status();
            };
            self.process_node(node, &mut rel, engine)?;
            self.log_progress();
        };

        let sol = self.finalize(status);
        if self.settings.verbose {
            log::info!(
                "Finished ({}): obj={:.6e}, bound={:.6e}, nodes={}",
                sol.status,
                sol.obj_val,
                sol.bound,
                sol.stats.nodes_explored
            );
        }
        Ok(sol)
    }

    /// Run the handlers' presolve until nothing changes. Returns true if
    /// the problem is infeasible.
    fn presolve(&mut self) -> bool {
        for _ in 0..MAX_PRESOLVE_ROUNDS {
            let mut changed = false;
            for h in self.handlers.iter_mut() {
                let (status, ch) = h.presolve(&mut self.problem);
                if status == SolveStatus::SolvedInfeasible {
                    log::debug!("{} found the problem infeasible", h.name());
                    return true;
                }
                changed |= ch;
            }
            if !changed {
                break;
            }
        }
        false
    }

    /// Copy the problem without the constraints the handlers relax
    /// themselves. Everything left must be linear.
    fn build_relaxation(&self) -> BnbResult<Relaxation> {
        let mut rel = Relaxation::new(&self.problem)?;
        for h in &self.handlers {
            for &c in h.constraints() {
                rel.mark_delete_cons(c);
            }
        }
        rel.del_marked_cons();

        if let Some(con) = rel
            .constraints()
            .iter()
            .find(|c| c.function_type() > FunctionType::Linear)
        {
            return Err(BnbError::InvalidProblem(format!(
                "no handler relaxes {}: {}",
                con.name, con.function
            )));
        }
        if let Some(obj) = rel.objective() {
            if obj.function_type() > FunctionType::Linear {
                return Err(BnbError::InvalidProblem(format!(
                    "objective must be linear, got {}",
                    obj.function_type()
                )));
            }
        }
        Ok(rel)
    }

    /// Initialize with the root node.
    pub fn initialize(&mut self, root_bound: f64) {
        let mut root = SearchNode::root();
        root.dual_bound = root_bound;
        self.queue.push(root);
    }

    /// Get the next node to process.
    pub fn next_node(&mut self) -> Option<SearchNode> {
        self.queue.pop()
    }

    fn process_node(
        &mut self,
        mut node: SearchNode,
        rel: &mut Relaxation,
        engine: &mut dyn Engine,
    ) -> BnbResult<()> {
        if node.can_prune(self.incumbent.obj_val) {
            self.nodes_pruned += 1;
            self.queue.end_dive();
            return Ok(());
        }
        node.status = NodeStatus::Processing;
        debug_assert!(rel.is_relaxation_of(&self.problem));

        let mut p_applied: Vec<Modification> = node.p_mods.iter().map(Modification::fresh).collect();
        let mut r_applied: Vec<Modification> = node.r_mods.iter().map(Modification::fresh).collect();
        for m in &mut p_applied {
            m.apply(&mut self.problem);
        }
        for m in &mut r_applied {
            m.apply(rel.problem_mut());
        }

        let mut p_local = Vec::new();
        let mut r_local = Vec::new();
        let outcome = self.evaluate(&node, rel, engine, &mut p_local, &mut r_local);

        for m in r_local.iter_mut().rev().chain(r_applied.iter_mut().rev()) {
            m.undo(rel.problem_mut());
        }
        for m in p_local.iter_mut().rev().chain(p_applied.iter_mut().rev()) {
            m.undo(&mut self.problem);
        }
        self.nodes_explored += 1;

        match outcome? {
            NodeOutcome::Pruned => {
                node.status = NodeStatus::Pruned;
                self.nodes_pruned += 1;
                self.queue.end_dive();
            }
            NodeOutcome::Infeasible => {
                node.status = NodeStatus::Infeasible;
                self.queue.end_dive();
            }
            NodeOutcome::Feasible { x, obj } => {
                node.status = NodeStatus::Feasible;
                self.update_incumbent(&x, obj);
                self.queue.end_dive();
            }
            NodeOutcome::Unresolved { bound } => {
                node.status = NodeStatus::Unresolved;
                self.nodes_unresolved += 1;
                self.dropped_bound = self.dropped_bound.min(bound);
                self.queue.end_dive();
            }
            NodeOutcome::Branched { bound, branches } => {
                node.status = NodeStatus::Branched;
                node.dual_bound = node.dual_bound.max(bound);
                let children = self.branch(&node, branches, &p_local, &r_local);
                self.queue.push_children(children);
            }
        }
        log::debug!(
            "Node {} (depth {}, bound {:.6e}): {}",
            node.id,
            node.depth,
            node.dual_bound,
            node.status
        );
        Ok(())
    }

    /// Tighten, solve and judge the node whose changes are applied. New
    /// changes go to `p_mods` and `r_mods`, applied.
    fn evaluate(
        &mut self,
        node: &SearchNode,
        rel: &mut Relaxation,
        engine: &mut dyn Engine,
        p_mods: &mut Vec<Modification>,
        r_mods: &mut Vec<Modification>,
    ) -> BnbResult<NodeOutcome> {
        for _ in 0..MAX_NODE_PRESOLVE_ROUNDS {
            let before = p_mods.len() + r_mods.len();
            for h in self.handlers.iter_mut() {
                if h.presolve_node(&mut self.problem, rel, p_mods, r_mods) {
                    log::debug!("{} found node {} infeasible", h.name(), node.id);
                    return Ok(NodeOutcome::Infeasible);
                }
            }
            if p_mods.len() + r_mods.len() == before {
                break;
            }
        }
        for h in self.handlers.iter_mut() {
            if h.relax_node_inc(&self.problem, rel) {
                return Ok(NodeOutcome::Infeasible);
            }
        }

        let n = self.problem.num_vars();
        let mut rounds = 0;
        loop {
            let status = engine.solve(rel.problem());
            if status.is_proven_infeasible() {
                return Ok(NodeOutcome::Infeasible);
            }
            if !status.is_usable() {
                log::warn!(
                    "{} returned {} at node {}, leaving it unresolved",
                    engine.name(),
                    status,
                    node.id
                );
                return Ok(NodeOutcome::Unresolved {
                    bound: node.dual_bound,
                });
            }
            let sol = engine.solution().ok_or_else(|| {
                BnbError::EngineFailure(format!("{} reported {} without a point", engine.name(), status))
            })?;
            if sol.len() != rel.num_vars() {
                return Err(BnbError::EngineFailure(format!(
                    "{} returned {} values for {} variables",
                    engine.name(),
                    sol.len(),
                    rel.num_vars()
                )));
            }
            let x = sol.x.clone();
            let bound = sol.obj_value.max(node.dual_bound);
            if bound >= self.incumbent.obj_val - 1e-9 {
                return Ok(NodeOutcome::Pruned);
            }

            if rounds < self.settings.max_separation_rounds {
                let mut resolve = false;
                for h in self.handlers.iter_mut() {
                    let (status, ncuts) = h.separate(&x, &self.problem, rel);
                    self.cuts_added += ncuts as u64;
                    match status {
                        SeparationStatus::SepaResolve => resolve = true,
                        SeparationStatus::SepaPrune => return Ok(NodeOutcome::Pruned),
                        _ => {}
                    }
                }
                if resolve {
                    rounds += 1;
                    continue;
                }
            }

            let rel: &Relaxation = rel;
            if self.handlers.iter().all(|h| h.is_feasible(&x, &self.problem, rel)) {
                let obj = self.problem.obj_value(&x[..n])?;
                return Ok(NodeOutcome::Feasible {
                    x: x[..n].to_vec(),
                    obj,
                });
            }

            let problem = &self.problem;
            let cands = self.handlers.iter().enumerate().flat_map(|(i, h)| {
                h.branching_candidates(&x, problem, rel)
                    .into_iter()
                    .map(move |c| (i, c))
            });
            let Some(choice) = self.brancher.select(cands, &x, rel) else {
                log::warn!(
                    "Node {}: relaxation point is infeasible but no variable can be branched on",
                    node.id
                );
                return Ok(NodeOutcome::Unresolved { bound });
            };
            let branches = self.handlers[choice.handler].branches(&choice.cand, &x, problem, rel);
            return Ok(NodeOutcome::Branched { bound, branches });
        }
    }

    /// Create the children of `parent`. Each child inherits the parent's
    /// changes, those made while processing the parent, and its branch.
    pub fn branch(
        &mut self,
        parent: &SearchNode,
        branches: Vec<Branch>,
        p_local: &[Modification],
        r_local: &[Modification],
    ) -> Vec<SearchNode> {
        let mut children = Vec::with_capacity(branches.len());
        for br in branches {
            let mut p_mods = parent.p_mods.clone();
            p_mods.extend(p_local.iter().map(Modification::fresh));
            p_mods.extend(br.p_mods);
            let mut r_mods = parent.r_mods.clone();
            r_mods.extend(r_local.iter().map(Modification::fresh));
            r_mods.extend(br.r_mods);

            let mut child = parent.child(self.next_node_id, p_mods, r_mods);
            child.activity = br.activity;
            self.next_node_id += 1;
            children.push(child);
        }
        children
    }

    /// Update incumbent with a new solution.
    ///
    /// Returns true if incumbent was improved.
    pub fn update_incumbent(&mut self, x: &[f64], obj: f64) -> bool {
        let improved = self.incumbent.update(x, obj);

        if improved {
            // Prune nodes dominated by new incumbent
            let pruned = self.queue.prune_by_bound(obj);
            self.nodes_pruned += pruned as u64;

            if self.settings.verbose {
                log::info!("New incumbent: obj={:.6e}, pruned {} nodes", obj, pruned);
            }
        }

        improved
    }

    /// Lower bound on the optimal value over open and dropped nodes.
    pub fn best_bound(&self) -> f64 {
        self.queue
            .best_bound()
            .min(self.dropped_bound)
            .min(self.incumbent.obj_val)
    }

    /// Get the current optimality gap.
    pub fn gap(&self) -> f64 {
        self.incumbent.gap(self.best_bound())
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn time_limit_exceeded(&self) -> bool {
        self.settings
            .time_limit_ms
            .is_some_and(|limit| self.elapsed_ms() >= limit)
    }

    /// Status once no open node is left.
    fn exhausted_status(&self) -> BnbStatus {
        if self.nodes_unresolved > 0 && self.dropped_bound < self.incumbent.obj_val - 1e-9 {
            BnbStatus::NumericalError
        } else if self.incumbent.has_incumbent() {
            BnbStatus::Optimal
        } else {
            BnbStatus::Infeasible
        }
    }

    /// Check termination conditions.
    ///
    /// Returns Some(status) if we should terminate, None otherwise.
    pub fn check_termination(&self) -> Option<BnbStatus> {
        if self.time_limit_exceeded() {
            return Some(BnbStatus::TimeLimit);
        }

        if self.nodes_explored >= self.settings.max_nodes {
            return Some(BnbStatus::NodeLimit);
        }

        if self.queue.is_empty() {
            return Some(self.exhausted_status());
        }

        if self.incumbent.has_incumbent() {
            let abs_gap = self.incumbent.obj_val - self.best_bound();
            if self.gap() <= self.settings.gap_tol || abs_gap <= self.settings.gap_abs_tol {
                return Some(BnbStatus::GapLimit);
            }
        }

        None
    }

    /// Finalize the solve and return the solution.
    pub fn finalize(&self, status: BnbStatus) -> BnbSolution {
        BnbSolution {
            status,
            x: self.incumbent.solution.clone().unwrap_or_default(),
            obj_val: self.incumbent.obj_val,
            bound: self.best_bound(),
            gap: self.gap(),
            stats: self.stats(),
        }
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose || self.settings.log_freq == 0 {
            return;
        }

        if self.nodes_explored % self.settings.log_freq != 0 {
            return;
        }

        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6e} | Incumbent: {:.6e} | Gap: {:.2}% | Cuts: {} | Time: {:.1}s",
            self.nodes_explored,
            self.queue.len(),
            self.best_bound(),
            self.incumbent.obj_val,
            self.gap() * 100.0,
            self.cuts_added,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes_explored: self.nodes_explored,
            nodes_pruned: self.nodes_pruned,
            nodes_unresolved: self.nodes_unresolved,
            nodes_open: self.queue.len() as u64,
            cuts_added: self.cuts_added,
            incumbent_updates: self.incumbent.update_count,
            elapsed_ms: self.elapsed_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minlp_core::{BoundType, VariableType};

    fn tree(settings: BnbSettings) -> BranchAndBound {
        let mut p = Problem::new();
        p.new_variable(0.0, 1.0, VariableType::Continuous);
        p.new_variable(0.0, 1.0, VariableType::Continuous);
        BranchAndBound::with_default_handlers(p, QuadSettings::default(), settings)
    }

    #[test]
    fn test_tree_initialization() {
        let mut tree = tree(BnbSettings::default());
        assert_eq!(tree.handlers().len(), 2);
        tree.initialize(0.0);

        assert!(tree.next_node().is_some());
        assert!(tree.next_node().is_none()); // Queue now empty
    }

    #[test]
    fn test_incumbent_update() {
        let mut tree = tree(BnbSettings::default());
        tree.initialize(0.0);

        assert!(tree.update_incumbent(&[1.0, 1.0], 100.0));
        assert!(!tree.update_incumbent(&[0.0, 1.0], 150.0));
        assert!(tree.update_incumbent(&[0.5, 0.5], 50.0));
        assert_eq!(tree.incumbent.obj_val, 50.0);
        assert_eq!(tree.stats().incumbent_updates, 2);
    }

    #[test]
    fn test_incumbent_prunes_open_nodes() {
        let mut tree = tree(BnbSettings::default());
        tree.initialize(10.0);
        tree.update_incumbent(&[0.0, 0.0], 5.0);
        assert_eq!(tree.stats().nodes_open, 0);
        assert_eq!(tree.stats().nodes_pruned, 1);
        assert_eq!(tree.check_termination(), Some(BnbStatus::Optimal));
    }

    #[test]
    fn test_termination_gap() {
        let mut tree = tree(BnbSettings::default().with_gap_tol(0.1));
        tree.initialize(95.0);
        assert_eq!(tree.check_termination(), None);

        tree.update_incumbent(&[1.0, 1.0], 100.0);
        assert_eq!(tree.check_termination(), Some(BnbStatus::GapLimit));
        let sol = tree.finalize(BnbStatus::GapLimit);
        assert_eq!(sol.bound, 95.0);
        assert!((sol.gap - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_termination_node_limit() {
        let mut tree = tree(BnbSettings::default().with_max_nodes(0));
        tree.initialize(0.0);
        assert_eq!(tree.check_termination(), Some(BnbStatus::NodeLimit));
    }

    #[test]
    fn test_empty_tree_without_incumbent_is_infeasible() {
        let tree = tree(BnbSettings::default());
        assert_eq!(tree.check_termination(), Some(BnbStatus::Infeasible));
        let sol = tree.finalize(BnbStatus::Infeasible);
        assert!(!sol.has_solution());
        assert_eq!(sol.bound, f64::INFINITY);
    }

    #[test]
    fn test_children_carry_all_changes() {
        let mut tree = tree(BnbSettings::default());
        let mut parent = SearchNode::root();
        parent.p_mods.push(Modification::var_bound(0, BoundType::Upper, 0.8));

        let mut down = Branch::new(0.5);
        down.add_p_mod(Modification::var_bound(1, BoundType::Upper, 0.5));
        let mut up = Branch::new(0.5);
        up.add_p_mod(Modification::var_bound(1, BoundType::Lower, 0.5));

        let mut local = Modification::var_bounds(0, 0.1, 0.8);
        local.apply(&mut tree.problem);
        let children = tree.branch(&parent, vec![down, up], &[local], &[]);

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, 1);
        assert_eq!(children[1].id, 2);
        assert_eq!(
            children[1].p_mods,
            vec![
                Modification::var_bound(0, BoundType::Upper, 0.8),
                Modification::var_bounds(0, 0.1, 0.8),
                Modification::var_bound(1, BoundType::Lower, 0.5),
            ]
        );
        assert!(children[0].r_mods.is_empty());
        assert_eq!(children[0].activity, 0.5);
    }
}
