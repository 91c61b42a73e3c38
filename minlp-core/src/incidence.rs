//! Back-references between variables and constraints.
//!
//! The two adjacency directions are kept as a pair and only ever updated
//! together.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Incidence {
    var_cons: Vec<BTreeSet<usize>>,
    cons_vars: Vec<BTreeSet<usize>>,
}

impl Incidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vars(&self) -> usize {
        self.var_cons.len()
    }

    pub fn num_cons(&self) -> usize {
        self.cons_vars.len()
    }

    pub fn push_var(&mut self) {
        self.var_cons.push(BTreeSet::new());
    }

    /// Append a constraint and link it to `vars`.
    pub fn push_cons<I: IntoIterator<Item = usize>>(&mut self, vars: I) {
        let c = self.cons_vars.len();
        self.cons_vars.push(BTreeSet::new());
        for v in vars {
            self.link(c, v);
        }
    }

    pub fn link(&mut self, c: usize, v: usize) {
        self.cons_vars[c].insert(v);
        self.var_cons[v].insert(c);
    }

    pub fn unlink(&mut self, c: usize, v: usize) {
        self.cons_vars[c].remove(&v);
        self.var_cons[v].remove(&c);
    }

    /// Drop every edge of constraint `c`.
    pub fn unlink_cons(&mut self, c: usize) {
        let vars = std::mem::take(&mut self.cons_vars[c]);
        for v in vars {
            self.var_cons[v].remove(&c);
        }
    }

    /// Replace the edges of `c` by `vars`.
    pub fn relink_cons<I: IntoIterator<Item = usize>>(&mut self, c: usize, vars: I) {
        self.unlink_cons(c);
        for v in vars {
            self.link(c, v);
        }
    }

    /// Constraints that reference `v`.
    pub fn cons_of(&self, v: usize) -> &BTreeSet<usize> {
        &self.var_cons[v]
    }

    /// Variables referenced by `c`.
    pub fn vars_of(&self, c: usize) -> &BTreeSet<usize> {
        &self.cons_vars[c]
    }

    /// Drop variables without an image in `map` and renumber the rest.
    /// The variables must already be unlinked.
    pub fn compact_vars(&mut self, map: &[Option<usize>]) {
        let old = std::mem::take(&mut self.var_cons);
        self.var_cons = old
            .into_iter()
            .enumerate()
            .filter(|(v, _)| map[*v].is_some())
            .map(|(_, s)| s)
            .collect();
        for vars in &mut self.cons_vars {
            *vars = vars.iter().filter_map(|&v| map[v]).collect();
        }
    }

    /// Drop constraints without an image in `map` and renumber the rest.
    /// The constraints must already be unlinked.
    pub fn compact_cons(&mut self, map: &[Option<usize>]) {
        let old = std::mem::take(&mut self.cons_vars);
        self.cons_vars = old
            .into_iter()
            .enumerate()
            .filter(|(c, _)| map[*c].is_some())
            .map(|(_, s)| s)
            .collect();
        for cons in &mut self.var_cons {
            *cons = cons.iter().filter_map(|&c| map[c]).collect();
        }
    }

    pub fn clear(&mut self) {
        self.var_cons.clear();
        self.cons_vars.clear();
    }
}
