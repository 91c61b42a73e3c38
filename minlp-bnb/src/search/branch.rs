//! Branching candidates and the branches built from them.

use std::fmt;

use minlp_core::Modification;

/// A variable proposed for branching, with the estimated distance to
/// feasibility in the down and up child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrVarCand {
    /// Relaxation variable index.
    pub var: usize,

    /// Distance to feasibility after branching down.
    pub ddist: f64,

    /// Distance to feasibility after branching up.
    pub udist: f64,
}

impl BrVarCand {
    pub fn new(var: usize, ddist: f64, udist: f64) -> Self {
        Self { var, ddist, udist }
    }

    /// Fold the distances of another violated term into this candidate.
    pub fn add_dist(&mut self, ddist: f64, udist: f64) {
        self.ddist += ddist;
        self.udist += udist;
    }

    /// Both children should move away from the current point, so the
    /// weaker side decides.
    pub fn score(&self) -> f64 {
        self.ddist.min(self.udist)
    }
}

/// One child of a branching: changes to the original problem and to the
/// relaxation, applied in order and undone in reverse.
#[derive(Debug, Clone, Default)]
pub struct Branch {
    pub p_mods: Vec<Modification>,
    pub r_mods: Vec<Modification>,

    /// Value of the branching expression before branching.
    pub activity: f64,
}

impl Branch {
    pub fn new(activity: f64) -> Self {
        Self {
            p_mods: Vec::new(),
            r_mods: Vec::new(),
            activity,
        }
    }

    pub fn add_p_mod(&mut self, m: Modification) {
        self.p_mods.push(m);
    }

    pub fn add_r_mod(&mut self, m: Modification) {
        self.r_mods.push(m);
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch at {}:", self.activity)?;
        for m in self.p_mods.iter().chain(&self.r_mods) {
            write!(f, " [{}]", m)?;
        }
        Ok(())
    }
}
