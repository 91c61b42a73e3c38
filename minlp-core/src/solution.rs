//! Primal points returned by engines.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A primal point indexed by variable index, with its objective value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// Value of each variable.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub obj_value: f64,
}

impl Solution {
    pub fn new(x: Vec<f64>, obj_value: f64) -> Self {
        Self { x, obj_value }
    }

    pub fn primal(&self) -> &[f64] {
        &self.x
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
