//! Records of the auxiliary relations `y = x^2` and `y = x0 * x1`.

use minlp_core::settings::{ABS_TOL, REL_TOL};
use minlp_core::LinearFunction;

/// `y = x^2`, with the relaxation row holding its secant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinSqr {
    pub x: usize,
    pub y: usize,
    /// Secant row in the relaxation, once relaxed.
    pub oe_con: Option<usize>,
}

impl LinSqr {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y, oe_con: None }
    }
}

/// `y = x0 * x1` with `x0 < x1`, and the four McCormick rows that relax it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinBil {
    x0: usize,
    x1: usize,
    y: usize,
    cons: Option<[usize; 4]>,
}

impl LinBil {
    /// The factors are stored in increasing index order, so `(a, b)` and
    /// `(b, a)` describe the same term.
    pub fn new(x0: usize, x1: usize, y: usize) -> Self {
        assert!(x0 != x1, "a bilinear term needs two distinct variables");
        let (x0, x1) = if x0 > x1 { (x1, x0) } else { (x0, x1) };
        Self {
            x0,
            x1,
            y,
            cons: None,
        }
    }

    pub fn x0(&self) -> usize {
        self.x0
    }

    pub fn x1(&self) -> usize {
        self.x1
    }

    pub fn y(&self) -> usize {
        self.y
    }

    /// Key under which the term is kept unique.
    pub fn key(&self) -> (usize, usize) {
        (self.x0, self.x1)
    }

    /// The McCormick rows, once relaxed.
    pub fn cons(&self) -> Option<[usize; 4]> {
        self.cons
    }

    pub fn set_cons(&mut self, cons: [usize; 4]) {
        self.cons = Some(cons);
    }

    /// The factor multiplied with `x`, if `x` is a factor.
    pub fn other_x(&self, x: usize) -> Option<usize> {
        if x == self.x0 {
            Some(self.x1)
        } else if x == self.x1 {
            Some(self.x0)
        } else {
            None
        }
    }

    pub fn is_violated(&self, x: &[f64]) -> bool {
        self.is_violated_at(x[self.x0], x[self.x1], x[self.y])
    }

    /// True if `yval` differs from `x0val * x1val` beyond both the absolute
    /// and the relative tolerance.
    pub fn is_violated_at(&self, x0val: f64, x1val: f64, yval: f64) -> bool {
        let gap = (x0val * x1val - yval).abs();
        gap > ABS_TOL && gap > yval.abs() * REL_TOL
    }
}

/// Row `facet` (0..4) of the McCormick envelope of `y = x0 * x1` over
/// `[l0, u0] x [l1, u1]`, as `lf <= rhs`:
///
/// - 0: `y >= l1 x0 + l0 x1 - l0 l1`
/// - 1: `y >= u1 x0 + u0 x1 - u0 u1`
/// - 2: `y <= u1 x0 + l0 x1 - l0 u1`
/// - 3: `y <= l1 x0 + u0 x1 - u0 l1`
///
/// A facet that needs an infinite bound becomes the free row `+-y <= inf`.
#[allow(clippy::too_many_arguments)]
pub fn mccormick_row(
    x0: usize,
    l0: f64,
    u0: f64,
    x1: usize,
    l1: f64,
    u1: f64,
    y: usize,
    facet: usize,
) -> (LinearFunction, f64) {
    let (a0, a1, ay, rhs) = match facet {
        0 => (l1, l0, -1.0, l0 * l1),
        1 => (u1, u0, -1.0, u0 * u1),
        2 => (-u1, -l0, 1.0, -l0 * u1),
        3 => (-l1, -u0, 1.0, -u0 * l1),
        _ => panic!("McCormick facet {} does not exist", facet),
    };
    let mut lf = LinearFunction::new();
    lf.add_term(y, ay);
    if !(a0.is_finite() && a1.is_finite() && rhs.is_finite()) {
        return (lf, f64::INFINITY);
    }
    lf.add_term(x0, a0);
    lf.add_term(x1, a1);
    (lf, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let a = LinBil::new(4, 1, 7);
        let b = LinBil::new(1, 4, 7);
        assert_eq!(a, b);
        assert_eq!(a.x0(), 1);
        assert_eq!(a.other_x(4), Some(1));
        assert_eq!(a.other_x(7), None);
    }

    #[test]
    fn test_violation_overloads_agree() {
        let b = LinBil::new(0, 1, 2);
        for x in [[2.0, 3.0, 6.0], [2.0, 3.0, 6.1], [1e-3, 1e-3, 0.0], [-1.5, 2.0, 5.0]] {
            assert_eq!(b.is_violated(&x), b.is_violated_at(x[0], x[1], x[2]));
        }
        assert!(!b.is_violated(&[2.0, 3.0, 6.0]));
        assert!(b.is_violated(&[2.0, 3.0, 6.1]));
        // relative tolerance on a large product
        assert!(!b.is_violated(&[1000.0, 1000.0, 1e6 + 1.0]));
    }

    #[test]
    fn test_facets_at_corners() {
        let (l0, u0, l1, u1) = (-1.0, 2.0, 0.5, 3.0);
        for facet in 0..4 {
            let (lf, rhs) = mccormick_row(0, l0, u0, 1, l1, u1, 2, facet);
            for (a, b) in [(l0, l1), (l0, u1), (u0, l1), (u0, u1)] {
                let v = lf.eval(&[a, b, a * b]);
                assert!(v <= rhs + 1e-12, "facet {} cuts off corner ({}, {})", facet, a, b);
            }
        }
    }

    #[test]
    fn test_infinite_bound_gives_free_row() {
        let (lf, rhs) = mccormick_row(0, f64::NEG_INFINITY, 1.0, 1, 0.0, 1.0, 2, 0);
        assert_eq!(rhs, f64::INFINITY);
        assert_eq!(lf.num_terms(), 1);
        assert_eq!(lf.weight(2), -1.0);
    }
}
