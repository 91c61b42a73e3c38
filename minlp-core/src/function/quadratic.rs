//! Sparse quadratic functions `sum a_ij x_i x_j`.

use std::collections::BTreeMap;
use std::fmt;

use super::LinearFunction;
use crate::types::FunctionType;

/// Quadratic form over unordered variable pairs.
///
/// Pairs are stored as `(min, max)` so `x_i x_j` and `x_j x_i` share a term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadraticFunction {
    terms: BTreeMap<(usize, usize), f64>,
}

fn canon(i: usize, j: usize) -> (usize, usize) {
    if i <= j {
        (i, j)
    } else {
        (j, i)
    }
}

impl QuadraticFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms<I: IntoIterator<Item = (usize, usize, f64)>>(terms: I) -> Self {
        let mut qf = Self::new();
        for (i, j, a) in terms {
            qf.inc_term(i, j, a);
        }
        qf
    }

    /// Increment the coefficient of `x_i x_j` by `a`.
    pub fn inc_term(&mut self, i: usize, j: usize, a: f64) {
        if a == 0.0 {
            return;
        }
        let key = canon(i, j);
        let w = self.terms.entry(key).or_insert(0.0);
        *w += a;
        if *w == 0.0 {
            self.terms.remove(&key);
        }
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.terms.get(&canon(i, j)).copied().unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.terms.iter().map(|(&(i, j), &a)| (i, j, a))
    }

    pub fn has_var(&self, v: usize) -> bool {
        self.terms.keys().any(|&(i, j)| i == v || j == v)
    }

    /// Variables in increasing order, without repetition.
    pub fn vars(&self) -> Vec<usize> {
        self.var_count_map().into_keys().collect()
    }

    /// Number of terms each variable appears in.
    pub fn var_count_map(&self) -> BTreeMap<usize, usize> {
        let mut m = BTreeMap::new();
        for &(i, j) in self.terms.keys() {
            *m.entry(i).or_insert(0) += 1;
            if i != j {
                *m.entry(j).or_insert(0) += 1;
            }
        }
        m
    }

    pub fn eval(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|(&(i, j), &a)| a * x[i] * x[j]).sum()
    }

    /// Bilinear when every term multiplies two distinct variables.
    pub fn function_type(&self) -> FunctionType {
        if self.terms.is_empty() {
            FunctionType::Constant
        } else if self.terms.keys().all(|&(i, j)| i != j) {
            FunctionType::Bilinear
        } else {
            FunctionType::Quadratic
        }
    }

    /// How `v` enters this function.
    pub fn var_fun_type(&self, v: usize) -> FunctionType {
        let mut t = FunctionType::Constant;
        for &(i, j) in self.terms.keys() {
            if i == v && j == v {
                return FunctionType::Quadratic;
            }
            if i == v || j == v {
                t = FunctionType::Bilinear;
            }
        }
        t
    }

    /// Fix `x_v = val`. Terms with `v` turn into linear terms (added to
    /// `lf`) or a constant (returned).
    pub fn remove_var(&mut self, v: usize, val: f64, lf: &mut LinearFunction) -> f64 {
        let hit: Vec<(usize, usize)> = self
            .terms
            .keys()
            .filter(|&&(i, j)| i == v || j == v)
            .copied()
            .collect();
        let mut c = 0.0;
        for key in hit {
            let a = self.terms.remove(&key).unwrap_or(0.0);
            let (i, j) = key;
            if i == j {
                c += a * val * val;
            } else {
                let other = if i == v { j } else { i };
                lf.inc_term(other, a * val);
            }
        }
        c
    }

    /// Replace `x_out` by `ratio * x_in`.
    pub fn subst(&mut self, out: usize, inn: usize, ratio: f64) {
        let hit: Vec<(usize, usize)> = self
            .terms
            .keys()
            .filter(|&&(i, j)| i == out || j == out)
            .copied()
            .collect();
        for key in hit {
            let a = self.terms.remove(&key).unwrap_or(0.0);
            let (i, j) = key;
            if i == j {
                self.inc_term(inn, inn, a * ratio * ratio);
            } else {
                let other = if i == out { j } else { i };
                self.inc_term(inn, other, a * ratio);
            }
        }
    }

    pub fn scale(&mut self, c: f64) {
        if c == 0.0 {
            self.terms.clear();
            return;
        }
        for a in self.terms.values_mut() {
            *a *= c;
        }
    }

    pub fn remap(&self, map: &[Option<usize>]) -> Option<QuadraticFunction> {
        let mut out = QuadraticFunction::new();
        for (i, j, a) in self.terms() {
            let ni = (*map.get(i)?)?;
            let nj = (*map.get(j)?)?;
            out.inc_term(ni, nj, a);
        }
        Some(out)
    }
}

impl fmt::Display for QuadraticFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, (i, j, a)) in self.terms().enumerate() {
            if n > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}*x{}*x{}", a, i, j)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_unordered() {
        let mut qf = QuadraticFunction::new();
        qf.inc_term(2, 1, 1.5);
        qf.inc_term(1, 2, 0.5);
        assert_eq!(qf.num_terms(), 1);
        assert_eq!(qf.weight(2, 1), 2.0);
    }

    #[test]
    fn test_function_type() {
        let bil = QuadraticFunction::from_terms([(0, 1, 1.0)]);
        assert_eq!(bil.function_type(), FunctionType::Bilinear);
        let sq = QuadraticFunction::from_terms([(0, 1, 1.0), (2, 2, 1.0)]);
        assert_eq!(sq.function_type(), FunctionType::Quadratic);
        assert_eq!(sq.var_fun_type(2), FunctionType::Quadratic);
        assert_eq!(sq.var_fun_type(0), FunctionType::Bilinear);
        assert_eq!(sq.var_fun_type(5), FunctionType::Constant);
    }

    #[test]
    fn test_remove_var_splits_terms() {
        let mut qf = QuadraticFunction::from_terms([(0, 1, 2.0), (0, 0, 1.0), (1, 2, 1.0)]);
        let mut lf = LinearFunction::new();
        let c = qf.remove_var(0, 3.0, &mut lf);
        assert_eq!(c, 9.0);
        assert_eq!(lf.weight(1), 6.0);
        assert_eq!(qf.num_terms(), 1);
    }

    #[test]
    fn test_subst_square() {
        let mut qf = QuadraticFunction::from_terms([(0, 0, 1.0), (0, 1, 1.0)]);
        qf.subst(0, 2, 2.0);
        assert_eq!(qf.weight(2, 2), 4.0);
        assert_eq!(qf.weight(1, 2), 2.0);
    }
}
