//! Sparse linear functions `sum a_i x_i`.

use std::collections::BTreeMap;
use std::fmt;

/// Linear combination of variables, keyed by variable index.
///
/// Terms with an exactly zero coefficient are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearFunction {
    terms: BTreeMap<usize, f64>,
}

impl LinearFunction {
    /// Empty function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(variable, coefficient)` pairs. Repeated variables add up.
    pub fn from_terms<I: IntoIterator<Item = (usize, f64)>>(terms: I) -> Self {
        let mut lf = Self::new();
        for (v, a) in terms {
            lf.inc_term(v, a);
        }
        lf
    }

    /// Add `a * x_v`, combining with an existing term.
    pub fn add_term(&mut self, v: usize, a: f64) {
        self.inc_term(v, a);
    }

    /// Increment the coefficient of `x_v` by `a`. A term that cancels to
    /// zero is removed.
    pub fn inc_term(&mut self, v: usize, a: f64) {
        if a == 0.0 {
            return;
        }
        let w = self.terms.entry(v).or_insert(0.0);
        *w += a;
        if *w == 0.0 {
            self.terms.remove(&v);
        }
    }

    /// Coefficient of `x_v` (zero when absent).
    pub fn weight(&self, v: usize) -> f64 {
        self.terms.get(&v).copied().unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_var(&self, v: usize) -> bool {
        self.terms.contains_key(&v)
    }

    /// Iterate `(variable, coefficient)` in increasing variable order.
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.terms.iter().map(|(&v, &a)| (v, a))
    }

    pub fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.keys().copied()
    }

    /// Value at `x`. Panics if `x` is shorter than the largest index.
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|(&v, &a)| a * x[v]).sum()
    }

    /// `self += other`.
    pub fn add(&mut self, other: &LinearFunction) {
        for (v, a) in other.terms() {
            self.inc_term(v, a);
        }
    }

    /// `self *= c`.
    pub fn scale(&mut self, c: f64) {
        if c == 0.0 {
            self.terms.clear();
            return;
        }
        for a in self.terms.values_mut() {
            *a *= c;
        }
    }

    /// Drop `x_v` and return the constant `a_v * val` it contributed.
    pub fn remove_var(&mut self, v: usize, val: f64) -> f64 {
        match self.terms.remove(&v) {
            Some(a) => a * val,
            None => 0.0,
        }
    }

    /// Replace `x_out` by `ratio * x_in`.
    pub fn subst(&mut self, out: usize, inn: usize, ratio: f64) {
        if let Some(a) = self.terms.remove(&out) {
            self.inc_term(inn, a * ratio);
        }
    }

    /// Renumber variables through `map` (`map[old] = Some(new)`). Returns
    /// `None` if a variable has no image.
    pub fn remap(&self, map: &[Option<usize>]) -> Option<LinearFunction> {
        let mut out = LinearFunction::new();
        for (v, a) in self.terms() {
            let nv = (*map.get(v)?)?;
            out.inc_term(nv, a);
        }
        Some(out)
    }
}

impl fmt::Display for LinearFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (v, a)) in self.terms().enumerate() {
            if i == 0 {
                write!(f, "{}*x{}", a, v)?;
            } else if a < 0.0 {
                write!(f, " - {}*x{}", -a, v)?;
            } else {
                write!(f, " + {}*x{}", a, v)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_combine_and_cancel() {
        let mut lf = LinearFunction::from_terms([(0, 2.0), (3, 1.0), (0, 1.0)]);
        assert_eq!(lf.num_terms(), 2);
        assert_eq!(lf.weight(0), 3.0);
        lf.inc_term(3, -1.0);
        assert_eq!(lf.num_terms(), 1);
        assert!(!lf.has_var(3));
    }

    #[test]
    fn test_eval_and_remove() {
        let mut lf = LinearFunction::from_terms([(0, 2.0), (1, 3.0)]);
        assert_eq!(lf.eval(&[5.0, 1.0]), 13.0);
        assert_eq!(lf.remove_var(0, 5.0), 10.0);
        assert_eq!(lf.remove_var(7, 5.0), 0.0);
        assert_eq!(lf.eval(&[0.0, 1.0]), 3.0);
    }

    #[test]
    fn test_subst() {
        let mut lf = LinearFunction::from_terms([(0, 2.0), (1, 3.0)]);
        lf.subst(0, 1, 0.5);
        assert_eq!(lf.num_terms(), 1);
        assert_eq!(lf.weight(1), 4.0);
    }

    #[test]
    fn test_remap() {
        let lf = LinearFunction::from_terms([(0, 2.0), (2, 3.0)]);
        let m = lf.remap(&[Some(0), None, Some(1)]).unwrap();
        assert_eq!(m.weight(1), 3.0);
        assert!(lf.remap(&[Some(0), None, None]).is_none());
    }
}
