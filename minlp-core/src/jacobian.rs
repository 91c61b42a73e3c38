//! Sparse constraint Jacobian structure.

use sprs::{CsMat, TriMat};

use crate::constraint::Constraint;

/// Jacobian of the constraints, rows by constraint index and columns by
/// variable index.
///
/// Linear coefficients are constant and stored with their values. Entries
/// contributed by quadratic and nonlinear parts depend on the point and are
/// only recorded in the sparsity pattern.
#[derive(Debug, Clone)]
pub struct Jacobian {
    linear: CsMat<f64>,
    pattern: CsMat<f64>,
}

impl Jacobian {
    pub fn new(cons: &[Constraint], num_vars: usize) -> Self {
        let m = cons.len();
        let mut lin = TriMat::new((m, num_vars));
        let mut pat = TriMat::new((m, num_vars));
        for (i, c) in cons.iter().enumerate() {
            if let Some(lf) = c.linear() {
                for (v, a) in lf.terms() {
                    lin.add_triplet(i, v, a);
                }
            }
            for v in c.function.vars() {
                pat.add_triplet(i, v, 1.0);
            }
        }
        Self {
            linear: lin.to_csr(),
            pattern: pat.to_csr(),
        }
    }

    /// Constant coefficients of the linear parts (CSR).
    pub fn linear_coefficients(&self) -> &CsMat<f64> {
        &self.linear
    }

    /// Sparsity pattern of the whole Jacobian (CSR, entries are 1).
    pub fn pattern(&self) -> &CsMat<f64> {
        &self.pattern
    }

    pub fn num_nz(&self) -> usize {
        self.pattern.nnz()
    }

    pub fn rows(&self) -> usize {
        self.pattern.rows()
    }

    pub fn cols(&self) -> usize {
        self.pattern.cols()
    }

    /// `A x` over the linear parts only.
    pub fn linear_activity(&self, x: &[f64]) -> Vec<f64> {
        self.linear
            .outer_iterator()
            .map(|row| row.iter().map(|(j, &a)| a * x[j]).sum())
            .collect()
    }
}
