//! Shared helpers: model builders and a small dense LP engine.

#![allow(dead_code)]

use minlp_core::{
    Engine, EngineStatus, Function, FunctionType, LinearFunction, NonlinearFunction, Problem,
    Solution, VariableType,
};

/// Feasibility tolerance of [`VertexEngine`], scaled by `1 + |rhs|`.
const FEAS_TOL: f64 = 1e-7;

pub fn lin(terms: &[(usize, f64)]) -> Function {
    Function::from_linear(LinearFunction::from_terms(terms.iter().copied()))
}

pub fn cont(p: &mut Problem, lb: f64, ub: f64) -> usize {
    p.new_variable(lb, ub, VariableType::Continuous)
}

/// Add `y - x^2 = 0`.
pub fn add_square(p: &mut Problem, x: usize, y: usize) -> usize {
    let f = Function::from_nonlinear(
        Some(LinearFunction::from_terms([(y, 1.0)])),
        NonlinearFunction::square(-1.0, x),
    );
    p.new_constraint(f, 0.0, 0.0)
}

/// Add `y - x0 * x1 = 0`.
pub fn add_product(p: &mut Problem, x0: usize, x1: usize, y: usize) -> usize {
    let f = Function::from_nonlinear(
        Some(LinearFunction::from_terms([(y, 1.0)])),
        NonlinearFunction::product(-1.0, x0, x1),
    );
    p.new_constraint(f, 0.0, 0.0)
}

/// One hyperplane `a . x = b` of the feasible region.
struct Plane {
    a: Vec<f64>,
    b: f64,
}

/// Solves LPs by enumerating every vertex of the feasible polyhedron.
///
/// Only suitable for a handful of variables. The feasible region must be
/// bounded; a region without vertices is reported infeasible.
#[derive(Default)]
pub struct VertexEngine {
    solution: Option<Solution>,
    pub solves: usize,
}

impl VertexEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn dense(lf: Option<&LinearFunction>, n: usize) -> Vec<f64> {
    let mut a = vec![0.0; n];
    if let Some(lf) = lf {
        for (v, w) in lf.terms() {
            a[v] = w;
        }
    }
    a
}

fn within(val: f64, lb: f64, ub: f64) -> bool {
    val >= lb - FEAS_TOL * (1.0 + lb.abs()) && val <= ub + FEAS_TOL * (1.0 + ub.abs())
}

/// Solve the square system of the chosen planes, or `None` if singular.
fn solve_system(planes: &[Plane], rows: &[usize]) -> Option<Vec<f64>> {
    let n = rows.len();
    let mut m: Vec<Vec<f64>> = rows
        .iter()
        .map(|&r| {
            let mut row = planes[r].a.clone();
            row.push(planes[r].b);
            row
        })
        .collect();

    for col in 0..n {
        let piv = (col..n).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        if m[piv][col].abs() < 1e-10 {
            return None;
        }
        m.swap(col, piv);
        for i in 0..n {
            if i != col {
                let f = m[i][col] / m[col][col];
                if f != 0.0 {
                    for k in col..=n {
                        m[i][k] -= f * m[col][k];
                    }
                }
            }
        }
    }
    Some((0..n).map(|i| m[i][n] / m[i][i]).collect())
}

/// Call `f` with every `k`-subset of `0..m`.
fn for_each_subset(k: usize, m: usize, start: usize, cur: &mut Vec<usize>, f: &mut dyn FnMut(&[usize])) {
    if cur.len() == k {
        f(cur);
        return;
    }
    for i in start..m {
        if m - i < k - cur.len() {
            break;
        }
        cur.push(i);
        for_each_subset(k, m, i + 1, cur, f);
        cur.pop();
    }
}

impl Engine for VertexEngine {
    fn name(&self) -> &str {
        "vertex"
    }

    fn solve(&mut self, p: &Problem) -> EngineStatus {
        self.solves += 1;
        self.solution = None;
        let n = p.num_vars();

        let (c, c0) = match p.objective() {
            Some(o) if o.function_type() > FunctionType::Linear => return EngineStatus::EngineError,
            Some(o) => (dense(o.function.linear.as_ref(), n), o.constant),
            None => (vec![0.0; n], 0.0),
        };

        let mut rows = Vec::with_capacity(p.num_cons());
        for con in p.constraints() {
            if con.function_type() > FunctionType::Linear {
                return EngineStatus::EngineError;
            }
            rows.push((dense(con.linear(), n), con.lb, con.ub));
        }

        let mut planes = Vec::new();
        let mut add = |a: &[f64], lb: f64, ub: f64| {
            if lb.is_finite() {
                planes.push(Plane { a: a.to_vec(), b: lb });
            }
            if ub.is_finite() && ub != lb {
                planes.push(Plane { a: a.to_vec(), b: ub });
            }
        };
        for (a, lb, ub) in &rows {
            add(a, *lb, *ub);
        }
        for (j, var) in p.variables().iter().enumerate() {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            add(&e, var.lb, var.ub);
        }

        let feasible = |x: &[f64]| {
            p.variables()
                .iter()
                .zip(x)
                .all(|(v, &xv)| within(xv, v.lb, v.ub))
                && rows.iter().all(|(a, lb, ub)| {
                    let act: f64 = a.iter().zip(x).map(|(ai, xi)| ai * xi).sum();
                    within(act, *lb, *ub)
                })
        };

        let mut best: Option<(f64, Vec<f64>)> = None;
        let mut subset = Vec::with_capacity(n);
        for_each_subset(n, planes.len(), 0, &mut subset, &mut |idx| {
            let Some(x) = solve_system(&planes, idx) else {
                return;
            };
            if !feasible(&x) {
                return;
            }
            let obj: f64 = c.iter().zip(&x).map(|(ci, xi)| ci * xi).sum::<f64>() + c0;
            if best.as_ref().map_or(true, |(b, _)| obj < b - 1e-12) {
                best = Some((obj, x));
            }
        });

        match best {
            Some((obj, x)) => {
                self.solution = Some(Solution::new(x, obj));
                EngineStatus::ProvenOptimal
            }
            None => EngineStatus::ProvenInfeasible,
        }
    }

    fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }
}

/// Always fails, for checking how the driver treats engine failures.
pub struct FailingEngine;

impl Engine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn solve(&mut self, _p: &Problem) -> EngineStatus {
        EngineStatus::EngineIterationLimit
    }

    fn solution(&self) -> Option<&Solution> {
        None
    }
}
