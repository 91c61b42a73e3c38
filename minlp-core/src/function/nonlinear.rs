//! General nonlinear functions as shared expression graphs.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::types::FunctionType;

/// Node of an expression graph. Children are reference counted so that
/// subgraphs can be shared between functions and between problems.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    /// Variable by index in the owning problem.
    Var(usize),
    Neg(Arc<Expr>),
    Add(Arc<Expr>, Arc<Expr>),
    Sub(Arc<Expr>, Arc<Expr>),
    Mul(Arc<Expr>, Arc<Expr>),
    Div(Arc<Expr>, Arc<Expr>),
    /// Integer power.
    Pow(Arc<Expr>, i32),
    Sqrt(Arc<Expr>),
    Exp(Arc<Expr>),
    Log(Arc<Expr>),
    Sin(Arc<Expr>),
    Cos(Arc<Expr>),
}

impl Expr {
    pub fn constant(c: f64) -> Arc<Expr> {
        Arc::new(Expr::Const(c))
    }

    pub fn var(v: usize) -> Arc<Expr> {
        Arc::new(Expr::Var(v))
    }

    pub fn neg(a: Arc<Expr>) -> Arc<Expr> {
        match *a {
            Expr::Const(c) => Expr::constant(-c),
            _ => Arc::new(Expr::Neg(a)),
        }
    }

    pub fn add(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
        match (&*a, &*b) {
            (Expr::Const(x), Expr::Const(y)) => Expr::constant(x + y),
            _ => Arc::new(Expr::Add(a, b)),
        }
    }

    pub fn sub(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
        match (&*a, &*b) {
            (Expr::Const(x), Expr::Const(y)) => Expr::constant(x - y),
            _ => Arc::new(Expr::Sub(a, b)),
        }
    }

    pub fn mul(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
        match (&*a, &*b) {
            (Expr::Const(x), Expr::Const(y)) => Expr::constant(x * y),
            _ => Arc::new(Expr::Mul(a, b)),
        }
    }

    pub fn div(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
        match (&*a, &*b) {
            (Expr::Const(x), Expr::Const(y)) if *y != 0.0 => Expr::constant(x / y),
            _ => Arc::new(Expr::Div(a, b)),
        }
    }

    pub fn pow(a: Arc<Expr>, k: i32) -> Arc<Expr> {
        match *a {
            Expr::Const(c) => Expr::constant(c.powi(k)),
            _ => Arc::new(Expr::Pow(a, k)),
        }
    }

    pub fn sqrt(a: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Sqrt(a))
    }

    pub fn exp(a: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Exp(a))
    }

    pub fn log(a: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Log(a))
    }

    pub fn sin(a: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Sin(a))
    }

    pub fn cos(a: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Cos(a))
    }

    fn eval(&self, x: &[f64]) -> ModelResult<f64> {
        let v = match self {
            Expr::Const(c) => *c,
            Expr::Var(i) => *x.get(*i).ok_or(ModelError::IndexOutOfRange {
                index: *i,
                size: x.len(),
            })?,
            Expr::Neg(a) => -a.eval(x)?,
            Expr::Add(a, b) => a.eval(x)? + b.eval(x)?,
            Expr::Sub(a, b) => a.eval(x)? - b.eval(x)?,
            Expr::Mul(a, b) => a.eval(x)? * b.eval(x)?,
            Expr::Div(a, b) => {
                let d = b.eval(x)?;
                if d == 0.0 {
                    return Err(ModelError::Evaluation("division by zero".into()));
                }
                a.eval(x)? / d
            }
            Expr::Pow(a, k) => a.eval(x)?.powi(*k),
            Expr::Sqrt(a) => {
                let u = a.eval(x)?;
                if u < 0.0 {
                    return Err(ModelError::Evaluation(format!("sqrt of {}", u)));
                }
                u.sqrt()
            }
            Expr::Exp(a) => a.eval(x)?.exp(),
            Expr::Log(a) => {
                let u = a.eval(x)?;
                if u <= 0.0 {
                    return Err(ModelError::Evaluation(format!("log of {}", u)));
                }
                u.ln()
            }
            Expr::Sin(a) => a.eval(x)?.sin(),
            Expr::Cos(a) => a.eval(x)?.cos(),
        };
        Ok(v)
    }

    fn collect_vars(&self, out: &mut BTreeSet<usize>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(i) => {
                out.insert(*i);
            }
            Expr::Neg(a)
            | Expr::Pow(a, _)
            | Expr::Sqrt(a)
            | Expr::Exp(a)
            | Expr::Log(a)
            | Expr::Sin(a)
            | Expr::Cos(a) => a.collect_vars(out),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
        }
    }

    fn vars(&self) -> BTreeSet<usize> {
        let mut s = BTreeSet::new();
        self.collect_vars(&mut s);
        s
    }

    fn function_type(&self) -> FunctionType {
        use FunctionType::*;
        match self {
            Expr::Const(_) => Constant,
            Expr::Var(_) => Linear,
            Expr::Neg(a) => a.function_type(),
            Expr::Add(a, b) | Expr::Sub(a, b) => a.function_type().add(b.function_type()),
            Expr::Mul(a, b) => {
                let (ta, tb) = (a.function_type(), b.function_type());
                let disjoint = a.vars().is_disjoint(&b.vars());
                match (ta, tb) {
                    (Linear, Linear) if disjoint => Bilinear,
                    (Linear, Bilinear) | (Bilinear, Linear) | (Linear, Multilinear)
                    | (Multilinear, Linear) | (Bilinear, Bilinear) if disjoint => Multilinear,
                    _ => ta.mult(tb),
                }
            }
            Expr::Div(a, b) => match b.function_type() {
                Constant => a.function_type(),
                _ => Nonlinear,
            },
            Expr::Pow(a, k) => {
                let t = a.function_type();
                match (*k, t) {
                    (_, Constant) | (0, _) => Constant,
                    (1, _) => t,
                    (k, _) if k < 0 => Nonlinear,
                    (2, Linear) => Quadratic,
                    (_, t) if t.is_polynomial() => Polynomial,
                    _ => t,
                }
            }
            Expr::Sqrt(a) | Expr::Exp(a) | Expr::Log(a) | Expr::Sin(a) | Expr::Cos(a) => {
                match a.function_type() {
                    Constant => Constant,
                    _ => Nonlinear,
                }
            }
        }
    }

    /// Split `c * e` into the scale and the rest.
    fn scaled(&self) -> (f64, &Expr) {
        match self {
            Expr::Neg(a) => {
                let (c, e) = a.scaled();
                (-c, e)
            }
            Expr::Mul(a, b) => match (&**a, &**b) {
                (Expr::Const(c), e) | (e, Expr::Const(c)) => {
                    let (d, e) = e.scaled();
                    (c * d, e)
                }
                _ => (1.0, self),
            },
            _ => (1.0, self),
        }
    }
}

fn rebuild<F>(e: &Arc<Expr>, leaf: &F) -> ModelResult<Arc<Expr>>
where
    F: Fn(usize) -> ModelResult<Arc<Expr>>,
{
    let out = match &**e {
        Expr::Const(_) => Arc::clone(e),
        Expr::Var(i) => leaf(*i)?,
        Expr::Neg(a) => Expr::neg(rebuild(a, leaf)?),
        Expr::Add(a, b) => Expr::add(rebuild(a, leaf)?, rebuild(b, leaf)?),
        Expr::Sub(a, b) => Expr::sub(rebuild(a, leaf)?, rebuild(b, leaf)?),
        Expr::Mul(a, b) => Expr::mul(rebuild(a, leaf)?, rebuild(b, leaf)?),
        Expr::Div(a, b) => Expr::div(rebuild(a, leaf)?, rebuild(b, leaf)?),
        Expr::Pow(a, k) => Expr::pow(rebuild(a, leaf)?, *k),
        Expr::Sqrt(a) => Expr::sqrt(rebuild(a, leaf)?),
        Expr::Exp(a) => Expr::exp(rebuild(a, leaf)?),
        Expr::Log(a) => Expr::log(rebuild(a, leaf)?),
        Expr::Sin(a) => Expr::sin(rebuild(a, leaf)?),
        Expr::Cos(a) => Expr::cos(rebuild(a, leaf)?),
    };
    Ok(out)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{}", c),
            Expr::Var(i) => write!(f, "x{}", i),
            Expr::Neg(a) => write!(f, "-({})", a),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => write!(f, "{}*{}", a, b),
            Expr::Div(a, b) => write!(f, "{}/{}", a, b),
            Expr::Pow(a, k) => write!(f, "{}^{}", a, k),
            Expr::Sqrt(a) => write!(f, "sqrt({})", a),
            Expr::Exp(a) => write!(f, "exp({})", a),
            Expr::Log(a) => write!(f, "log({})", a),
            Expr::Sin(a) => write!(f, "sin({})", a),
            Expr::Cos(a) => write!(f, "cos({})", a),
        }
    }
}

/// A nonlinear function. Cloning shares the underlying graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NonlinearFunction {
    root: Arc<Expr>,
}

impl NonlinearFunction {
    pub fn new(root: Arc<Expr>) -> Self {
        Self { root }
    }

    /// `c * x_i * x_j`.
    pub fn product(c: f64, i: usize, j: usize) -> Self {
        let p = Expr::mul(Expr::var(i), Expr::var(j));
        if c == 1.0 {
            Self::new(p)
        } else {
            Self::new(Expr::mul(Expr::constant(c), p))
        }
    }

    /// `c * x_i^2`.
    pub fn square(c: f64, i: usize) -> Self {
        let p = Expr::pow(Expr::var(i), 2);
        if c == 1.0 {
            Self::new(p)
        } else {
            Self::new(Expr::mul(Expr::constant(c), p))
        }
    }

    pub fn root(&self) -> &Arc<Expr> {
        &self.root
    }

    /// True if both functions point at the same graph.
    pub fn shares_graph(&self, other: &NonlinearFunction) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    pub fn eval(&self, x: &[f64]) -> ModelResult<f64> {
        let v = self.root.eval(x)?;
        if !v.is_finite() {
            return Err(ModelError::Evaluation(format!("non-finite value {}", v)));
        }
        Ok(v)
    }

    pub fn vars(&self) -> BTreeSet<usize> {
        self.root.vars()
    }

    pub fn has_var(&self, v: usize) -> bool {
        self.root.vars().contains(&v)
    }

    pub fn function_type(&self) -> FunctionType {
        self.root.function_type()
    }

    /// Copy of the graph with every variable renumbered through `map`.
    /// Fails if a variable has no image.
    pub fn clone_with_vars(&self, map: &[Option<usize>]) -> ModelResult<NonlinearFunction> {
        let root = rebuild(&self.root, &|i| match map.get(i).copied().flatten() {
            Some(j) => Ok(Expr::var(j)),
            None => Err(ModelError::UnmappedVariable(i)),
        })?;
        Ok(Self::new(root))
    }

    /// Same as [`Self::clone_with_vars`] but returns `None` on failure.
    pub fn remap(&self, map: &[Option<usize>]) -> Option<NonlinearFunction> {
        self.clone_with_vars(map).ok()
    }

    /// Replace `x_v` by the constant `val`.
    pub fn fix_var(&mut self, v: usize, val: f64) {
        if let Ok(root) = rebuild(&self.root, &|i| {
            Ok(if i == v {
                Expr::constant(val)
            } else {
                Expr::var(i)
            })
        }) {
            self.root = root;
        }
    }

    /// Replace `x_out` by `ratio * x_in`.
    pub fn subst(&mut self, out: usize, inn: usize, ratio: f64) {
        if let Ok(root) = rebuild(&self.root, &|i| {
            Ok(if i != out {
                Expr::var(i)
            } else if ratio == 1.0 {
                Expr::var(inn)
            } else {
                Expr::mul(Expr::constant(ratio), Expr::var(inn))
            })
        }) {
            self.root = root;
        }
    }

    /// The value of the graph if it has no variables.
    pub fn as_constant(&self) -> Option<f64> {
        match *self.root {
            Expr::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Recognise `c * x_i * x_j` with `i != j`; returns `(c, i, j)`.
    pub fn bilinear_vars(&self) -> Option<(f64, usize, usize)> {
        let (c, e) = self.root.scaled();
        match e {
            Expr::Mul(a, b) => match (&**a, &**b) {
                (Expr::Var(i), Expr::Var(j)) if i != j => Some((c, *i, *j)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Recognise `c * x_i^2`; returns `(c, i)`.
    pub fn square_var(&self) -> Option<(f64, usize)> {
        let (c, e) = self.root.scaled();
        match e {
            Expr::Mul(a, b) => match (&**a, &**b) {
                (Expr::Var(i), Expr::Var(j)) if i == j => Some((c, *i)),
                _ => None,
            },
            Expr::Pow(a, 2) => match **a {
                Expr::Var(i) => Some((c, i)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for NonlinearFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(NonlinearFunction::product(1.0, 0, 1).function_type(), FunctionType::Bilinear);
        assert_eq!(NonlinearFunction::square(2.0, 0).function_type(), FunctionType::Quadratic);
        let cube = NonlinearFunction::new(Expr::pow(Expr::var(0), 3));
        assert_eq!(cube.function_type(), FunctionType::Polynomial);
        let tri = NonlinearFunction::new(Expr::mul(
            Expr::var(0),
            Expr::mul(Expr::var(1), Expr::var(2)),
        ));
        assert_eq!(tri.function_type(), FunctionType::Multilinear);
        let e = NonlinearFunction::new(Expr::exp(Expr::var(0)));
        assert_eq!(e.function_type(), FunctionType::Nonlinear);
    }

    #[test]
    fn test_eval_errors() {
        let f = NonlinearFunction::new(Expr::log(Expr::var(0)));
        assert!(f.eval(&[1.0]).is_ok());
        assert!(matches!(f.eval(&[0.0]), Err(ModelError::Evaluation(_))));
        let g = NonlinearFunction::new(Expr::div(Expr::constant(1.0), Expr::var(0)));
        assert!(g.eval(&[0.0]).is_err());
    }

    #[test]
    fn test_clone_with_vars() {
        let f = NonlinearFunction::product(-1.0, 0, 2);
        let g = f.clone_with_vars(&[Some(1), None, Some(0)]).unwrap();
        assert_eq!(g.vars().into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert!(!g.shares_graph(&f));
        assert_eq!(
            f.clone_with_vars(&[Some(0)]),
            Err(ModelError::UnmappedVariable(2))
        );
    }

    #[test]
    fn test_shape_queries() {
        let f = NonlinearFunction::product(-1.0, 3, 1);
        assert_eq!(f.bilinear_vars(), Some((-1.0, 3, 1)));
        assert_eq!(f.square_var(), None);
        let neg = NonlinearFunction::new(Expr::neg(Expr::pow(Expr::var(4), 2)));
        assert_eq!(neg.square_var(), Some((-1.0, 4)));
        let sq = NonlinearFunction::product(1.0, 2, 2);
        assert_eq!(sq.square_var(), Some((1.0, 2)));
    }

    #[test]
    fn test_fix_var_folds() {
        let mut f = NonlinearFunction::product(2.0, 0, 1);
        f.fix_var(0, 3.0);
        assert_eq!(f.function_type(), FunctionType::Linear);
        f.fix_var(1, 1.0);
        assert_eq!(f.as_constant(), Some(6.0));
    }
}
