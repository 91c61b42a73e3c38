//! Reversible changes to a problem.
//!
//! Every modification remembers what it overwrote when applied, so undoing
//! a sequence in reverse order restores the problem exactly. Callers must
//! undo in strict LIFO order.

use std::fmt;

use crate::function::LinearFunction;
use crate::problem::Problem;
use crate::settings::ABS_TOL;
use crate::types::BoundType;

/// Secant of `y = x^2` over `[lb, ub]`: `y - (lb + ub) x <= -lb ub`.
///
/// When `lb + ub` is numerically zero the `x` term is dropped.
/// Both bounds must be finite.
pub fn secant_row(x: usize, y: usize, lb: f64, ub: f64) -> (LinearFunction, f64) {
    assert!(lb > -1e21 && ub < 1e21, "secant needs finite bounds on x{}", x);
    let mut lf = LinearFunction::new();
    lf.add_term(y, 1.0);
    if (ub + lb).abs() > ABS_TOL {
        lf.add_term(x, -(lb + ub));
    }
    (lf, -lb * ub)
}

/// Change one bound of a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBoundMod {
    pub var: usize,
    pub lu: BoundType,
    pub value: f64,
    old: Option<f64>,
}

/// Change both bounds of a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBound2Mod {
    pub var: usize,
    pub lb: f64,
    pub ub: f64,
    old: Option<(f64, f64)>,
}

/// Replace the linear part and bounds of a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct LinConMod {
    pub cons: usize,
    pub lf: LinearFunction,
    pub lb: f64,
    pub ub: f64,
    old: Option<(LinearFunction, f64, f64)>,
}

/// Change one bound of `x` and rebuild the secant row `cons` of `y = x^2`
/// for the resulting box.
#[derive(Debug, Clone, PartialEq)]
pub struct SecantMod {
    pub cons: usize,
    pub x: usize,
    pub y: usize,
    pub lu: BoundType,
    pub value: f64,
    old: Option<(f64, LinearFunction, f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modification {
    VarBound(VarBoundMod),
    VarBound2(VarBound2Mod),
    LinCon(LinConMod),
    Secant(SecantMod),
    /// Applied in order, undone in reverse.
    Bundle(Vec<Modification>),
}

impl Modification {
    pub fn var_bound(var: usize, lu: BoundType, value: f64) -> Self {
        Modification::VarBound(VarBoundMod {
            var,
            lu,
            value,
            old: None,
        })
    }

    pub fn var_bounds(var: usize, lb: f64, ub: f64) -> Self {
        Modification::VarBound2(VarBound2Mod {
            var,
            lb,
            ub,
            old: None,
        })
    }

    pub fn lin_con(cons: usize, lf: LinearFunction, lb: f64, ub: f64) -> Self {
        Modification::LinCon(LinConMod {
            cons,
            lf,
            lb,
            ub,
            old: None,
        })
    }

    pub fn secant(cons: usize, x: usize, y: usize, lu: BoundType, value: f64) -> Self {
        Modification::Secant(SecantMod {
            cons,
            x,
            y,
            lu,
            value,
            old: None,
        })
    }

    /// The same change, not yet applied anywhere. Used to replay a
    /// recorded change on another problem.
    pub fn fresh(&self) -> Self {
        match self {
            Modification::VarBound(m) => Self::var_bound(m.var, m.lu, m.value),
            Modification::VarBound2(m) => Self::var_bounds(m.var, m.lb, m.ub),
            Modification::LinCon(m) => Self::lin_con(m.cons, m.lf.clone(), m.lb, m.ub),
            Modification::Secant(m) => Self::secant(m.cons, m.x, m.y, m.lu, m.value),
            Modification::Bundle(v) => Modification::Bundle(v.iter().map(Self::fresh).collect()),
        }
    }

    pub fn apply(&mut self, p: &mut Problem) {
        match self {
            Modification::VarBound(m) => {
                let v = p.variable(m.var);
                m.old = Some(match m.lu {
                    BoundType::Lower => v.lb,
                    BoundType::Upper => v.ub,
                });
                p.change_bound(m.var, m.lu, m.value);
            }
            Modification::VarBound2(m) => {
                let v = p.variable(m.var);
                m.old = Some((v.lb, v.ub));
                p.change_bounds(m.var, m.lb, m.ub);
            }
            Modification::LinCon(m) => {
                let c = p.constraint(m.cons);
                m.old = Some((c.linear().cloned().unwrap_or_default(), c.lb, c.ub));
                p.change_constraint(m.cons, m.lf.clone(), m.lb, m.ub);
            }
            Modification::Secant(m) => {
                let v = p.variable(m.x);
                let old_bound = match m.lu {
                    BoundType::Lower => v.lb,
                    BoundType::Upper => v.ub,
                };
                let c = p.constraint(m.cons);
                m.old = Some((old_bound, c.linear().cloned().unwrap_or_default(), c.lb, c.ub));
                p.change_bound(m.x, m.lu, m.value);
                let (lb, ub) = (p.variable(m.x).lb, p.variable(m.x).ub);
                let (lf, rhs) = secant_row(m.x, m.y, lb, ub);
                p.change_constraint(m.cons, lf, f64::NEG_INFINITY, rhs);
            }
            Modification::Bundle(mods) => {
                for m in mods.iter_mut() {
                    m.apply(p);
                }
            }
        }
    }

    /// Restore what [`Self::apply`] overwrote. Does nothing if the
    /// modification was never applied.
    pub fn undo(&mut self, p: &mut Problem) {
        match self {
            Modification::VarBound(m) => {
                if let Some(old) = m.old.take() {
                    p.change_bound(m.var, m.lu, old);
                }
            }
            Modification::VarBound2(m) => {
                if let Some((lb, ub)) = m.old.take() {
                    p.change_bounds(m.var, lb, ub);
                }
            }
            Modification::LinCon(m) => {
                if let Some((lf, lb, ub)) = m.old.take() {
                    p.change_constraint(m.cons, lf, lb, ub);
                }
            }
            Modification::Secant(m) => {
                if let Some((bound, lf, lb, ub)) = m.old.take() {
                    p.change_constraint(m.cons, lf, lb, ub);
                    p.change_bound(m.x, m.lu, bound);
                }
            }
            Modification::Bundle(mods) => {
                for m in mods.iter_mut().rev() {
                    m.undo(p);
                }
            }
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |lu: BoundType| match lu {
            BoundType::Lower => "lb",
            BoundType::Upper => "ub",
        };
        match self {
            Modification::VarBound(m) => write!(f, "x{}.{} <- {}", m.var, side(m.lu), m.value),
            Modification::VarBound2(m) => write!(f, "x{} <- [{}, {}]", m.var, m.lb, m.ub),
            Modification::LinCon(m) => {
                write!(f, "cons{} <- {} <= {} <= {}", m.cons, m.lb, m.lf, m.ub)
            }
            Modification::Secant(m) => write!(
                f,
                "x{}.{} <- {} with secant cons{}",
                m.x,
                side(m.lu),
                m.value,
                m.cons
            ),
            Modification::Bundle(v) => {
                write!(f, "bundle of {}", v.len())
            }
        }
    }
}
