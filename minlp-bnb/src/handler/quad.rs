//! Handler for the auxiliary relations `y = x^2` and `y = x0 * x1`.
//!
//! Squares are relaxed by their secant and cut from below by tangents.
//! Bilinear terms are relaxed by the four McCormick rows. Both depend on
//! the bounds of the factors, so the rows are regenerated whenever bound
//! propagation or branching shrinks a box.

use std::collections::BTreeMap;

use minlp_core::interval::{bounds_on_div, bounds_on_product, bounds_on_square};
use minlp_core::modification::secant_row;
use minlp_core::settings::{ABS_TOL, REL_TOL};
use minlp_core::{
    BoundType, BranchDirection, Constraint, Function, LinearFunction, Modification, Problem,
    Relaxation, SeparationStatus, SolveStatus,
};

use super::linbil::{mccormick_row, LinBil, LinSqr};
use super::tangent::find_lin_pt;
use super::Handler;
use crate::search::{Branch, BrVarCand};
use crate::settings::QuadSettings;

const ME: &str = "QuadHandler: ";

/// Passes over all terms in one propagation call.
const MAX_PROP_ROUNDS: usize = 50;

/// Minimum distance of a branching point from the bounds.
const BRANCH_BOUND_TOL: f64 = 1e-8;

/// Destination of tightened bounds.
trait BoundSink {
    fn problem(&self) -> &Problem;

    /// Intersect the bounds of `v` with `[lb, ub]`. Returns true if the
    /// intersection is empty beyond [`ABS_TOL`].
    fn tighten(&mut self, v: usize, lb: f64, ub: f64) -> bool;

    /// Whether anything changed since the last call.
    fn take_changed(&mut self) -> bool;

    fn bounds(&self, v: usize) -> (f64, f64) {
        let var = self.problem().variable(v);
        (var.lb, var.ub)
    }
}

/// Which sides of `[vlb, vub]` improve by more than the tolerance, with
/// the new values clipped into the old box.
fn improvement(vlb: f64, vub: f64, lb: f64, ub: f64) -> Option<(Option<f64>, Option<f64>)> {
    if lb > vub + ABS_TOL || ub < vlb - ABS_TOL {
        return None;
    }
    let new_lb = (lb > vlb + ABS_TOL).then(|| lb.min(vub));
    let new_ub = (ub < vub - ABS_TOL).then(|| ub.max(vlb));
    Some((new_lb, new_ub))
}

/// The modification that moves the given sides of the bounds of `v`.
fn bound_mod(v: usize, sides: (Option<f64>, Option<f64>)) -> Option<Modification> {
    match sides {
        (Some(l), Some(u)) => Some(Modification::var_bounds(v, l, u)),
        (Some(l), None) => Some(Modification::var_bound(v, BoundType::Lower, l)),
        (None, Some(u)) => Some(Modification::var_bound(v, BoundType::Upper, u)),
        (None, None) => None,
    }
}

/// Changes the problem in place, without records.
struct Direct<'a> {
    p: &'a mut Problem,
    changed: bool,
    any: bool,
}

impl BoundSink for Direct<'_> {
    fn problem(&self) -> &Problem {
        self.p
    }

    fn tighten(&mut self, v: usize, lb: f64, ub: f64) -> bool {
        let (vlb, vub) = self.bounds(v);
        let Some((new_lb, new_ub)) = improvement(vlb, vub, lb, ub) else {
            return true;
        };
        if let Some(u) = new_ub {
            self.p.change_bound(v, BoundType::Upper, u);
            self.changed = true;
        }
        if let Some(l) = new_lb {
            self.p.change_bound(v, BoundType::Lower, l);
            self.changed = true;
        }
        self.any |= self.changed;
        false
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Applies every change as a [`Modification`] and keeps it for undo.
struct Recorded<'a> {
    p: &'a mut Problem,
    rel: &'a mut Relaxation,
    modify_relaxation: bool,
    p_mods: &'a mut Vec<Modification>,
    r_mods: &'a mut Vec<Modification>,
    changed: bool,
}

impl BoundSink for Recorded<'_> {
    fn problem(&self) -> &Problem {
        self.p
    }

    fn tighten(&mut self, v: usize, lb: f64, ub: f64) -> bool {
        let (vlb, vub) = self.bounds(v);
        let Some(sides) = improvement(vlb, vub, lb, ub) else {
            return true;
        };
        let Some(mut m) = bound_mod(v, sides) else {
            return false;
        };
        log::debug!("{}tightened x{}: {}", ME, v, m);
        m.apply(self.p);
        self.p_mods.push(m);
        self.changed = true;

        // the relaxation box may already be tighter than the problem's
        let Some(r) = self.rel.relaxation_var(v).filter(|_| self.modify_relaxation) else {
            return false;
        };
        let (rlb, rub) = (self.rel.variable(r).lb, self.rel.variable(r).ub);
        let Some(sides) = improvement(rlb, rub, lb, ub) else {
            return true;
        };
        if let Some(mut m) = bound_mod(r, sides) {
            m.apply(self.rel.problem_mut());
            self.r_mods.push(m);
        }
        false
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Tighten `y` from `x`, then `x` from `y`. Returns true if infeasible.
fn prop_sqr(sq: &LinSqr, sink: &mut impl BoundSink) -> bool {
    let (xlb, xub) = sink.bounds(sq.x);
    let (lb, ub) = bounds_on_square(xlb, xub);
    if sink.tighten(sq.y, lb, ub) {
        return true;
    }

    let (ylb, yub) = sink.bounds(sq.y);
    let xlb = sink.bounds(sq.x).0;
    if yub > ABS_TOL {
        let ub = yub.sqrt();
        let root = ylb.max(0.0).sqrt();
        // x cannot reach the left branch of the parabola
        let lb = if xlb > -root + ABS_TOL { root } else { -ub };
        sink.tighten(sq.x, lb, ub)
    } else if yub < -ABS_TOL {
        true
    } else {
        sink.tighten(sq.x, 0.0, 0.0)
    }
}

/// Tighten `y` from the product box, then each factor by dividing `y` by
/// the other factor. Returns true if infeasible.
fn prop_bil(b: &LinBil, sink: &mut impl BoundSink) -> bool {
    let (l0, u0) = sink.bounds(b.x0());
    let (l1, u1) = sink.bounds(b.x1());
    let (lb, ub) = bounds_on_product(l0, u0, l1, u1);
    if sink.tighten(b.y(), lb, ub) {
        return true;
    }

    let (yl, yu) = sink.bounds(b.y());
    let (lb, ub) = bounds_on_div(yl, yu, l0, u0);
    if sink.tighten(b.x1(), lb, ub) {
        return true;
    }

    let (l1, u1) = sink.bounds(b.x1());
    let (lb, ub) = bounds_on_div(yl, yu, l1, u1);
    sink.tighten(b.x0(), lb, ub)
}

/// Intersect the bounds of two variables defined by the same term.
/// Returns true if infeasible.
fn prop_alias(y: usize, dup: usize, sink: &mut impl BoundSink) -> bool {
    let (lb, ub) = sink.bounds(y);
    if sink.tighten(dup, lb, ub) {
        return true;
    }
    let (lb, ub) = sink.bounds(dup);
    sink.tighten(y, lb, ub)
}

/// Secant row of `y = x^2`, or the free row `y <= inf` while `x` is
/// unbounded.
fn sq_row(x: usize, y: usize, lb: f64, ub: f64) -> (LinearFunction, f64) {
    if lb.is_finite() && ub.is_finite() {
        secant_row(x, y, lb, ub)
    } else {
        (LinearFunction::from_terms([(y, 1.0)]), f64::INFINITY)
    }
}

/// Replace row `c` of `rel` by `lf <= rhs` unless it already is that row.
fn replace_row(
    rel: &mut Relaxation,
    c: usize,
    lf: LinearFunction,
    rhs: f64,
    r_mods: &mut Vec<Modification>,
) {
    let con = rel.constraint(c);
    if con.linear() == Some(&lf) && con.ub == rhs && con.lb == f64::NEG_INFINITY {
        return;
    }
    let mut m = Modification::lin_con(c, lf, f64::NEG_INFINITY, rhs);
    log::debug!("{}refreshed row {}", ME, m);
    m.apply(rel.problem_mut());
    r_mods.push(m);
}

/// Relaxes, propagates and branches on `y = x^2` and `y = x0 * x1`.
#[derive(Debug, Clone, Default)]
pub struct QuadHandler {
    settings: QuadSettings,
    cons: Vec<usize>,
    /// Squares keyed by `x`.
    x2_funs: BTreeMap<usize, LinSqr>,
    /// Bilinear terms keyed by their ordered factor pair.
    x0x1_funs: BTreeMap<(usize, usize), LinBil>,
    /// Variables defined by a term already held for another variable.
    aliases: Vec<(usize, usize)>,
}

impl QuadHandler {
    pub fn new(settings: QuadSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// A handler for every constraint of `p` that it accepts.
    pub fn from_problem(p: &Problem, settings: QuadSettings) -> Self {
        let mut h = Self::new(settings);
        for c in 0..p.num_cons() {
            if Self::accepts(p.constraint(c)) {
                h.add_constraint(p, c);
            }
        }
        log::debug!(
            "{}{} squares, {} bilinear terms",
            ME,
            h.x2_funs.len(),
            h.x0x1_funs.len()
        );
        h
    }

    pub fn settings(&self) -> &QuadSettings {
        &self.settings
    }

    /// Match `a y + c m(x) = 0` with `a = -c`, where `m` is `x^2` or
    /// `x0 * x1`. Returns `(x0, x1, y)`, with `x1` absent for a square.
    fn term_of(con: &Constraint) -> Option<(usize, Option<usize>, usize)> {
        let f = &con.function;
        if f.quadratic.as_ref().is_some_and(|qf| !qf.is_empty()) {
            return None;
        }
        let lf = f.linear.as_ref()?;
        let nlf = f.nonlinear.as_ref()?;
        if lf.num_terms() != 1 || con.lb != 0.0 || con.ub != 0.0 {
            return None;
        }
        let (y, a) = lf.terms().next()?;
        let same_scale = |c: f64| (a + c).abs() <= f64::EPSILON * a.abs();
        if let Some((c, x0, x1)) = nlf.bilinear_vars() {
            return (same_scale(c) && x0 != y && x1 != y).then_some((x0, Some(x1), y));
        }
        if let Some((c, x)) = nlf.square_var() {
            return (same_scale(c) && x != y).then_some((x, None, y));
        }
        None
    }

    /// True if `con` defines `y = x^2` or `y = x0 * x1`.
    pub fn accepts(con: &Constraint) -> bool {
        Self::term_of(con).is_some()
    }

    /// Take charge of constraint `c` of `p`.
    ///
    /// Panics unless [`Self::accepts`] holds; other shapes, including
    /// constraints with a quadratic part, belong to other handlers.
    pub fn add_constraint(&mut self, p: &Problem, c: usize) {
        let con = p.constraint(c);
        let Some((x0, x1, y)) = Self::term_of(con) else {
            panic!("{}cannot handle {}: {}", ME, con.name, con.function);
        };
        self.cons.push(c);
        let held = match x1 {
            None => self.x2_funs.entry(x0).or_insert_with(|| LinSqr::new(x0, y)).y,
            Some(x1) => {
                let b = LinBil::new(x0, x1, y);
                self.x0x1_funs.entry(b.key()).or_insert(b).y()
            }
        };
        if held != y && !self.aliases.contains(&(held, y)) {
            log::debug!("{}x{} repeats the term of x{}", ME, y, held);
            self.aliases.push((held, y));
        }
    }

    /// Pairs `(y, dup)` where `dup` is defined by the same term as `y`.
    pub fn aliases(&self) -> &[(usize, usize)] {
        &self.aliases
    }

    pub fn num_squares(&self) -> usize {
        self.x2_funs.len()
    }

    pub fn num_bilinears(&self) -> usize {
        self.x0x1_funs.len()
    }

    /// The square whose base is `x`.
    pub fn linsqr(&self, x: usize) -> Option<&LinSqr> {
        self.x2_funs.get(&x)
    }

    /// The bilinear term with factors `a` and `b`, in either order.
    pub fn linbil(&self, a: usize, b: usize) -> Option<&LinBil> {
        self.x0x1_funs.get(&(a.min(b), a.max(b)))
    }

    fn relax(&mut self, rel: &mut Relaxation) {
        for sq in self.x2_funs.values_mut() {
            let v = rel.variable(sq.x);
            let (lf, rhs) = sq_row(sq.x, sq.y, v.lb, v.ub);
            sq.oe_con = Some(rel.new_constraint(Function::from_linear(lf), f64::NEG_INFINITY, rhs));
        }

        for b in self.x0x1_funs.values_mut() {
            let (x0, x1, y) = (b.x0(), b.x1(), b.y());
            let (l0, u0) = (rel.variable(x0).lb, rel.variable(x0).ub);
            let (l1, u1) = (rel.variable(x1).lb, rel.variable(x1).ub);
            let mut cons = [0; 4];
            for (facet, c) in cons.iter_mut().enumerate() {
                let (lf, rhs) = mccormick_row(x0, l0, u0, x1, l1, u1, y, facet);
                *c = rel.new_constraint(Function::from_linear(lf), f64::NEG_INFINITY, rhs);
            }
            b.set_cons(cons);
        }

        for &(y, dup) in &self.aliases {
            let lf = LinearFunction::from_terms([(dup, 1.0), (y, -1.0)]);
            rel.new_constraint(Function::from_linear(lf), 0.0, 0.0);
        }
        debug_assert_eq!(rel.check_con_vars(), 0);
    }

    /// Propagate over all terms until no bound moves. Returns true if
    /// infeasible.
    fn propagate(&self, sink: &mut impl BoundSink) -> bool {
        for _ in 0..MAX_PROP_ROUNDS {
            for sq in self.x2_funs.values() {
                if prop_sqr(sq, sink) {
                    log::debug!("{}x{}^2 = x{} is infeasible", ME, sq.x, sq.y);
                    return true;
                }
            }
            for b in self.x0x1_funs.values() {
                if prop_bil(b, sink) {
                    log::debug!("{}x{} * x{} = x{} is infeasible", ME, b.x0(), b.x1(), b.y());
                    return true;
                }
            }
            for &(y, dup) in &self.aliases {
                if prop_alias(y, dup, sink) {
                    log::debug!("{}x{} = x{} is infeasible", ME, dup, y);
                    return true;
                }
            }
            if !sink.take_changed() {
                break;
            }
        }
        false
    }

    /// Regenerate the secant when it is no longer tight at both ends of
    /// the box of `x`.
    fn up_sq_con(sq: &LinSqr, rel: &mut Relaxation, r_mods: &mut Vec<Modification>) {
        let Some(c) = sq.oe_con else {
            return;
        };
        let (lb, ub) = (rel.variable(sq.x).lb, rel.variable(sq.x).ub);
        let con = rel.constraint(c);
        let (a_x, a_y) = con
            .linear()
            .map_or((0.0, 0.0), |lf| (lf.weight(sq.x), lf.weight(sq.y)));
        assert!((a_y - 1.0).abs() <= 1e-8, "secant row {} lost its y term", c);
        let cub = con.ub;
        if lb * lb + a_x * lb < cub - ABS_TOL || ub * ub + a_x * ub < cub - ABS_TOL {
            let (lf, rhs) = sq_row(sq.x, sq.y, lb, ub);
            replace_row(rel, c, lf, rhs, r_mods);
        }
    }

    /// Regenerate every McCormick row that is not tight at the three box
    /// corners where it should be.
    fn up_bil_con(b: &LinBil, rel: &mut Relaxation, r_mods: &mut Vec<Modification>) {
        let Some(cons) = b.cons() else {
            return;
        };
        let (x0, x1, y) = (b.x0(), b.x1(), b.y());
        let (l0, u0) = (rel.variable(x0).lb, rel.variable(x0).ub);
        let (l1, u1) = (rel.variable(x1).lb, rel.variable(x1).ub);
        let corners = [
            [(l0, l1), (l0, u1), (u0, l1)],
            [(l0, u1), (u0, l1), (u0, u1)],
            [(l0, l1), (l0, u1), (u0, u1)],
            [(l0, l1), (u0, l1), (u0, u1)],
        ];
        for (facet, &c) in cons.iter().enumerate() {
            let con = rel.constraint(c);
            let (a0, a1, ay) = con.linear().map_or((0.0, 0.0, 0.0), |lf| {
                (lf.weight(x0), lf.weight(x1), lf.weight(y))
            });
            let cub = con.ub;
            let stale = corners[facet]
                .iter()
                .any(|&(v0, v1)| a0 * v0 + a1 * v1 + ay * v0 * v1 < cub - ABS_TOL);
            if stale {
                let (lf, rhs) = mccormick_row(x0, l0, u0, x1, l1, u1, y, facet);
                replace_row(rel, c, lf, rhs, r_mods);
            }
        }
    }

    fn refresh_rows(&self, rel: &mut Relaxation, r_mods: &mut Vec<Modification>) {
        for sq in self.x2_funs.values() {
            Self::up_sq_con(sq, rel, r_mods);
        }
        for b in self.x0x1_funs.values() {
            Self::up_bil_con(b, rel, r_mods);
        }
    }

    fn is_at_bnds(rel: &Relaxation, v: usize, val: f64) -> bool {
        let var = rel.variable(v);
        (val - var.lb).abs() < ABS_TOL || (val - var.ub).abs() < ABS_TOL
    }

    /// Add the tangent of `y = x^2` at the parabola point nearest to
    /// `(xval, yval)` if it cuts that point off by enough.
    fn add_cut(rel: &mut Relaxation, sq: &LinSqr, xval: f64, yval: f64) -> bool {
        let (xl, yl) = find_lin_pt(xval, yval);
        let lhs = 2.0 * xl * xval - yval;
        if lhs - yl > 1e-5 && lhs > yl * (1.0 + 1e-4) {
            let lf = LinearFunction::from_terms([(sq.x, 2.0 * xl), (sq.y, -1.0)]);
            let c = rel.new_constraint(Function::from_linear(lf), f64::NEG_INFINITY, xl * xl);
            log::debug!("{}new cut {}", ME, rel.constraint(c));
            true
        } else {
            log::debug!(
                "{}not adding cut because of insufficient violation {}",
                ME,
                lhs - xl * xl
            );
            false
        }
    }
}

impl Handler for QuadHandler {
    fn name(&self) -> &str {
        "QuadHandler"
    }

    fn constraints(&self) -> &[usize] {
        &self.cons
    }

    fn relax_init_full(&mut self, _p: &Problem, rel: &mut Relaxation) -> bool {
        self.relax(rel);
        false
    }

    fn relax_node_full(&mut self, _p: &Problem, rel: &mut Relaxation) -> bool {
        let mut mods = Vec::new();
        self.refresh_rows(rel, &mut mods);
        false
    }

    fn is_feasible(&self, x: &[f64], _p: &Problem, _rel: &Relaxation) -> bool {
        for sq in self.x2_funs.values() {
            let (xval, yval) = (x[sq.x], x[sq.y]);
            let gap = (yval - xval * xval).abs();
            if gap / (yval.abs() + 1e-6) > REL_TOL && gap > ABS_TOL {
                return false;
            }
        }
        self.x0x1_funs.values().all(|b| !b.is_violated(x))
            && self.aliases.iter().all(|&(y, dup)| {
                let gap = (x[y] - x[dup]).abs();
                gap <= ABS_TOL || gap <= REL_TOL * x[y].abs()
            })
    }

    fn separate(
        &mut self,
        x: &[f64],
        _p: &Problem,
        rel: &mut Relaxation,
    ) -> (SeparationStatus, usize) {
        let mut ncuts = 0;
        for sq in self.x2_funs.values() {
            let (xval, yval) = (x[sq.x], x[sq.y]);
            let sqr = xval * xval;
            if sqr > (1.0 + REL_TOL) * yval.abs() && (sqr - yval).abs() > ABS_TOL {
                log::debug!("{}x{} = {} x{} = {} violation = {}", ME, sq.x, xval, sq.y, yval, sqr - yval);
                if Self::add_cut(rel, sq, xval, yval) {
                    ncuts += 1;
                }
            }
        }
        if ncuts > 0 {
            (SeparationStatus::SepaResolve, ncuts)
        } else {
            (SeparationStatus::SepaNone, 0)
        }
    }

    fn branching_candidates(&self, x: &[f64], _p: &Problem, rel: &Relaxation) -> Vec<BrVarCand> {
        let mut cands: BTreeMap<usize, BrVarCand> = BTreeMap::new();
        let mut add = |v: usize, ddist: f64, udist: f64| {
            cands
                .entry(v)
                .and_modify(|c| c.add_dist(ddist, udist))
                .or_insert_with(|| BrVarCand::new(v, ddist, udist));
        };

        // y above the parabola: only branching on x helps
        for sq in self.x2_funs.values() {
            let (xval, yval) = (x[sq.x], x[sq.y]);
            let vio = yval - xval * xval;
            if vio / (yval.abs() + 1e-6) > REL_TOL {
                log::debug!("{}branching candidate for x^2: x{} = {} aux x{} = {}", ME, sq.x, xval, sq.y, yval);
                let v = rel.variable(sq.x);
                let ddist = vio / (1.0 + (v.lb + xval) * (v.lb + xval)).sqrt();
                let udist = vio / (1.0 + (v.ub + xval) * (v.ub + xval)).sqrt();
                add(sq.x, ddist, udist);
            } else if -vio / (yval.abs() + 1e-6) > REL_TOL {
                log::debug!(
                    "{}x{} = {} below x{}^2 = {} with no cut or branch, node stays unresolved",
                    ME, sq.y, yval, sq.x, xval * xval
                );
            }
        }

        for b in self.x0x1_funs.values() {
            let (x0, x1) = (b.x0(), b.x1());
            let (x0val, x1val, yval) = (x[x0], x[x1], x[b.y()]);
            if !b.is_violated_at(x0val, x1val, yval) {
                continue;
            }
            let prod = x0val * x1val;
            let mut check = false;
            for (v, val, other, oval) in [(x0, x0val, x1, x1val), (x1, x1val, x0, x0val)] {
                if Self::is_at_bnds(rel, v, val) {
                    continue;
                }
                check = true;
                let (ol, ou) = (rel.variable(other).lb, rel.variable(other).ub);
                let norm = |bound: f64| (1.0 + val * val + bound * bound).sqrt();
                let (ddist, udist) = if prod > yval {
                    ((prod - yval) / norm(ou), (prod - yval) / norm(ol))
                } else {
                    ((yval - prod) / norm(ol), (yval - prod) / norm(ou))
                };
                log::debug!(
                    "{}branching candidate for x0x1: x{} = {} x{} = {} x{} = {} vio = {}",
                    ME, v, val, other, oval, b.y(), yval, (prod - yval).abs()
                );
                add(v, ddist, udist);
            }
            if !check {
                log::error!(
                    "{}both variables are at bounds, but we still want to branch on a bilinear \
                     constraint. x{} = {} x{} = {} x{} = {} product = {}",
                    ME, x0, x0val, x1, x1val, b.y(), yval, prod
                );
            }
        }
        cands.into_values().collect()
    }

    fn branches(&self, cand: &BrVarCand, x: &[f64], _p: &Problem, rel: &Relaxation) -> Vec<Branch> {
        let v = cand.var;
        let value = x[v];
        let var = rel.variable(v);
        assert!(
            value > var.lb + BRANCH_BOUND_TOL && value < var.ub - BRANCH_BOUND_TOL,
            "{}cannot branch on x{} = {} at its bounds [{}, {}]",
            ME, v, value, var.lb, var.ub
        );

        let mut out = Vec::with_capacity(2);
        for lu in [BoundType::Upper, BoundType::Lower] {
            let mut br = Branch::new(value);
            if self.settings.modify_problem {
                if let Some(pv) = rel.original_var(v) {
                    br.add_p_mod(Modification::var_bound(pv, lu, value));
                }
            }
            if self.settings.modify_relaxation {
                br.add_r_mod(Modification::var_bound(v, lu, value));
            }
            out.push(br);
        }
        log::debug!("{}branching on x{} <= {} or >= {}", ME, v, value, value);
        out
    }

    fn br_mod(
        &self,
        cand: &BrVarCand,
        x: &[f64],
        rel: &Relaxation,
        dir: BranchDirection,
    ) -> Modification {
        let x0 = cand.var;
        let value = x[x0];
        let var = rel.variable(x0);
        let (lb, ub, lu) = match dir {
            BranchDirection::DownBranch => (var.lb, value, BoundType::Upper),
            BranchDirection::UpBranch => (value, var.ub, BoundType::Lower),
        };

        if let Some(sq) = self.x2_funs.get(&x0) {
            if let (Some(c), true) = (sq.oe_con, lb.is_finite() && ub.is_finite()) {
                return Modification::secant(c, x0, sq.y, lu, value);
            }
        }

        let mut mods = Vec::new();
        for b in self.x0x1_funs.values() {
            if let Some(x1) = b.other_x(x0) {
                let other = rel.variable(x1);
                let (l, u) = bounds_on_product(lb, ub, other.lb, other.ub);
                let y = rel.variable(b.y());
                mods.push(Modification::var_bounds(b.y(), l.max(y.lb), u.min(y.ub)));
            }
        }
        mods.push(Modification::var_bound(x0, lu, value));
        Modification::Bundle(mods)
    }

    fn presolve(&mut self, p: &mut Problem) -> (SolveStatus, bool) {
        let mut sink = Direct {
            p,
            changed: false,
            any: false,
        };
        let is_inf = self.propagate(&mut sink);
        let status = if is_inf {
            SolveStatus::SolvedInfeasible
        } else {
            SolveStatus::Finished
        };
        (status, sink.any)
    }

    fn presolve_node(
        &mut self,
        p: &mut Problem,
        rel: &mut Relaxation,
        p_mods: &mut Vec<Modification>,
        r_mods: &mut Vec<Modification>,
    ) -> bool {
        let mut sink = Recorded {
            p,
            rel: &mut *rel,
            modify_relaxation: self.settings.modify_relaxation,
            p_mods,
            r_mods: &mut *r_mods,
            changed: false,
        };
        if self.propagate(&mut sink) {
            return true;
        }
        self.refresh_rows(rel, r_mods);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minlp_core::{NonlinearFunction, QuadraticFunction, VariableType};

    fn square_problem(lb: f64, ub: f64) -> Problem {
        let mut p = Problem::new();
        let x = p.new_variable(lb, ub, VariableType::Continuous);
        let y = p.new_variable(f64::NEG_INFINITY, f64::INFINITY, VariableType::Continuous);
        let f = Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            NonlinearFunction::square(-1.0, x),
        );
        p.new_constraint(f, 0.0, 0.0);
        p
    }

    #[test]
    fn test_accepts() {
        let p = square_problem(-1.0, 1.0);
        assert!(QuadHandler::accepts(p.constraint(0)));

        let mut q = Problem::new();
        let x = q.new_variable(0.0, 1.0, VariableType::Continuous);
        let y = q.new_variable(0.0, 1.0, VariableType::Continuous);
        let f = Function::from_quadratic(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            QuadraticFunction::from_terms([(x, x, -1.0)]),
        );
        q.new_constraint(f, 0.0, 0.0);
        // y <= x^2 is not a definition of y
        let g = Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            NonlinearFunction::square(-1.0, x),
        );
        q.new_constraint(g, f64::NEG_INFINITY, 0.0);
        assert!(!QuadHandler::accepts(q.constraint(0)));
        assert!(!QuadHandler::accepts(q.constraint(1)));
        assert_eq!(QuadHandler::from_problem(&q, QuadSettings::default()).constraints().len(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot handle")]
    fn test_add_unsupported_constraint_panics() {
        let mut q = Problem::new();
        let x = q.new_variable(0.0, 1.0, VariableType::Continuous);
        let f = Function::from_quadratic(None, QuadraticFunction::from_terms([(x, x, 1.0)]));
        q.new_constraint(f, 0.0, 1.0);
        QuadHandler::new(QuadSettings::default()).add_constraint(&q, 0);
    }

    #[test]
    fn test_duplicate_terms_are_merged() {
        let mut p = Problem::new();
        let x0 = p.new_variable(0.0, 1.0, VariableType::Continuous);
        let x1 = p.new_variable(0.0, 1.0, VariableType::Continuous);
        let y = p.new_variable(0.0, 1.0, VariableType::Continuous);
        for (a, b) in [(x0, x1), (x1, x0)] {
            let f = Function::from_nonlinear(
                Some(LinearFunction::from_terms([(y, 1.0)])),
                NonlinearFunction::product(-1.0, a, b),
            );
            p.new_constraint(f, 0.0, 0.0);
        }
        let h = QuadHandler::from_problem(&p, QuadSettings::default());
        assert_eq!(h.num_bilinears(), 1);
        assert_eq!(h.constraints(), &[0, 1]);
        assert!(h.linbil(x1, x0).is_some());
        assert!(h.aliases().is_empty());
    }

    #[test]
    fn test_repeated_square_is_linked() {
        // y1 = x^2 and y2 = x^2
        let mut p = square_problem(-1.0, 2.0);
        let y2 = p.new_variable(-10.0, 10.0, VariableType::Continuous);
        let f = Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y2, 1.0)])),
            NonlinearFunction::square(-1.0, 0),
        );
        p.new_constraint(f, 0.0, 0.0);

        let mut h = QuadHandler::from_problem(&p, QuadSettings::default());
        assert_eq!(h.num_squares(), 1);
        assert_eq!(h.aliases(), &[(1, y2)]);
        assert_eq!(h.constraints(), &[0, 1]);

        assert_eq!(h.presolve(&mut p), (SolveStatus::Finished, true));
        assert_eq!((p.variable(y2).lb, p.variable(y2).ub), (0.0, 4.0));

        let mut rel = Relaxation::new(&p).unwrap();
        let before = rel.num_cons();
        h.relax_init_full(&p, &mut rel);
        // secant plus y2 - y1 = 0
        assert_eq!(rel.num_cons(), before + 2);
        let row = rel.constraint(rel.num_cons() - 1);
        assert_eq!((row.lb, row.ub), (0.0, 0.0));
        assert_eq!(row.linear().unwrap().weight(y2), 1.0);
        assert_eq!(row.linear().unwrap().weight(1), -1.0);

        assert!(h.is_feasible(&[2.0, 4.0, 4.0], &p, &rel));
        assert!(!h.is_feasible(&[2.0, 4.0, 10.0], &p, &rel));
    }

    #[test]
    fn test_point_below_square_is_not_branched() {
        let p = square_problem(-1.0, 2.0);
        let h = QuadHandler::from_problem(&p, QuadSettings::default());
        let rel = Relaxation::new(&p).unwrap();

        // only a tangent cut can remove it
        let x = [1.0, 0.5];
        assert!(!h.is_feasible(&x, &p, &rel));
        assert!(h.branching_candidates(&x, &p, &rel).is_empty());

        assert_eq!(h.branching_candidates(&[1.0, 1.5], &p, &rel).len(), 1);
    }

    #[test]
    fn test_improvement_sides() {
        assert_eq!(improvement(0.0, 1.0, 0.5, 2.0), Some((Some(0.5), None)));
        assert_eq!(improvement(0.0, 1.0, 0.0, 1.0), Some((None, None)));
        assert_eq!(improvement(0.0, 1.0, 2.0, 3.0), None);
        // within tolerance of an empty box: clipped, not infeasible
        assert_eq!(improvement(0.0, 1.0, 1.0 + 1e-6, 2.0), Some((Some(1.0), None)));
    }

    #[test]
    fn test_presolve_negative_square_is_infeasible() {
        let mut p = square_problem(-2.0, 3.0);
        p.change_bound(1, BoundType::Upper, -1.0);
        let mut h = QuadHandler::from_problem(&p, QuadSettings::default());
        assert_eq!(h.presolve(&mut p).0, SolveStatus::SolvedInfeasible);
    }

    #[test]
    fn test_presolve_fixes_x_when_square_is_zero() {
        let mut p = square_problem(-2.0, 3.0);
        p.change_bounds(1, 0.0, 0.0);
        let mut h = QuadHandler::from_problem(&p, QuadSettings::default());
        assert_eq!(h.presolve(&mut p), (SolveStatus::Finished, true));
        assert_eq!((p.variable(0).lb, p.variable(0).ub), (0.0, 0.0));
    }

    #[test]
    fn test_presolve_uses_sign_of_x() {
        let mut p = square_problem(0.5, 10.0);
        p.change_bounds(1, 4.0, 9.0);
        let mut h = QuadHandler::from_problem(&p, QuadSettings::default());
        h.presolve(&mut p);
        assert_eq!((p.variable(0).lb, p.variable(0).ub), (2.0, 3.0));
    }
}
