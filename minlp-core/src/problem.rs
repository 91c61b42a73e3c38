//! The mathematical program: variables, constraints and an objective.
//!
//! Structural mutation and engine attachment are exclusive phases. Once an
//! engine is attached, only bound changes, new constraints and constraint
//! replacement are allowed, and each is forwarded to the engine. Everything
//! else panics.

use std::fmt;

use log::debug;

use crate::constraint::Constraint;
use crate::engine::Engine;
use crate::error::{ModelError, ModelResult};
use crate::function::{Function, LinearFunction, QuadraticFunction};
use crate::incidence::Incidence;
use crate::jacobian::Jacobian;
use crate::objective::Objective;
use crate::settings::{ClassifySettings, FIXED_VAR_TOL, INT_TOL};
use crate::size::ProblemSize;
use crate::types::{
    BoundType, ConsState, FunctionType, ObjectiveSense, ProblemType, VarState, VariableType,
};
use crate::variable::Variable;

pub struct Problem {
    vars: Vec<Variable>,
    cons: Vec<Constraint>,
    obj: Option<Objective>,
    incidence: Incidence,
    initial_point: Option<Vec<f64>>,
    size: Option<ProblemSize>,
    cons_moded: bool,
    vars_moded: bool,
    next_vid: u32,
    next_cid: u32,
    num_dvars: usize,
    num_dcons: usize,
    native_der: bool,
    jacobian: Option<Jacobian>,
    engine: Option<Box<dyn Engine>>,
    classify: ClassifySettings,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new()
    }
}

impl Problem {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            cons: Vec::new(),
            obj: None,
            incidence: Incidence::new(),
            initial_point: None,
            size: None,
            cons_moded: false,
            vars_moded: false,
            next_vid: 0,
            next_cid: 0,
            num_dvars: 0,
            num_dcons: 0,
            native_der: false,
            jacobian: None,
            engine: None,
            classify: ClassifySettings::default(),
        }
    }

    pub fn with_classify_settings(mut self, settings: ClassifySettings) -> Self {
        self.classify = settings;
        self
    }

    fn assert_detached(&self, what: &str) {
        assert!(
            self.engine.is_none(),
            "Cannot {} after loading problem to engine",
            what
        );
    }

    // === Access ===

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_cons(&self) -> usize {
        self.cons.len()
    }

    pub fn variable(&self, index: usize) -> &Variable {
        &self.vars[index]
    }

    pub fn try_variable(&self, index: usize) -> ModelResult<&Variable> {
        self.vars.get(index).ok_or(ModelError::IndexOutOfRange {
            index,
            size: self.vars.len(),
        })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    pub fn constraint(&self, index: usize) -> &Constraint {
        &self.cons[index]
    }

    pub fn try_constraint(&self, index: usize) -> ModelResult<&Constraint> {
        self.cons.get(index).ok_or(ModelError::IndexOutOfRange {
            index,
            size: self.cons.len(),
        })
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.cons
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.obj.as_ref()
    }

    /// Constraints in which variable `v` appears.
    pub fn cons_of_var(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.incidence.cons_of(v).iter().copied()
    }

    /// Variables that appear in constraint `c`.
    pub fn vars_of_cons(&self, c: usize) -> impl Iterator<Item = usize> + '_ {
        self.incidence.vars_of(c).iter().copied()
    }

    pub fn initial_point(&self) -> Option<&[f64]> {
        self.initial_point.as_deref()
    }

    pub fn size(&self) -> Option<&ProblemSize> {
        self.size.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.cons_moded || self.vars_moded
    }

    // === Variables ===

    /// Add a variable named `var{n}`; returns its index.
    pub fn new_variable(&mut self, lb: f64, ub: f64, vtype: VariableType) -> usize {
        let name = format!("var{}", self.vars.len());
        self.new_variable_named(lb, ub, vtype, name)
    }

    pub fn new_variable_named(
        &mut self,
        lb: f64,
        ub: f64,
        vtype: VariableType,
        name: impl Into<String>,
    ) -> usize {
        self.assert_detached("add variables");
        let index = self.vars.len();
        self.vars
            .push(Variable::new(self.next_vid, index, lb, ub, vtype, name.into()));
        self.next_vid += 1;
        self.incidence.push_var();
        self.vars_moded = true;
        index
    }

    pub fn new_binary_variable(&mut self) -> usize {
        self.new_variable(0.0, 1.0, VariableType::Binary)
    }

    /// Add copies of `vars` (bounds, type and name); ids are fresh.
    pub fn new_variables(&mut self, vars: &[Variable]) {
        for v in vars {
            self.new_variable_named(v.lb, v.ub, v.vtype, v.name.clone());
        }
    }

    pub fn set_var_type(&mut self, v: usize, vtype: VariableType) {
        if let Some(size) = &mut self.size {
            match self.vars[v].vtype {
                VariableType::Binary | VariableType::ImplBin => size.bins -= 1,
                VariableType::Integer | VariableType::ImplInt => size.ints -= 1,
                VariableType::Continuous => size.conts -= 1,
            }
            match vtype {
                VariableType::Binary | VariableType::ImplBin => size.bins += 1,
                VariableType::Integer | VariableType::ImplInt => size.ints += 1,
                VariableType::Continuous => size.conts += 1,
            }
        }
        self.vars[v].vtype = vtype;
        self.vars_moded = true;
    }

    pub fn change_bound(&mut self, v: usize, lu: BoundType, value: f64) {
        assert!(
            v < self.vars.len(),
            "index of variable exceeds number of variables"
        );
        match lu {
            BoundType::Lower => self.vars[v].lb = value,
            BoundType::Upper => self.vars[v].ub = value,
        }
        if let Some(e) = &mut self.engine {
            e.change_var_bound(v, lu, value);
        }
    }

    pub fn change_bounds(&mut self, v: usize, lb: f64, ub: f64) {
        assert!(
            v < self.vars.len(),
            "index of variable exceeds number of variables"
        );
        self.vars[v].lb = lb;
        self.vars[v].ub = ub;
        if let Some(e) = &mut self.engine {
            e.change_var_bounds(v, lb, ub);
        }
    }

    // === Constraints ===

    /// Add `lb <= f(x) <= ub` named `cons{n}`; returns its index.
    ///
    /// Panics if `lb > ub`; see [`Self::try_new_constraint`].
    pub fn new_constraint(&mut self, f: Function, lb: f64, ub: f64) -> usize {
        let name = format!("cons{}", self.cons.len());
        self.new_constraint_named(f, lb, ub, name)
    }

    pub fn try_new_constraint(&mut self, f: Function, lb: f64, ub: f64) -> ModelResult<usize> {
        if lb > ub {
            return Err(ModelError::InvalidBounds {
                what: format!("cons{}", self.cons.len()),
                lb,
                ub,
            });
        }
        Ok(self.new_constraint(f, lb, ub))
    }

    pub fn new_constraint_named(
        &mut self,
        f: Function,
        lb: f64,
        ub: f64,
        name: impl Into<String>,
    ) -> usize {
        assert!(!(lb > ub), "constraint with lb {} > ub {}", lb, ub);
        let index = self.cons.len();
        let vars = f.vars();
        if let Some(&v) = vars.iter().next_back() {
            assert!(v < self.vars.len(), "constraint references unknown variable {}", v);
        }
        self.cons.push(Constraint {
            id: self.next_cid,
            index,
            function: f,
            lb,
            ub,
            state: ConsState::Normal,
            name: name.into(),
        });
        self.next_cid += 1;
        self.incidence.push_cons(vars);
        if let Some(e) = &mut self.engine {
            e.add_constraint(&self.cons[index]);
        }
        self.cons_moded = true;
        index
    }

    /// Change one bound of a constraint. Allowed with an engine attached.
    pub fn change_cons_bound(&mut self, c: usize, lu: BoundType, value: f64) {
        if let Some(e) = &mut self.engine {
            e.change_cons_bound(c, lu, value);
        }
        match lu {
            BoundType::Lower => self.cons[c].lb = value,
            BoundType::Upper => self.cons[c].ub = value,
        }
        self.cons_moded = true;
    }

    pub fn change_cons_bounds(&mut self, c: usize, lb: f64, ub: f64) {
        self.assert_detached("change constraint");
        self.cons[c].lb = lb;
        self.cons[c].ub = ub;
        self.cons_moded = true;
    }

    /// Replace the linear part and bounds of `c`. The engine sees the old
    /// constraint first.
    pub fn change_constraint(&mut self, c: usize, lf: LinearFunction, lb: f64, ub: f64) {
        if let Some(e) = &mut self.engine {
            e.change_constraint(&self.cons[c], &lf, lb, ub);
        }
        let con = &mut self.cons[c];
        con.function.linear = Some(lf);
        con.lb = lb;
        con.ub = ub;
        let vars = con.function.vars();
        self.incidence.relink_cons(c, vars);
        self.cons_moded = true;
    }

    pub fn add_to_constraint(&mut self, c: usize, lf: &LinearFunction) {
        self.assert_detached("change constraint");
        self.cons[c].function.add_linear(lf);
        let vars = self.cons[c].function.vars();
        self.incidence.relink_cons(c, vars);
        self.cons_moded = true;
    }

    /// Add a constant to the function of `c`, shifting its bounds.
    pub fn add_to_cons(&mut self, c: usize, constant: f64) {
        let con = &mut self.cons[c];
        con.lb -= constant;
        con.ub -= constant;
        self.cons_moded = true;
    }

    /// `lb <= f <= ub` becomes `-ub <= -f <= -lb`.
    pub fn reverse_sense(&mut self, c: usize) {
        let con = &mut self.cons[c];
        con.function.negate();
        let (lb, ub) = (con.lb, con.ub);
        con.lb = -ub;
        con.ub = -lb;
        self.cons_moded = true;
    }

    // === Objective ===

    /// Set the objective. A maximization objective is negated and stored
    /// as a minimization.
    pub fn new_objective(&mut self, f: Function, constant: f64, sense: ObjectiveSense) {
        self.new_objective_named(f, constant, sense, "obj");
    }

    pub fn new_objective_named(
        &mut self,
        mut f: Function,
        mut constant: f64,
        sense: ObjectiveSense,
        name: impl Into<String>,
    ) {
        self.assert_detached("add objective");
        if sense == ObjectiveSense::Maximize {
            f.negate();
            constant = -constant;
        }
        self.obj = Some(Objective {
            function: f,
            constant,
            sense: ObjectiveSense::Minimize,
            name: name.into(),
        });
        self.cons_moded = true;
    }

    /// Replace the objective function, keeping the name.
    pub fn change_obj(&mut self, f: Function, constant: f64) {
        if let Some(e) = &mut self.engine {
            e.change_obj(&f, constant);
        }
        let name = self
            .obj
            .as_ref()
            .map_or_else(|| "obj".to_string(), |o| o.name.clone());
        self.obj = Some(Objective {
            function: f,
            constant,
            sense: ObjectiveSense::Minimize,
            name,
        });
        self.cons_moded = true;
    }

    pub fn negate_obj(&mut self) {
        if let Some(e) = &mut self.engine {
            e.negate_obj();
        }
        if let Some(o) = &mut self.obj {
            o.function.negate();
            o.constant = -o.constant;
        }
    }

    pub fn add_to_obj(&mut self, lf: &LinearFunction) {
        self.assert_detached("change objective");
        let Some(o) = self.obj.as_mut() else {
            panic!("Cannot add lf to an empty objective");
        };
        o.function.add_linear(lf);
        self.cons_moded = true;
    }

    pub fn add_constant_to_obj(&mut self, c: f64) {
        self.assert_detached("change objective");
        let Some(o) = self.obj.as_mut() else {
            panic!("Cannot add c to an empty objective");
        };
        o.constant += c;
        self.cons_moded = true;
    }

    pub fn remove_quad_from_obj(&mut self) -> Option<QuadraticFunction> {
        self.assert_detached("change objective");
        self.cons_moded = true;
        self.obj.as_mut().and_then(|o| o.function.quadratic.take())
    }

    pub fn remove_objective(&mut self) {
        self.assert_detached("change objective");
        self.obj = None;
        self.cons_moded = true;
    }

    /// Objective value at `x`, or zero without an objective.
    pub fn obj_value(&self, x: &[f64]) -> ModelResult<f64> {
        match &self.obj {
            Some(o) => Ok(o.function.eval(x)? + o.constant),
            None => Ok(0.0),
        }
    }

    // === Points ===

    pub fn set_initial_point(&mut self, x: &[f64]) {
        if self.vars.is_empty() {
            return;
        }
        let n = self.vars.len();
        let mut pt = vec![0.0; n];
        let k = x.len().min(n);
        pt[..k].copy_from_slice(&x[..k]);
        self.initial_point = Some(pt);
    }

    /// Copy the first `k` entries of `x`; the rest are zero.
    pub fn set_initial_point_prefix(&mut self, x: &[f64], k: usize) {
        let k = k.min(x.len());
        self.set_initial_point(&x[..k]);
    }

    pub fn is_sol_integral(&self, x: &[f64]) -> bool {
        self.vars
            .iter()
            .zip(x)
            .all(|(v, &xi)| !v.is_integer() || ((xi + 0.5).floor() - xi).abs() <= INT_TOL)
    }

    // === Size and classification ===

    /// Recompute the cached size if the problem changed since the last
    /// call, or unconditionally with `force`.
    pub fn calculate_size(&mut self, force: bool) {
        if self.size.is_some() && !force && !self.is_dirty() {
            return;
        }
        let mut size = ProblemSize {
            vars: self.vars.len(),
            cons: self.cons.len(),
            objs: usize::from(self.obj.is_some()),
            ..ProblemSize::default()
        };
        self.count_var_types(&mut size);
        self.count_cons_types(&mut size);
        self.count_obj_types(&mut size);
        self.find_var_fun_types();
        self.size = Some(size);
        self.cons_moded = false;
        self.vars_moded = false;
    }

    fn count_var_types(&self, size: &mut ProblemSize) {
        for v in &self.vars {
            match v.vtype {
                VariableType::Binary => size.bins += 1,
                VariableType::Integer => size.ints += 1,
                VariableType::Continuous => size.conts += 1,
                _ => {}
            }
            if v.is_fixed(FIXED_VAR_TOL) {
                size.fixed += 1;
            }
        }
    }

    fn count_cons_types(&self, size: &mut ProblemSize) {
        for c in &self.cons {
            match c.function_type() {
                FunctionType::Constant | FunctionType::Linear => size.lin_cons += 1,
                FunctionType::Bilinear => size.bilin_cons += 1,
                FunctionType::Multilinear => size.multilin_cons += 1,
                FunctionType::Quadratic => size.quad_cons += 1,
                _ => size.nonlin_cons += 1,
            }
            if let Some(lf) = &c.function.linear {
                size.cons_with_lin += 1;
                size.lin_terms += lf.num_terms();
            }
            if let Some(qf) = &c.function.quadratic {
                size.cons_with_quad += 1;
                size.quad_terms += qf.num_terms();
                if qf.function_type() == FunctionType::Bilinear {
                    size.cons_with_bilin += 1;
                }
            }
            if let Some(nlf) = &c.function.nonlinear {
                size.cons_with_nonlin += 1;
                match nlf.function_type() {
                    FunctionType::Bilinear => size.cons_with_bilin += 1,
                    FunctionType::Multilinear => {
                        size.cons_with_multilin += 1;
                        size.multilin_terms += 1;
                    }
                    _ => {}
                }
            }
        }
    }

    fn count_obj_types(&self, size: &mut ProblemSize) {
        if let Some(o) = &self.obj {
            size.obj_type = o.function_type();
            size.obj_lin_terms = o.function.num_linear_terms();
            size.obj_quad_terms = o.function.num_quadratic_terms();
        }
    }

    fn find_var_fun_types(&mut self) {
        for v in &mut self.vars {
            v.fun_type = FunctionType::Constant;
        }
        for c in &self.cons {
            for v in c.function.vars() {
                let t = c.function.var_fun_type(v);
                self.vars[v].fun_type = self.vars[v].fun_type.add(t);
            }
        }
        if let Some(o) = &self.obj {
            for v in o.function.vars() {
                let t = o.function.var_fun_type(v);
                self.vars[v].fun_type = self.vars[v].fun_type.add(t);
            }
        }
    }

    /// Per-variable summary of how each variable enters the problem, as of
    /// the last [`Self::calculate_size`].
    pub fn var_fun_types(&self) -> Vec<FunctionType> {
        self.vars.iter().map(|v| v.fun_type).collect()
    }

    fn is_integer_problem(size: &ProblemSize) -> bool {
        size.num_integers() > 0
    }

    pub fn is_linear(&self) -> bool {
        self.size.as_ref().is_some_and(|s| {
            s.cons == s.lin_cons
                && matches!(s.obj_type, FunctionType::Constant | FunctionType::Linear)
        })
    }

    pub fn is_qp(&self) -> bool {
        !self.is_linear()
            && self
                .size
                .as_ref()
                .is_some_and(|s| s.cons == s.lin_cons && at_most_quadratic(s.obj_type))
    }

    pub fn is_quadratic(&self) -> bool {
        !self.is_linear()
            && self.size.as_ref().is_some_and(|s| {
                s.cons == s.lin_cons + s.bilin_cons + s.quad_cons && at_most_quadratic(s.obj_type)
            })
    }

    fn is_polyp(&self) -> bool {
        let bad = |f: &Function| {
            matches!(
                f.function_type(),
                FunctionType::Nonlinear | FunctionType::Unknown
            )
        };
        if self.obj.as_ref().is_some_and(|o| bad(&o.function)) {
            return false;
        }
        if self.cons.iter().any(|c| bad(&c.function)) {
            return false;
        }
        self.classify.detect_polynomial
    }

    /// Tightest problem class. Recomputes the size first.
    pub fn find_type(&mut self) -> ProblemType {
        self.calculate_size(false);
        let Some(s) = self.size.as_ref() else {
            return ProblemType::Unknown;
        };
        let int = Self::is_integer_problem(s);
        let lin_obj = matches!(s.obj_type, FunctionType::Constant | FunctionType::Linear);
        let quad_obj = matches!(s.obj_type, FunctionType::Quadratic | FunctionType::Bilinear);
        if s.cons == s.lin_cons && lin_obj {
            if int { ProblemType::Milp } else { ProblemType::Lp }
        } else if s.cons == s.lin_cons && quad_obj {
            if int { ProblemType::Miqp } else { ProblemType::Qp }
        } else if s.cons == s.lin_cons + s.bilin_cons + s.quad_cons && quad_obj {
            if int { ProblemType::Miqcqp } else { ProblemType::Qcqp }
        } else if self.is_polyp() {
            if int { ProblemType::Mipolyp } else { ProblemType::Polyp }
        } else if int {
            ProblemType::Minlp
        } else {
            ProblemType::Nlp
        }
    }

    // === Deletion ===

    pub fn mark_delete_var(&mut self, v: usize) {
        self.assert_detached("delete variables");
        if self.vars[v].state != VarState::DeletedVar {
            self.vars[v].state = VarState::DeletedVar;
            self.num_dvars += 1;
        }
    }

    pub fn mark_delete_cons(&mut self, c: usize) {
        if self.cons[c].state != ConsState::DeletedCons {
            self.cons[c].state = ConsState::DeletedCons;
            self.num_dcons += 1;
        }
    }

    pub fn is_marked_del_var(&self, v: usize) -> bool {
        self.vars[v].state == VarState::DeletedVar
    }

    pub fn is_marked_del_cons(&self, c: usize) -> bool {
        self.cons[c].state == ConsState::DeletedCons
    }

    /// Remove the variables marked for deletion. Each is fixed at its lower
    /// bound and the constant is folded into the constraints and objective.
    /// Remaining variables are renumbered densely from 0.
    pub fn del_marked_vars(&mut self) {
        self.assert_detached("delete variables");
        if self.num_dvars == 0 {
            return;
        }
        let n = self.vars.len();
        let mut map = vec![None; n];
        let mut next = 0;
        for v in 0..n {
            if self.vars[v].state != VarState::DeletedVar {
                map[v] = Some(next);
                next += 1;
                continue;
            }
            let val = self.vars[v].lb;
            let cons: Vec<usize> = self.incidence.cons_of(v).iter().copied().collect();
            for c in cons {
                let con = &mut self.cons[c];
                let k = con.function.del_fixed_var(v, val);
                con.lb -= k;
                con.ub -= k;
                self.incidence.unlink(c, v);
            }
            if let Some(o) = &mut self.obj {
                o.constant += o.function.del_fixed_var(v, val);
            }
            debug!("Problem: deleted {} fixed at {}", self.vars[v].name, val);
        }

        for con in &mut self.cons {
            con.function = remap_function(&con.function, &map);
        }
        if let Some(o) = &mut self.obj {
            o.function = remap_function(&o.function, &map);
        }
        self.vars.retain(|v| v.state != VarState::DeletedVar);
        for (i, v) in self.vars.iter_mut().enumerate() {
            v.index = i;
        }
        self.incidence.compact_vars(&map);
        if let Some(pt) = self.initial_point.take() {
            let kept = pt
                .into_iter()
                .enumerate()
                .filter(|(i, _)| map[*i].is_some())
                .map(|(_, x)| x)
                .collect();
            self.initial_point = Some(kept);
        }
        self.vars_moded = true;
        self.cons_moded = true;
        self.num_dvars = 0;
    }

    /// Remove the constraints marked for deletion. An attached engine is
    /// told first, while the constraints still exist.
    pub fn del_marked_cons(&mut self) {
        if self.num_dcons == 0 {
            return;
        }
        let deleted: Vec<usize> = (0..self.cons.len())
            .filter(|&c| self.cons[c].state == ConsState::DeletedCons)
            .collect();
        if let Some(e) = &mut self.engine {
            let refs: Vec<&Constraint> = deleted.iter().map(|&c| &self.cons[c]).collect();
            e.remove_cons(&refs);
        }
        for &c in &deleted {
            self.incidence.unlink_cons(c);
        }
        let mut map = vec![None; self.cons.len()];
        let mut next = 0;
        for (c, slot) in map.iter_mut().enumerate() {
            if self.cons[c].state != ConsState::DeletedCons {
                *slot = Some(next);
                next += 1;
            }
        }
        self.cons.retain(|c| c.state != ConsState::DeletedCons);
        for (i, c) in self.cons.iter_mut().enumerate() {
            c.index = i;
        }
        self.incidence.compact_cons(&map);
        self.cons_moded = true;
        self.num_dcons = 0;
    }

    /// Replace `out` by `ratio * inn` in every constraint and the objective.
    pub fn subst(&mut self, out: usize, inn: usize, ratio: f64) {
        self.assert_detached("substitute variables");
        let cons: Vec<usize> = self.incidence.cons_of(out).iter().copied().collect();
        for c in cons {
            let stayin = self.cons[c].function.subst(out, inn, ratio);
            self.incidence.unlink(c, out);
            if stayin {
                self.incidence.link(c, inn);
            } else {
                self.incidence.unlink(c, inn);
            }
        }
        if let Some(o) = &mut self.obj {
            o.function.subst(out, inn, ratio);
        }
        self.cons_moded = true;
        self.vars_moded = true;
    }

    // === Derivatives and engines ===

    /// Build the Jacobian cache and keep it current on
    /// [`Self::prepare_for_solve`].
    pub fn set_native_der(&mut self) {
        self.calculate_size(false);
        self.native_der = true;
        self.jacobian = Some(Jacobian::new(&self.cons, self.vars.len()));
    }

    pub fn has_native_der(&self) -> bool {
        self.native_der
    }

    pub fn jacobian(&self) -> Option<&Jacobian> {
        self.jacobian.as_ref()
    }

    /// Refresh the size and, with native derivatives on, the Jacobian.
    pub fn prepare_for_solve(&mut self) {
        let reload = self.is_dirty();
        self.calculate_size(false);
        if self.native_der && (reload || self.jacobian.is_none()) {
            self.set_native_der();
        }
    }

    /// Attach `engine`. A previously attached engine is cleared and dropped.
    pub fn set_engine(&mut self, engine: Box<dyn Engine>) {
        if let Some(mut old) = self.engine.take() {
            old.clear();
        }
        self.engine = Some(engine);
    }

    pub fn unset_engine(&mut self) -> Option<Box<dyn Engine>> {
        self.engine.take()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Drop every constraint and detach the engine.
    pub fn clear(&mut self) {
        self.incidence.clear();
        for _ in &self.vars {
            self.incidence.push_var();
        }
        self.cons.clear();
        self.num_dcons = 0;
        if let Some(mut e) = self.engine.take() {
            e.clear();
        }
        self.jacobian = None;
        self.cons_moded = true;
        self.vars_moded = true;
    }

    /// Number of inconsistencies between the functions and the incidence
    /// structure. Zero for a sound problem.
    pub fn check_con_vars(&self) -> usize {
        let mut bad = 0;
        for (c, con) in self.cons.iter().enumerate() {
            let vars = con.function.vars();
            if &vars != self.incidence.vars_of(c) {
                bad += 1;
            }
            for v in vars {
                if v >= self.vars.len() || !self.incidence.cons_of(v).contains(&c) {
                    bad += 1;
                }
            }
            if con.index != c {
                bad += 1;
            }
        }
        bad + self
            .vars
            .iter()
            .enumerate()
            .filter(|(i, v)| v.index != *i)
            .count()
    }

    pub fn write_size(&self, f: &mut impl fmt::Write) -> fmt::Result {
        match &self.size {
            Some(s) => write!(f, "{}", s),
            None => Ok(()),
        }
    }
}

fn at_most_quadratic(t: FunctionType) -> bool {
    matches!(
        t,
        FunctionType::Constant | FunctionType::Linear | FunctionType::Bilinear | FunctionType::Quadratic
    )
}

fn remap_function(f: &Function, map: &[Option<usize>]) -> Function {
    match f.clone_with_vars(map) {
        Ok(g) => g,
        Err(e) => panic!("deleted variable is still referenced: {}", e),
    }
}

impl Clone for Problem {
    /// Deep copy of the model. The engine and the Jacobian are not copied;
    /// the clone rebuilds derivatives on its next `prepare_for_solve`.
    fn clone(&self) -> Self {
        Self {
            vars: self.vars.clone(),
            cons: self.cons.clone(),
            obj: self.obj.clone(),
            incidence: self.incidence.clone(),
            initial_point: self.initial_point.clone(),
            size: self.size.clone(),
            cons_moded: self.cons_moded,
            vars_moded: self.vars_moded,
            next_vid: self.next_vid,
            next_cid: self.next_cid,
            num_dvars: self.num_dvars,
            num_dcons: self.num_dcons,
            native_der: self.native_der,
            jacobian: None,
            engine: None,
            classify: self.classify.clone(),
        }
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("vars", &self.vars.len())
            .field("cons", &self.cons.len())
            .field("has_obj", &self.obj.is_some())
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_size(f)?;
        for v in &self.vars {
            writeln!(f, "{}", v)?;
        }
        if let Some(o) = &self.obj {
            writeln!(f, "{}", o)?;
        }
        for c in &self.cons {
            writeln!(f, "{}", c)?;
        }
        Ok(())
    }
}
