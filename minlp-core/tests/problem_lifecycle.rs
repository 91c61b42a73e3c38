//! Life-cycle tests for Problem and Relaxation: deletion, renumbering,
//! engine notification and relaxation mapping.

use std::cell::RefCell;
use std::rc::Rc;

use minlp_core::interval::{bounds_on_div, bounds_on_product, bounds_on_square};
use minlp_core::{
    BoundType, Constraint, Engine, EngineStatus, Function, LinearFunction, NonlinearFunction,
    ObjectiveSense, Problem, ProblemType, Relaxation, Solution, VariableType,
};
use proptest::prelude::*;

fn lin(terms: &[(usize, f64)]) -> Function {
    Function::from_linear(LinearFunction::from_terms(terms.iter().copied()))
}

#[derive(Default)]
struct Log {
    removed: Vec<String>,
    bounds: Vec<(usize, f64, f64)>,
    cleared: usize,
}

/// Records the notifications it receives.
struct RecordingEngine {
    log: Rc<RefCell<Log>>,
}

impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn solve(&mut self, _problem: &Problem) -> EngineStatus {
        EngineStatus::EngineError
    }

    fn solution(&self) -> Option<&Solution> {
        None
    }

    fn change_var_bounds(&mut self, index: usize, lb: f64, ub: f64) {
        self.log.borrow_mut().bounds.push((index, lb, ub));
    }

    fn remove_cons(&mut self, cons: &[&Constraint]) {
        let mut log = self.log.borrow_mut();
        log.removed.extend(cons.iter().map(|c| c.name.clone()));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().cleared += 1;
    }
}

#[test]
fn test_delete_fixed_variable_folds_constant() {
    let mut p = Problem::new();
    let w = p.new_variable(0.0, 1.0, VariableType::Continuous);
    let x = p.new_variable(5.0, 5.0, VariableType::Continuous);
    let z = p.new_variable(0.0, 10.0, VariableType::Continuous);
    p.new_constraint(lin(&[(x, 2.0), (z, 3.0)]), f64::NEG_INFINITY, 10.0);
    p.new_constraint(lin(&[(w, 1.0), (z, 1.0)]), 0.0, 4.0);
    p.new_objective(lin(&[(x, 1.0), (z, 1.0)]), 0.0, ObjectiveSense::Minimize);

    p.mark_delete_var(x);
    assert!(p.is_marked_del_var(x));
    // indices are untouched until compaction
    assert_eq!(p.variable(z).index, 2);
    p.del_marked_vars();

    assert_eq!(p.num_vars(), 2);
    for (i, v) in p.variables().iter().enumerate() {
        assert_eq!(v.index, i);
    }
    assert_eq!(p.variable(1).name, "var2");
    assert_eq!(p.variable(1).id, 2);

    let c = p.constraint(0);
    assert_eq!(c.linear().unwrap().num_terms(), 1);
    assert_eq!(c.linear().unwrap().weight(1), 3.0);
    assert_eq!(c.ub, 0.0);

    let o = p.objective().unwrap();
    assert_eq!(o.constant, 5.0);
    assert_eq!(p.obj_value(&[0.0, 1.0]).unwrap(), 6.0);
    assert_eq!(p.check_con_vars(), 0);
}

#[test]
fn test_delete_fixed_variable_in_bilinear_term() {
    let mut p = Problem::new();
    let x0 = p.new_variable(2.0, 2.0, VariableType::Continuous);
    let x1 = p.new_variable(0.0, 3.0, VariableType::Continuous);
    let y = p.new_variable(0.0, 6.0, VariableType::Continuous);
    p.new_constraint(
        Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            NonlinearFunction::product(-1.0, x0, x1),
        ),
        0.0,
        0.0,
    );
    p.mark_delete_var(x0);
    p.del_marked_vars();

    let c = p.constraint(0);
    assert_eq!(c.function.vars().into_iter().collect::<Vec<_>>(), vec![0, 1]);
    // y - 2 x1 = 0 at x1 = 1.5, y = 3
    assert_eq!(c.activity(&[1.5, 3.0]), 0.0);
    assert_eq!(p.check_con_vars(), 0);
}

#[test]
fn test_delete_constraints_notifies_engine_first() {
    let mut p = Problem::new();
    for _ in 0..2 {
        p.new_variable(0.0, 1.0, VariableType::Continuous);
    }
    p.new_constraint(lin(&[(0, 1.0)]), 0.0, 1.0);
    p.new_constraint(lin(&[(0, 1.0), (1, 1.0)]), 0.0, 1.0);
    p.new_constraint(lin(&[(1, 1.0)]), 0.0, 1.0);

    let log = Rc::new(RefCell::new(Log::default()));
    p.set_engine(Box::new(RecordingEngine { log: log.clone() }));
    p.mark_delete_cons(1);
    p.del_marked_cons();

    assert_eq!(log.borrow().removed, vec!["cons1".to_string()]);
    assert_eq!(p.num_cons(), 2);
    assert_eq!(p.constraint(1).name, "cons2");
    assert_eq!(p.constraint(1).index, 1);
    assert_eq!(p.cons_of_var(1).collect::<Vec<_>>(), vec![1]);
    assert_eq!(p.check_con_vars(), 0);
}

#[test]
fn test_bound_changes_reach_engine() {
    let mut p = Problem::new();
    p.new_variable(0.0, 1.0, VariableType::Continuous);
    let log = Rc::new(RefCell::new(Log::default()));
    p.set_engine(Box::new(RecordingEngine { log: log.clone() }));
    p.change_bounds(0, 0.25, 0.75);
    assert_eq!(log.borrow().bounds, vec![(0, 0.25, 0.75)]);

    p.set_engine(Box::new(RecordingEngine {
        log: Rc::new(RefCell::new(Log::default())),
    }));
    assert_eq!(log.borrow().cleared, 1);
    assert!(p.unset_engine().is_some());
    assert!(!p.has_engine());
}

#[test]
#[should_panic(expected = "after loading problem to engine")]
fn test_new_variable_with_engine_panics() {
    let mut p = Problem::new();
    p.set_engine(Box::new(RecordingEngine {
        log: Rc::new(RefCell::new(Log::default())),
    }));
    p.new_variable(0.0, 1.0, VariableType::Continuous);
}

#[test]
#[should_panic(expected = "after loading problem to engine")]
fn test_subst_with_engine_panics() {
    let mut p = Problem::new();
    p.new_variable(0.0, 1.0, VariableType::Continuous);
    p.new_variable(0.0, 1.0, VariableType::Continuous);
    p.set_engine(Box::new(RecordingEngine {
        log: Rc::new(RefCell::new(Log::default())),
    }));
    p.subst(0, 1, 1.0);
}

#[test]
fn test_relaxation_round_trip() {
    let mut p = Problem::new();
    for i in 0..5 {
        p.new_variable(-(i as f64), i as f64, VariableType::Continuous);
    }
    p.new_constraint(lin(&[(0, 1.0), (4, -1.0)]), 0.0, 0.0);
    let r = Relaxation::new(&p).unwrap();
    for i in 0..r.num_vars() {
        let o = r.original_var(i).unwrap();
        assert_eq!(o, i);
        assert_eq!(p.variable(o).lb, r.variable(i).lb);
        assert_eq!(r.relaxation_var(o), Some(i));
    }
}

#[test]
fn test_classification_of_bilinear_problem() {
    let mut p = Problem::new();
    let x0 = p.new_variable(0.0, 2.0, VariableType::Continuous);
    let x1 = p.new_variable(0.0, 3.0, VariableType::Integer);
    let y = p.new_variable(0.0, 6.0, VariableType::Continuous);
    p.new_constraint(
        Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            NonlinearFunction::product(-1.0, x0, x1),
        ),
        0.0,
        0.0,
    );
    p.new_objective(
        Function::from_nonlinear(None, NonlinearFunction::square(1.0, x0)),
        0.0,
        ObjectiveSense::Minimize,
    );
    assert_eq!(p.find_type(), ProblemType::Miqcqp);
    let s = p.size().unwrap();
    assert_eq!(s.bilin_cons, 1);
    assert_eq!(s.cons_with_bilin, 1);
    assert!(p.is_quadratic());
    assert!(!p.is_qp());
    let types = p.var_fun_types();
    assert_eq!(types[y], minlp_core::FunctionType::Linear);
    assert!(types[x0] >= minlp_core::FunctionType::Bilinear);

    let mut out = String::new();
    p.write_size(&mut out).unwrap();
    assert!(out.contains("Number of bilinear constraints = 1"));
}

#[test]
fn test_jacobian_linear_coefficients() {
    let mut p = Problem::new();
    for _ in 0..3 {
        p.new_variable(0.0, 1.0, VariableType::Continuous);
    }
    p.new_constraint(lin(&[(0, 2.0), (2, -1.0)]), 0.0, 1.0);
    p.new_constraint(
        Function::from_nonlinear(
            Some(LinearFunction::from_terms([(0, 1.0)])),
            NonlinearFunction::product(1.0, 1, 2),
        ),
        0.0,
        1.0,
    );
    p.set_native_der();
    let jac = p.jacobian().unwrap();
    assert_eq!((jac.rows(), jac.cols()), (2, 3));
    assert_eq!(jac.num_nz(), 5);
    assert_eq!(jac.linear_coefficients().nnz(), 3);
    assert_eq!(jac.linear_activity(&[1.0, 1.0, 1.0]), vec![1.0, 1.0]);

    p.change_bound(0, BoundType::Upper, 0.5);
    p.new_constraint(lin(&[(1, 1.0)]), 0.0, 1.0);
    p.prepare_for_solve();
    assert_eq!(p.jacobian().unwrap().rows(), 3);
}

proptest! {
    #[test]
    fn prop_product_bounds_contain_products(
        l0 in -10.0f64..10.0, w0 in 0.0f64..10.0,
        l1 in -10.0f64..10.0, w1 in 0.0f64..10.0,
        t0 in 0.0f64..=1.0, t1 in 0.0f64..=1.0,
    ) {
        let (u0, u1) = (l0 + w0, l1 + w1);
        let (x0, x1) = (l0 + t0 * w0, l1 + t1 * w1);
        let (lo, hi) = bounds_on_product(l0, u0, l1, u1);
        let p = x0 * x1;
        prop_assert!(lo <= p + 1e-9 && p <= hi + 1e-9);

        let (slo, shi) = bounds_on_square(l0, u0);
        prop_assert!(slo <= x0 * x0 + 1e-9 && x0 * x0 <= shi + 1e-9);
    }

    #[test]
    fn prop_div_bounds_contain_quotients(
        yl in -10.0f64..10.0, wy in 0.0f64..10.0,
        xl in 0.5f64..10.0, wx in 0.0f64..10.0,
        ty in 0.0f64..=1.0, tx in 0.0f64..=1.0,
    ) {
        let (y, x) = (yl + ty * wy, xl + tx * wx);
        let (lo, hi) = bounds_on_div(yl, yl + wy, xl, xl + wx);
        let q = y / x;
        prop_assert!(lo <= q + 1e-9 && q <= hi + 1e-9);
    }
}
