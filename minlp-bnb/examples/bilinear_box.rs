//! Show how the quadratic handler relaxes and splits one bilinear term.
//!
//! Run with: cargo run -p minlp-bnb --example bilinear_box

use minlp_bnb::{Handler, QuadHandler, QuadSettings};
use minlp_core::{
    Function, LinearFunction, NonlinearFunction, ObjectiveSense, Problem, Relaxation,
    VariableType,
};

fn main() {
    println!("=== Bilinear term over a box ===\n");

    // max y s.t. y = x0 * x1, x0 in [0, 2], x1 in [-1, 3]
    let mut p = Problem::new();
    let x0 = p.new_variable(0.0, 2.0, VariableType::Continuous);
    let x1 = p.new_variable(-1.0, 3.0, VariableType::Continuous);
    let y = p.new_variable(f64::NEG_INFINITY, f64::INFINITY, VariableType::Continuous);
    p.new_constraint(
        Function::from_nonlinear(
            Some(LinearFunction::from_terms([(y, 1.0)])),
            NonlinearFunction::product(-1.0, x0, x1),
        ),
        0.0,
        0.0,
    );
    p.new_objective(
        Function::from_linear(LinearFunction::from_terms([(y, 1.0)])),
        0.0,
        ObjectiveSense::Maximize,
    );

    let mut quad = QuadHandler::from_problem(&p, QuadSettings::default());
    let (status, changed) = quad.presolve(&mut p);
    println!("Presolve: {} (changed: {})", status, changed);
    println!(
        "  y in [{}, {}]\n",
        p.variable(y).lb,
        p.variable(y).ub
    );

    let mut rel = match Relaxation::new(&p) {
        Ok(rel) => rel,
        Err(e) => {
            eprintln!("Cannot build relaxation: {}", e);
            return;
        }
    };
    for &c in quad.constraints() {
        rel.mark_delete_cons(c);
    }
    rel.del_marked_cons();
    quad.relax_init_full(&p, &mut rel);

    println!("--- McCormick relaxation ---");
    for con in rel.constraints() {
        println!("  {}", con);
    }

    // on both upper facets, well above x0 * x1 = 1
    let x = [1.0, 1.0, 3.0];
    println!("\n--- Point {:?} ---", x);
    println!("  feasible: {}", quad.is_feasible(&x, &p, &rel));

    let cands = quad.branching_candidates(&x, &p, &rel);
    for cand in &cands {
        println!(
            "  candidate x{}: down {:.4}, up {:.4}, score {:.4}",
            cand.var,
            cand.ddist,
            cand.udist,
            cand.score()
        );
    }
    let Some(best) = cands.iter().max_by(|a, b| a.score().total_cmp(&b.score())) else {
        println!("  nothing to branch on");
        return;
    };
    for br in quad.branches(best, &x, &p, &rel) {
        println!("  branch: {}", br);
    }
}
