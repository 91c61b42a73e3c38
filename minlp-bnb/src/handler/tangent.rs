//! Tangent points on the parabola `y = x^2`.

use minlp_core::settings::{GOLDEN_RATIO, GOLDEN_STOP};

#[inline]
fn dist2(x: f64, xval: f64, yval: f64) -> f64 {
    (x - xval) * (x - xval) + (x * x - yval) * (x * x - yval)
}

/// Point `(xl, xl^2)` on the parabola nearest to `(xval, yval)`, for a
/// point with `yval < xval^2`.
///
/// The nearest point lies between `xval` and the parabola point with the
/// same `y` on the same side of the axis. A golden-section search over
/// that bracket stops once it is narrower than [`GOLDEN_STOP`].
pub fn find_lin_pt(xval: f64, yval: f64) -> (f64, f64) {
    let root = yval.max(0.0).sqrt();
    let (mut a, mut b) = if xval > 0.0 { (root, xval) } else { (xval, -root) };
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }

    let mut mu = a + GOLDEN_RATIO * (b - a);
    let mut la = b - GOLDEN_RATIO * (b - a);
    let mut mu_val = dist2(mu, xval, yval);
    let mut la_val = dist2(la, xval, yval);
    while b - a > GOLDEN_STOP {
        if mu_val < la_val {
            a = la;
            la = mu;
            la_val = mu_val;
            mu = a + GOLDEN_RATIO * (b - a);
            mu_val = dist2(mu, xval, yval);
        } else {
            b = mu;
            mu = la;
            mu_val = la_val;
            la = b - GOLDEN_RATIO * (b - a);
            la_val = dist2(la, xval, yval);
        }
    }
    (la, la * la)
}
