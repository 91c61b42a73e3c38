//! Interval bounds on products, quotients and squares.
//!
//! Infinite endpoints are allowed. `0 * inf` is taken as `0`, and any case
//! that is still ambiguous widens the result to `(-inf, inf)`.

#[inline]
fn mul_for_bounds(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        0.0
    } else {
        a * b
    }
}

fn hull(candidates: [f64; 4]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in candidates {
        if p.is_nan() {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        lo = lo.min(p);
        hi = hi.max(p);
    }
    (lo, hi)
}

/// Bounds on `x0 * x1` for `x0 in [l0, u0]`, `x1 in [l1, u1]`.
pub fn bounds_on_product(l0: f64, u0: f64, l1: f64, u1: f64) -> (f64, f64) {
    if [l0, u0, l1, u1].iter().any(|v| v.is_nan()) {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    hull([
        mul_for_bounds(l0, l1),
        mul_for_bounds(l0, u1),
        mul_for_bounds(u0, l1),
        mul_for_bounds(u0, u1),
    ])
}

/// Bounds on `y / x` for `y in [yl, yu]`, `x in [xl, xu]`.
///
/// Only a divisor interval that excludes zero gives finite information;
/// otherwise the result is unbounded.
pub fn bounds_on_div(yl: f64, yu: f64, xl: f64, xu: f64) -> (f64, f64) {
    if [yl, yu, xl, xu].iter().any(|v| v.is_nan()) || (xl <= 0.0 && xu >= 0.0) {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    hull([yl / xl, yl / xu, yu / xl, yu / xu])
}

/// Bounds on `x^2` for `x in [l, u]`.
pub fn bounds_on_square(l: f64, u: f64) -> (f64, f64) {
    let (ll, uu) = (mul_for_bounds(l, l), mul_for_bounds(u, u));
    if l >= 0.0 {
        (ll, uu)
    } else if u <= 0.0 {
        (uu, ll)
    } else {
        (0.0, ll.max(uu))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product() {
        assert_eq!(bounds_on_product(0.0, 2.0, 0.0, 3.0), (0.0, 6.0));
        assert_eq!(bounds_on_product(-1.0, 2.0, -3.0, 1.0), (-6.0, 3.0));
        assert_eq!(
            bounds_on_product(0.0, 0.0, f64::NEG_INFINITY, f64::INFINITY),
            (0.0, 0.0)
        );
        assert_eq!(
            bounds_on_product(1.0, 2.0, 0.0, f64::INFINITY),
            (0.0, f64::INFINITY)
        );
    }

    #[test]
    fn test_div() {
        assert_eq!(bounds_on_div(2.0, 6.0, 1.0, 2.0), (1.0, 6.0));
        assert_eq!(
            bounds_on_div(0.0, 6.0, 0.0, 2.0),
            (f64::NEG_INFINITY, f64::INFINITY)
        );
        assert_eq!(bounds_on_div(-4.0, 4.0, -2.0, -1.0), (-4.0, 4.0));
    }

    #[test]
    fn test_square() {
        assert_eq!(bounds_on_square(-2.0, 3.0), (0.0, 9.0));
        assert_eq!(bounds_on_square(1.0, 3.0), (1.0, 9.0));
        assert_eq!(bounds_on_square(-3.0, -1.0), (1.0, 9.0));
        assert_eq!(
            bounds_on_square(f64::NEG_INFINITY, 1.0),
            (0.0, f64::INFINITY)
        );
    }
}
