use crate::ensemble::wigner_semicircle_density;

const TOLERANCE: f64 = 1e-9;
const MAX_DEPTH: u32 = 40;

/// Unfolding through the integrated semicircle level density.
///
/// For `N` eigenvalues of a GOE matrix with off-diagonal variance 1/2 the
/// level density is `R₁(x) = (1/π) √(2N - x²)` on `|x| < √(2N)` (Mehta
/// 2004, Eq. 7.2.33). The unfolded value of `x` is `∫_{-R}^{x} R₁`, and the
/// total mass is `N`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemicircleFit {
    n: usize,
    radius: f64,
    total: f64,
}

impl SemicircleFit {
    pub fn new(n: usize) -> Self {
        let radius = (2.0 * n as f64).sqrt();
        let mut fit = Self {
            n,
            radius,
            total: 0.0,
        };
        fit.total = fit.integrate_to(radius);
        fit
    }

    /// Edge of the support, `√(2N)`.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Integral of the level density over the whole support.
    pub fn total_mass(&self) -> f64 {
        self.total
    }

    pub fn level_density(&self, x: f64) -> f64 {
        // R₁ is N times the normalized semicircle of radius R.
        self.n as f64 * wigner_semicircle_density(x, self.radius / 2.0)
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        if x >= self.radius {
            return self.total;
        }
        if x <= -self.radius {
            return 0.0;
        }
        self.integrate_to(x)
    }

    fn integrate_to(&self, x: f64) -> f64 {
        let tol = TOLERANCE * (self.n as f64).max(1.0);
        adaptive_simpson(&|t| self.level_density(t), -self.radius, x, tol)
    }
}

/// Adaptive Simpson quadrature with a hard recursion bound.
fn adaptive_simpson(f: &dyn Fn(f64) -> f64, a: f64, b: f64, tol: f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = (a + b) / 2.0;
    let fm = f(m);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(f, a, b, fa, fm, fb, whole, tol, MAX_DEPTH)
}

#[allow(clippy::too_many_arguments)]
fn simpson_step(
    f: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> f64 {
    let m = (a + b) / 2.0;
    let lm = (a + m) / 2.0;
    let rm = (m + b) / 2.0;
    let flm = f(lm);
    let frm = f(rm);
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tol {
        return left + right + delta / 15.0;
    }
    simpson_step(f, a, m, fa, flm, fm, left, tol / 2.0, depth - 1)
        + simpson_step(f, m, b, fm, frm, fb, right, tol / 2.0, depth - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    /// Closed-form antiderivative of R₁ from -R.
    fn exact(x: f64, n: usize) -> f64 {
        let r2 = 2.0 * n as f64;
        let r = r2.sqrt();
        let x = x.clamp(-r, r);
        ((x * (r2 - x * x).sqrt() + r2 * (x / r).asin()) / 2.0 + r2 * PI / 4.0) / PI
    }

    #[test]
    fn test_total_mass_is_n() {
        for n in [1, 10, 200, 1000] {
            let fit = SemicircleFit::new(n);
            assert_abs_diff_eq!(fit.total_mass(), n as f64, epsilon = 1e-4 * n as f64);
        }
    }

    #[test]
    fn test_matches_closed_form() {
        let n = 200;
        let fit = SemicircleFit::new(n);
        for x in [-19.9, -10.0, -0.5, 0.0, 3.3, 15.0, 19.99] {
            assert_abs_diff_eq!(fit.evaluate(x), exact(x, n), epsilon = 1e-4);
        }
        assert_abs_diff_eq!(fit.evaluate(0.0), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn test_clamped_outside_support() {
        let fit = SemicircleFit::new(50);
        assert_eq!(fit.evaluate(-100.0), 0.0);
        assert_eq!(fit.evaluate(100.0), fit.total_mass());
    }

    #[test]
    fn test_simpson_polynomial_exact() {
        let v = adaptive_simpson(&|x| x * x * x - x, 0.0, 2.0, 1e-12);
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-10);
        assert_eq!(adaptive_simpson(&|x| x, 1.0, 1.0, 1e-12), 0.0);
    }
}
