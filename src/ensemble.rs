//! Closed-form reference curves for the classical ensembles.
//!
//! | Ensemble | β | NNSD (Wigner surmise) |
//! |----------|---|------------------------|
//! | [`Poisson`] | 0 | `exp(-s)` |
//! | [`Goe`] | 1 | `(π s / 2) exp(-π s² / 4)` |
//! | [`Gue`] | 2 | `(32 / π²) s² exp(-4 s² / π)` |
//! | [`Gse`] | 4 | `(2¹⁸ / 3⁶π³) s⁴ exp(-64 s² / 9π)` |
//!
//! All curves assume a spectrum unfolded to unit mean spacing. Rigidity and
//! level variance are the large-`L` asymptotic forms (Mehta 2004), so they
//! are poor below `L ≈ 1`.

use ndarray::Array1;
use statrs::consts::EULER_MASCHERONI;
use statrs::function::gamma::gamma;

const PI: f64 = std::f64::consts::PI;

/// Variance of nearest-neighbour spacings of an unfolded GOE spectrum.
///
/// The Wigner surmise gives `4/π - 1 ≈ 0.273`; the exact large-N value is
/// slightly wider.
pub const GOE_SPACING_VARIANCE: f64 = 0.286;

/// Mean spacing ratio ⟨r⟩ for GOE.
pub const GOE_MEAN_SPACING_RATIO: f64 = 0.5307;

/// Mean spacing ratio ⟨r⟩ for uncorrelated (Poisson) levels.
pub const POISSON_MEAN_SPACING_RATIO: f64 = 0.3863;

/// Evenly spaced grid of `n` points over `[min, max]`.
pub fn grid(min: f64, max: f64, n: usize) -> Vec<f64> {
    Array1::linspace(min, max, n).to_vec()
}

/// Spectral statistics with a known (or approximate) closed form.
pub trait Ensemble {
    fn name(&self) -> &'static str;

    /// Nearest-neighbour spacing density at `s`.
    fn nnsd(&self, s: f64) -> f64;

    /// Next-nearest-neighbour spacing density at `s`, where one is known.
    fn nnnsd(&self, s: f64) -> Option<f64>;

    /// Spectral rigidity Δ₃(L).
    fn spectral_rigidity(&self, l: f64) -> f64;

    /// Number variance Σ²(L).
    fn level_variance(&self, l: f64) -> f64;

    fn nnsd_curve(&self, s: &[f64]) -> Vec<f64> {
        s.iter().map(|&x| self.nnsd(x)).collect()
    }

    fn nnnsd_curve(&self, s: &[f64]) -> Option<Vec<f64>> {
        s.iter().map(|&x| self.nnnsd(x)).collect()
    }

    fn spectral_rigidity_curve(&self, l: &[f64]) -> Vec<f64> {
        l.iter().map(|&x| self.spectral_rigidity(x)).collect()
    }

    fn level_variance_curve(&self, l: &[f64]) -> Vec<f64> {
        l.iter().map(|&x| self.level_variance(x)).collect()
    }
}

/// Uncorrelated levels (diagonal random matrices).
///
/// Rigidity and number variance use the textbook `L/15` and `L`; some
/// references quote half of each.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poisson;

/// Gaussian Orthogonal Ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Goe;

/// Gaussian Unitary Ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gue;

/// Gaussian Symplectic Ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gse;

impl Ensemble for Poisson {
    fn name(&self) -> &'static str {
        "Poisson"
    }

    fn nnsd(&self, s: f64) -> f64 {
        (-s).exp()
    }

    /// Brody distribution with β = 0.6. No exact form is known; this is a
    /// heuristic that tracks simulated Poisson spectra closely.
    fn nnnsd(&self, s: f64) -> Option<f64> {
        let beta = 0.6;
        let b1 = beta + 1.0;
        let alpha = gamma((beta + 2.0) / b1).powf(b1);
        Some(b1 * alpha * s.powf(beta) * (-alpha * s.powf(b1)).exp())
    }

    fn spectral_rigidity(&self, l: f64) -> f64 {
        l / 15.0
    }

    fn level_variance(&self, l: f64) -> f64 {
        l
    }
}

impl Ensemble for Goe {
    fn name(&self) -> &'static str {
        "GOE"
    }

    fn nnsd(&self, s: f64) -> f64 {
        (PI * s / 2.0) * (-(PI / 4.0) * s * s).exp()
    }

    /// Next-nearest spacings of GOE follow the GSE surmise at half scale
    /// (Dettmann et al. 2017, Eq. 11).
    fn nnnsd(&self, s: f64) -> Option<f64> {
        Some(0.5 * Gse.nnsd(s / 2.0))
    }

    fn spectral_rigidity(&self, l: f64) -> f64 {
        (1.0 / (PI * PI)) * ((2.0 * PI * l).ln() + EULER_MASCHERONI - 5.0 / 4.0 - PI * PI / 8.0)
    }

    fn level_variance(&self, l: f64) -> f64 {
        (2.0 / (PI * PI)) * ((2.0 * PI * l).ln() + EULER_MASCHERONI + 1.0 - PI * PI / 8.0)
    }
}

impl Ensemble for Gue {
    fn name(&self) -> &'static str {
        "GUE"
    }

    fn nnsd(&self, s: f64) -> f64 {
        (32.0 / (PI * PI)) * s * s * (-(4.0 * s * s) / PI).exp()
    }

    fn nnnsd(&self, _s: f64) -> Option<f64> {
        None
    }

    fn spectral_rigidity(&self, l: f64) -> f64 {
        (1.0 / (2.0 * PI * PI)) * ((2.0 * PI * l).ln() + EULER_MASCHERONI - 5.0 / 4.0)
    }

    fn level_variance(&self, l: f64) -> f64 {
        (1.0 / (PI * PI)) * ((2.0 * PI * l).ln() + EULER_MASCHERONI + 1.0)
    }
}

impl Ensemble for Gse {
    fn name(&self) -> &'static str {
        "GSE"
    }

    fn nnsd(&self, s: f64) -> f64 {
        let norm = 262_144.0 / (729.0 * PI.powi(3));
        norm * s.powi(4) * (-(64.0 / (9.0 * PI)) * s * s).exp()
    }

    fn nnnsd(&self, _s: f64) -> Option<f64> {
        None
    }

    fn spectral_rigidity(&self, l: f64) -> f64 {
        (1.0 / (4.0 * PI * PI))
            * ((4.0 * PI * l).ln() + EULER_MASCHERONI - 5.0 / 4.0 + PI * PI / 8.0)
    }

    fn level_variance(&self, l: f64) -> f64 {
        (1.0 / (2.0 * PI * PI)) * ((4.0 * PI * l).ln() + EULER_MASCHERONI + 1.0 + PI * PI / 8.0)
    }
}

/// Wigner semicircle density at point λ.
///
/// For eigenvalues of symmetric matrix with i.i.d. entries of variance σ².
///
/// # Arguments
///
/// * `lambda` - Eigenvalue to evaluate density at
/// * `sigma` - Standard deviation (radius = 2σ)
///
/// # Returns
///
/// Density ρ(λ), or 0 if |λ| > 2σ
///
/// # Example
///
/// ```rust
/// use rmt_unfold::wigner_semicircle_density;
///
/// // At lambda=0 with sigma=1, R=2, density = 2/(pi*R^2) * R = 1/pi
/// let density = wigner_semicircle_density(0.0, 1.0);
/// assert!(density > 0.3);  // Should be ~1/pi ≈ 0.318
/// ```
pub fn wigner_semicircle_density(lambda: f64, sigma: f64) -> f64 {
    let r = 2.0 * sigma;
    if lambda.abs() > r {
        return 0.0;
    }

    (2.0 / (PI * r * r)) * (r * r - lambda * lambda).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn integrate(f: impl Fn(f64) -> f64, lo: f64, hi: f64) -> f64 {
        let n_points = 4000;
        let dx = (hi - lo) / n_points as f64;
        (0..n_points)
            .map(|i| f(lo + (i as f64 + 0.5) * dx) * dx)
            .sum()
    }

    #[test]
    fn test_nnsd_normalization() {
        let ensembles: [&dyn Ensemble; 4] = [&Poisson, &Goe, &Gue, &Gse];
        for e in ensembles {
            let mass = integrate(|s| e.nnsd(s), 0.0, 30.0);
            assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-3);
            let mean = integrate(|s| s * e.nnsd(s), 0.0, 30.0);
            assert_abs_diff_eq!(mean, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_goe_surmise_variance_below_exact() {
        let second = integrate(|s| s * s * Goe.nnsd(s), 0.0, 30.0);
        let surmise = second - 1.0;
        assert_abs_diff_eq!(surmise, 4.0 / PI - 1.0, epsilon = 1e-3);
        assert!(surmise < GOE_SPACING_VARIANCE);
    }

    #[test]
    fn test_goe_nnnsd_has_mean_two() {
        let mass = integrate(|s| Goe.nnnsd(s).unwrap_or(0.0), 0.0, 30.0);
        let mean = integrate(|s| s * Goe.nnnsd(s).unwrap_or(0.0), 0.0, 30.0);
        assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(mean, 2.0, epsilon = 1e-3);
        assert!(Gue.nnnsd_curve(&[1.0, 2.0]).is_none());
        assert_eq!(Poisson.nnnsd_curve(&[0.5, 1.0]).map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_rigidity_ordering() {
        // Stronger level repulsion means a stiffer spectrum once L is past
        // the small-L regime where the asymptotic forms cross.
        for l in grid(5.0, 30.0, 10) {
            let p = Poisson.spectral_rigidity(l);
            let o = Goe.spectral_rigidity(l);
            let u = Gue.spectral_rigidity(l);
            assert!(p > o && o > u, "ordering violated at L={}", l);
            assert!(Poisson.level_variance(l) > Goe.level_variance(l));
        }
    }

    #[test]
    fn test_grid_endpoints() {
        let g = grid(0.5, 20.0, 50);
        assert_eq!(g.len(), 50);
        assert_abs_diff_eq!(g[0], 0.5);
        assert_abs_diff_eq!(g[49], 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wigner_semicircle_normalization() {
        let sigma = 1.0;
        let r = 2.0 * sigma;
        let integral = integrate(|x| wigner_semicircle_density(x, sigma), -r, r);
        assert!(
            (integral - 1.0).abs() < 0.05,
            "Wigner density should integrate to ~1"
        );
    }

    #[test]
    fn test_wigner_at_zero() {
        let density = wigner_semicircle_density(0.0, 1.0);
        // At λ=0: ρ(0) = 2/(πR²) × R = 2/(πR) = 1/π for R=2
        let expected = 1.0 / PI;
        assert!(
            (density - expected).abs() < 0.01,
            "Wigner at zero: {} vs expected {}",
            density,
            expected
        );
    }
}
