use ndarray::Array2;

use super::lstsq;
use crate::error::{Error, Result};

const MAX_INTERVALS: usize = 40;

/// Penalized B-spline (P-spline, Eilers & Marx 1996) fit to the staircase.
///
/// Uniform knots over the data range with `min(n / 3, 40)` intervals. The
/// smoothing factor weights a difference penalty on adjacent coefficients,
/// so larger values give a stiffer curve. Outside the data range the fit is
/// held constant at its boundary value.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineFit {
    degree: usize,
    lo: f64,
    hi: f64,
    step: f64,
    intervals: usize,
    coeffs: Vec<f64>,
}

impl SplineFit {
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let (span, basis) = self.basis(x);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[span + r])
            .sum()
    }

    fn knot(&self, j: usize) -> f64 {
        self.lo + (j as f64 - self.degree as f64) * self.step
    }

    /// Non-zero basis functions at `x` (Piegl & Tiller, A2.2).
    ///
    /// Returns the index of the first non-zero basis function and the
    /// `degree + 1` values starting there.
    fn basis(&self, x: f64) -> (usize, Vec<f64>) {
        let k = self.degree;
        let x = x.clamp(self.lo, self.hi);
        let span = (((x - self.lo) / self.step).floor().max(0.0) as usize).min(self.intervals - 1);
        let i = span + k;

        let mut n = vec![0.0; k + 1];
        let mut left = vec![0.0; k + 1];
        let mut right = vec![0.0; k + 1];
        n[0] = 1.0;
        for j in 1..=k {
            left[j] = x - self.knot(i + 1 - j);
            right[j] = self.knot(i + j) - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = n[r] / (right[r + 1] + left[j - r]);
                n[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n[j] = saved;
        }
        (span, n)
    }
}

pub(crate) fn fit(values: &[f64], degree: usize, smooth: f64) -> Result<SplineFit> {
    let label = format!("spline_{}_{}", degree, smooth);
    let n = values.len();
    if n < degree + 2 {
        return Err(Error::degenerate(label, degree + 2, n));
    }

    let lo = values[0];
    let hi = values[n - 1];
    if hi <= lo {
        return Err(Error::no_convergence(label, "eigenvalues span a zero-width range"));
    }

    let intervals = (n / 3).clamp(1, MAX_INTERVALS);
    let mut spline = SplineFit {
        degree,
        lo,
        hi,
        step: (hi - lo) / intervals as f64,
        intervals,
        coeffs: Vec::new(),
    };
    let n_basis = intervals + degree;

    let mut design = Array2::<f64>::zeros((n, n_basis));
    for (row, &x) in values.iter().enumerate() {
        let (span, basis) = spline.basis(x);
        for (r, b) in basis.into_iter().enumerate() {
            design[[row, span + r]] = b;
        }
    }

    let order = if n_basis > 2 { 2 } else { 1 };
    let penalty = difference_matrix(n_basis, order);
    let steps: Vec<f64> = (1..=n).map(|i| i as f64).collect();

    spline.coeffs = lstsq::solve_penalized(&design, &steps, &penalty, smooth)
        .ok_or_else(|| Error::no_convergence(label, "penalized solve is not finite"))?;
    Ok(spline)
}

/// `order`-th difference operator on `n` coefficients.
fn difference_matrix(n: usize, order: usize) -> Array2<f64> {
    let mut d = Array2::from_shape_fn((n, n), |(i, j)| if i == j { 1.0 } else { 0.0 });
    for _ in 0..order {
        let rows = d.nrows() - 1;
        d = Array2::from_shape_fn((rows, n), |(i, j)| d[[i + 1, j]] - d[[i, j]]);
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_partition_of_unity() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 * 0.7).collect();
        let spline = fit(&values, 3, 1.0).unwrap();
        for x in [0.0, 1.3, 10.0, 20.3] {
            let (_, basis) = spline.basis(x);
            assert_abs_diff_eq!(basis.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_staircase_unpenalized_by_second_differences() {
        // A straight line lies in the null space of the second-difference
        // penalty, so any smoothing factor recovers it.
        let values: Vec<f64> = (0..60).map(|i| i as f64 * 0.5).collect();
        for degree in 1..=5 {
            let spline = fit(&values, degree, 50.0).unwrap();
            for (i, &x) in values.iter().enumerate() {
                assert_abs_diff_eq!(spline.evaluate(x), (i + 1) as f64, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_too_few_points() {
        let err = fit(&[0.0, 1.0, 2.0], 3, 1.0).unwrap_err();
        assert!(err.is_recoverable());
        assert!(fit(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 3, 1.0).is_err());
    }

    #[test]
    fn test_difference_matrix_shape() {
        let d = difference_matrix(5, 2);
        assert_eq!(d.dim(), (3, 5));
        assert_eq!(d.row(0).to_vec(), vec![1.0, -2.0, 1.0, 0.0, 0.0]);
    }
}
