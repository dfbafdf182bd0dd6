use ndarray::Array2;

use super::lstsq;
use crate::error::{Error, Result};

/// Least-squares polynomial through the staircase `x_i ↦ i + 1`.
///
/// The abscissa is mapped to `[-1, 1]` before building the Vandermonde
/// matrix; raw eigenvalues can be large enough that `x^11` overflows the
/// useful precision of the design.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    coeffs: Vec<f64>,
    center: f64,
    half_width: f64,
}

impl PolynomialFit {
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Coefficients in the rescaled variable, constant term first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.half_width;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }
}

pub(crate) fn fit(values: &[f64], degree: usize) -> Result<PolynomialFit> {
    let label = format!("poly_{}", degree);
    if values.len() <= degree {
        return Err(Error::degenerate(label, degree + 1, values.len()));
    }

    let lo = values[0];
    let hi = values[values.len() - 1];
    let center = (lo + hi) / 2.0;
    let half_width = if hi > lo { (hi - lo) / 2.0 } else { 1.0 };

    let design = Array2::from_shape_fn((values.len(), degree + 1), |(i, j)| {
        ((values[i] - center) / half_width).powi(j as i32)
    });
    let steps: Vec<f64> = (1..=values.len()).map(|i| i as f64).collect();

    let coeffs = lstsq::solve(&design, &steps)
        .ok_or_else(|| Error::no_convergence(label, "least-squares solution is not finite"))?;

    Ok(PolynomialFit {
        coeffs,
        center,
        half_width,
    })
}
