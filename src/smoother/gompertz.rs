use ndarray::Array2;
use statrs::statistics::{Data, Median, Statistics};

use super::lstsq;
use crate::error::{Error, Result};

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;
const MAX_DAMPING: f64 = 1e12;

/// Gompertz sigmoid `F(x) = a · exp(-exp(-c · (x - b)))`.
///
/// `a` is the upper asymptote, `b` the displacement (inflection point) and
/// `c > 0` the growth rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GompertzFit {
    pub asymptote: f64,
    pub displacement: f64,
    pub growth_rate: f64,
}

impl GompertzFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        gompertz(x, self.asymptote, self.displacement, self.growth_rate)
    }
}

fn gompertz(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * (-(-c * (x - b)).exp()).exp()
}

fn sse(values: &[f64], steps: &[f64], p: [f64; 3]) -> f64 {
    values
        .iter()
        .zip(steps)
        .map(|(&x, &y)| {
            let r = y - gompertz(x, p[0], p[1], p[2]);
            r * r
        })
        .sum()
}

/// Levenberg–Marquardt fit of the Gompertz curve to the staircase.
///
/// Starts from `a = n`, `b = median`, `c = 1 / std`. Each damped step is
/// solved as the stacked least-squares problem `[J; √μ I] δ = [r; 0]`.
pub(crate) fn fit(values: &[f64]) -> Result<GompertzFit> {
    let n = values.len();
    if n < 4 {
        return Err(Error::degenerate("gompertz", 4, n));
    }

    let spread = values.iter().std_dev();
    if !(spread > 0.0) {
        return Err(Error::no_convergence("gompertz", "eigenvalues have zero spread"));
    }

    let steps: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let mut p = [n as f64, Data::new(values.to_vec()).median(), 1.0 / spread];
    let mut current = sse(values, &steps, p);
    let mut damping: f64 = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        let (a, b, c) = (p[0], p[1], p[2]);

        let mut jacobian = Array2::<f64>::zeros((n + 3, 3));
        let mut residuals = vec![0.0; n + 3];
        for (i, &x) in values.iter().enumerate() {
            let e = (-c * (x - b)).exp();
            let g = (-e).exp();
            jacobian[[i, 0]] = g;
            jacobian[[i, 1]] = -a * g * c * e;
            jacobian[[i, 2]] = a * g * (x - b) * e;
            residuals[i] = steps[i] - a * g;
        }
        for k in 0..3 {
            jacobian[[n + k, k]] = damping.sqrt();
        }

        let Some(delta) = lstsq::solve(&jacobian, &residuals) else {
            return Err(Error::no_convergence("gompertz", "damped step is not finite"));
        };
        let candidate = [p[0] + delta[0], p[1] + delta[1], p[2] + delta[2]];
        let trial = sse(values, &steps, candidate);

        if trial.is_finite() && trial < current {
            let improvement = (current - trial) / current.max(f64::MIN_POSITIVE);
            p = candidate;
            current = trial;
            damping = (damping / 10.0).max(1e-12);
            if improvement < TOLERANCE {
                return finish(p);
            }
        } else {
            damping *= 10.0;
            // No descent direction left at any damping: a (local) minimum.
            if damping > MAX_DAMPING {
                return finish(p);
            }
        }
    }

    Err(Error::no_convergence(
        "gompertz",
        format!("no convergence within {} iterations", MAX_ITERATIONS),
    ))
}

fn finish(p: [f64; 3]) -> Result<GompertzFit> {
    if !p.iter().all(|v| v.is_finite()) {
        return Err(Error::no_convergence("gompertz", "parameters diverged"));
    }
    if p[0] <= 0.0 {
        return Err(Error::no_convergence("gompertz", "asymptote is not positive"));
    }
    if p[2] <= 0.0 {
        return Err(Error::no_convergence("gompertz", "growth rate is not positive"));
    }
    Ok(GompertzFit {
        asymptote: p[0],
        displacement: p[1],
        growth_rate: p[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Invert a known Gompertz curve at the staircase heights.
    fn gompertz_quantiles(n: usize, a: f64, b: f64, c: f64) -> Vec<f64> {
        (1..=n)
            .map(|i| b - (-(i as f64 / a).ln()).ln() / c)
            .collect()
    }

    #[test]
    fn test_recovers_generating_curve() {
        let values = gompertz_quantiles(150, 160.0, 2.0, 0.8);
        let fit = fit(&values).unwrap();
        assert_relative_eq!(fit.asymptote, 160.0, max_relative = 1e-4);
        assert_relative_eq!(fit.displacement, 2.0, max_relative = 1e-4);
        assert_relative_eq!(fit.growth_rate, 0.8, max_relative = 1e-4);
    }

    #[test]
    fn test_fit_is_monotone() {
        let values: Vec<f64> = (0..80)
            .map(|i| 10.0 * (3.0 * ((i as f64 + 0.5) / 80.0 - 0.5)).sin())
            .collect();
        let fit = fit(&values).unwrap();
        let curve: Vec<f64> = values.iter().map(|&x| fit.evaluate(x)).collect();
        assert!(curve.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            fit(&[1.0, 2.0, 3.0]),
            Err(Error::DegenerateInput { .. })
        ));
        assert!(matches!(
            fit(&[2.0; 10]),
            Err(Error::FitNonConvergence { .. })
        ));
    }
}
