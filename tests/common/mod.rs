#![allow(dead_code)]

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rmt_unfold::Eigenvalues;

/// GOE matrix with diagonal N(0, 1) and off-diagonal N(0, 1/2), so the
/// spectrum fills `±√(2n)`.
pub fn sample_goe(n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let diagonal = Normal::new(0.0, 1.0).unwrap();
    let off_diagonal = Normal::new(0.0, 0.5f64.sqrt()).unwrap();

    let mut m = Array2::zeros((n, n));
    for i in 0..n {
        m[[i, i]] = diagonal.sample(&mut rng);
        for j in (i + 1)..n {
            let val = off_diagonal.sample(&mut rng);
            m[[i, j]] = val;
            m[[j, i]] = val;
        }
    }
    m
}

pub fn goe_eigenvalues(n: usize, seed: u64) -> Eigenvalues {
    Eigenvalues::from_symmetric(&sample_goe(n, seed)).unwrap()
}

/// Midpoint quantiles of the semicircle law on `±√(2n)`.
///
/// With `x = r sin θ` the CDF is `1/2 + (θ + sin θ cos θ) / π`, which is
/// inverted by bisection on `θ`.
pub fn semicircle_quantiles(n: usize) -> Vec<f64> {
    let r = (2.0 * n as f64).sqrt();
    let half_pi = std::f64::consts::FRAC_PI_2;
    (0..n)
        .map(|i| {
            let p = (i as f64 + 0.5) / n as f64;
            let (mut lo, mut hi) = (-half_pi, half_pi);
            for _ in 0..60 {
                let mid = (lo + hi) / 2.0;
                let cdf = 0.5 + (mid + mid.sin() * mid.cos()) / std::f64::consts::PI;
                if cdf < p {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            r * ((lo + hi) / 2.0).sin()
        })
        .collect()
}
