//! Dense least squares shared by the parametric fits.

use faer::solvers::SpSolverLstsq;
use faer::Mat;
use ndarray::Array2;

/// Solve `min ||A x - b||₂` by Householder QR.
///
/// Returns `None` when the solution is not finite (rank-deficient or
/// overflowing design).
pub(crate) fn solve(design: &Array2<f64>, target: &[f64]) -> Option<Vec<f64>> {
    let (rows, cols) = design.dim();
    debug_assert_eq!(rows, target.len());

    let a = Mat::<f64>::from_fn(rows, cols, |i, j| design[[i, j]]);
    let b = Mat::<f64>::from_fn(rows, 1, |i, _| target[i]);
    let x = a.qr().solve_lstsq(b.as_ref());

    let coeffs: Vec<f64> = (0..cols).map(|j| x.read(j, 0)).collect();
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}

/// Stack `penalty` (scaled by `sqrt(weight)`) under `design`, padding the
/// target with zeros. Solving the stacked system minimizes
/// `||A x - b||² + weight · ||P x||²`.
pub(crate) fn solve_penalized(
    design: &Array2<f64>,
    target: &[f64],
    penalty: &Array2<f64>,
    weight: f64,
) -> Option<Vec<f64>> {
    let (rows, cols) = design.dim();
    let extra = penalty.nrows();
    let scale = weight.sqrt();

    let stacked = Array2::from_shape_fn((rows + extra, cols), |(i, j)| {
        if i < rows {
            design[[i, j]]
        } else {
            scale * penalty[[i - rows, j]]
        }
    });
    let mut padded = target.to_vec();
    padded.resize(rows + extra, 0.0);
    solve(&stacked, &padded)
}
