//! Entry point: a sorted, validated eigenvalue set.

use std::sync::atomic::{AtomicBool, Ordering};

use faer::{Mat, Side};
use ndarray::Array2;

use crate::config::TrimConfig;
use crate::error::{Error, Result};
use crate::report::TrimReport;
use crate::smoother::{Detrender, Smoother, SmootherConfig};
use crate::trim::{TrimWindow, Trimmed};
use crate::unfolded::Unfolded;

/// Below this many eigenvalues RMT asymptotics are unreliable.
pub const SMALL_SAMPLE_SIZE: usize = 50;

/// Set on the first small-sample warning; never reset while the process runs.
static SMALL_SAMPLE_WARNED: AtomicBool = AtomicBool::new(false);

/// Eigenvalues sorted ascending.
///
/// ```rust
/// use rmt_unfold::{Eigenvalues, TrimConfig};
///
/// // Level density growing linearly: the staircase is N(x) = x².
/// let values: Vec<f64> = (1..=200).map(|i| (i as f64).sqrt()).collect();
///
/// let eigs = Eigenvalues::new(values).unwrap();
/// let config = TrimConfig::default().max_iters(0).poly_degrees([5]).gompertz(false);
/// let unfolded = eigs.trim_unfold_auto(&config).unwrap();
/// assert!((unfolded.mean_spacing() - 1.0).abs() < 0.05);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenvalues {
    values: Vec<f64>,
}

impl Eigenvalues {
    /// Sort and validate `values`.
    ///
    /// Empty input is degenerate and non-finite values are rejected. Fewer
    /// than [`SMALL_SAMPLE_SIZE`] values is allowed, with a one-time warning
    /// per process.
    pub fn new(values: impl Into<Vec<f64>>) -> Result<Self> {
        let mut values = values.into();
        if values.is_empty() {
            return Err(Error::degenerate("eigenvalue set", 1, 0));
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFinite { index, value });
        }
        if values.len() < SMALL_SAMPLE_SIZE && !SMALL_SAMPLE_WARNED.swap(true, Ordering::Relaxed) {
            log::warn!(
                "only {} eigenvalues; RMT statistics are unreliable below {}",
                values.len(),
                SMALL_SAMPLE_SIZE
            );
        }
        values.sort_by(f64::total_cmp);
        Ok(Self { values })
    }

    /// Eigenvalues of a real symmetric matrix; only the lower triangle is read.
    pub fn from_symmetric(matrix: &Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(Error::DimensionMismatch(rows, cols));
        }
        let m = Mat::<f64>::from_fn(rows, cols, |i, j| matrix[[i, j]]);
        Self::new(m.selfadjoint_eigenvalues(Side::Lower))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Score every (trim window, smoother) combination of `config`.
    pub fn trim_report(&self, config: &TrimConfig) -> Result<TrimReport> {
        TrimReport::new(&self.values, config)
    }

    /// The trim that best suits a single smoother.
    ///
    /// Runs a one-smoother search with the trimming settings of `config` and
    /// returns the eigenvalues of the best-scoring window.
    pub fn get_best_trimmed(
        &self,
        smoother: &SmootherConfig,
        config: &TrimConfig,
    ) -> Result<Trimmed> {
        let report = TrimReport::new(&self.values, &config.for_smoother(smoother)?)?;
        report.trimmed(report.best_overall())
    }

    /// Search the full grid and return the selected unfolding.
    ///
    /// Selection follows `TrimConfig::prioritize_smoother`: smoother first
    /// when set, otherwise the single best cell.
    pub fn trim_unfold_auto(&self, config: &TrimConfig) -> Result<Unfolded> {
        let report = self.trim_report(config)?;
        let chosen = report.selected();
        log::info!(
            "selected {} with {:.1}% trimmed (score {:.6})",
            chosen.smoother(),
            100.0 * chosen.trimmed_fraction(),
            chosen.score()
        );
        Ok(chosen.unfolded().clone())
    }

    /// Unfold the untrimmed spectrum with one smoother.
    pub fn unfold(&self, smoother: &SmootherConfig) -> Result<Unfolded> {
        Smoother::new(&self.values).fit(smoother)
    }

    /// Unfold the untrimmed spectrum and smooth the resulting spacings.
    pub fn unfold_detrended(
        &self,
        smoother: &SmootherConfig,
        detrender: &dyn Detrender,
    ) -> Result<Unfolded> {
        Smoother::new(&self.values).fit_detrended(smoother, Some(detrender))
    }

    /// Semicircle unfolding of the untrimmed spectrum.
    pub fn unfold_goe(&self) -> Unfolded {
        Smoother::new(&self.values).fit_semicircle()
    }

    /// Keep the eigenvalues at sorted positions `[start, end)`.
    pub fn trim_manually(&self, start: usize, end: usize) -> Result<Trimmed> {
        Trimmed::new(&self.values, TrimWindow::new(start, end, self.values.len())?)
    }
}
