//! Trim windows and histogram-based outlier trimming.
//!
//! ## Outlier scoring
//!
//! Each eigenvalue of the current window gets a Histogram-Based Outlier
//! Score (HBOS, Goldstein & Dengel 2012) over two features: its value and
//! its local spacing. Per feature the score is `-ln(h)`, where `h` is the
//! height of the element's bin relative to the tallest bin, so elements in
//! sparse bins (isolated edge eigenvalues, large gaps) score high.
//!
//! ```text
//! value       ▁▁▁▂▅▇█▇▅▂▁▁▁         ▁    <- lone eigenvalue far right
//! score       low in the bulk, high for the lone value
//! ```
//!
//! Only the two boundary elements are ever removed, one per iteration, so
//! every window is a contiguous index range and each window nests inside
//! the previous one.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::smoother::{Smoother, SmootherConfig};
use crate::spacings::Histogram;
use crate::unfolded::Unfolded;

/// Half-open index range `[start, end)` into a sorted eigenvalue set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrimWindow {
    start: usize,
    end: usize,
}

impl TrimWindow {
    /// Window over `[start, end)` of a set of `len` eigenvalues.
    pub fn new(start: usize, end: usize, len: usize) -> Result<Self> {
        if start >= end || end > len {
            return Err(Error::InvalidWindow { start, end, len });
        }
        Ok(Self { start, end })
    }

    /// The untrimmed window `[0, len)`.
    pub fn full(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `other` lies within this window.
    pub fn contains(&self, other: &TrimWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Fraction of `total` eigenvalues outside the window.
    pub fn trimmed_fraction(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        1.0 - self.len() as f64 / total as f64
    }
}

/// A contiguous slice of a sorted spectrum plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Trimmed {
    values: Vec<f64>,
    window: TrimWindow,
    original_len: usize,
}

impl Trimmed {
    /// Copy `window` out of the sorted spectrum `sorted`.
    pub fn new(sorted: &[f64], window: TrimWindow) -> Result<Self> {
        if window.end > sorted.len() {
            return Err(Error::InvalidWindow {
                start: window.start,
                end: window.end,
                len: sorted.len(),
            });
        }
        Ok(Self {
            values: sorted[window.range()].to_vec(),
            window,
            original_len: sorted.len(),
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn window(&self) -> TrimWindow {
        self.window
    }

    pub fn original_len(&self) -> usize {
        self.original_len
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fraction of the original spectrum removed, in `[0, 1)`.
    pub fn trimmed_fraction(&self) -> f64 {
        self.window.trimmed_fraction(self.original_len)
    }

    /// Percentage of the original spectrum removed.
    pub fn percent_trimmed(&self) -> f64 {
        100.0 * self.trimmed_fraction()
    }

    /// Unfold the trimmed values with one smoother.
    pub fn unfold(&self, smoother: &SmootherConfig) -> Result<Unfolded> {
        Smoother::new(&self.values).fit(smoother)
    }

    /// Unfold the trimmed values via the semicircle law.
    pub fn unfold_goe(&self) -> Unfolded {
        Smoother::new(&self.values).fit_semicircle()
    }
}

/// Iterative edge trimming driven by histogram outlier scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierTrimSearch {
    max_trim: f64,
    max_iters: usize,
    outlier_tol: f64,
}

impl OutlierTrimSearch {
    /// # Arguments
    ///
    /// * `max_trim` - Largest fraction of the spectrum that may be removed, in (0, 1)
    /// * `max_iters` - Trimming iterations; 0 evaluates the raw spectrum only
    /// * `outlier_tol` - Expected outlier fraction, in (0, 1)
    pub fn new(max_trim: f64, max_iters: usize, outlier_tol: f64) -> Result<Self> {
        if !(max_trim > 0.0 && max_trim < 1.0) {
            return Err(Error::config(
                "max_trim",
                format!("must be in (0, 1) (got {})", max_trim),
            ));
        }
        if !(outlier_tol > 0.0 && outlier_tol < 1.0) {
            return Err(Error::config(
                "outlier_tol",
                format!("must be in (0, 1) (got {})", outlier_tol),
            ));
        }
        Ok(Self {
            max_trim,
            max_iters,
            outlier_tol,
        })
    }

    /// Candidate windows over `sorted`, least trimmed first.
    ///
    /// The first window is always the full range. Each later window drops
    /// one boundary eigenvalue from its predecessor. The search stops after
    /// `max_iters` iterations, when neither boundary element is an outlier,
    /// when the next window would exceed `max_trim`, or when it would leave
    /// fewer than two eigenvalues.
    pub fn windows(&self, sorted: &[f64]) -> Vec<TrimWindow> {
        let total = sorted.len();
        let mut current = TrimWindow::full(total);
        let mut windows = vec![current];

        for iteration in 0..self.max_iters {
            if current.len() <= 2 {
                log::debug!("trim search stopped at iteration {}: window too small", iteration);
                break;
            }

            let scores = hbos_scores(&sorted[current.range()]);
            let threshold = upper_quantile(&scores, 1.0 - self.outlier_tol);
            let low = scores[0];
            let high = scores[scores.len() - 1];

            let next = match (low > threshold, high > threshold) {
                (false, false) => {
                    log::debug!("trim search stopped at iteration {}: no boundary outlier", iteration);
                    break;
                }
                (true, false) => TrimWindow {
                    start: current.start + 1,
                    end: current.end,
                },
                (false, true) => TrimWindow {
                    start: current.start,
                    end: current.end - 1,
                },
                (true, true) if high > low => TrimWindow {
                    start: current.start,
                    end: current.end - 1,
                },
                (true, true) => TrimWindow {
                    start: current.start + 1,
                    end: current.end,
                },
            };

            if next.trimmed_fraction(total) > self.max_trim {
                log::debug!("trim search stopped at iteration {}: max_trim reached", iteration);
                break;
            }
            current = next;
            windows.push(current);
        }

        windows
    }
}

/// HBOS score per element of a sorted sample, higher is more outlying.
///
/// Features are the value itself and its local spacing (mean of the gaps
/// to its neighbours). Uses `ceil(sqrt(n))` bins per feature.
pub fn hbos_scores(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let local_spacing: Vec<f64> = (0..n)
        .map(|i| match i {
            0 => sorted[1] - sorted[0],
            i if i == n - 1 => sorted[n - 1] - sorted[n - 2],
            i => (sorted[i + 1] - sorted[i - 1]) / 2.0,
        })
        .collect();

    let bins = ((n as f64).sqrt().ceil() as usize).max(2);
    let value_hist = Histogram::new(sorted, bins);
    let spacing_hist = Histogram::new(&local_spacing, bins);

    sorted
        .iter()
        .zip(&local_spacing)
        .map(|(&v, &s)| {
            let hv = value_hist.relative_height(value_hist.bin_of(v));
            let hs = spacing_hist.relative_height(spacing_hist.bin_of(s));
            -hv.ln() - hs.ln()
        })
        .collect()
}

/// Value at quantile `q` (lower interpolation) of an unsorted sample.
fn upper_quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() - 1) as f64 * q.clamp(0.0, 1.0)).floor() as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Bulk on a gentle ramp plus isolated values at both edges.
    fn spectrum_with_outliers() -> Vec<f64> {
        let mut values = vec![-40.0, -25.0];
        values.extend((0..120).map(|i| i as f64 * 0.1));
        values.push(35.0);
        values
    }

    #[test]
    fn test_window_validation() {
        assert!(TrimWindow::new(0, 5, 5).is_ok());
        assert!(matches!(
            TrimWindow::new(3, 3, 5),
            Err(Error::InvalidWindow { .. })
        ));
        assert!(TrimWindow::new(0, 6, 5).is_err());

        let w = TrimWindow::new(1, 4, 5).unwrap();
        assert_eq!(w.len(), 3);
        assert!(TrimWindow::full(5).contains(&w));
        assert!((w.trimmed_fraction(5) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_trimmed_provenance() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        let trimmed = Trimmed::new(&sorted, TrimWindow::new(1, 3, 4).unwrap()).unwrap();
        assert_eq!(trimmed.values(), &[2.0, 3.0]);
        assert_eq!(trimmed.window().start(), 1);
        assert!((trimmed.percent_trimmed() - 50.0).abs() < 1e-12);
        assert!(Trimmed::new(&sorted[..2], TrimWindow::new(1, 3, 4).unwrap()).is_err());
    }

    #[test]
    fn test_search_rejects_bad_parameters() {
        assert!(OutlierTrimSearch::new(0.0, 3, 0.1).is_err());
        assert!(OutlierTrimSearch::new(1.0, 3, 0.1).is_err());
        assert!(OutlierTrimSearch::new(0.5, 3, 1.5).is_err());
        let err = OutlierTrimSearch::new(0.5, 3, f64::NAN).unwrap_err();
        assert!(err.to_string().contains("outlier_tol"));
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let values = spectrum_with_outliers();
        let search = OutlierTrimSearch::new(0.5, 0, 0.1).unwrap();
        assert_eq!(search.windows(&values), vec![TrimWindow::full(values.len())]);
    }

    #[test]
    fn test_isolated_edges_are_trimmed_first() {
        let values = spectrum_with_outliers();
        let search = OutlierTrimSearch::new(0.5, 3, 0.1).unwrap();
        let windows = search.windows(&values);
        assert!(windows.len() >= 2);

        let last = windows[windows.len() - 1];
        // Nothing from the bulk is ever removed before the isolated values.
        assert!(last.start() <= 2);
        assert!(last.end() >= values.len() - 1);
    }

    #[test]
    fn test_uniform_ladder_has_no_outliers() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let search = OutlierTrimSearch::new(0.5, 5, 0.1).unwrap();
        assert_eq!(search.windows(&values).len(), 1);
    }

    #[test]
    fn test_max_trim_bounds_search() {
        let values = spectrum_with_outliers();
        let search = OutlierTrimSearch::new(0.01, 10, 0.1).unwrap();
        for w in search.windows(&values) {
            assert!(w.trimmed_fraction(values.len()) <= 0.01);
        }
    }

    #[test]
    fn test_tiny_inputs_stop() {
        let search = OutlierTrimSearch::new(0.9, 10, 0.5).unwrap();
        assert_eq!(search.windows(&[1.0, 50.0]).len(), 1);
        assert_eq!(search.windows(&[3.0]).len(), 1);
        assert_eq!(hbos_scores(&[3.0]), vec![0.0]);
    }

    #[test]
    fn test_hbos_flags_isolated_value() {
        let values = spectrum_with_outliers();
        let scores = hbos_scores(&values);
        let bulk_max = scores[10..100].iter().cloned().fold(f64::MIN, f64::max);
        assert!(scores[scores.len() - 1] > bulk_max);
        assert!(scores.iter().all(|s| *s >= 0.0));
    }

    proptest! {
        #[test]
        fn windows_nest_and_trim_monotonically(
            mut values in prop::collection::vec(-100.0f64..100.0, 3..80),
            iters in 0usize..8,
        ) {
            values.sort_by(f64::total_cmp);
            let search = OutlierTrimSearch::new(0.5, iters, 0.1).unwrap();
            let windows = search.windows(&values);

            prop_assert_eq!(windows[0], TrimWindow::full(values.len()));
            prop_assert!(windows.len() <= iters + 1);
            for pair in windows.windows(2) {
                prop_assert!(pair[0].contains(&pair[1]));
                prop_assert_eq!(pair[0].len(), pair[1].len() + 1);
                prop_assert!(
                    pair[1].trimmed_fraction(values.len()) > pair[0].trimmed_fraction(values.len())
                );
            }
            for w in &windows {
                prop_assert!(w.len() >= 2);
                prop_assert!(w.trimmed_fraction(values.len()) <= 0.5);
            }
        }
    }
}
