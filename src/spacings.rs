//! Nearest-neighbour spacings and their summary statistics.
//!
//! Every function here takes a sorted sequence (raw or unfolded eigenvalues)
//! and is pure. For an unfolded GOE spectrum the spacings have mean 1 and
//! variance close to [`crate::GOE_SPACING_VARIANCE`].

use statrs::statistics::Statistics;

/// Nearest-neighbour spacings `s_i = x_{i+1} - x_i`.
pub fn spacings(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Next-nearest-neighbour spacings `x_{i+2} - x_i`.
pub fn next_nearest_spacings(values: &[f64]) -> Vec<f64> {
    values.windows(3).map(|w| w[2] - w[0]).collect()
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Population variance (divides by `n`); NaN for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    values.iter().population_variance()
}

/// Symmetric trimmed mean: drop `floor(proportion * n)` values from each end
/// of the sorted sample and average the rest.
///
/// Falls back to the plain mean when trimming would leave nothing.
pub fn trimmed_mean(values: &[f64], proportion: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let cut = (proportion.clamp(0.0, 0.5) * sorted.len() as f64).floor() as usize;
    if 2 * cut >= sorted.len() {
        return mean(&sorted);
    }
    mean(&sorted[cut..sorted.len() - cut])
}

/// Level spacing ratio for eigenvalue sequence.
///
/// The ratio r_i = min(s_i, s_{i+1}) / max(s_i, s_{i+1}) where s_i = λ_{i+1} - λ_i.
/// For GOE: mean ≈ 0.5307. For Poisson (uncorrelated): mean ≈ 0.3863.
///
/// Ratios need no unfolding, which makes them a useful cross-check on a
/// chosen unfolding.
pub fn level_spacing_ratios(values: &[f64]) -> Vec<f64> {
    values
        .windows(3)
        .filter_map(|w| {
            let s1 = w[1] - w[0];
            let s2 = w[2] - w[1];
            (s1 > 0.0 && s2 > 0.0).then(|| s1.min(s2) / s1.max(s2))
        })
        .collect()
}

/// Mean level spacing ratio, 0 when no ratio is defined.
pub fn mean_spacing_ratio(values: &[f64]) -> f64 {
    let ratios = level_spacing_ratios(values);
    if ratios.is_empty() {
        return 0.0;
    }
    mean(&ratios)
}

/// Fixed-width histogram over the range of a sample.
#[derive(Debug, Clone)]
pub struct Histogram {
    min: f64,
    width: f64,
    counts: Vec<usize>,
    total: usize,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning `[min, max]`.
    ///
    /// A sample with (numerically) zero range collapses into a single bin.
    pub fn new(values: &[f64], bins: usize) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if values.is_empty() || bins == 0 || (max - min).abs() < 1e-10 {
            return Self {
                min: if values.is_empty() { 0.0 } else { min },
                width: 0.0,
                counts: vec![values.len()],
                total: values.len(),
            };
        }

        let width = (max - min) / bins as f64;
        let mut hist = Self {
            min,
            width,
            counts: vec![0; bins],
            total: values.len(),
        };
        for &v in values {
            let idx = hist.bin_of(v);
            hist.counts[idx] += 1;
        }
        hist
    }

    /// Index of the bin containing `x`, clamped to the outer bins.
    pub fn bin_of(&self, x: f64) -> usize {
        if self.width == 0.0 {
            return 0;
        }
        let idx = ((x - self.min) / self.width).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.counts.len() - 1)
        }
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Bin height normalized so the tallest bin is 1.
    pub fn relative_height(&self, bin: usize) -> f64 {
        let tallest = self.counts.iter().copied().max().unwrap_or(0);
        if tallest == 0 {
            return 0.0;
        }
        self.counts[bin] as f64 / tallest as f64
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|i| self.min + (i as f64 + 0.5) * self.width)
            .collect()
    }

    /// Probability densities; integrates to 1 over the histogram range.
    pub fn densities(&self) -> Vec<f64> {
        if self.width == 0.0 {
            return vec![1.0; self.counts.len()];
        }
        let n = self.total as f64;
        self.counts
            .iter()
            .map(|&c| c as f64 / (n * self.width))
            .collect()
    }
}

/// Empirical density via histogram.
///
/// # Returns
///
/// (bin_centers, densities)
pub fn empirical_density(values: &[f64], bins: usize) -> (Vec<f64>, Vec<f64>) {
    if values.is_empty() || bins == 0 {
        return (vec![], vec![]);
    }
    let hist = Histogram::new(values, bins);
    (hist.centers(), hist.densities())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spacings_of_ladder() {
        let s = spacings(&[0.0, 1.0, 3.0, 6.0]);
        assert_eq!(s, vec![1.0, 2.0, 3.0]);
        assert_eq!(next_nearest_spacings(&[0.0, 1.0, 3.0, 6.0]), vec![3.0, 5.0]);
        assert!(spacings(&[1.0]).is_empty());
    }

    #[test]
    fn test_population_variance() {
        let s = [0.8, 1.0, 1.2];
        assert_relative_eq!(mean(&s), 1.0, epsilon = 1e-12);
        assert_relative_eq!(variance(&s), 0.08 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trimmed_mean_discounts_extremes() {
        let mut scores: Vec<f64> = (0..9).map(|_| 1.0).collect();
        scores.push(100.0);
        // 10% of 10 values = one from each end
        assert_relative_eq!(trimmed_mean(&scores, 0.1), 1.0, epsilon = 1e-12);
        assert_relative_eq!(trimmed_mean(&[2.0, 4.0], 0.1), 3.0, epsilon = 1e-12);
        assert!(trimmed_mean(&[], 0.1).is_nan());
    }

    #[test]
    fn test_spacing_ratio_bounds() {
        let eigenvalues = vec![1.0, 2.0, 3.5, 4.0, 6.0];
        for r in level_spacing_ratios(&eigenvalues) {
            assert!((0.0..=1.0).contains(&r), "spacing ratio should be in [0, 1]");
        }
        assert_relative_eq!(mean_spacing_ratio(&[0.0, 1.0, 2.0, 3.0]), 1.0);
        assert_eq!(mean_spacing_ratio(&[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_empirical_density() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let (centers, densities) = empirical_density(&values, 10);

        assert_eq!(centers.len(), 10);
        assert_eq!(densities.len(), 10);

        // All densities should be roughly equal for uniform input
        for d in &densities {
            assert!(*d > 0.5 && *d < 1.5);
        }
    }

    #[test]
    fn test_histogram_clamps_outer_bins() {
        let hist = Histogram::new(&[0.0, 1.0, 2.0, 10.0], 5);
        assert_eq!(hist.bin_of(-3.0), 0);
        assert_eq!(hist.bin_of(10.0), 4);
        assert_eq!(hist.counts().iter().sum::<usize>(), 4);
        assert_relative_eq!(hist.relative_height(0), 1.0);

        let flat = Histogram::new(&[2.0, 2.0, 2.0], 4);
        assert_eq!(flat.counts(), &[3]);
        assert_eq!(flat.bin_of(7.0), 0);
    }
}
