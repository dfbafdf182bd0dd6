//! GOE score: distance of unfolded spacings from GOE expectations.
//!
//! ```text
//! score = (mean(s) - 1)² + (var(s) - v_GOE)²
//! ```
//!
//! A correctly unfolded GOE spectrum has spacings with mean 1 and variance
//! [`GOE_SPACING_VARIANCE`]; under-smoothing (too flexible a fit) shrinks
//! the variance, under-fitting inflates it. The score is the single figure of
//! merit for every trim/smoother comparison, so it is deterministic and
//! depends on nothing but the unfolded values.

use crate::ensemble::GOE_SPACING_VARIANCE;
use crate::spacings;
use crate::unfolded::Unfolded;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoeScorer {
    pub expected_mean: f64,
    pub expected_variance: f64,
}

impl Default for GoeScorer {
    fn default() -> Self {
        Self {
            expected_mean: 1.0,
            expected_variance: GOE_SPACING_VARIANCE,
        }
    }
}

impl GoeScorer {
    pub fn score(&self, unfolded: &Unfolded) -> f64 {
        self.score_spacings(&unfolded.spacings())
    }

    /// Score a spacing sequence directly.
    ///
    /// With no spacings at all (a single level) the score is `+∞`, so such
    /// a configuration never wins a comparison.
    pub fn score_spacings(&self, spacings: &[f64]) -> f64 {
        if spacings.is_empty() {
            return f64::INFINITY;
        }
        let mean = spacings::mean(spacings);
        let var = spacings::variance(spacings);
        (mean - self.expected_mean).powi(2) + (var - self.expected_variance).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_literal_example() {
        let s = [0.8, 1.0, 1.2];
        let var = ((0.8f64 - 1.0).powi(2) + 0.0 + (1.2f64 - 1.0).powi(2)) / 3.0;
        let expected = (var - GOE_SPACING_VARIANCE).powi(2);
        assert_abs_diff_eq!(GoeScorer::default().score_spacings(&s), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_ideal_spacings_score_zero() {
        let scorer = GoeScorer {
            expected_mean: 1.0,
            expected_variance: 0.0,
        };
        assert_eq!(scorer.score_spacings(&[1.0; 10]), 0.0);
    }

    #[test]
    fn test_scores_unfolded() {
        let values = vec![0.0, 1.0, 2.0, 3.0];
        let u = Unfolded::new(values.clone(), values).unwrap();
        assert_abs_diff_eq!(u.goe_score(), GOE_SPACING_VARIANCE.powi(2), epsilon = 1e-15);
        assert_eq!(GoeScorer::default().score_spacings(&[]), f64::INFINITY);
    }

    proptest! {
        #[test]
        fn score_is_non_negative(s in prop::collection::vec(-1e3f64..1e3, 1..100)) {
            let score = GoeScorer::default().score_spacings(&s);
            prop_assert!(score >= 0.0);
            prop_assert!(score.is_finite());
        }
    }
}
