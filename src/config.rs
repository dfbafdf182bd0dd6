//! Search configuration for [`crate::TrimReport`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::smoother::{CustomSmoother, Detrender, SmootherConfig};

/// Parameters of a trim × smoother grid search.
///
/// Built with chained setters from [`TrimConfig::default`]:
///
/// ```rust
/// use rmt_unfold::TrimConfig;
///
/// let config = TrimConfig::default()
///     .max_iters(0)
///     .poly_degrees([5])
///     .gompertz(false);
/// assert_eq!(config.smoothers().unwrap().len(), 1);
/// ```
///
/// Deserializes with every field optional, so a search can be described in
/// a configuration file. The detrender and custom smoothers are runtime
/// values and are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Largest fraction of the spectrum that may be trimmed, in (0, 1).
    pub max_trim: f64,
    /// Outlier-trimming iterations; 0 evaluates the untrimmed spectrum only.
    pub max_iters: usize,
    pub poly_degrees: Vec<usize>,
    /// Spline degrees, crossed with `spline_smooths`.
    pub spline_degrees: Vec<usize>,
    pub spline_smooths: Vec<f64>,
    pub gompertz: bool,
    /// Expected outlier fraction for histogram outlier scoring, in (0, 1).
    pub outlier_tol: f64,
    /// Rank smoother families before picking a trim (see
    /// [`crate::TrimReport::best_smoother_first`]).
    pub prioritize_smoother: bool,
    /// Evaluate grid cells on the rayon thread pool.
    pub parallel: bool,
    #[serde(skip)]
    pub custom: Vec<CustomSmoother>,
    #[serde(skip)]
    pub detrender: Option<Arc<dyn Detrender>>,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            max_trim: 0.5,
            max_iters: 7,
            poly_degrees: (3..=11).collect(),
            spline_degrees: Vec::new(),
            spline_smooths: Vec::new(),
            gompertz: true,
            outlier_tol: 0.1,
            prioritize_smoother: true,
            parallel: true,
            custom: Vec::new(),
            detrender: None,
        }
    }
}

impl TrimConfig {
    pub fn max_trim(mut self, max_trim: f64) -> Self {
        self.max_trim = max_trim;
        self
    }

    pub fn max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn poly_degrees(mut self, degrees: impl IntoIterator<Item = usize>) -> Self {
        self.poly_degrees = degrees.into_iter().collect();
        self
    }

    pub fn spline_degrees(mut self, degrees: impl IntoIterator<Item = usize>) -> Self {
        self.spline_degrees = degrees.into_iter().collect();
        self
    }

    pub fn spline_smooths(mut self, smooths: impl IntoIterator<Item = f64>) -> Self {
        self.spline_smooths = smooths.into_iter().collect();
        self
    }

    pub fn gompertz(mut self, gompertz: bool) -> Self {
        self.gompertz = gompertz;
        self
    }

    pub fn outlier_tol(mut self, outlier_tol: f64) -> Self {
        self.outlier_tol = outlier_tol;
        self
    }

    pub fn prioritize_smoother(mut self, prioritize: bool) -> Self {
        self.prioritize_smoother = prioritize;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Append a caller-supplied smoother; it is tried after Gompertz.
    pub fn custom_smoother(mut self, smoother: CustomSmoother) -> Self {
        self.custom.push(smoother);
        self
    }

    /// Detrend the spacings of every polynomial, spline and Gompertz fit.
    pub fn detrender(mut self, detrender: impl Detrender + 'static) -> Self {
        self.detrender = Some(Arc::new(detrender));
        self
    }

    /// Restrict the search to a single smoother, keeping every other setting.
    ///
    /// Semicircle unfolding has no fitted curve whose quality depends on the
    /// trim, so it is rejected here.
    pub fn for_smoother(&self, smoother: &SmootherConfig) -> Result<Self> {
        let mut single = Self {
            poly_degrees: Vec::new(),
            spline_degrees: Vec::new(),
            spline_smooths: Vec::new(),
            gompertz: false,
            custom: Vec::new(),
            ..self.clone()
        };
        match smoother {
            SmootherConfig::Polynomial(p) => single.poly_degrees.push(p.degree()),
            SmootherConfig::Spline(s) => {
                single.spline_degrees.push(s.degree());
                single.spline_smooths.push(s.smooth());
            }
            SmootherConfig::Gompertz => single.gompertz = true,
            SmootherConfig::Custom(c) => single.custom.push(c.clone()),
            SmootherConfig::Semicircle => {
                return Err(Error::config(
                    "smoother",
                    "must be a fitted smoother (poly, spline, gompertz or custom), not goe",
                ))
            }
        }
        Ok(single)
    }

    /// Check every parameter against its constraint.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_trim > 0.0 && self.max_trim < 1.0) {
            return Err(Error::config(
                "max_trim",
                format!("must be in (0, 1) (got {})", self.max_trim),
            ));
        }
        if !(self.outlier_tol > 0.0 && self.outlier_tol < 1.0) {
            return Err(Error::config(
                "outlier_tol",
                format!("must be in (0, 1) (got {})", self.outlier_tol),
            ));
        }
        if self.spline_degrees.is_empty() != self.spline_smooths.is_empty() {
            return Err(Error::config(
                "spline_degrees/spline_smooths",
                "must be both empty or both non-empty",
            ));
        }
        if self.smoothers()?.is_empty() {
            return Err(Error::config(
                "smoothers",
                "must name at least one polynomial degree, spline, gompertz or custom smoother",
            ));
        }
        Ok(())
    }

    /// Smoothers in declaration order: polynomials, splines (degree-major),
    /// Gompertz, then custom smoothers.
    pub fn smoothers(&self) -> Result<Vec<SmootherConfig>> {
        let mut smoothers = Vec::new();
        for &degree in &self.poly_degrees {
            smoothers.push(SmootherConfig::polynomial(degree)?);
        }
        for &degree in &self.spline_degrees {
            for &smooth in &self.spline_smooths {
                smoothers.push(SmootherConfig::spline(degree, smooth)?);
            }
        }
        if self.gompertz {
            smoothers.push(SmootherConfig::Gompertz);
        }
        smoothers.extend(self.custom.iter().cloned().map(SmootherConfig::Custom));
        Ok(smoothers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrimConfig::default();
        assert_eq!(config.poly_degrees, (3..=11).collect::<Vec<_>>());
        assert!(config.validate().is_ok());
        let smoothers = config.smoothers().unwrap();
        assert_eq!(smoothers.len(), 10);
        assert_eq!(smoothers[9].label(), "gompertz");
    }

    #[test]
    fn test_declaration_order() {
        let config = TrimConfig::default()
            .poly_degrees([2])
            .spline_degrees([1, 3])
            .spline_smooths([0.5, 2.0])
            .custom_smoother(CustomSmoother::new("identity", |v| v.to_vec()));
        let labels: Vec<String> = config.smoothers().unwrap().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            [
                "poly_2",
                "spline_1_0.5",
                "spline_1_2",
                "spline_3_0.5",
                "spline_3_2",
                "gompertz",
                "identity"
            ]
        );
    }

    #[test]
    fn test_validation_names_parameter() {
        let cases = [
            (TrimConfig::default().max_trim(1.0), "max_trim"),
            (TrimConfig::default().outlier_tol(0.0), "outlier_tol"),
            (TrimConfig::default().poly_degrees([0]), "polynomial degree"),
            (
                TrimConfig::default().spline_degrees([9]).spline_smooths([1.0]),
                "spline degree",
            ),
            (
                TrimConfig::default().spline_degrees([3]),
                "spline_degrees/spline_smooths",
            ),
            (
                TrimConfig::default().poly_degrees(Vec::new()).gompertz(false),
                "smoothers",
            ),
        ];
        for (config, parameter) in cases {
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, Error::Configuration { parameter: p, .. } if p == parameter),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_for_smoother() {
        let base = TrimConfig::default().max_iters(3);
        let single = base
            .for_smoother(&SmootherConfig::spline(2, 0.7).unwrap())
            .unwrap();
        assert_eq!(single.max_iters, 3);
        let labels: Vec<String> = single.smoothers().unwrap().iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["spline_2_0.7"]);

        assert!(base.for_smoother(&SmootherConfig::Semicircle).is_err());
        assert_eq!(
            base.for_smoother(&SmootherConfig::Gompertz).unwrap().smoothers().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_serde_partial_document() {
        let config: TrimConfig =
            serde_json::from_str(r#"{"max_iters": 0, "poly_degrees": [5], "gompertz": false}"#)
                .unwrap();
        assert_eq!(config.max_iters, 0);
        assert_eq!(config.max_trim, 0.5);
        assert_eq!(config.smoothers().unwrap().len(), 1);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["outlier_tol"], 0.1);
        assert!(json.get("detrender").is_none());
    }
}
