//! Smoothers: fitted cumulative level counts and the unfolding they induce.
//!
//! Every smoother fits the empirical staircase `N(x_i) = i + 1` of a sorted
//! eigenvalue set and unfolds by evaluating the fit at each eigenvalue. A
//! good fit leaves unfolded values with unit mean spacing.
//!
//! | Family | Parameters | Fit |
//! |--------|------------|-----|
//! | [`SmootherConfig::Polynomial`] | degree ≥ 1 | least squares |
//! | [`SmootherConfig::Spline`] | degree 1..=5, smoothing > 0 | penalized B-spline |
//! | [`SmootherConfig::Gompertz`] | - | Levenberg–Marquardt |
//! | [`SmootherConfig::Semicircle`] | - | analytic (GOE level density) |
//! | [`SmootherConfig::Custom`] | function | caller supplied |

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::spacings;
use crate::unfolded::Unfolded;

mod gompertz;
mod lstsq;
mod polynomial;
mod semicircle;
mod spline;

pub use gompertz::GompertzFit;
pub use polynomial::PolynomialFit;
pub use semicircle::SemicircleFit;
pub use spline::SplineFit;

pub const DEFAULT_POLY_DEGREE: usize = 9;
pub const DEFAULT_SPLINE_DEGREE: usize = 3;
pub const DEFAULT_SPLINE_SMOOTH: f64 = 1.4;

/// Smoother family, in declaration (tie-break) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SmootherFamily {
    Polynomial,
    Spline,
    Gompertz,
    Semicircle,
    Custom,
}

/// Polynomial degree, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolySpec {
    degree: usize,
}

impl PolySpec {
    pub fn degree(&self) -> usize {
        self.degree
    }
}

/// Spline degree and smoothing factor, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineSpec {
    degree: usize,
    smooth: f64,
}

impl SplineSpec {
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn smooth(&self) -> f64 {
        self.smooth
    }
}

type UnfoldFn = dyn Fn(&[f64]) -> Vec<f64> + Send + Sync;

/// A named caller-supplied unfolding: sorted eigenvalues in, unfolded out.
#[derive(Clone)]
pub struct CustomSmoother {
    name: String,
    func: Arc<UnfoldFn>,
}

impl CustomSmoother {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomSmoother {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSmoother")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Which curve to fit to the staircase.
///
/// Parameterized variants are built through [`SmootherConfig::polynomial`]
/// and [`SmootherConfig::spline`], which reject invalid parameters.
#[derive(Debug, Clone)]
pub enum SmootherConfig {
    Polynomial(PolySpec),
    Spline(SplineSpec),
    Gompertz,
    /// Wigner semicircle ("goe") unfolding.
    Semicircle,
    Custom(CustomSmoother),
}

impl SmootherConfig {
    pub fn polynomial(degree: usize) -> Result<Self> {
        if degree < 1 {
            return Err(Error::config(
                "polynomial degree",
                format!("must be at least 1 (got {})", degree),
            ));
        }
        Ok(Self::Polynomial(PolySpec { degree }))
    }

    pub fn spline(degree: usize, smooth: f64) -> Result<Self> {
        if !(1..=5).contains(&degree) {
            return Err(Error::config(
                "spline degree",
                format!("must be in 1..=5 (got {})", degree),
            ));
        }
        if !(smooth > 0.0 && smooth.is_finite()) {
            return Err(Error::config(
                "spline smoothing factor",
                format!("must be positive and finite (got {})", smooth),
            ));
        }
        Ok(Self::Spline(SplineSpec { degree, smooth }))
    }

    pub fn custom(
        name: impl Into<String>,
        func: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(CustomSmoother::new(name, func))
    }

    pub fn family(&self) -> SmootherFamily {
        match self {
            Self::Polynomial(_) => SmootherFamily::Polynomial,
            Self::Spline(_) => SmootherFamily::Spline,
            Self::Gompertz => SmootherFamily::Gompertz,
            Self::Semicircle => SmootherFamily::Semicircle,
            Self::Custom(_) => SmootherFamily::Custom,
        }
    }

    /// Stable identifier, e.g. `poly_9`, `spline_3_1.4`, `gompertz`.
    pub fn label(&self) -> String {
        match self {
            Self::Polynomial(p) => format!("poly_{}", p.degree),
            Self::Spline(s) => format!("spline_{}_{}", s.degree, s.smooth),
            Self::Gompertz => "gompertz".to_string(),
            Self::Semicircle => "goe".to_string(),
            Self::Custom(c) => c.name.clone(),
        }
    }
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self::Polynomial(PolySpec {
            degree: DEFAULT_POLY_DEGREE,
        })
    }
}

impl fmt::Display for SmootherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Post-fit smoothing of spacings, e.g. Empirical Mode Decomposition.
///
/// Receives the first differences of the unfolded sequence and must return
/// a sequence of the same length.
pub trait Detrender: fmt::Debug + Send + Sync {
    fn detrend(&self, spacings: &[f64]) -> Vec<f64>;
}

/// A fitted cumulative count `F: eigenvalue -> N(eigenvalue)`.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFunctionFit {
    Polynomial(PolynomialFit),
    Spline(SplineFit),
    Gompertz(GompertzFit),
    Semicircle(SemicircleFit),
}

impl StepFunctionFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Polynomial(p) => p.evaluate(x),
            Self::Spline(s) => s.evaluate(x),
            Self::Gompertz(g) => g.evaluate(x),
            Self::Semicircle(s) => s.evaluate(x),
        }
    }

    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Fits smoothers to one sorted eigenvalue set.
#[derive(Debug, Clone, Copy)]
pub struct Smoother<'a> {
    values: &'a [f64],
}

impl<'a> Smoother<'a> {
    /// `values` must already be sorted ascending.
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    pub fn fit(&self, config: &SmootherConfig) -> Result<Unfolded> {
        self.fit_detrended(config, None)
    }

    /// Fit, optionally detrend the spacings, and wrap as [`Unfolded`].
    ///
    /// Only polynomial, spline and Gompertz fits are detrended; semicircle
    /// and custom unfoldings are returned as computed. Every family except
    /// the semicircle needs at least two eigenvalues.
    pub fn fit_detrended(
        &self,
        config: &SmootherConfig,
        detrender: Option<&dyn Detrender>,
    ) -> Result<Unfolded> {
        let label = config.label();
        if config.family() != SmootherFamily::Semicircle && self.values.len() < 2 {
            return Err(Error::degenerate(label, 2, self.values.len()));
        }
        let (unfolded, fit) = match config {
            SmootherConfig::Semicircle => return Ok(self.fit_semicircle()),
            SmootherConfig::Polynomial(p) => {
                let fit = StepFunctionFit::Polynomial(polynomial::fit(self.values, p.degree)?);
                (fit.evaluate_all(self.values), Some(fit))
            }
            SmootherConfig::Spline(s) => {
                let fit = StepFunctionFit::Spline(spline::fit(self.values, s.degree, s.smooth)?);
                (fit.evaluate_all(self.values), Some(fit))
            }
            SmootherConfig::Gompertz => {
                let fit = StepFunctionFit::Gompertz(gompertz::fit(self.values)?);
                (fit.evaluate_all(self.values), Some(fit))
            }
            SmootherConfig::Custom(c) => {
                let unfolded = (c.func)(self.values);
                if unfolded.len() != self.values.len() {
                    return Err(Error::DimensionMismatch(self.values.len(), unfolded.len()));
                }
                (unfolded, None)
            }
        };

        if let Some(i) = unfolded.iter().position(|u| !u.is_finite()) {
            return Err(Error::no_convergence(
                label,
                format!("non-finite unfolded value at index {}", i),
            ));
        }

        let unfolded = match (detrender, &fit) {
            (Some(d), Some(_)) => detrend(&unfolded, d)?,
            _ => unfolded,
        };
        Unfolded::with_fit(self.values.to_vec(), unfolded, fit)
    }

    /// Semicircle unfolding; always succeeds.
    pub fn fit_semicircle(&self) -> Unfolded {
        let fit = SemicircleFit::new(self.values.len());
        let unfolded = self.values.iter().map(|&x| fit.evaluate(x)).collect();
        Unfolded::from_parts(
            self.values.to_vec(),
            unfolded,
            Some(StepFunctionFit::Semicircle(fit)),
        )
    }
}

/// Replace the spacings of `unfolded` by their detrended version, keeping
/// the first value as anchor.
fn detrend(unfolded: &[f64], detrender: &dyn Detrender) -> Result<Vec<f64>> {
    let Some(&first) = unfolded.first() else {
        return Ok(Vec::new());
    };
    let gaps = spacings::spacings(unfolded);
    let smoothed = detrender.detrend(&gaps);
    if smoothed.len() != gaps.len() {
        log::warn!(
            "detrender returned {} spacings for {} inputs",
            smoothed.len(),
            gaps.len()
        );
        return Err(Error::DimensionMismatch(gaps.len(), smoothed.len()));
    }

    let mut out = Vec::with_capacity(unfolded.len());
    out.push(first);
    let mut acc = first;
    for s in smoothed {
        acc += s;
        out.push(acc);
    }
    Ok(out)
}
