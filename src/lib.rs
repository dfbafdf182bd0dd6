//! # rmt-unfold
//!
//! Trimming, unfolding and GOE-score model selection for empirical spectra.
//!
//! ## The Core Idea
//!
//! Local spectral statistics (spacing distributions, rigidity, number
//! variance) are universal only after *unfolding*: mapping each eigenvalue
//! through a smooth fit of the cumulative level count so the mean spacing
//! becomes 1. The fit depends on two choices that the data rarely makes
//! obvious:
//!
//! 1. **Which eigenvalues to keep.** Edge outliers (a market mode, a
//!    disconnected component) distort any global fit.
//! 2. **Which smoother to fit.** Too rigid a curve leaves trend in the
//!    spacings; too flexible a curve absorbs real fluctuations.
//!
//! This crate searches both at once. Candidate trims come from histogram
//! outlier scoring; every (trim, smoother) cell is unfolded and scored by how
//! close its spacings' mean and variance are to GOE.
//!
//! ## Smoothers
//!
//! | Smoother | Parameters | Notes |
//! |----------|------------|-------|
//! | Polynomial | degree | default degree 9 |
//! | Spline | degree, smoothing | penalized B-spline |
//! | Gompertz | - | sigmoid, nonlinear least squares |
//! | Semicircle (`goe`) | - | analytic, assumes GOE scaling |
//! | Custom | function | caller supplied |
//!
//! ## Quick Start
//!
//! ```rust
//! use rmt_unfold::{Eigenvalues, SmootherConfig, TrimConfig};
//!
//! let values: Vec<f64> = (1..=200).map(|i| (i as f64).sqrt()).collect();
//! let eigs = Eigenvalues::new(values).unwrap();
//!
//! // Score every trim window against polynomial degrees 3..=11 and Gompertz.
//! let report = eigs.trim_report(&TrimConfig::default()).unwrap();
//! let best = report.best_overall();
//! println!("{} trimmed {:.1}%", best.smoother(), 100.0 * best.trimmed_fraction());
//!
//! // Or unfold directly.
//! let unfolded = eigs.unfold(&SmootherConfig::polynomial(7).unwrap()).unwrap();
//! assert_eq!(unfolded.len(), 200);
//! ```
//!
//! ## The GOE Score
//!
//! ```text
//! score = (mean(s) - 1)² + (var(s) - 0.286)²
//! ```
//!
//! Lower is better. It is a heuristic: it sees only the first two moments of
//! the spacing distribution, so compare it across configurations of one
//! spectrum, never across spectra.
//!
//! ## What Can Go Wrong
//!
//! 1. **Small samples**: below ~50 eigenvalues the asymptotic forms are
//!    unreliable. A warning is logged once per process.
//! 2. **Over-trimming**: removing more eigenvalues regularizes what is left and
//!    improves scores mechanically. Cap it with `max_trim`, and prefer the
//!    smoother-first selection when comparing families.
//! 3. **Semicircle scaling**: `goe` unfolding assumes off-diagonal variance
//!    1/2 (support `±√(2N)`). Rescale other spectra first.
//! 4. **Failed fits**: Gompertz may not converge and high degrees need enough
//!    points. Those cells are dropped from the grid and listed in
//!    [`TrimReport::excluded`].
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade; install any logger to see them.
//!
//! ## References
//!
//! - Mehta (2004). "Random Matrices", 3rd ed.
//! - Guhr, Müller-Groeling & Weidenmüller (1998). "Random-matrix theories in quantum physics: common concepts"
//! - Goldstein & Dengel (2012). "Histogram-based Outlier Score (HBOS)"
//! - Eilers & Marx (1996). "Flexible smoothing with B-splines and penalties"

mod config;
mod eigenvalues;
mod ensemble;
mod error;
mod report;
mod score;
pub mod smoother;
pub mod spacings;
mod trim;
mod unfolded;

pub use config::TrimConfig;
pub use eigenvalues::{Eigenvalues, SMALL_SAMPLE_SIZE};
pub use ensemble::{
    grid, wigner_semicircle_density, Ensemble, Goe, Gse, Gue, Poisson, GOE_MEAN_SPACING_RATIO,
    GOE_SPACING_VARIANCE, POISSON_MEAN_SPACING_RATIO,
};
pub use error::{Error, Result};
pub use report::{ExcludedCell, ScoreGridEntry, ScoreRow, SmootherRank, TrimReport};
pub use score::GoeScorer;
pub use smoother::{
    CustomSmoother, Detrender, Smoother, SmootherConfig, SmootherFamily, StepFunctionFit,
    DEFAULT_POLY_DEGREE, DEFAULT_SPLINE_DEGREE, DEFAULT_SPLINE_SMOOTH,
};
pub use trim::{hbos_scores, OutlierTrimSearch, TrimWindow, Trimmed};
pub use unfolded::{ObservableOptions, Unfolded};
