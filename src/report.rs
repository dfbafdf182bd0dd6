//! Exhaustive trim × smoother search and its selection queries.
//!
//! A [`TrimReport`] evaluates every (trim window, smoother) cell once, scores
//! the unfolded spectrum with [`GoeScorer`](crate::GoeScorer) and answers
//! "which configuration unfolds best" in two ways:
//!
//! - [`TrimReport::best_overall`]: the cell with the lowest score.
//! - [`TrimReport::best_smoother_first`]: rank smoothers by a trimmed mean of
//!   their scores across all windows, then take the best window for the
//!   winner.
//!
//! More trimming mechanically regularizes what is left, so flexible smoothers
//! tend to win the raw minimum at the largest trims. The trimmed mean discounts
//! those extreme cells before smoothers are compared.
//!
//! ## Ties
//!
//! Cells compare by score, then trimmed fraction (less is better), then
//! smoother family declaration order, then smoother and window position.
//! Cells may be evaluated on several threads, but ranking only happens once
//! every cell has completed.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::TrimConfig;
use crate::error::{Error, Result};
use crate::smoother::{Detrender, Smoother, SmootherConfig};
use crate::spacings;
use crate::trim::{OutlierTrimSearch, TrimWindow, Trimmed};
use crate::unfolded::Unfolded;

/// Proportion cut from each end of a smoother's scores before averaging.
const RANKING_TRIM: f64 = 0.1;

/// One evaluated (window, smoother) cell.
#[derive(Debug, Clone)]
pub struct ScoreGridEntry {
    window_index: usize,
    smoother_index: usize,
    window: TrimWindow,
    smoother: SmootherConfig,
    score: f64,
    trimmed_fraction: f64,
    unfolded: Unfolded,
}

impl ScoreGridEntry {
    /// Position of the window in [`TrimReport::windows`].
    pub fn window_index(&self) -> usize {
        self.window_index
    }

    /// Position of the smoother in [`TrimReport::smoothers`].
    pub fn smoother_index(&self) -> usize {
        self.smoother_index
    }

    pub fn window(&self) -> TrimWindow {
        self.window
    }

    pub fn smoother(&self) -> &SmootherConfig {
        &self.smoother
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn trimmed_fraction(&self) -> f64 {
        self.trimmed_fraction
    }

    pub fn unfolded(&self) -> &Unfolded {
        &self.unfolded
    }
}

/// A cell whose fit failed and was left out of the grid.
#[derive(Debug)]
pub struct ExcludedCell {
    pub window_index: usize,
    pub smoother_index: usize,
    pub error: Error,
}

/// A smoother's aggregate score across all windows it fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SmootherRank {
    pub smoother_index: usize,
    pub label: String,
    /// Trimmed mean of the smoother's cell scores.
    pub trimmed_mean: f64,
}

/// One serializable line of [`TrimReport::summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub window_start: usize,
    pub window_end: usize,
    pub percent_trimmed: f64,
    pub smoother: String,
    pub score: f64,
}

/// Score grid over every candidate trim window and configured smoother.
#[derive(Debug)]
pub struct TrimReport {
    eigenvalues: Vec<f64>,
    windows: Vec<TrimWindow>,
    smoothers: Vec<SmootherConfig>,
    grid: BTreeMap<(usize, usize), ScoreGridEntry>,
    excluded: Vec<ExcludedCell>,
    ranking: Vec<SmootherRank>,
    best_key: (usize, usize),
    smoother_first_key: (usize, usize),
    prioritize_smoother: bool,
}

impl TrimReport {
    /// Run the full search over `sorted`, which must be sorted ascending.
    ///
    /// Cells that fail recoverably (see [`Error::is_recoverable`]) are
    /// excluded with a warning. Any other failure aborts the search, as does
    /// a grid with no successful cell.
    pub fn new(sorted: &[f64], config: &TrimConfig) -> Result<Self> {
        config.validate()?;
        if sorted.is_empty() {
            return Err(Error::degenerate("trim report", 1, 0));
        }
        let smoothers = config.smoothers()?;
        let windows = OutlierTrimSearch::new(config.max_trim, config.max_iters, config.outlier_tol)?
            .windows(sorted);

        let cells: Vec<(usize, usize)> = (0..windows.len())
            .flat_map(|w| (0..smoothers.len()).map(move |s| (w, s)))
            .collect();
        let detrender = config.detrender.as_deref();
        let run = |&(wi, si): &(usize, usize)| {
            evaluate_cell(sorted, windows[wi], &smoothers[si], detrender)
        };
        let outcomes: Vec<Result<Unfolded>> = if config.parallel {
            cells.par_iter().map(run).collect()
        } else {
            cells.iter().map(run).collect()
        };

        let total = sorted.len();
        let mut grid = BTreeMap::new();
        let mut excluded = Vec::new();
        for (&(wi, si), outcome) in cells.iter().zip(outcomes) {
            let window = windows[wi];
            match outcome {
                Ok(unfolded) => {
                    let entry = ScoreGridEntry {
                        window_index: wi,
                        smoother_index: si,
                        window,
                        smoother: smoothers[si].clone(),
                        score: unfolded.goe_score(),
                        trimmed_fraction: window.trimmed_fraction(total),
                        unfolded,
                    };
                    grid.insert((wi, si), entry);
                }
                Err(error) if error.is_recoverable() => {
                    log::warn!(
                        "excluding window {} [{}, {}) with {}: {}",
                        wi,
                        window.start(),
                        window.end(),
                        smoothers[si],
                        error
                    );
                    excluded.push(ExcludedCell {
                        window_index: wi,
                        smoother_index: si,
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        if !excluded.is_empty() && !grid.is_empty() {
            log::warn!("{} of {} grid cells excluded", excluded.len(), cells.len());
        }

        Self::assemble(
            sorted.to_vec(),
            windows,
            smoothers,
            grid,
            excluded,
            config.prioritize_smoother,
        )
    }

    /// Rank a completed grid.
    fn assemble(
        eigenvalues: Vec<f64>,
        windows: Vec<TrimWindow>,
        smoothers: Vec<SmootherConfig>,
        grid: BTreeMap<(usize, usize), ScoreGridEntry>,
        excluded: Vec<ExcludedCell>,
        prioritize_smoother: bool,
    ) -> Result<Self> {
        let Some(best_key) = grid.values().min_by(|a, b| compare(a, b)).map(key) else {
            return Err(Error::config(
                "smoothers",
                format!(
                    "produced no usable (window, smoother) cell ({} excluded)",
                    excluded.len()
                ),
            ));
        };

        let ranking = rank_smoothers(&grid, &smoothers);
        let smoother_first_key = ranking
            .first()
            .and_then(|top| {
                grid.values()
                    .filter(|e| e.smoother_index == top.smoother_index)
                    .min_by(|a, b| compare(a, b))
            })
            .map(key)
            .unwrap_or(best_key);

        Ok(Self {
            eigenvalues,
            windows,
            smoothers,
            grid,
            excluded,
            ranking,
            best_key,
            smoother_first_key,
            prioritize_smoother,
        })
    }

    /// The lowest-scoring cell of the whole grid.
    pub fn best_overall(&self) -> &ScoreGridEntry {
        &self.grid[&self.best_key]
    }

    /// For each window with at least one fit, its best smoother, in window
    /// order.
    pub fn best_per_trim(&self) -> Vec<&ScoreGridEntry> {
        (0..self.windows.len())
            .filter_map(|wi| {
                self.grid
                    .range((wi, 0)..(wi + 1, 0))
                    .map(|(_, e)| e)
                    .min_by(|a, b| compare(a, b))
            })
            .collect()
    }

    /// For each smoother with at least one fit, its best window, in smoother
    /// order.
    pub fn best_per_smoother(&self) -> Vec<&ScoreGridEntry> {
        (0..self.smoothers.len())
            .filter_map(|si| {
                self.grid
                    .values()
                    .filter(|e| e.smoother_index == si)
                    .min_by(|a, b| compare(a, b))
            })
            .collect()
    }

    /// Smoothers ordered by the trimmed mean of their scores, best first.
    pub fn smoother_ranking(&self) -> &[SmootherRank] {
        &self.ranking
    }

    /// Best window for the smoother that ranks first in
    /// [`smoother_ranking`](Self::smoother_ranking).
    pub fn best_smoother_first(&self) -> &ScoreGridEntry {
        &self.grid[&self.smoother_first_key]
    }

    /// The cell picked by the configured selection mode.
    pub fn selected(&self) -> &ScoreGridEntry {
        if self.prioritize_smoother {
            self.best_smoother_first()
        } else {
            self.best_overall()
        }
    }

    /// The sorted eigenvalues the search ran over.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Candidate windows, least trimmed first.
    pub fn windows(&self) -> &[TrimWindow] {
        &self.windows
    }

    pub fn smoothers(&self) -> &[SmootherConfig] {
        &self.smoothers
    }

    /// The eigenvalues of each candidate window.
    pub fn trims(&self) -> Vec<Trimmed> {
        self.windows
            .iter()
            .filter_map(|&w| Trimmed::new(&self.eigenvalues, w).ok())
            .collect()
    }

    /// The trimmed eigenvalues behind `entry`.
    pub fn trimmed(&self, entry: &ScoreGridEntry) -> Result<Trimmed> {
        Trimmed::new(&self.eigenvalues, entry.window)
    }

    /// Grid entries ordered by (window, smoother).
    pub fn entries(&self) -> impl Iterator<Item = &ScoreGridEntry> {
        self.grid.values()
    }

    pub fn get(&self, window_index: usize, smoother_index: usize) -> Option<&ScoreGridEntry> {
        self.grid.get(&(window_index, smoother_index))
    }

    pub fn excluded(&self) -> &[ExcludedCell] {
        &self.excluded
    }

    /// Number of successful cells.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn summary(&self) -> Vec<ScoreRow> {
        self.grid
            .values()
            .map(|e| ScoreRow {
                window_start: e.window.start(),
                window_end: e.window.end(),
                percent_trimmed: 100.0 * e.trimmed_fraction,
                smoother: e.smoother.label(),
                score: e.score,
            })
            .collect()
    }
}

impl fmt::Display for TrimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>6} {:>8}  {:<16} {:>12}",
            "start", "end", "trim %", "smoother", "score"
        )?;
        for row in self.summary() {
            writeln!(
                f,
                "{:>6} {:>6} {:>8.2}  {:<16} {:>12.6}",
                row.window_start, row.window_end, row.percent_trimmed, row.smoother, row.score
            )?;
        }
        if !self.excluded.is_empty() {
            writeln!(f, "excluded cells: {}", self.excluded.len())?;
        }
        let best = self.best_overall();
        writeln!(
            f,
            "best overall: {} at [{}, {}) (score {:.6})",
            best.smoother,
            best.window.start(),
            best.window.end(),
            best.score
        )?;
        let first = self.best_smoother_first();
        write!(
            f,
            "best smoother first: {} at [{}, {}) (score {:.6})",
            first.smoother,
            first.window.start(),
            first.window.end(),
            first.score
        )
    }
}

fn evaluate_cell(
    sorted: &[f64],
    window: TrimWindow,
    smoother: &SmootherConfig,
    detrender: Option<&dyn Detrender>,
) -> Result<Unfolded> {
    Smoother::new(&sorted[window.range()]).fit_detrended(smoother, detrender)
}

fn key(entry: &ScoreGridEntry) -> (usize, usize) {
    (entry.window_index, entry.smoother_index)
}

/// Total order used by every "best" query; `Less` is better.
fn compare(a: &ScoreGridEntry, b: &ScoreGridEntry) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then(a.trimmed_fraction.total_cmp(&b.trimmed_fraction))
        .then(a.smoother.family().cmp(&b.smoother.family()))
        .then(a.smoother_index.cmp(&b.smoother_index))
        .then(a.window_index.cmp(&b.window_index))
}

fn rank_smoothers(
    grid: &BTreeMap<(usize, usize), ScoreGridEntry>,
    smoothers: &[SmootherConfig],
) -> Vec<SmootherRank> {
    let mut ranking: Vec<SmootherRank> = smoothers
        .iter()
        .enumerate()
        .filter_map(|(si, smoother)| {
            let scores: Vec<f64> = grid
                .values()
                .filter(|e| e.smoother_index == si)
                .map(|e| e.score)
                .collect();
            (!scores.is_empty()).then(|| SmootherRank {
                smoother_index: si,
                label: smoother.label(),
                trimmed_mean: spacings::trimmed_mean(&scores, RANKING_TRIM),
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        a.trimmed_mean
            .total_cmp(&b.trimmed_mean)
            .then(smoothers[a.smoother_index].family().cmp(&smoothers[b.smoother_index].family()))
            .then(a.smoother_index.cmp(&b.smoother_index))
    });
    ranking
}
