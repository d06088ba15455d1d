//! Joint return-level surface over the copula-uniform square.
//!
//! For a conditioning regime with `n_obs` conditional observations over
//! `record_years` years of record, the effective annual exceedance rate is
//! `lambda = n_obs / record_years` and the mean inter-exceedance time is
//! `EL = 1 / lambda` years. Survival-function return-period theory then
//! gives the return level at `(u, v)` as
//!
//! ```text
//! T(u, v) = EL / (1 - u - v + C(u, v))
//! ```
//!
//! where `C` is the fitted copula's joint CDF.

use rayon::prelude::*;

use crate::constants::{GRID_LOWER, GRID_UPPER, MIN_SURVIVAL};
use crate::copula::BivariateCopula;
use crate::error::EstimationError;
use crate::isoline::trace_level_set;

/// A lazily evaluated return-level surface for one conditioning regime.
///
/// Rows are computed on demand (the dense grid is never stored), which
/// keeps the default 1e-4 step tractable.
pub struct ReturnLevelGrid<'a> {
    us: Vec<f64>,
    vs: Vec<f64>,
    copula: &'a dyn BivariateCopula,
    mean_interarrival: f64,
}

impl<'a> ReturnLevelGrid<'a> {
    /// Builds the grid over `(GRID_LOWER, GRID_UPPER]^2` at `step`.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InvalidConfig`] for a non-positive or too-coarse
    /// step or non-positive record length;
    /// [`EstimationError::InsufficientData`] when the conditional sample is
    /// empty.
    pub fn new(
        copula: &'a dyn BivariateCopula,
        step: f64,
        n_obs: usize,
        record_years: f64,
    ) -> Result<Self, EstimationError> {
        if !(step > 0.0 && step <= 0.25) {
            return Err(EstimationError::InvalidConfig {
                reason: format!("grid step must lie in (0, 0.25], got {}", step),
            });
        }
        if n_obs == 0 {
            return Err(EstimationError::InsufficientData {
                context: "conditional sample",
                needed: 1,
                got: 0,
            });
        }
        if !(record_years.is_finite() && record_years > 0.0) {
            return Err(EstimationError::InvalidConfig {
                reason: format!("record length must be positive, got {} years", record_years),
            });
        }

        let axis = build_axis(step);
        let lambda = n_obs as f64 / record_years;
        Ok(Self {
            us: axis.clone(),
            vs: axis,
            copula,
            mean_interarrival: 1.0 / lambda,
        })
    }

    /// Grid nodes along the u-axis.
    pub fn us(&self) -> &[f64] {
        &self.us
    }

    /// Grid nodes along the v-axis.
    pub fn vs(&self) -> &[f64] {
        &self.vs
    }

    /// Mean inter-exceedance time `EL` in years.
    pub fn mean_interarrival(&self) -> f64 {
        self.mean_interarrival
    }

    /// Return level (years) at one `(u, v)` node.
    ///
    /// The joint survival probability is floored at a tiny epsilon so the
    /// surface stays finite near the grid's upper corner.
    pub fn return_level(&self, u: f64, v: f64) -> f64 {
        let survival = (1.0 - u - v + self.copula.cdf(u, v)).max(MIN_SURVIVAL);
        self.mean_interarrival / survival
    }

    /// One row of the surface at `vs[j]`, evaluated in parallel.
    fn row(&self, j: usize) -> Vec<f64> {
        let v = self.vs[j];
        self.us
            .par_iter()
            .map(|&u| self.return_level(u, v))
            .collect()
    }

    /// Extracts the isoline at return period `level` in uniform coordinates.
    ///
    /// When the tracer finds several disjoint branches, the first branch in
    /// its row-major emission order is used.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::NoIsoline`] when `level` lies outside the
    /// surface's value range.
    pub fn isoline(&self, level: f64) -> Result<Vec<(f64, f64)>, EstimationError> {
        let level_set = trace_level_set(&self.us, &self.vs, |j| self.row(j), level);
        level_set
            .branches
            .into_iter()
            .next()
            .ok_or(EstimationError::NoIsoline {
                return_period: level,
                min_level: level_set.min_value,
                max_level: level_set.max_value,
            })
    }
}

/// Grid nodes `GRID_LOWER, GRID_LOWER + step, ...` up to `GRID_UPPER`.
fn build_axis(step: f64) -> Vec<f64> {
    let mut axis = Vec::new();
    let mut k = 0usize;
    loop {
        let value = GRID_LOWER + k as f64 * step;
        if value > GRID_UPPER + 1.0e-12 {
            break;
        }
        axis.push(value);
        k += 1;
    }
    axis
}
