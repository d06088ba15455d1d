//! Configuration for joint simulation and design-event estimation.

use crate::constants::{DEFAULT_ENSEMBLE_SIZE, DEFAULT_GRID_STEP, DEFAULT_SIMULATION_DRAWS};
use crate::error::EstimationError;

/// Configuration for the joint simulator.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Average event rate `mu` in events per year (default: 365.25).
    pub events_per_year: f64,

    /// Simulation horizon `N` in years (default: 100).
    pub horizon_years: f64,

    /// Optional deterministic seed; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            events_per_year: 365.25,
            horizon_years: 100.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Validates rates and horizon.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidConfig`] when either quantity is
    /// not positive and finite, or when `round(mu * N)` yields no events.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !(self.events_per_year.is_finite() && self.events_per_year > 0.0) {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "events per year must be finite and > 0, got {}",
                    self.events_per_year
                ),
            });
        }
        if !(self.horizon_years.is_finite() && self.horizon_years > 0.0) {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "horizon must be finite and > 0, got {} years",
                    self.horizon_years
                ),
            });
        }
        if (self.events_per_year * self.horizon_years).round() < 1.0 {
            return Err(EstimationError::InvalidConfig {
                reason: "event rate and horizon round to zero simulated events".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the design-event estimator.
#[derive(Debug, Clone)]
pub struct DesignConfig {
    /// Target joint return period in years (default: 100).
    pub return_period: f64,

    /// Step of the return-level grid along each uniform axis
    /// (default: 1e-4).
    pub grid_step: f64,

    /// Pooled copula draws backing the kernel density estimate
    /// (default: 5,000). Split between the regimes proportionally to their
    /// conditional sample sizes.
    pub simulation_draws: usize,

    /// Number of ensemble events drawn along the isoline (default: 100).
    pub ensemble_size: usize,

    /// Step of the common x-grid used when merging the two regime
    /// isolines; `None` derives it as span/1000.
    pub merge_step: Option<f64>,

    /// Optional deterministic seed; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            return_period: 100.0,
            grid_step: DEFAULT_GRID_STEP,
            simulation_draws: DEFAULT_SIMULATION_DRAWS,
            ensemble_size: DEFAULT_ENSEMBLE_SIZE,
            merge_step: None,
            seed: None,
        }
    }
}

impl DesignConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidConfig`] for a non-positive
    /// return period, a grid step outside (0, 0.25], too few simulation
    /// draws, or a non-positive explicit merge step.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !(self.return_period.is_finite() && self.return_period > 0.0) {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "return period must be finite and > 0, got {}",
                    self.return_period
                ),
            });
        }
        if !(self.grid_step > 0.0 && self.grid_step <= 0.25) {
            return Err(EstimationError::InvalidConfig {
                reason: format!("grid step must lie in (0, 0.25], got {}", self.grid_step),
            });
        }
        if self.simulation_draws < 2 {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "need at least 2 simulation draws for the density estimate, got {}",
                    self.simulation_draws
                ),
            });
        }
        if let Some(step) = self.merge_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(EstimationError::InvalidConfig {
                    reason: format!("merge step must be finite and > 0, got {}", step),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(DesignConfig::default().validate().is_ok());
    }

    #[test]
    fn degenerate_event_counts_rejected() {
        let config = SimulationConfig {
            events_per_year: 0.001,
            horizon_years: 1.0,
            seed: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_design_parameters_rejected() {
        let config = DesignConfig {
            grid_step: 0.5,
            ..DesignConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DesignConfig {
            return_period: -1.0,
            ..DesignConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DesignConfig {
            merge_step: Some(0.0),
            ..DesignConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
