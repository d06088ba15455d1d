//! The design-event estimator: per-regime return-level isolines, their
//! merge, density scoring, and event selection.

use crate::config::DesignConfig;
use crate::constants::CONDITIONAL_EXCEEDANCE_RATE;
use crate::copula::{make_rng, simulate_uniforms, BivariateCopula};
use crate::density::{select_events, KernelDensity2d};
use crate::error::EstimationError;
use crate::isoline::{merge_isolines, Isoline, ReturnLevelGrid};
use crate::margins::{BulkMargin, GpdTail};
use crate::result::{DesignEvents, IsolinePoint};
use crate::types::Point;

/// Everything the estimator needs to know about one variable.
#[derive(Debug, Clone)]
pub struct VariableModel {
    /// Variable name (reported back in results).
    pub name: String,
    /// Fitted GPD tail model.
    pub tail: GpdTail,
    /// Bulk marginal for values below the tail threshold.
    pub bulk: BulkMargin,
}

/// One conditioning regime: the conditional sample gathered above one
/// variable's threshold, the copula fitted to it, and the record length it
/// was extracted from.
pub struct Regime<'a> {
    /// Concurrent observation pairs, `(x, y)` in variable order.
    pub observations: &'a [Point],
    /// Bivariate copula fitted to this conditional sample.
    pub copula: &'a dyn BivariateCopula,
    /// Length of the underlying record in years.
    pub record_years: f64,
}

/// Estimator for joint design events at a target return period.
///
/// # Example
///
/// ```ignore
/// use compound_extremes::DesignEventEstimator;
///
/// let events = DesignEventEstimator::new(100.0)
///     .grid_step(1e-3)
///     .seed(42)
///     .estimate(&rain_model, &surge_model, &rain_regime, &surge_regime)?;
/// println!("most likely: ({}, {})", events.most_likely.x, events.most_likely.y);
/// ```
#[derive(Debug, Clone)]
pub struct DesignEventEstimator {
    config: DesignConfig,
}

impl DesignEventEstimator {
    /// Creates an estimator for the given return period (years) with
    /// default settings.
    pub fn new(return_period: f64) -> Self {
        Self {
            config: DesignConfig {
                return_period,
                ..DesignConfig::default()
            },
        }
    }

    /// Creates an estimator from a full configuration.
    pub fn with_config(config: DesignConfig) -> Self {
        Self { config }
    }

    /// Sets the return-level grid step.
    pub fn grid_step(mut self, step: f64) -> Self {
        self.config.grid_step = step;
        self
    }

    /// Sets the pooled simulation size backing the density estimate.
    pub fn simulation_draws(mut self, draws: usize) -> Self {
        self.config.simulation_draws = draws;
        self
    }

    /// Sets the ensemble size.
    pub fn ensemble_size(mut self, size: usize) -> Self {
        self.config.ensemble_size = size;
        self
    }

    /// Sets an explicit merge-grid step.
    pub fn merge_step(mut self, step: f64) -> Self {
        self.config.merge_step = Some(step);
        self
    }

    /// Sets the deterministic seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// The effective configuration.
    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// Runs the full estimation: one return-level isoline per conditioning
    /// regime, merged into the composite isoline, scored by a kernel
    /// density fitted on pooled copula draws, and reduced to the three
    /// design-event kinds.
    ///
    /// `first` must be the regime conditioned on `x_model`'s variable and
    /// `second` the regime conditioned on `y_model`'s.
    ///
    /// # Errors
    ///
    /// Any [`EstimationError`]; in particular
    /// [`EstimationError::NoIsoline`] when the return period is not
    /// representable on either regime's grid. A failure aborts the whole
    /// result.
    pub fn estimate(
        &self,
        x_model: &VariableModel,
        y_model: &VariableModel,
        first: &Regime<'_>,
        second: &Regime<'_>,
    ) -> Result<DesignEvents, EstimationError> {
        self.config.validate()?;
        x_model.tail.validate()?;
        y_model.tail.validate()?;
        for (regime, which) in [(first, "first"), (second, "second")] {
            if regime.observations.is_empty() {
                return Err(EstimationError::InsufficientData {
                    context: "conditional sample",
                    needed: 1,
                    got: 0,
                });
            }
            if !(regime.record_years.is_finite() && regime.record_years > 0.0) {
                return Err(EstimationError::InvalidConfig {
                    reason: format!(
                        "{} regime record length must be positive, got {} years",
                        which, regime.record_years
                    ),
                });
            }
        }

        let mut rng = make_rng(self.config.seed);

        // Per-regime isolines in physical units.
        let iso_first = self.regime_isoline(first, true, x_model, y_model)?;
        let iso_second = self.regime_isoline(second, false, x_model, y_model)?;

        let merged = merge_isolines(&iso_first, &iso_second, self.config.merge_step)?;

        // Pooled physical-scale sample, sized proportionally to each
        // regime's share of the conditional observations.
        let n1 = first.observations.len();
        let n2 = second.observations.len();
        let share = n1 as f64 / (n1 + n2) as f64;
        let draws_first = ((self.config.simulation_draws as f64) * share).round() as usize;
        let draws_second = self.config.simulation_draws - draws_first;

        let mut pooled = Vec::with_capacity(self.config.simulation_draws);
        for (regime, draws, conditioned_on_x) in
            [(first, draws_first, true), (second, draws_second, false)]
        {
            if draws == 0 {
                continue;
            }
            let uniforms = simulate_uniforms(regime.copula, draws, &mut rng)?;
            for row in 0..draws {
                pooled.push(map_pair(
                    uniforms[(row, 0)],
                    uniforms[(row, 1)],
                    conditioned_on_x,
                    x_model,
                    y_model,
                )?);
            }
        }

        let kde = KernelDensity2d::fit(&pooled)?;
        let isoline_points: Vec<Point> =
            merged.iter().map(|p| Point::new(p.x, p.y)).collect();
        let densities = kde.densities(&isoline_points);

        let selected = select_events(&merged, &densities, self.config.ensemble_size, &mut rng)?;

        let isoline = merged
            .iter()
            .zip(&densities)
            .map(|(p, &density)| IsolinePoint {
                x: p.x,
                y: p.y,
                source: p.source,
                density,
            })
            .collect();

        Ok(DesignEvents {
            most_likely: selected.most_likely,
            full_dependence: selected.full_dependence,
            ensemble: selected.ensemble,
            isoline,
            first_conditional: first.observations.to_vec(),
            second_conditional: second.observations.to_vec(),
        })
    }

    /// Builds one regime's return-level grid, extracts the isoline at the
    /// target return period, and maps it to physical units.
    fn regime_isoline(
        &self,
        regime: &Regime<'_>,
        conditioned_on_x: bool,
        x_model: &VariableModel,
        y_model: &VariableModel,
    ) -> Result<Isoline, EstimationError> {
        let grid = ReturnLevelGrid::new(
            regime.copula,
            self.config.grid_step,
            regime.observations.len(),
            regime.record_years,
        )?;
        let branch = grid.isoline(self.config.return_period)?;
        let mut points = Vec::with_capacity(branch.len());
        for (u, v) in branch {
            points.push(map_pair(u, v, conditioned_on_x, x_model, y_model)?);
        }
        Ok(Isoline::new(points))
    }
}

/// Maps one copula-uniform pair to physical units for a conditioning
/// regime: the conditioning coordinate goes through the GPD tail inverse
/// at exceedance rate 1 (the sample is already conditioned), the other
/// through its bulk marginal quantile.
fn map_pair(
    u: f64,
    v: f64,
    conditioned_on_x: bool,
    x_model: &VariableModel,
    y_model: &VariableModel,
) -> Result<Point, EstimationError> {
    if conditioned_on_x {
        Ok(Point::new(
            x_model.tail.inverse(u, CONDITIONAL_EXCEEDANCE_RATE)?,
            y_model.bulk.quantile(v)?,
        ))
    } else {
        Ok(Point::new(
            x_model.bulk.quantile(u)?,
            y_model.tail.inverse(v, CONDITIONAL_EXCEEDANCE_RATE)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copula::{ClaytonCopula, GumbelCopula};
    use crate::margins::FittedMargin;

    fn x_model() -> VariableModel {
        VariableModel {
            name: "rain".to_string(),
            tail: GpdTail {
                threshold: 3.0,
                scale: 1.0,
                shape: 0.1,
                exceedance_rate: 0.1,
            },
            bulk: BulkMargin::Parametric(FittedMargin::Gaussian {
                mean: 4.0,
                std_dev: 1.0,
            }),
        }
    }

    fn y_model() -> VariableModel {
        VariableModel {
            name: "surge".to_string(),
            tail: GpdTail {
                threshold: 4.0,
                scale: 0.8,
                shape: 0.05,
                exceedance_rate: 0.1,
            },
            bulk: BulkMargin::Parametric(FittedMargin::Gaussian {
                mean: 3.0,
                std_dev: 1.0,
            }),
        }
    }

    /// Synthetic conditional samples; only their size and echo matter to
    /// the estimator.
    fn observations(n: usize, x0: f64, y0: f64) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(x0 + 0.01 * i as f64, y0 + 0.02 * (i % 7) as f64))
            .collect()
    }

    fn estimator() -> DesignEventEstimator {
        DesignEventEstimator::new(50.0)
            .grid_step(0.005)
            .simulation_draws(600)
            .ensemble_size(50)
            .seed(42)
    }

    #[test]
    fn full_pipeline_produces_consistent_events() {
        let obs1 = observations(80, 3.0, 2.5);
        let obs2 = observations(60, 2.0, 4.0);
        let clayton = ClaytonCopula::new(2.0);
        let gumbel = GumbelCopula::new(1.5);
        let first = Regime {
            observations: &obs1,
            copula: &clayton,
            record_years: 40.0,
        };
        let second = Regime {
            observations: &obs2,
            copula: &gumbel,
            record_years: 30.0,
        };

        let events = estimator()
            .estimate(&x_model(), &y_model(), &first, &second)
            .unwrap();

        // The ensemble has the configured size, and every member is an
        // exact isoline point, not an interpolated value.
        assert_eq!(events.ensemble.len(), 50);
        for event in &events.ensemble {
            assert!(
                events
                    .isoline
                    .iter()
                    .any(|p| p.x == event.x && p.y == event.y),
                "ensemble point {:?} missing from isoline",
                event
            );
        }

        // Full-dependence dominance: the corner bounds every other event.
        for event in std::iter::once(&events.most_likely).chain(&events.ensemble) {
            assert!(event.x <= events.full_dependence.x + 1e-12);
            assert!(event.y <= events.full_dependence.y + 1e-12);
        }

        // The most likely event is the density argmax over the isoline.
        let best = events
            .isoline
            .iter()
            .max_by(|a, b| a.density.total_cmp(&b.density))
            .unwrap();
        assert_eq!(events.most_likely, Point::new(best.x, best.y));

        // Isoline is monotone in x and finite in density.
        for pair in events.isoline.windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
        assert!(events.isoline.iter().all(|p| p.density.is_finite()));

        // Conditional samples are echoed for plotting.
        assert_eq!(events.first_conditional.len(), 80);
        assert_eq!(events.second_conditional.len(), 60);
    }

    #[test]
    fn fixed_seed_is_bit_reproducible() {
        let obs1 = observations(80, 3.0, 2.5);
        let obs2 = observations(60, 2.0, 4.0);
        let clayton = ClaytonCopula::new(2.0);
        let gumbel = GumbelCopula::new(1.5);
        let first = Regime {
            observations: &obs1,
            copula: &clayton,
            record_years: 40.0,
        };
        let second = Regime {
            observations: &obs2,
            copula: &gumbel,
            record_years: 30.0,
        };

        let a = estimator()
            .estimate(&x_model(), &y_model(), &first, &second)
            .unwrap();
        let b = estimator()
            .estimate(&x_model(), &y_model(), &first, &second)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unreachable_return_period_raises_no_isoline() {
        let obs1 = observations(80, 3.0, 2.5);
        let obs2 = observations(60, 2.0, 4.0);
        let clayton = ClaytonCopula::new(2.0);
        let gumbel = GumbelCopula::new(1.5);
        let first = Regime {
            observations: &obs1,
            copula: &clayton,
            record_years: 40.0,
        };
        let second = Regime {
            observations: &obs2,
            copula: &gumbel,
            record_years: 30.0,
        };

        let result = DesignEventEstimator::new(1.0e9)
            .grid_step(0.005)
            .simulation_draws(600)
            .ensemble_size(50)
            .seed(42)
            .estimate(&x_model(), &y_model(), &first, &second);
        assert!(matches!(result, Err(EstimationError::NoIsoline { .. })));
    }

    #[test]
    fn empty_conditional_sample_is_rejected() {
        let obs2 = observations(60, 2.0, 4.0);
        let clayton = ClaytonCopula::new(2.0);
        let gumbel = GumbelCopula::new(1.5);
        let first = Regime {
            observations: &[],
            copula: &clayton,
            record_years: 40.0,
        };
        let second = Regime {
            observations: &obs2,
            copula: &gumbel,
            record_years: 30.0,
        };
        assert!(matches!(
            estimator().estimate(&x_model(), &y_model(), &first, &second),
            Err(EstimationError::InsufficientData { .. })
        ));
    }
}
