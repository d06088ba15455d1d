//! Joint simulation of multivariate events on the uniform and physical
//! scales.

use crate::config::SimulationConfig;
use crate::copula::{make_rng, simulate_uniforms, Copula};
use crate::error::EstimationError;
use crate::margins::{map_uniform_to_physical, GpdTail};
use crate::result::JointSimulation;
use crate::types::DataTable;

/// Simulates `round(mu * N)` joint events from a fitted copula and maps
/// each coordinate back to physical units.
///
/// Each column of `data` provides the empirical bulk reference for its
/// variable; values above that variable's tail threshold re-map through
/// the inverse GPD transform at the variable's own exceedance rate. The
/// optional index column of `data` is ignored.
///
/// Returns the uniform and physical samples as two aligned tables whose
/// column names are copied from `data`.
///
/// # Errors
///
/// [`EstimationError::LengthMismatch`] when the tail-model count or copula
/// dimension disagrees with the column count;
/// [`EstimationError::InsufficientData`] when a column has fewer than two
/// non-missing observations; [`EstimationError::InvalidConfig`] for bad
/// rates/horizons or tail parameters; [`EstimationError::Sampling`] from
/// the copula wrapper.
pub fn simulate_joint(
    data: &DataTable,
    tails: &[GpdTail],
    copula: &dyn Copula,
    config: &SimulationConfig,
) -> Result<JointSimulation, EstimationError> {
    config.validate()?;

    let n_vars = data.n_cols();
    if n_vars == 0 {
        return Err(EstimationError::InsufficientData {
            context: "input data table",
            needed: 1,
            got: 0,
        });
    }
    if tails.len() != n_vars {
        return Err(EstimationError::LengthMismatch {
            expected: n_vars,
            got: tails.len(),
            field: "tail models".to_string(),
        });
    }
    if copula.dim() != n_vars {
        return Err(EstimationError::LengthMismatch {
            expected: n_vars,
            got: copula.dim(),
            field: "copula dimension".to_string(),
        });
    }
    for tail in tails {
        tail.validate()?;
    }

    let events = (config.events_per_year * config.horizon_years).round() as usize;
    let mut rng = make_rng(config.seed);
    let uniforms = simulate_uniforms(copula, events, &mut rng)?;

    let mut uniform_columns = Vec::with_capacity(n_vars);
    let mut physical_columns = Vec::with_capacity(n_vars);
    for (j, tail) in tails.iter().enumerate() {
        let u_col: Vec<f64> = (0..events).map(|row| uniforms[(row, j)]).collect();
        let physical =
            map_uniform_to_physical(&u_col, &data.columns[j], tail, tail.exceedance_rate)?;
        uniform_columns.push(u_col);
        physical_columns.push(physical);
    }

    Ok(JointSimulation {
        uniform: DataTable::new(data.names.clone(), uniform_columns)?,
        physical: DataTable::new(data.names.clone(), physical_columns)?,
    })
}
