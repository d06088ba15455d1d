//! Design-event selection along the composite isoline.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::RngCore;

use crate::error::EstimationError;
use crate::isoline::MergedPoint;
use crate::types::Point;

/// The three kinds of design event derived from the composite isoline.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedEvents {
    /// Isoline point of maximum estimated density (first occurrence wins
    /// ties).
    pub most_likely: Point,
    /// The corner of the exceedance region: both variables at their
    /// univariate return-period level simultaneously.
    pub full_dependence: Point,
    /// Density-weighted draw of isoline points, with replacement.
    pub ensemble: Vec<Point>,
}

/// Selects the design events from the composite isoline and its per-point
/// density estimates.
///
/// The full-dependence event pairs the maximum x over the whole isoline
/// with the maximum y excluding the synthetic first (closure) point. The
/// ensemble draws `ensemble_size` points with probability proportional to
/// density; weights need not be normalized. An ensemble size of zero
/// yields an empty ensemble.
///
/// # Errors
///
/// [`EstimationError::LengthMismatch`] when `densities` is not aligned
/// with `isoline`; [`EstimationError::InsufficientData`] for an isoline
/// with fewer than two points; [`EstimationError::Sampling`] when every
/// density weight is zero (or otherwise unusable) so no ensemble can be
/// drawn.
pub fn select_events(
    isoline: &[MergedPoint],
    densities: &[f64],
    ensemble_size: usize,
    rng: &mut dyn RngCore,
) -> Result<SelectedEvents, EstimationError> {
    if densities.len() != isoline.len() {
        return Err(EstimationError::LengthMismatch {
            expected: isoline.len(),
            got: densities.len(),
            field: "densities".to_string(),
        });
    }
    if isoline.len() < 2 {
        return Err(EstimationError::InsufficientData {
            context: "composite isoline",
            needed: 2,
            got: isoline.len(),
        });
    }

    // Strict comparison keeps the first occurrence on ties.
    let mut best = 0usize;
    for (idx, &d) in densities.iter().enumerate() {
        if d > densities[best] {
            best = idx;
        }
    }
    let most_likely = Point::new(isoline[best].x, isoline[best].y);

    let max_x = isoline
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_y = isoline[1..]
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);
    let full_dependence = Point::new(max_x, max_y);

    let ensemble = if ensemble_size == 0 {
        Vec::new()
    } else {
        let weights = WeightedIndex::new(densities.iter().copied()).map_err(|e| {
            EstimationError::Sampling {
                reason: format!("isoline density weights unusable: {}", e),
            }
        })?;
        (0..ensemble_size)
            .map(|_| {
                let idx = weights.sample(rng);
                Point::new(isoline[idx].x, isoline[idx].y)
            })
            .collect()
    };

    Ok(SelectedEvents {
        most_likely,
        full_dependence,
        ensemble,
    })
}
