//! Hybrid empirical/parametric quantile mapping from the copula-uniform
//! scale to physical units.
//!
//! Below the tail threshold, uniforms map through linear interpolation
//! between order statistics of a reference sample (the R-7 definition).
//! Where the empirically mapped value exceeds the threshold, the *same*
//! uniform coordinate is re-mapped through the inverse GPD transform, which
//! keeps ranks consistent across the two regimes and makes the composite
//! quantile function continuous with a kink at the threshold.

use crate::error::EstimationError;
use crate::margins::GpdTail;

/// Minimum number of non-missing reference observations for an empirical
/// quantile.
const MIN_BULK_OBSERVATIONS: usize = 2;

/// Collects the finite values of `sample` in ascending order.
fn sorted_finite(sample: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    values
}

/// R-7 empirical quantile of pre-sorted data (linear interpolation).
fn quantile_sorted(sorted: &[f64], u: f64) -> f64 {
    let n = sorted.len();
    let h = (n - 1) as f64 * u;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        sorted[n - 1]
    } else if h_frac == 0.0 {
        sorted[h_floor]
    } else {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    }
}

/// Empirical quantile of `sample` at probability `u`.
///
/// Missing (non-finite) values are ignored. Uses the R-7 definition with
/// linear interpolation between order statistics.
///
/// # Errors
///
/// Returns [`EstimationError::InsufficientData`] when fewer than two
/// non-missing observations remain.
///
/// # Panics
///
/// Panics when `u` lies outside `[0, 1]`.
pub fn empirical_quantile(sample: &[f64], u: f64) -> Result<f64, EstimationError> {
    assert!(
        (0.0..=1.0).contains(&u),
        "quantile probability must lie in [0, 1], got {}",
        u
    );
    let sorted = sorted_finite(sample);
    if sorted.len() < MIN_BULK_OBSERVATIONS {
        return Err(EstimationError::InsufficientData {
            context: "empirical quantile",
            needed: MIN_BULK_OBSERVATIONS,
            got: sorted.len(),
        });
    }
    Ok(quantile_sorted(&sorted, u))
}

/// Empirical rank of `x` within `sample`: the probability level whose R-7
/// quantile is `x`, clamped to `[0, 1]` outside the sample range.
///
/// This is the interpolation inverse of [`empirical_quantile`].
///
/// # Errors
///
/// Returns [`EstimationError::InsufficientData`] when fewer than two
/// non-missing observations remain.
pub fn empirical_rank(sample: &[f64], x: f64) -> Result<f64, EstimationError> {
    let sorted = sorted_finite(sample);
    if sorted.len() < MIN_BULK_OBSERVATIONS {
        return Err(EstimationError::InsufficientData {
            context: "empirical rank",
            needed: MIN_BULK_OBSERVATIONS,
            got: sorted.len(),
        });
    }

    let n = sorted.len();
    if x <= sorted[0] {
        return Ok(0.0);
    }
    if x >= sorted[n - 1] {
        return Ok(1.0);
    }
    // partition_point: first index with sorted[i] > x; the order statistics
    // bracketing x are then i-1 and i.
    let i = sorted.partition_point(|&v| v <= x);
    let lo = sorted[i - 1];
    let hi = sorted[i];
    let frac = if hi > lo { (x - lo) / (hi - lo) } else { 0.0 };
    Ok(((i - 1) as f64 + frac) / (n - 1) as f64)
}

/// Maps a vector of copula-uniform values to physical units.
///
/// Each `u[i]` first maps through the empirical quantile of `bulk`; entries
/// whose mapped value exceeds `tail.threshold` are overwritten with the
/// inverse GPD transform of the same `u[i]` at exceedance probability
/// `rate`. The branch decision uses the empirically mapped value, not `u`
/// itself.
///
/// # Errors
///
/// Returns [`EstimationError::InsufficientData`] when `bulk` has fewer than
/// two non-missing values, and propagates
/// [`EstimationError::DegenerateShape`] from the tail inverse.
///
/// # Panics
///
/// Panics when any `u[i]` lies outside `[0, 1]` or `rate` outside (0, 1].
pub fn map_uniform_to_physical(
    u: &[f64],
    bulk: &[f64],
    tail: &GpdTail,
    rate: f64,
) -> Result<Vec<f64>, EstimationError> {
    let sorted = sorted_finite(bulk);
    if sorted.len() < MIN_BULK_OBSERVATIONS {
        return Err(EstimationError::InsufficientData {
            context: "bulk reference sample",
            needed: MIN_BULK_OBSERVATIONS,
            got: sorted.len(),
        });
    }

    let mut mapped = Vec::with_capacity(u.len());
    for &ui in u {
        assert!(
            (0.0..=1.0).contains(&ui),
            "uniform coordinate must lie in [0, 1], got {}",
            ui
        );
        let empirical = quantile_sorted(&sorted, ui);
        if empirical > tail.threshold {
            mapped.push(tail.inverse(ui.min(1.0 - f64::EPSILON), rate)?);
        } else {
            mapped.push(empirical);
        }
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0, 0.1, ..., 100 — a linear grid so R-7 interpolation is exact.
    fn linear_bulk() -> Vec<f64> {
        (0..=1000).map(|i| i as f64 / 10.0).collect()
    }

    fn tail() -> GpdTail {
        GpdTail {
            threshold: 90.0,
            scale: 5.0,
            shape: 0.1,
            exceedance_rate: 0.1,
        }
    }

    #[test]
    fn quantile_then_rank_round_trips_below_threshold() {
        let bulk = linear_bulk();
        for k in 1..18 {
            let u = k as f64 * 0.05;
            let x = empirical_quantile(&bulk, u).unwrap();
            let r = empirical_rank(&bulk, x).unwrap();
            assert!((r - u).abs() < 1e-9, "u={}: rank came back {}", u, r);
        }
    }

    #[test]
    fn missing_values_are_ignored() {
        let mut bulk = linear_bulk();
        bulk.push(f64::NAN);
        bulk.push(f64::INFINITY);
        let q = empirical_quantile(&bulk, 0.5).unwrap();
        assert!((q - 50.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_observations_rejected() {
        assert!(matches!(
            empirical_quantile(&[1.0, f64::NAN], 0.5),
            Err(EstimationError::InsufficientData { got: 1, .. })
        ));
        assert!(map_uniform_to_physical(&[0.5], &[3.0], &tail(), 0.1).is_err());
    }

    #[test]
    fn mapping_is_continuous_across_the_threshold() {
        // The threshold sits at the 0.9 empirical quantile and the tail
        // rate is 0.1, so the GPD branch takes over exactly at u = 0.9.
        let bulk = linear_bulk();
        let eps = 1.0e-4;
        let below = map_uniform_to_physical(&[0.9 - eps], &bulk, &tail(), 0.1).unwrap()[0];
        let above = map_uniform_to_physical(&[0.9 + eps], &bulk, &tail(), 0.1).unwrap()[0];
        assert!(below <= tail().threshold + 1e-9);
        assert!(above > tail().threshold);
        assert!(
            (above - below).abs() < 0.05,
            "jump across threshold: {} vs {}",
            below,
            above
        );
    }

    #[test]
    fn branch_decision_uses_the_mapped_value() {
        // A bulk sample entirely below the threshold never enters the tail,
        // no matter how large u is.
        let bulk: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let t = GpdTail {
            threshold: 50.0,
            scale: 1.0,
            shape: 0.0,
            exceedance_rate: 0.5,
        };
        let mapped = map_uniform_to_physical(&[0.999], &bulk, &t, 0.5).unwrap();
        assert!(mapped[0] <= 9.9 + 1e-12);
    }

    #[test]
    fn tail_branch_remaps_the_same_uniform() {
        let bulk = linear_bulk();
        let t = tail();
        let u = 0.97;
        let mapped = map_uniform_to_physical(&[u], &bulk, &t, 0.1).unwrap()[0];
        let direct = t.inverse(u, 0.1).unwrap();
        assert!((mapped - direct).abs() < 1e-12);
    }
}
