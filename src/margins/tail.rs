//! Generalized Pareto tail model for values above a fixed threshold.

use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// Fitted GPD tail of one variable.
///
/// The parameters come from an external fitting step and are read-only here:
/// the threshold is never re-estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpdTail {
    /// Threshold above which the tail model applies (physical units).
    pub threshold: f64,
    /// GPD scale parameter, strictly positive.
    pub scale: f64,
    /// GPD shape parameter; 0 selects the exponential tail.
    pub shape: f64,
    /// Fraction of observations exceeding the threshold, in (0, 1].
    pub exceedance_rate: f64,
}

impl GpdTail {
    /// Checks the parameter domain.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidConfig`] when the scale is not a
    /// positive finite number, the shape is not finite, or the exceedance
    /// rate falls outside (0, 1].
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !self.threshold.is_finite() {
            return Err(EstimationError::InvalidConfig {
                reason: format!("GPD threshold must be finite, got {}", self.threshold),
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(EstimationError::InvalidConfig {
                reason: format!("GPD scale must be finite and > 0, got {}", self.scale),
            });
        }
        if !self.shape.is_finite() {
            return Err(EstimationError::InvalidConfig {
                reason: format!("GPD shape must be finite, got {}", self.shape),
            });
        }
        if !self.exceedance_rate.is_finite()
            || self.exceedance_rate <= 0.0
            || self.exceedance_rate > 1.0
        {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "GPD exceedance rate must lie in (0, 1], got {}",
                    self.exceedance_rate
                ),
            });
        }
        Ok(())
    }

    /// Inverse GPD transform of the uniform coordinate `u`.
    ///
    /// `rate` is the exceedance probability used for the tail: each
    /// variable's own rate when simulating from the full joint distribution,
    /// or 1 for already-conditioned samples.
    ///
    /// For shape `xi != 0`:
    /// `threshold + scale/xi * (((1 - u) / rate)^(-xi) - 1)`,
    /// degenerating to `threshold - scale * ln((1 - u) / rate)` at `xi == 0`.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::DegenerateShape`] when the transform
    /// produces a non-finite value.
    ///
    /// # Panics
    ///
    /// Panics when `u` lies outside `[0, 1)` or `rate` outside (0, 1];
    /// those are caller contract violations, not data conditions.
    pub fn inverse(&self, u: f64, rate: f64) -> Result<f64, EstimationError> {
        assert!(
            (0.0..1.0).contains(&u),
            "uniform coordinate must lie in [0, 1), got {}",
            u
        );
        assert!(
            rate > 0.0 && rate <= 1.0,
            "exceedance rate must lie in (0, 1], got {}",
            rate
        );

        let ratio = (1.0 - u) / rate;
        let x = if self.shape == 0.0 {
            // Limiting exponential form; the power form divides by xi.
            self.threshold - self.scale * ratio.ln()
        } else {
            self.threshold + self.scale / self.shape * (ratio.powf(-self.shape) - 1.0)
        };

        if x.is_finite() {
            Ok(x)
        } else {
            Err(EstimationError::DegenerateShape { shape: self.shape })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail(shape: f64) -> GpdTail {
        GpdTail {
            threshold: 10.0,
            scale: 2.0,
            shape,
            exceedance_rate: 0.1,
        }
    }

    #[test]
    fn exponential_form_at_zero_shape() {
        // threshold - scale * ln(1 - u) with rate 1
        let x = tail(0.0).inverse(0.99, 1.0).unwrap();
        let expected = 10.0 - 2.0 * (0.01f64).ln();
        assert!((x - expected).abs() < 1e-12);
    }

    #[test]
    fn tiny_shape_matches_exponential_limit() {
        let exact = tail(0.0).inverse(0.99, 1.0).unwrap();
        let near = tail(1.0e-8).inverse(0.99, 1.0).unwrap();
        assert!(
            (near - exact).abs() < 1e-5,
            "xi->0 limit: {} vs {}",
            near,
            exact
        );
    }

    #[test]
    fn positive_shape_heavier_than_exponential_in_far_tail() {
        let exp_tail = tail(0.0).inverse(0.9999, 1.0).unwrap();
        let frechet_tail = tail(0.3).inverse(0.9999, 1.0).unwrap();
        assert!(frechet_tail > exp_tail);
    }

    #[test]
    fn conditioned_rate_scales_quantile() {
        // With rate p, u = 1 - p maps exactly onto the threshold.
        let t = tail(0.2);
        let x = t.inverse(1.0 - t.exceedance_rate, t.exceedance_rate).unwrap();
        assert!((x - t.threshold).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let mut t = tail(0.1);
        t.scale = 0.0;
        assert!(t.validate().is_err());

        let mut t = tail(0.1);
        t.exceedance_rate = 1.5;
        assert!(t.validate().is_err());

        assert!(tail(0.1).validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "uniform coordinate")]
    fn out_of_range_uniform_panics() {
        let _ = tail(0.1).inverse(1.2, 1.0);
    }
}
