//! Bulk (non-extreme) marginal models.
//!
//! The bulk of a variable is described either nonparametrically, by a raw
//! reference sample used for empirical-quantile lookup, or parametrically,
//! by one of a fixed enumeration of distribution families. Family dispatch
//! is by enumerated tag; name lookup happens once at the boundary via
//! [`MarginFamily::from_name`].

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Gamma};

use crate::error::EstimationError;
use crate::margins::quantile_map::empirical_quantile;
use crate::math;

/// Cap on the compound Poisson-Gamma series length for the Tweedie CDF.
const TWEEDIE_MAX_TERMS: usize = 10_000;

/// Variance power used when fitting a Tweedie margin by moments.
const TWEEDIE_FIT_POWER: f64 = 1.5;

/// Recognized bulk-marginal distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginFamily {
    /// Exponential with rate parameter.
    Exponential,
    /// Gamma with shape and rate.
    Gamma,
    /// Normal with mean and standard deviation.
    Gaussian,
    /// Inverse Gaussian (Wald) with mean and shape.
    InverseGaussian,
    /// Logistic with location and scale.
    Logistic,
    /// Log-normal with log-scale location and scale.
    LogNormal,
    /// Tweedie compound Poisson-Gamma, variance power in (1, 2).
    Tweedie,
    /// Weibull with shape and scale.
    Weibull,
    /// Birnbaum-Saunders (fatigue life) with scale and shape.
    BirnbaumSaunders,
}

impl MarginFamily {
    /// Resolves a family from its name (case-insensitive, common aliases).
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::UnsupportedFamily`] for names outside the
    /// enumeration.
    pub fn from_name(name: &str) -> Result<Self, EstimationError> {
        match name.to_ascii_lowercase().as_str() {
            "exponential" | "exp" => Ok(Self::Exponential),
            "gamma" => Ok(Self::Gamma),
            "gaussian" | "normal" => Ok(Self::Gaussian),
            "inverse_gaussian" | "inverse-gaussian" | "inversegaussian" => {
                Ok(Self::InverseGaussian)
            }
            "logistic" => Ok(Self::Logistic),
            "log_normal" | "log-normal" | "lognormal" => Ok(Self::LogNormal),
            "tweedie" => Ok(Self::Tweedie),
            "weibull" => Ok(Self::Weibull),
            "birnbaum_saunders" | "birnbaum-saunders" | "birnbaumsaunders" => {
                Ok(Self::BirnbaumSaunders)
            }
            other => Err(EstimationError::UnsupportedFamily {
                name: other.to_string(),
            }),
        }
    }

    /// Canonical name of the family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exponential => "exponential",
            Self::Gamma => "gamma",
            Self::Gaussian => "gaussian",
            Self::InverseGaussian => "inverse_gaussian",
            Self::Logistic => "logistic",
            Self::LogNormal => "log_normal",
            Self::Tweedie => "tweedie",
            Self::Weibull => "weibull",
            Self::BirnbaumSaunders => "birnbaum_saunders",
        }
    }

    /// Fits this family to a sample.
    ///
    /// Estimators are closed-form MLE where one exists, method of moments
    /// otherwise; the Weibull shape solves its likelihood equation by
    /// Newton iteration, and the Tweedie variance power is fixed at 1.5.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InsufficientData`] with fewer than two finite
    /// observations; [`EstimationError::InvalidConfig`] when the data lie
    /// outside the family's support or are degenerate (zero spread).
    pub fn fit(&self, sample: &[f64]) -> Result<FittedMargin, EstimationError> {
        let values = clean(sample)?;
        match self {
            Self::Exponential => fit_exponential(&values),
            Self::Gamma => fit_gamma(&values),
            Self::Gaussian => fit_gaussian(&values),
            Self::InverseGaussian => fit_inverse_gaussian(&values),
            Self::Logistic => fit_logistic(&values),
            Self::LogNormal => fit_log_normal(&values),
            Self::Tweedie => fit_tweedie(&values),
            Self::Weibull => fit_weibull(&values),
            Self::BirnbaumSaunders => fit_birnbaum_saunders(&values),
        }
    }
}

/// A fitted parametric bulk margin with typed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FittedMargin {
    /// Exponential quantiles `-ln(1 - u) / rate`.
    Exponential {
        /// Rate parameter (> 0).
        rate: f64,
    },
    /// Gamma margin.
    Gamma {
        /// Shape parameter (> 0).
        shape: f64,
        /// Rate parameter (> 0).
        rate: f64,
    },
    /// Normal margin.
    Gaussian {
        /// Mean.
        mean: f64,
        /// Standard deviation (> 0).
        std_dev: f64,
    },
    /// Inverse Gaussian margin.
    InverseGaussian {
        /// Mean (> 0).
        mean: f64,
        /// Shape parameter (> 0).
        shape: f64,
    },
    /// Logistic margin.
    Logistic {
        /// Location.
        location: f64,
        /// Scale (> 0).
        scale: f64,
    },
    /// Log-normal margin, parameters on the log scale.
    LogNormal {
        /// Mean of the logs.
        location: f64,
        /// Standard deviation of the logs (> 0).
        scale: f64,
    },
    /// Tweedie compound Poisson-Gamma margin.
    Tweedie {
        /// Mean (> 0).
        mean: f64,
        /// Dispersion (> 0).
        dispersion: f64,
        /// Variance power, strictly between 1 and 2.
        power: f64,
    },
    /// Weibull margin.
    Weibull {
        /// Shape parameter (> 0).
        shape: f64,
        /// Scale parameter (> 0).
        scale: f64,
    },
    /// Birnbaum-Saunders margin.
    BirnbaumSaunders {
        /// Scale parameter, equal to the median (> 0).
        scale: f64,
        /// Shape parameter (> 0).
        shape: f64,
    },
}

impl FittedMargin {
    /// The family tag of this fitted margin.
    pub fn family(&self) -> MarginFamily {
        match self {
            Self::Exponential { .. } => MarginFamily::Exponential,
            Self::Gamma { .. } => MarginFamily::Gamma,
            Self::Gaussian { .. } => MarginFamily::Gaussian,
            Self::InverseGaussian { .. } => MarginFamily::InverseGaussian,
            Self::Logistic { .. } => MarginFamily::Logistic,
            Self::LogNormal { .. } => MarginFamily::LogNormal,
            Self::Tweedie { .. } => MarginFamily::Tweedie,
            Self::Weibull { .. } => MarginFamily::Weibull,
            Self::BirnbaumSaunders { .. } => MarginFamily::BirnbaumSaunders,
        }
    }

    /// Quantile function of the fitted margin at probability `u`.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidConfig`] when the stored parameters
    /// are outside the family's domain.
    ///
    /// # Panics
    ///
    /// Panics when `u` lies outside the open interval (0, 1).
    pub fn quantile(&self, u: f64) -> Result<f64, EstimationError> {
        assert!(
            u > 0.0 && u < 1.0,
            "quantile probability must lie in (0, 1), got {}",
            u
        );
        match *self {
            Self::Exponential { rate } => {
                require_positive(rate, "exponential rate")?;
                Ok(-(1.0 - u).ln() / rate)
            }
            Self::Gamma { shape, rate } => {
                let dist = Gamma::new(shape, rate).map_err(|e| EstimationError::InvalidConfig {
                    reason: format!("gamma parameters: {}", e),
                })?;
                Ok(dist.inverse_cdf(u))
            }
            Self::Gaussian { mean, std_dev } => {
                require_positive(std_dev, "gaussian standard deviation")?;
                Ok(mean + std_dev * math::normal_quantile(u))
            }
            Self::InverseGaussian { mean, shape } => {
                require_positive(mean, "inverse gaussian mean")?;
                require_positive(shape, "inverse gaussian shape")?;
                Ok(invert_cdf(u, mean, |x| inverse_gaussian_cdf(x, mean, shape)))
            }
            Self::Logistic { location, scale } => {
                require_positive(scale, "logistic scale")?;
                Ok(location + scale * (u / (1.0 - u)).ln())
            }
            Self::LogNormal { location, scale } => {
                require_positive(scale, "log-normal scale")?;
                Ok((location + scale * math::normal_quantile(u)).exp())
            }
            Self::Tweedie {
                mean,
                dispersion,
                power,
            } => tweedie_quantile(u, mean, dispersion, power),
            Self::Weibull { shape, scale } => {
                require_positive(shape, "weibull shape")?;
                require_positive(scale, "weibull scale")?;
                Ok(scale * (-(1.0 - u).ln()).powf(1.0 / shape))
            }
            Self::BirnbaumSaunders { scale, shape } => {
                require_positive(scale, "birnbaum-saunders scale")?;
                require_positive(shape, "birnbaum-saunders shape")?;
                let half = 0.5 * shape * math::normal_quantile(u);
                Ok(scale * (half + (half * half + 1.0).sqrt()).powi(2))
            }
        }
    }
}

/// A variable's bulk marginal: raw reference sample or fitted family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BulkMargin {
    /// Raw observations for empirical-quantile lookup (NaN = missing).
    Empirical(Vec<f64>),
    /// Fitted parametric family.
    Parametric(FittedMargin),
}

impl BulkMargin {
    /// Quantile of the bulk margin at probability `u`.
    ///
    /// # Errors
    ///
    /// Propagates [`EstimationError::InsufficientData`] from the empirical
    /// branch and [`EstimationError::InvalidConfig`] from the parametric
    /// one.
    pub fn quantile(&self, u: f64) -> Result<f64, EstimationError> {
        match self {
            BulkMargin::Empirical(sample) => empirical_quantile(sample, u),
            BulkMargin::Parametric(margin) => margin.quantile(u),
        }
    }
}

fn require_positive(value: f64, what: &str) -> Result<(), EstimationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EstimationError::InvalidConfig {
            reason: format!("{} must be finite and > 0, got {}", what, value),
        })
    }
}

/// Finite observations only; at least two required.
fn clean(sample: &[f64]) -> Result<Vec<f64>, EstimationError> {
    let values: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        return Err(EstimationError::InsufficientData {
            context: "marginal fit",
            needed: 2,
            got: values.len(),
        });
    }
    Ok(values)
}

fn require_strictly_positive_data(values: &[f64], family: &str) -> Result<(), EstimationError> {
    if values.iter().any(|&v| v <= 0.0) {
        return Err(EstimationError::InvalidConfig {
            reason: format!("{} fit requires strictly positive observations", family),
        });
    }
    Ok(())
}

/// Sample mean and unbiased variance.
fn mean_and_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

fn fit_exponential(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    let (mean, _) = mean_and_var(values);
    if mean <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "exponential fit requires a positive sample mean".to_string(),
        });
    }
    Ok(FittedMargin::Exponential { rate: 1.0 / mean })
}

fn fit_gamma(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    require_strictly_positive_data(values, "gamma")?;
    let (mean, var) = mean_and_var(values);
    if var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "gamma fit requires nonzero sample variance".to_string(),
        });
    }
    Ok(FittedMargin::Gamma {
        shape: mean * mean / var,
        rate: mean / var,
    })
}

fn fit_gaussian(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    let (mean, var) = mean_and_var(values);
    if var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "gaussian fit requires nonzero sample variance".to_string(),
        });
    }
    Ok(FittedMargin::Gaussian {
        mean,
        std_dev: var.sqrt(),
    })
}

fn fit_inverse_gaussian(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    require_strictly_positive_data(values, "inverse gaussian")?;
    let (mean, _) = mean_and_var(values);
    let n = values.len() as f64;
    let denom: f64 = values.iter().map(|&v| 1.0 / v - 1.0 / mean).sum();
    if denom <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "inverse gaussian fit requires a sample with nonzero spread".to_string(),
        });
    }
    Ok(FittedMargin::InverseGaussian {
        mean,
        shape: n / denom,
    })
}

fn fit_logistic(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    let (mean, var) = mean_and_var(values);
    if var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "logistic fit requires nonzero sample variance".to_string(),
        });
    }
    Ok(FittedMargin::Logistic {
        location: mean,
        scale: var.sqrt() * 3.0f64.sqrt() / std::f64::consts::PI,
    })
}

fn fit_log_normal(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    require_strictly_positive_data(values, "log-normal")?;
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let (location, var) = mean_and_var(&logs);
    if var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "log-normal fit requires nonzero sample variance".to_string(),
        });
    }
    Ok(FittedMargin::LogNormal {
        location,
        scale: var.sqrt(),
    })
}

fn fit_tweedie(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    if values.iter().any(|&v| v < 0.0) {
        return Err(EstimationError::InvalidConfig {
            reason: "tweedie fit requires nonnegative observations".to_string(),
        });
    }
    let (mean, var) = mean_and_var(values);
    if mean <= 0.0 || var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "tweedie fit requires positive sample mean and variance".to_string(),
        });
    }
    // Variance power fixed; profile estimation of the power belongs to the
    // external fitting step.
    Ok(FittedMargin::Tweedie {
        mean,
        dispersion: var / mean.powf(TWEEDIE_FIT_POWER),
        power: TWEEDIE_FIT_POWER,
    })
}

fn fit_weibull(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    require_strictly_positive_data(values, "weibull")?;
    let n = values.len() as f64;
    let (mean, var) = mean_and_var(values);
    if var <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "weibull fit requires nonzero sample variance".to_string(),
        });
    }
    let mean_log = values.iter().map(|v| v.ln()).sum::<f64>() / n;

    // Newton iteration on the profile likelihood equation
    //   sum(x^k ln x)/sum(x^k) - 1/k - mean(ln x) = 0,
    // started from the coefficient-of-variation heuristic.
    let cv = var.sqrt() / mean;
    let mut k = (1.0 / cv).clamp(0.05, 50.0);
    for _ in 0..100 {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        for &x in values {
            let xk = x.powf(k);
            let lx = x.ln();
            s0 += xk;
            s1 += xk * lx;
            s2 += xk * lx * lx;
        }
        let g = s1 / s0 - 1.0 / k - mean_log;
        let dg = (s2 * s0 - s1 * s1) / (s0 * s0) + 1.0 / (k * k);
        let step = g / dg;
        k = (k - step).clamp(1.0e-3, 1.0e3);
        if step.abs() < 1.0e-10 {
            break;
        }
    }
    let scale = (values.iter().map(|&x| x.powf(k)).sum::<f64>() / n).powf(1.0 / k);
    Ok(FittedMargin::Weibull { shape: k, scale })
}

fn fit_birnbaum_saunders(values: &[f64]) -> Result<FittedMargin, EstimationError> {
    require_strictly_positive_data(values, "birnbaum-saunders")?;
    let n = values.len() as f64;
    let arithmetic = values.iter().sum::<f64>() / n;
    let harmonic = n / values.iter().map(|&v| 1.0 / v).sum::<f64>();
    // Modified moment estimators; arithmetic >= harmonic with equality only
    // for a constant sample.
    let inner = 2.0 * ((arithmetic / harmonic).sqrt() - 1.0);
    if inner <= 0.0 {
        return Err(EstimationError::InvalidConfig {
            reason: "birnbaum-saunders fit requires a sample with nonzero spread".to_string(),
        });
    }
    Ok(FittedMargin::BirnbaumSaunders {
        scale: (arithmetic * harmonic).sqrt(),
        shape: inner.sqrt(),
    })
}

/// Inverse Gaussian CDF via its closed form in normal CDFs.
fn inverse_gaussian_cdf(x: f64, mean: f64, shape: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let s = (shape / x).sqrt();
    let term1 = math::normal_cdf(s * (x / mean - 1.0));
    let tail = math::normal_cdf(-s * (x / mean + 1.0));
    // exp(2*shape/mean) alone can overflow; combine in log space.
    let term2 = if tail > 0.0 {
        (2.0 * shape / mean + tail.ln()).exp()
    } else {
        0.0
    };
    (term1 + term2).min(1.0)
}

/// Tweedie CDF for variance power in (1, 2), as a compound Poisson-Gamma
/// mixture with a point mass at zero.
fn tweedie_cdf(x: f64, mean: f64, dispersion: f64, power: f64) -> f64 {
    let lambda = mean.powf(2.0 - power) / (dispersion * (2.0 - power));
    let alpha = (2.0 - power) / (power - 1.0);
    let gamma_scale = dispersion * (power - 1.0) * mean.powf(power - 1.0);

    let p0 = (-lambda).exp();
    if x <= 0.0 {
        return p0;
    }

    let mut acc = p0;
    // Poisson weights in log space so large event rates do not underflow.
    let mut log_w = -lambda;
    for n in 1..=TWEEDIE_MAX_TERMS {
        log_w += lambda.ln() - (n as f64).ln();
        if log_w < -36.0 && n as f64 > lambda {
            break;
        }
        let w = log_w.exp();
        if w > 0.0 {
            if let Ok(gamma) = Gamma::new(n as f64 * alpha, 1.0 / gamma_scale) {
                acc += w * gamma.cdf(x);
            }
        }
    }
    acc.min(1.0)
}

fn tweedie_quantile(
    u: f64,
    mean: f64,
    dispersion: f64,
    power: f64,
) -> Result<f64, EstimationError> {
    require_positive(mean, "tweedie mean")?;
    require_positive(dispersion, "tweedie dispersion")?;
    if !(power > 1.0 && power < 2.0) {
        return Err(EstimationError::InvalidConfig {
            reason: format!("tweedie variance power must lie in (1, 2), got {}", power),
        });
    }
    let lambda = mean.powf(2.0 - power) / (dispersion * (2.0 - power));
    if u <= (-lambda).exp() {
        // Inside the point mass at zero.
        return Ok(0.0);
    }
    Ok(invert_cdf(u, mean, |x| {
        tweedie_cdf(x, mean, dispersion, power)
    }))
}

/// Monotone-CDF inversion: doubling bracket search from `hi`, then bisection.
fn invert_cdf(u: f64, mut hi: f64, cdf: impl Fn(f64) -> f64) -> f64 {
    let mut lo = 0.0;
    let mut expand = 0;
    while cdf(hi) < u && expand < 400 {
        lo = hi;
        hi *= 2.0;
        expand += 1;
    }
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if cdf(mid) < u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
