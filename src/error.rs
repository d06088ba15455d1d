//! Typed failures for simulation and design-event estimation.
//!
//! Every fallible operation reports one of these variants to its immediate
//! caller; a failing call aborts its whole result. There is no retry logic:
//! these are deterministic numerical computations, and a failure indicates
//! invalid input or an unrepresentable request.

/// Error type for all fallible operations in this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Too few usable observations for an empirical quantile or a marginal fit.
    InsufficientData {
        /// What was being estimated.
        context: &'static str,
        /// Minimum number of non-missing observations required.
        needed: usize,
        /// Number actually available.
        got: usize,
    },
    /// Invalid simulation request or a copula that cannot simulate.
    Sampling {
        /// Why the draw could not be produced.
        reason: String,
    },
    /// The requested return period lies outside the achievable range of the
    /// return-level grid, so the contour tracer found no level set.
    NoIsoline {
        /// Requested return period in years.
        return_period: f64,
        /// Smallest return level on the evaluated grid.
        min_level: f64,
        /// Largest return level on the evaluated grid.
        max_level: f64,
    },
    /// Bulk-marginal family name outside the recognized enumeration.
    UnsupportedFamily {
        /// The name that failed to resolve.
        name: String,
    },
    /// GPD shape parameter produced a non-finite inverse.
    DegenerateShape {
        /// The offending shape value.
        shape: f64,
    },
    /// Two inputs that must be aligned have different lengths.
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
        /// Which input was mis-sized.
        field: String,
    },
    /// A configuration value or model parameter is outside its domain.
    InvalidConfig {
        /// Human-readable description of the violation.
        reason: String,
    },
}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationError::InsufficientData {
                context,
                needed,
                got,
            } => {
                write!(
                    f,
                    "insufficient data for {}: need at least {} non-missing observations, got {}",
                    context, needed, got
                )
            }
            EstimationError::Sampling { reason } => write!(f, "sampling failed: {}", reason),
            EstimationError::NoIsoline {
                return_period,
                min_level,
                max_level,
            } => {
                write!(
                    f,
                    "no isoline: return period {} years outside achievable range [{:.4}, {:.4}]",
                    return_period, min_level, max_level
                )
            }
            EstimationError::UnsupportedFamily { name } => {
                write!(f, "unsupported marginal family: {:?}", name)
            }
            EstimationError::DegenerateShape { shape } => {
                write!(f, "GPD shape {} produced a non-finite quantile", shape)
            }
            EstimationError::LengthMismatch {
                expected,
                got,
                field,
            } => {
                write!(
                    f,
                    "length mismatch for {}: expected {}, got {}",
                    field, expected, got
                )
            }
            EstimationError::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for EstimationError {}
