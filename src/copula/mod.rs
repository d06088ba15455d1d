//! Dependence models on the uniform scale.
//!
//! A copula couples uniform marginals into a joint distribution. The crate
//! consumes copulas that were fitted externally; here they only need to
//! simulate dependent uniforms and (for the bivariate ones) evaluate their
//! joint CDF.

mod families;
mod sampling;

pub use families::{
    ClaytonCopula, FrankCopula, GaussianCopula, GumbelCopula, IndependenceCopula,
    MultivariateGaussianCopula,
};
pub use sampling::{make_rng, simulate_uniforms};

use nalgebra::DMatrix;
use rand::RngCore;

use crate::error::EstimationError;

/// A fitted dependence model over `dim` uniform marginals.
///
/// Implementations must be thread-safe: grid evaluation fans out across
/// rows with data parallelism.
pub trait Copula: Send + Sync {
    /// Number of variables coupled by this copula.
    fn dim(&self) -> usize;

    /// Draws `count` dependent uniform vectors, one per row.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::Sampling`] when the model cannot
    /// simulate (e.g. a degenerate correlation matrix).
    fn simulate(&self, count: usize, rng: &mut dyn RngCore)
        -> Result<DMatrix<f64>, EstimationError>;
}

/// A bivariate copula with an evaluable joint CDF.
pub trait BivariateCopula: Copula {
    /// Joint CDF `C(u, v)` on the unit square.
    fn cdf(&self, u: f64, v: f64) -> f64;

    /// Draws one dependent uniform pair.
    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64);
}

/// Fills a `count x 2` matrix from repeated pair draws, row by row so a
/// seeded stream reproduces bit-identically.
pub(crate) fn simulate_pairs<C: BivariateCopula + ?Sized>(
    copula: &C,
    count: usize,
    rng: &mut dyn RngCore,
) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(count, 2);
    for row in 0..count {
        let (u, v) = copula.sample_pair(rng);
        out[(row, 0)] = u;
        out[(row, 1)] = v;
    }
    out
}
