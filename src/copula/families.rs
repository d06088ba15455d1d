//! Bivariate copula families and a multivariate Gaussian copula.
//!
//! CDF formulas follow the standard parameterizations; sampling uses the
//! conditional-inversion construction (closed form where one exists,
//! bisection on the conditional CDF for the Gumbel family).

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};

use crate::copula::{simulate_pairs, BivariateCopula, Copula};
use crate::error::EstimationError;
use crate::math;

/// Keeps simulated uniforms strictly inside (0, 1) so downstream quantile
/// transforms stay finite.
const UNIFORM_CLAMP: f64 = 1.0e-12;

fn clamp_unit(u: f64) -> f64 {
    u.clamp(UNIFORM_CLAMP, 1.0 - UNIFORM_CLAMP)
}

/// Independence copula: `C(u, v) = u * v`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndependenceCopula;

impl Copula for IndependenceCopula {
    fn dim(&self) -> usize {
        2
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        Ok(simulate_pairs(self, count, rng))
    }
}

impl BivariateCopula for IndependenceCopula {
    fn cdf(&self, u: f64, v: f64) -> f64 {
        u * v
    }

    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64) {
        (clamp_unit(rng.random::<f64>()), clamp_unit(rng.random::<f64>()))
    }
}

/// Gaussian copula: `C(u, v) = Phi2(Phi^-1(u), Phi^-1(v); rho)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianCopula {
    rho: f64,
}

impl GaussianCopula {
    /// Creates a Gaussian copula with correlation `rho`.
    ///
    /// # Panics
    ///
    /// Panics when `rho` lies outside `(-1, 1)`.
    pub fn new(rho: f64) -> Self {
        assert!(
            rho > -1.0 && rho < 1.0,
            "correlation must lie in (-1, 1), got {}",
            rho
        );
        Self { rho }
    }

    /// The correlation parameter.
    pub fn rho(&self) -> f64 {
        self.rho
    }
}

impl Copula for GaussianCopula {
    fn dim(&self) -> usize {
        2
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        Ok(simulate_pairs(self, count, rng))
    }
}

impl BivariateCopula for GaussianCopula {
    fn cdf(&self, u: f64, v: f64) -> f64 {
        math::bivariate_normal_cdf(
            math::normal_quantile(u),
            math::normal_quantile(v),
            self.rho,
        )
    }

    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64) {
        let z1: f64 = StandardNormal.sample(rng);
        let eps: f64 = StandardNormal.sample(rng);
        let z2 = self.rho * z1 + (1.0 - self.rho * self.rho).sqrt() * eps;
        (
            clamp_unit(math::normal_cdf(z1)),
            clamp_unit(math::normal_cdf(z2)),
        )
    }
}

/// Clayton copula: `C(u, v) = (u^-t + v^-t - 1)^(-1/t)` for `t > 0`.
///
/// Models lower-tail dependence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaytonCopula {
    theta: f64,
}

impl ClaytonCopula {
    /// Creates a Clayton copula with parameter `theta > 0`.
    ///
    /// # Panics
    ///
    /// Panics when `theta` is not a positive finite number.
    pub fn new(theta: f64) -> Self {
        assert!(
            theta.is_finite() && theta > 0.0,
            "Clayton parameter must be > 0, got {}",
            theta
        );
        Self { theta }
    }

    /// The dependence parameter.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl Copula for ClaytonCopula {
    fn dim(&self) -> usize {
        2
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        Ok(simulate_pairs(self, count, rng))
    }
}

impl BivariateCopula for ClaytonCopula {
    fn cdf(&self, u: f64, v: f64) -> f64 {
        let u = clamp_unit(u);
        let v = clamp_unit(v);
        (u.powf(-self.theta) + v.powf(-self.theta) - 1.0).powf(-1.0 / self.theta)
    }

    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64) {
        let u = clamp_unit(rng.random::<f64>());
        let t = clamp_unit(rng.random::<f64>());
        // Closed-form inverse of the conditional CDF C(v | u).
        let v = ((t.powf(-self.theta / (1.0 + self.theta)) - 1.0) * u.powf(-self.theta) + 1.0)
            .powf(-1.0 / self.theta);
        (u, clamp_unit(v))
    }
}

/// Gumbel copula:
/// `C(u, v) = exp(-((-ln u)^t + (-ln v)^t)^(1/t))` for `t >= 1`.
///
/// Models upper-tail dependence; `t = 1` is independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GumbelCopula {
    theta: f64,
}

impl GumbelCopula {
    /// Creates a Gumbel copula with parameter `theta >= 1`.
    ///
    /// # Panics
    ///
    /// Panics when `theta` is not finite or below 1.
    pub fn new(theta: f64) -> Self {
        assert!(
            theta.is_finite() && theta >= 1.0,
            "Gumbel parameter must be >= 1, got {}",
            theta
        );
        Self { theta }
    }

    /// The dependence parameter.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Conditional CDF `C(v | u) = dC/du`, used for inversion sampling.
    fn conditional(&self, v: f64, u: f64) -> f64 {
        let lu = -u.ln();
        let lv = -v.ln();
        let s = lu.powf(self.theta) + lv.powf(self.theta);
        let c = (-s.powf(1.0 / self.theta)).exp();
        c * s.powf(1.0 / self.theta - 1.0) * lu.powf(self.theta - 1.0) / u
    }
}

impl Copula for GumbelCopula {
    fn dim(&self) -> usize {
        2
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        Ok(simulate_pairs(self, count, rng))
    }
}

impl BivariateCopula for GumbelCopula {
    fn cdf(&self, u: f64, v: f64) -> f64 {
        let u = clamp_unit(u);
        let v = clamp_unit(v);
        let s = (-u.ln()).powf(self.theta) + (-v.ln()).powf(self.theta);
        (-s.powf(1.0 / self.theta)).exp()
    }

    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64) {
        let u = clamp_unit(rng.random::<f64>());
        let t = clamp_unit(rng.random::<f64>());
        // No closed-form conditional inverse; bisect C(v | u) = t, which is
        // monotone in v.
        let mut lo = UNIFORM_CLAMP;
        let mut hi = 1.0 - UNIFORM_CLAMP;
        for _ in 0..60 {
            let mid = 0.5 * (lo + hi);
            if self.conditional(mid, u) < t {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (u, 0.5 * (lo + hi))
    }
}

/// Frank copula for `theta != 0`; negative values give negative dependence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrankCopula {
    theta: f64,
}

impl FrankCopula {
    /// Creates a Frank copula with nonzero parameter `theta`.
    ///
    /// # Panics
    ///
    /// Panics when `theta` is zero or not finite.
    pub fn new(theta: f64) -> Self {
        assert!(
            theta.is_finite() && theta != 0.0,
            "Frank parameter must be finite and nonzero, got {}",
            theta
        );
        Self { theta }
    }

    /// The dependence parameter.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl Copula for FrankCopula {
    fn dim(&self) -> usize {
        2
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        Ok(simulate_pairs(self, count, rng))
    }
}

impl BivariateCopula for FrankCopula {
    fn cdf(&self, u: f64, v: f64) -> f64 {
        let t = self.theta;
        let num = ((-t * u).exp_m1()) * ((-t * v).exp_m1());
        -(1.0 + num / (-t).exp_m1()).ln() / t
    }

    fn sample_pair(&self, rng: &mut dyn RngCore) -> (f64, f64) {
        let t = self.theta;
        let u = clamp_unit(rng.random::<f64>());
        let w = clamp_unit(rng.random::<f64>());
        // Closed-form inverse of the conditional CDF.
        let a = (-t * u).exp();
        let v = -(1.0 + w * (-t).exp_m1() / (w + a * (1.0 - w))).ln() / t;
        (u, clamp_unit(v))
    }
}

/// Gaussian copula over `n >= 2` variables, simulated through the Cholesky
/// factor of its correlation matrix.
///
/// Used by the joint simulator when more than two variables are coupled;
/// the bivariate surface machinery keeps using [`GaussianCopula`].
#[derive(Debug, Clone)]
pub struct MultivariateGaussianCopula {
    factor: Cholesky<f64, nalgebra::Dyn>,
    dim: usize,
}

impl MultivariateGaussianCopula {
    /// Builds the copula from a correlation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidConfig`] for a non-square matrix,
    /// a unit-diagonal violation, or a matrix that is not positive
    /// definite.
    pub fn new(correlation: DMatrix<f64>) -> Result<Self, EstimationError> {
        let dim = correlation.nrows();
        if correlation.ncols() != dim || dim < 2 {
            return Err(EstimationError::InvalidConfig {
                reason: format!(
                    "correlation matrix must be square with dimension >= 2, got {}x{}",
                    correlation.nrows(),
                    correlation.ncols()
                ),
            });
        }
        for i in 0..dim {
            if (correlation[(i, i)] - 1.0).abs() > 1.0e-12 {
                return Err(EstimationError::InvalidConfig {
                    reason: format!("correlation diagonal entry {} is not 1", i),
                });
            }
        }
        let factor = Cholesky::new(correlation).ok_or_else(|| EstimationError::InvalidConfig {
            reason: "correlation matrix is not positive definite".to_string(),
        })?;
        Ok(Self { factor, dim })
    }
}

impl Copula for MultivariateGaussianCopula {
    fn dim(&self) -> usize {
        self.dim
    }

    fn simulate(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>, EstimationError> {
        let l = self.factor.l();
        let mut out = DMatrix::zeros(count, self.dim);
        let mut z = DVector::zeros(self.dim);
        for row in 0..count {
            for k in 0..self.dim {
                z[k] = StandardNormal.sample(rng);
            }
            let correlated = &l * &z;
            for k in 0..self.dim {
                out[(row, k)] = clamp_unit(math::normal_cdf(correlated[k]));
            }
        }
        Ok(out)
    }
}
