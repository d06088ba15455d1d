//! Bivariate Gaussian kernel density estimation.
//!
//! The bandwidth matrix uses the normal-reference plug-in rule
//! `H = n^(-1/3) * Sigma_hat` (the optimal `n^(-2/(d+4))` rate at `d = 2`
//! applied to the sample covariance). The kernel quadratic form is solved
//! through a Cholesky factorization of `H`; when the sample covariance is
//! not positive definite a small ridge is added to the diagonal.

use nalgebra::Cholesky;
use rayon::prelude::*;

use crate::error::EstimationError;
use crate::types::{Matrix2, Point, Vector2};

/// Scale of the diagonal ridge applied when the bandwidth matrix is
/// numerically singular.
const RIDGE_FRACTION: f64 = 1.0e-9;

/// Number of escalating ridge attempts before giving up.
const RIDGE_ATTEMPTS: usize = 6;

/// A fitted bivariate kernel density estimate.
#[derive(Debug, Clone)]
pub struct KernelDensity2d {
    sample: Vec<Point>,
    factor: Cholesky<f64, nalgebra::Const<2>>,
    norm: f64,
}

impl KernelDensity2d {
    /// Fits the estimator to a sample.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InsufficientData`] with fewer than two finite
    /// points, or when the sample is so degenerate that no ridged
    /// bandwidth is positive definite.
    pub fn fit(sample: &[Point]) -> Result<Self, EstimationError> {
        let points: Vec<Point> = sample
            .iter()
            .copied()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();
        let n = points.len();
        if n < 2 {
            return Err(EstimationError::InsufficientData {
                context: "kernel density sample",
                needed: 2,
                got: n,
            });
        }

        let mut bandwidth = plugin_bandwidth(&points);
        let mut ridge = RIDGE_FRACTION * bandwidth.trace().max(f64::MIN_POSITIVE);
        let mut factor = None;
        for attempt in 0..=RIDGE_ATTEMPTS {
            // A zero pivot can slip through the factorization with a zero
            // determinant, so both failure modes get the ridge.
            if let Some(candidate) = Cholesky::new(bandwidth) {
                let det = candidate.determinant();
                if det.is_finite() && det > 0.0 {
                    factor = Some(candidate);
                    break;
                }
            }
            if attempt < RIDGE_ATTEMPTS {
                bandwidth[(0, 0)] += ridge;
                bandwidth[(1, 1)] += ridge;
                ridge *= 10.0;
            }
        }
        let factor = factor.ok_or(EstimationError::InsufficientData {
            context: "kernel density sample with nonzero spread",
            needed: 2,
            got: n,
        })?;

        let norm = 1.0 / (n as f64 * 2.0 * std::f64::consts::PI * factor.determinant().sqrt());
        Ok(Self {
            sample: points,
            factor,
            norm,
        })
    }

    /// Number of sample points backing the estimate.
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    /// Whether the estimator holds no points (never true after `fit`).
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// Estimated density at one point.
    pub fn density(&self, at: Point) -> f64 {
        let mut acc = 0.0;
        for p in &self.sample {
            let d = Vector2::new(at.x - p.x, at.y - p.y);
            let solved = self.factor.solve(&d);
            let quad = d.dot(&solved);
            acc += (-0.5 * quad).exp();
        }
        self.norm * acc
    }

    /// Estimated density at many points, evaluated in parallel with
    /// order-preserving collection.
    pub fn densities(&self, points: &[Point]) -> Vec<f64> {
        points.par_iter().map(|&p| self.density(p)).collect()
    }
}

/// Normal-reference plug-in bandwidth `n^(-1/3) * Sigma_hat`.
fn plugin_bandwidth(points: &[Point]) -> Matrix2 {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let denom = n - 1.0;
    let scale = n.powf(-1.0 / 3.0);
    Matrix2::new(
        sxx / denom * scale,
        sxy / denom * scale,
        sxy / denom * scale,
        syy / denom * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn gaussian_cloud(n: usize, seed: u64) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let x: f64 = StandardNormal.sample(&mut rng);
                let y: f64 = StandardNormal.sample(&mut rng);
                Point::new(x, y)
            })
            .collect()
    }

    #[test]
    fn density_peaks_at_the_data_center() {
        let kde = KernelDensity2d::fit(&gaussian_cloud(800, 1)).unwrap();
        let center = kde.density(Point::new(0.0, 0.0));
        let far = kde.density(Point::new(4.0, 4.0));
        assert!(center > 10.0 * far, "center {} vs far {}", center, far);
    }

    #[test]
    fn density_approximates_the_standard_normal() {
        let kde = KernelDensity2d::fit(&gaussian_cloud(2000, 2)).unwrap();
        let at_origin = kde.density(Point::new(0.0, 0.0));
        let truth = 1.0 / (2.0 * std::f64::consts::PI);
        assert!(
            (at_origin - truth).abs() / truth < 0.25,
            "estimated {} vs true {}",
            at_origin,
            truth
        );
    }

    #[test]
    fn batch_matches_pointwise() {
        let kde = KernelDensity2d::fit(&gaussian_cloud(200, 3)).unwrap();
        let targets = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, -1.0),
            Point::new(-0.5, 0.25),
        ];
        let batch = kde.densities(&targets);
        for (point, batch_value) in targets.iter().zip(&batch) {
            assert_eq!(*batch_value, kde.density(*point));
        }
    }

    #[test]
    fn degenerate_sample_gets_a_ridge() {
        // Perfectly collinear points: covariance is singular, the ridge
        // must still produce a usable estimate.
        let points: Vec<Point> = (0..50).map(|i| Point::new(i as f64, i as f64)).collect();
        let kde = KernelDensity2d::fit(&points).unwrap();
        let on_line = kde.density(Point::new(25.0, 25.0));
        assert!(on_line.is_finite() && on_line > 0.0);
    }

    #[test]
    fn too_few_points_rejected() {
        assert!(matches!(
            KernelDensity2d::fit(&[Point::new(0.0, 0.0)]),
            Err(EstimationError::InsufficientData { .. })
        ));
    }
}
