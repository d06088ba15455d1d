//! Scalar normal-distribution helpers shared by the copula families and the
//! parametric marginals.

use std::f64::consts::PI;

/// Standard normal density.
pub fn normal_pdf(x: f64) -> f64 {
    (-(0.5) * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF.
///
/// Uses the Abramowitz & Stegun 7.1.26 rational approximation of `erf`,
/// accurate to ~1.5e-7 absolute.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t) * (-x * x).exp();
    sign * y
}

/// Inverse standard normal CDF (probit).
///
/// Acklam's rational approximation, relative error below 1.2e-9 on (0, 1).
/// Returns `-inf`/`+inf` at the endpoints.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

/// Bivariate standard normal CDF `P(X <= a, Y <= b)` with correlation `rho`.
///
/// Drezner (1978) 5-point Gauss quadrature with the usual sign reductions,
/// accurate to ~1e-6. `|rho|` within 1e-12 of 1 degenerates to the
/// comonotone/countermonotone bounds.
pub fn bivariate_normal_cdf(a: f64, b: f64, rho: f64) -> f64 {
    debug_assert!((-1.0..=1.0).contains(&rho), "correlation out of [-1, 1]");

    let phi_a = normal_cdf(a);
    let phi_b = normal_cdf(b);

    if rho >= 1.0 - 1.0e-12 {
        return phi_a.min(phi_b);
    }
    if rho <= -1.0 + 1.0e-12 {
        return (phi_a + phi_b - 1.0).max(0.0);
    }

    // Effectively univariate once either margin saturates.
    if 1.0 - phi_a.max(phi_b) < 1.0e-15 || phi_a.min(phi_b) < 1.0e-15 {
        return phi_a.min(phi_b);
    }

    if a <= 0.0 && b <= 0.0 && rho <= 0.0 {
        drezner_quadrature(a, b, rho)
    } else if a <= 0.0 && b >= 0.0 && rho >= 0.0 {
        phi_a - bivariate_normal_cdf(a, -b, -rho)
    } else if a >= 0.0 && b <= 0.0 && rho >= 0.0 {
        phi_b - bivariate_normal_cdf(-a, b, -rho)
    } else if a >= 0.0 && b >= 0.0 && rho <= 0.0 {
        phi_a + phi_b - 1.0 + bivariate_normal_cdf(-a, -b, rho)
    } else {
        // a*b*rho > 0: split on the line through the origin. The derived
        // correlations are clamped against floating-point drift past +-1.
        let denom = (a * a - 2.0 * rho * a * b + b * b).sqrt();
        let sgn_a = if a > 0.0 { 1.0 } else { -1.0 };
        let sgn_b = if b > 0.0 { 1.0 } else { -1.0 };
        let rho1 = ((rho * a - b) * sgn_a / denom).clamp(-1.0, 1.0);
        let rho2 = ((rho * b - a) * sgn_b / denom).clamp(-1.0, 1.0);
        let delta = (1.0 - sgn_a * sgn_b) / 4.0;
        bivariate_normal_cdf(a, 0.0, rho1) + bivariate_normal_cdf(b, 0.0, rho2) - delta
    }
}

/// Core quadrature, valid for `a <= 0`, `b <= 0`, `rho <= 0`.
fn drezner_quadrature(a: f64, b: f64, rho: f64) -> f64 {
    const X: [f64; 5] = [0.24840615, 0.39233107, 0.21141819, 0.03324666, 0.00082485334];
    const Y: [f64; 5] = [0.10024215, 0.48281397, 1.06094980, 1.77972940, 2.66976040];

    let one_minus_rho2 = 1.0 - rho * rho;
    let a1 = a / (2.0 * one_minus_rho2).sqrt();
    let b1 = b / (2.0 * one_minus_rho2).sqrt();

    let mut sum = 0.0;
    for i in 0..5 {
        for j in 0..5 {
            sum += X[i]
                * X[j]
                * (a1 * (2.0 * Y[i] - a1)
                    + b1 * (2.0 * Y[j] - b1)
                    + 2.0 * rho * (Y[i] - a1) * (Y[j] - b1))
                    .exp();
        }
    }
    one_minus_rho2.sqrt() / PI * sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_and_quantile_are_inverses() {
        for &p in &[0.001, 0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99, 0.999] {
            let z = normal_quantile(p);
            assert!(
                (normal_cdf(z) - p).abs() < 1e-6,
                "round trip failed at p={}",
                p
            );
        }
    }

    #[test]
    fn quantile_known_values() {
        assert!(normal_quantile(0.5).abs() < 1e-9);
        assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-5);
        assert!((normal_quantile(0.025) + 1.959964).abs() < 1e-5);
    }

    #[test]
    fn bivariate_independent_factorizes() {
        for &(a, b) in &[(0.0, 0.0), (-1.0, 0.5), (1.3, -0.7), (2.0, 2.0)] {
            let joint = bivariate_normal_cdf(a, b, 0.0);
            let product = normal_cdf(a) * normal_cdf(b);
            assert!(
                (joint - product).abs() < 1e-5,
                "rho=0 at ({}, {}): {} vs {}",
                a,
                b,
                joint,
                product
            );
        }
    }

    #[test]
    fn bivariate_origin_closed_form() {
        // Phi2(0, 0, rho) = 1/4 + asin(rho) / (2 pi)
        for &rho in &[-0.9f64, -0.5, 0.0, 0.3, 0.5, 0.9] {
            let expected = 0.25 + rho.asin() / (2.0 * PI);
            let got = bivariate_normal_cdf(0.0, 0.0, rho);
            assert!(
                (got - expected).abs() < 1e-5,
                "rho={}: {} vs {}",
                rho,
                got,
                expected
            );
        }
    }

    #[test]
    fn bivariate_perfect_dependence_bounds() {
        assert!((bivariate_normal_cdf(0.5, -0.2, 1.0) - normal_cdf(-0.2)).abs() < 1e-12);
        let lower = (normal_cdf(0.5) + normal_cdf(0.2) - 1.0).max(0.0);
        assert!((bivariate_normal_cdf(0.5, 0.2, -1.0) - lower).abs() < 1e-12);
    }
}
