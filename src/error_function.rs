// src/error_function.rs - Closed-form error function and its inverse

use std::f64::consts::{PI, SQRT_2};

/// Shape constant of the Winitzki approximation
const WINITZKI_A: f64 = 0.147;

/// Approximate error function.
///
/// erf(x) ≈ sgn(x) · sqrt(1 - exp(-x² (4/π + a x²) / (1 + a x²))), absolute
/// error below 1.3e-4.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }

    let x2 = x * x;
    let ratio = (4.0 / PI + WINITZKI_A * x2) / (1.0 + WINITZKI_A * x2);
    let value = (1.0 - (-x2 * ratio).exp()).sqrt();
    value.copysign(x)
}

/// Inverse of [`erf`], solved in closed form from the same approximation,
/// so `erf_inv(erf(x))` recovers `x` up to rounding.
///
/// Returns ±∞ at ±1 and NaN outside [-1, 1].
pub fn erf_inv(y: f64) -> f64 {
    if y.is_nan() || y.abs() > 1.0 {
        return f64::NAN;
    }
    if y.abs() == 1.0 {
        return f64::INFINITY.copysign(y);
    }
    if y == 0.0 {
        return 0.0;
    }

    let ln = (1.0 - y * y).ln();
    let t = 2.0 / (PI * WINITZKI_A) + ln / 2.0;
    let x2 = (t * t - ln / WINITZKI_A).sqrt() - t;
    x2.sqrt().copysign(y)
}

/// Quantile of the standard normal distribution
pub fn inverse_normal_cdf(p: f64) -> f64 {
    SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Two-sided z-value for a significance level given in percent
/// (5.0 gives roughly 1.96)
pub fn z_value(alpha_percent: f64) -> f64 {
    inverse_normal_cdf(1.0 - alpha_percent / 200.0)
}
