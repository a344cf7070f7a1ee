//! Smoothing kernel for SPH interpolation
//!
//! 2D cubic-spline kernel with support radius equal to the smoothing radius
//! h and normalization 40 / (7 * pi * h^2). One continuous function pair
//! (value + radial gradient) serves every solver stage.

use std::f32::consts::PI;

use crate::math::{Real, Vector};

/// Normalization factor of the 2D cubic spline.
#[inline(always)]
pub fn normalization(h: Real) -> Real {
    40.0 / (7.0 * PI * h * h)
}

/// Kernel value W(r, h). Zero at and beyond the support radius h.
#[inline]
pub fn value(r: Real, h: Real) -> Real {
    let q = r / h;
    if q >= 1.0 {
        return 0.0;
    }
    let w = if q <= 0.5 {
        6.0 * (q * q * q - q * q) + 1.0
    } else {
        let t = 1.0 - q;
        2.0 * t * t * t
    };
    normalization(h) * w
}

/// Kernel gradient with respect to the first particle, evaluated at
/// `r_ij = p_i - p_j`. Radially consistent with [`value`]: the returned
/// vector is dW/dr along `r_ij / |r_ij|`, vanishing at the support
/// boundary and at zero separation (where the direction is undefined).
#[inline]
pub fn gradient(r_ij: Vector, h: Real) -> Vector {
    let r = r_ij.length();
    if r >= h || r < 1e-6 * h {
        return Vector::ZERO;
    }
    let q = r / h;
    let dw = if q <= 0.5 {
        6.0 * q * (3.0 * q - 2.0)
    } else {
        let t = 1.0 - q;
        -6.0 * t * t
    };
    (normalization(h) / h) * dw * (r_ij / r)
}
