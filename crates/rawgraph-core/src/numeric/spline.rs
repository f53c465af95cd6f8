//! Monotone cubic Hermite curves through four control points.

use super::NumericError;

/// Secants this close to zero mark a flat segment.
const FLAT_EPSILON: f32 = 1e-8;

/// Computes tangents that keep a cubic Hermite curve monotone (Fritsch–Carlson).
///
/// `x` must increase strictly. Tangents start as secant averages (one-sided at
/// the ends). Interior points where the secant changes sign are local extrema
/// and get a zero tangent. Flat segments pin both adjacent tangents to zero,
/// and any segment whose tangent ratios leave the circle of radius 3 is scaled
/// back onto it.
pub fn monotone_tangents(x: &[f32; 4], y: &[f32; 4]) -> Result<[f32; 4], NumericError> {
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(NumericError::NonFinite);
    }
    if let Some(index) = (1..4).find(|&i| x[i] <= x[i - 1]) {
        return Err(NumericError::NonIncreasing { index });
    }

    let mut d = [0.0f32; 4];
    for i in 0..3 {
        d[i] = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
    }
    d[3] = d[2];

    // m[4] is scratch so the last segment can write its right neighbour.
    let mut m = [0.0f32; 5];
    m[0] = d[0];
    m[3] = d[3];
    for i in 1..3 {
        m[i] = (d[i - 1] + d[i]) * 0.5;
        // local extremum
        if d[i - 1] * d[i] < 0.0 {
            m[i] = 0.0;
        }
    }

    for i in 0..4 {
        if d[i].abs() <= FLAT_EPSILON {
            m[i] = 0.0;
            m[i + 1] = 0.0;
        } else {
            let alpha = m[i] / d[i];
            let beta = m[i + 1] / d[i];
            let tau = alpha * alpha + beta * beta;
            if tau > 9.0 {
                m[i] = 3.0 * m[i] / tau.sqrt();
                m[i + 1] = 3.0 * m[i + 1] / tau.sqrt();
            }
        }
    }

    Ok([m[0], m[1], m[2], m[3]])
}

/// Evaluates the Hermite curve defined by control points and tangents at `t`.
///
/// Values outside `x[0]..=x[3]` continue along the end tangent.
pub fn eval_hermite(x: &[f32; 4], y: &[f32; 4], m: &[f32; 4], t: f32) -> f32 {
    if t <= x[0] {
        return y[0] + m[0] * (t - x[0]);
    }
    if t >= x[3] {
        return y[3] + m[3] * (t - x[3]);
    }
    let i = (0..3).rfind(|&i| t >= x[i]).unwrap_or(0);
    let h = x[i + 1] - x[i];
    let s = (t - x[i]) / h;
    let (s2, s3) = (s * s, s * s * s);
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * y[i] + h10 * h * m[i] + h01 * y[i + 1] + h11 * h * m[i + 1]
}
