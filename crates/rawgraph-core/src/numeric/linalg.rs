//! Dense linear solves and projective transforms.

use super::NumericError;

/// Pivots smaller than this fraction of the largest matrix entry count as
/// zero.
const PIVOT_EPSILON: f64 = 1e-12;

/// Solves `m * x = r` in place by Gaussian elimination with partial pivoting.
///
/// On success the first `N` entries of `r` hold the solution; entries past
/// `N` are left untouched. `m` is destroyed.
pub fn gauss_solve<const N: usize>(
    m: &mut [[f64; N]; N],
    r: &mut [f64],
) -> Result<(), NumericError> {
    assert!(r.len() >= N, "right-hand side shorter than system");

    let magnitude = m.iter().flatten().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !magnitude.is_finite() || r[..N].iter().any(|v| !v.is_finite()) {
        return Err(NumericError::NonFinite);
    }
    let eps = magnitude * PIVOT_EPSILON;

    for col in 0..N {
        let pivot = (col..N)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() <= eps {
            return Err(NumericError::Singular { column: col });
        }
        m.swap(col, pivot);
        r.swap(col, pivot);

        for row in col + 1..N {
            let f = m[row][col] / m[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..N {
                m[row][k] -= f * m[col][k];
            }
            r[row] -= f * r[col];
        }
    }

    for col in (0..N).rev() {
        let mut acc = r[col];
        for k in col + 1..N {
            acc -= m[col][k] * r[k];
        }
        r[col] = acc / m[col][col];
    }

    if r[..N].iter().any(|v| !v.is_finite()) {
        return Err(NumericError::NonFinite);
    }
    Ok(())
}

/// Solves the homography taking a quadrilateral onto an axis-aligned
/// rectangle.
///
/// `quad` holds four corners `x0 y0 x1 y1 x2 y2 x3 y3` in pixels, ordered
/// top-left, top-right, bottom-right, bottom-left. The rectangle spans
/// `x0..x1` horizontally and `y0..y3` vertically, so corner 0 stays fixed.
///
/// Returns the 3x3 matrix `H` row-major with `H[8] = 1`. Mapping a corner
/// `(x, y, 1)` through `H` and dividing by the third coordinate yields the
/// matching rectangle corner.
///
/// The eight free entries come from an 8x8 system: one row per corner and
/// axis, `x` rows first.
pub fn solve_homography(quad: &[f32; 8]) -> Result<[f32; 9], NumericError> {
    if quad.iter().any(|v| !v.is_finite()) {
        return Err(NumericError::NonFinite);
    }
    let p: [[f64; 2]; 4] =
        core::array::from_fn(|k| [f64::from(quad[2 * k]), f64::from(quad[2 * k + 1])]);
    check_quad(&p)?;

    let (left, right) = (p[0][0], p[1][0]);
    let (top, bottom) = (p[0][1], p[3][1]);
    if left == right || top == bottom {
        return Err(NumericError::EmptyTarget);
    }
    let u = [[left, top], [right, top], [right, bottom], [left, bottom]];

    let mut m = [[0.0f64; 8]; 8];
    let mut r = [0.0f64; 9];
    for k in 0..4 {
        let [px, py] = p[k];
        let [ux, uy] = u[k];
        m[k] = [px, py, 1.0, 0.0, 0.0, 0.0, -ux * px, -ux * py];
        m[k + 4] = [0.0, 0.0, 0.0, px, py, 1.0, -uy * px, -uy * py];
        r[k] = ux;
        r[k + 4] = uy;
    }
    r[8] = 1.0;

    gauss_solve(&mut m, &mut r)?;
    Ok(r.map(|v| v as f32))
}

/// Maps `(x, y)` through a row-major homography with perspective divide.
pub fn apply_homography(h: &[f32; 9], x: f32, y: f32) -> (f32, f32) {
    let w = h[6] * x + h[7] * y + h[8];
    (
        (h[0] * x + h[1] * y + h[2]) / w,
        (h[3] * x + h[4] * y + h[5]) / w,
    )
}

/// Rejects quads with three collinear corners (which includes zero area).
fn check_quad(p: &[[f64; 2]; 4]) -> Result<(), NumericError> {
    let (mut min, mut max) = ([f64::MAX; 2], [f64::MIN; 2]);
    for c in p {
        for a in 0..2 {
            min[a] = min[a].min(c[a]);
            max[a] = max[a].max(c[a]);
        }
    }
    let extent = (max[0] - min[0]).max(max[1] - min[1]);
    let eps = extent * extent * 1e-9;

    for i in 0..4 {
        let tri = [i, (i + 1) % 4, (i + 2) % 4];
        let [a, b, c] = tri.map(|k| p[k]);
        let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
        if cross.abs() <= eps {
            return Err(NumericError::Collinear(tri));
        }
    }
    Ok(())
}
