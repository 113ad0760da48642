/// Small numeric helpers shared by the transform and raster stages
use nalgebra::{Point3, SMatrix, Vector3};

/// Dense matrix product `a · b`.
///
/// Conformance (`cols(a) == rows(b)`) is enforced by the const parameters.
/// The sum over `k` runs in index order so results match a naive triple loop
/// bit for bit.
pub fn multiply<const R: usize, const K: usize, const C: usize>(
    a: &SMatrix<f64, R, K>,
    b: &SMatrix<f64, K, C>,
) -> SMatrix<f64, R, C> {
    let mut result = SMatrix::<f64, R, C>::zeros();
    for i in 0..R {
        for j in 0..C {
            for k in 0..K {
                result[(i, j)] += a[(i, k)] * b[(k, j)];
            }
        }
    }
    result
}

/// Bound `value` into `[min, max]` and truncate it to an index.
///
/// NaN maps to `min`.
pub fn clamp(value: f64, min: usize, max: usize) -> usize {
    let bounded = value.max(min as f64).min(max as f64);
    bounded as usize
}

/// Apply a 3×3 matrix to a point treated as a column vector.
pub fn transform_point(matrix: &SMatrix<f64, 3, 3>, point: &Point3<f64>) -> Point3<f64> {
    Point3::from(multiply(matrix, &point.coords))
}

/// Unit vector in the direction of `v`, or `v` itself when it has zero length.
pub fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let magnitude = v.norm();
    if magnitude > 0.0 {
        v / magnitude
    } else {
        v
    }
}
