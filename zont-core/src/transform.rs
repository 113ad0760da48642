/// Rotation matrices applied to every vertex of a frame
use nalgebra::{Matrix3, Point3};

use crate::math::transform_point;

/// The three basis rotations for the current frame.
///
/// Vertices are rotated as `x · (y · (z · v))`: the Z matrix is applied
/// first and the X matrix last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    x: Matrix3<f64>,
    y: Matrix3<f64>,
    z: Matrix3<f64>,
}

impl RotationState {
    pub fn new(x: Matrix3<f64>, y: Matrix3<f64>, z: Matrix3<f64>) -> Self {
        Self { x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Matrix3::identity(), Matrix3::identity())
    }

    /// Single-axis spin around Y. The X and Z slots hold identity matrices.
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        #[rustfmt::skip]
        let y = Matrix3::new(
            cos,  0.0, sin,
            0.0,  1.0, 0.0,
            -sin, 0.0, cos,
        );
        Self::new(Matrix3::identity(), y, Matrix3::identity())
    }

    /// Replace all three matrices at once.
    pub fn update(&mut self, x: Matrix3<f64>, y: Matrix3<f64>, z: Matrix3<f64>) {
        *self = Self::new(x, y, z);
    }

    pub fn x(&self) -> &Matrix3<f64> {
        &self.x
    }

    pub fn y(&self) -> &Matrix3<f64> {
        &self.y
    }

    pub fn z(&self) -> &Matrix3<f64> {
        &self.z
    }

    /// Rotate a single point.
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        let inner = transform_point(&self.z, point);
        let middle = transform_point(&self.y, &inner);
        transform_point(&self.x, &middle)
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::identity()
    }
}
