/// Orthographic projection and screen-space mapping
use nalgebra::{Matrix2x3, Point3, Vector2};

use crate::error::RenderError;
use crate::math::multiply;

/// Fixed 2×3 orthographic projection: keeps x and y, drops z.
pub fn projection_matrix() -> Matrix2x3<f64> {
    #[rustfmt::skip]
    let matrix = Matrix2x3::new(
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
    );
    matrix
}

/// Project a rotated vertex onto the view plane.
pub fn project(point: &Point3<f64>) -> Vector2<f64> {
    multiply(&projection_matrix(), &point.coords)
}

/// Character grid dimensions of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// Both dimensions must be non-zero.
    pub fn new(cols: usize, rows: usize) -> Result<Self, RenderError> {
        if cols == 0 || rows == 0 {
            return Err(RenderError::EmptyViewport { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Map projected coordinates to fractional screen coordinates.
    ///
    /// The view plane spans roughly `[-1, 1]` on both axes; y grows upwards
    /// on the plane and downwards on screen.
    pub fn to_screen(&self, projected: &Vector2<f64>) -> (f64, f64) {
        let cols = self.cols as f64;
        let rows = self.rows as f64;
        let x = cols / 2.0 + projected.x / 2.0 * cols;
        let y = rows / 2.0 + projected.y / -2.0 * rows;
        (x, y)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_drops_depth() {
        let projected = project(&Point3::new(0.5, -0.25, 42.0));
        assert_eq!(projected, Vector2::new(0.5, -0.25));
    }

    #[test]
    fn test_screen_mapping_flips_y() {
        let viewport = Viewport::new(20, 10).unwrap();
        assert_eq!(viewport.to_screen(&Vector2::new(0.0, 0.0)), (10.0, 5.0));
        assert_eq!(viewport.to_screen(&Vector2::new(1.0, 1.0)), (20.0, 0.0));
        assert_eq!(viewport.to_screen(&Vector2::new(-1.0, -1.0)), (0.0, 10.0));
    }

    #[test]
    fn test_empty_viewport_is_rejected() {
        assert!(matches!(
            Viewport::new(0, 10),
            Err(RenderError::EmptyViewport { cols: 0, rows: 10 })
        ));
        assert!(Viewport::new(10, 0).is_err());
    }

    #[test]
    fn test_contains() {
        let viewport = Viewport::new(4, 3).unwrap();
        assert!(viewport.contains(0, 0));
        assert!(viewport.contains(3, 2));
        assert!(!viewport.contains(4, 2));
        assert!(!viewport.contains(-1, 0));
    }
}
