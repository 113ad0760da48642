/// Per-frame vertex rotation, face normals and visibility culling
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

use crate::cache::RenderCache;
use crate::geometry::{Mesh, VisibleTriangle};
use crate::math::normalize_or_zero;
use crate::transform::RotationState;

/// Offset of the fixed viewer along the z axis.
pub const VIEWER_OFFSET: f64 = 10.0;

/// A face is kept when its visibility score is strictly above this value.
pub const VISIBILITY_THRESHOLD: f64 = 1.0;

/// Unit normal of `(v2 - v1) × (v3 - v1)`.
///
/// Degenerate triangles yield the zero vector.
pub fn face_normal(vertices: &[Point3<f64>; 3]) -> Vector3<f64> {
    let [v1, v2, v3] = vertices;
    let edge1 = v2 - v1;
    let edge2 = v3 - v1;
    normalize_or_zero(edge1.cross(&edge2))
}

/// `normal · (v1.x, v1.y, v1.z - 10)`, the score the culling test compares
/// against [`VISIBILITY_THRESHOLD`].
pub fn visibility_score(first_vertex: &Point3<f64>, normal: &Vector3<f64>) -> f64 {
    normal.x * first_vertex.x
        + normal.y * first_vertex.y
        + normal.z * (first_vertex.z - VIEWER_OFFSET)
}

pub fn is_visible(first_vertex: &Point3<f64>, normal: &Vector3<f64>) -> bool {
    visibility_score(first_vertex, normal) > VISIBILITY_THRESHOLD
}

/// Rotation matrices for `angle`, memoized per exact angle.
pub fn rotation_for(angle: f64, cache: &RenderCache) -> RotationState {
    if let Some(rotation) = cache.rotation(angle) {
        return rotation;
    }
    let rotation = RotationState::from_angle(angle);
    cache.store_rotation(angle, rotation);
    rotation
}

/// Rotate every triangle of `mesh` and keep the ones that pass the
/// visibility test, in mesh order.
pub fn transform_and_cull(
    mesh: &Mesh,
    rotation: &RotationState,
    cache: &RenderCache,
) -> Vec<VisibleTriangle> {
    let mut visible = Vec::with_capacity(mesh.len());

    for triangle in &mesh.triangles {
        let rotated = triangle.vertices.map(|vertex| rotation.apply(&vertex));
        let normal = match cache.normal(&rotated) {
            Some(normal) => normal,
            None => {
                let normal = face_normal(&rotated);
                cache.store_normal(&rotated, normal);
                normal
            }
        };

        if is_visible(&rotated[0], &normal) {
            visible.push(VisibleTriangle::new(rotated, normal));
        }
    }

    visible
}

/// Visible triangles of `mesh` at `angle`, memoized per exact angle.
pub fn visible_triangles(mesh: &Mesh, angle: f64, cache: &RenderCache) -> Arc<Vec<VisibleTriangle>> {
    if let Some(frame) = cache.frame(angle) {
        return frame;
    }

    let rotation = rotation_for(angle, cache);
    let frame = Arc::new(transform_and_cull(mesh, &rotation, cache));
    tracing::trace!(angle, visible = frame.len(), total = mesh.len(), "culled frame");
    cache.store_frame(angle, Arc::clone(&frame));
    frame
}
