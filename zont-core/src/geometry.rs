/// Geometry primitives for 3D rendering
use nalgebra::{Point3, Vector3};

/// A triangle face defined by three object-space vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f64>; 3],
}

impl Triangle {
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }
}

/// A rotated triangle that survived culling, carrying its face normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTriangle {
    pub vertices: [Point3<f64>; 3],
    pub normal: Vector3<f64>,
}

impl VisibleTriangle {
    pub fn new(vertices: [Point3<f64>; 3], normal: Vector3<f64>) -> Self {
        Self { vertices, normal }
    }

    /// Mean z of the three vertices; the normal does not take part.
    pub fn average_depth(&self) -> f64 {
        (self.vertices[0].z + self.vertices[1].z + self.vertices[2].z) / 3.0
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Group a flat vertex stream into triangles, three entries at a time.
    ///
    /// A trailing run shorter than three vertices is ignored.
    pub fn from_vertex_stream(stream: &[Point3<f64>]) -> Self {
        let mut mesh = Self::with_capacity(stream.len() / 3);
        for chunk in stream.chunks_exact(3) {
            mesh.add_triangle(Triangle::new(chunk[0], chunk[1], chunk[2]));
        }
        mesh
    }

    /// Flatten back into the vertex stream the loader produces.
    pub fn vertex_stream(&self) -> Vec<Point3<f64>> {
        self.triangles
            .iter()
            .flat_map(|triangle| triangle.vertices)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Create an axis-aligned cube centered on the origin, wound
    /// counter-clockwise when seen from outside.
    pub fn cube(size: f64) -> Self {
        let h = size / 2.0;
        let corners = [
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let faces: [[usize; 3]; 12] = [
            // Front (+z)
            [4, 5, 6],
            [4, 6, 7],
            // Back (-z)
            [1, 0, 3],
            [1, 3, 2],
            // Top (+y)
            [7, 6, 2],
            [7, 2, 3],
            // Bottom (-y)
            [0, 1, 5],
            [0, 5, 4],
            // Right (+x)
            [5, 1, 2],
            [5, 2, 6],
            // Left (-x)
            [0, 4, 7],
            [0, 7, 3],
        ];

        let mut mesh = Self::with_capacity(faces.len());
        for [a, b, c] in faces {
            mesh.add_triangle(Triangle::new(corners[a], corners[b], corners[c]));
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_has_twelve_triangles() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.len(), 12);
        assert_eq!(cube.vertex_stream().len(), 36);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Mesh::cube(2.0);
        for triangle in &cube.triangles {
            let [a, b, c] = triangle.vertices;
            let normal = (b - a).cross(&(c - a));
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            assert!(normal.dot(&centroid) > 0.0, "inward face: {:?}", triangle);
        }
    }

    #[test]
    fn test_from_vertex_stream_drops_partial_triangle() {
        let stream = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mesh = Mesh::from_vertex_stream(&stream);
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.vertex_stream(), stream[..3].to_vec());
    }

    #[test]
    fn test_average_depth_ignores_normal() {
        let triangle = VisibleTriangle::new(
            [
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(0.0, 0.0, 3.0),
            ],
            Vector3::new(0.0, 0.0, 100.0),
        );
        assert!((triangle.average_depth() - 2.0).abs() < 1e-12);
    }
}
