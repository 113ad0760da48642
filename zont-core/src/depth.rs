/// Painter's-algorithm ordering of visible triangles
use crate::geometry::VisibleTriangle;

/// Sort triangles back to front: descending average z, since the viewer
/// looks towards -z. The sort is stable, so equal depths keep mesh order.
pub fn sort_back_to_front(triangles: &mut [VisibleTriangle]) {
    triangles.sort_by(|a, b| b.average_depth().total_cmp(&a.average_depth()));
}

/// Sorted copy of `triangles`.
pub fn sorted_back_to_front(triangles: &[VisibleTriangle]) -> Vec<VisibleTriangle> {
    let mut sorted = triangles.to_vec();
    sort_back_to_front(&mut sorted);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn at_depth(z: f64, tag: f64) -> VisibleTriangle {
        VisibleTriangle::new(
            [
                Point3::new(tag, 0.0, z - 1.0),
                Point3::new(tag, 1.0, z),
                Point3::new(tag, 2.0, z + 1.0),
            ],
            Vector3::zeros(),
        )
    }

    #[test]
    fn test_sorted_by_descending_average_depth() {
        let triangles: Vec<_> = [0.5, -3.0, 7.25, 2.0, -0.1, 7.25]
            .iter()
            .enumerate()
            .map(|(i, &z)| at_depth(z, i as f64))
            .collect();

        let sorted = sorted_back_to_front(&triangles);
        assert_eq!(sorted.len(), triangles.len());
        for pair in sorted.windows(2) {
            assert!(pair[0].average_depth() >= pair[1].average_depth());
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let triangles = vec![at_depth(1.0, 0.0), at_depth(1.0, 1.0), at_depth(1.0, 2.0)];
        let sorted = sorted_back_to_front(&triangles);
        assert_eq!(sorted, triangles);
    }

    #[test]
    fn test_empty_input() {
        let mut triangles: Vec<VisibleTriangle> = Vec::new();
        sort_back_to_front(&mut triangles);
        assert!(triangles.is_empty());
    }
}
