/// Memoization for per-angle rotations, culled frames and face normals
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::geometry::VisibleTriangle;
use crate::transform::RotationState;

/// Default number of entries the rotation and normal maps may hold before
/// they are cleared.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Culled frames kept at once. Each entry holds a whole triangle list and the
/// angle only moves forward, so only the most recent angles are worth keeping.
pub const FRAME_CACHE_CAPACITY: usize = 2;

/// Exact bit pattern of an angle; distinct angles never share an entry.
pub type AngleKey = u64;

/// Bit patterns of the nine coordinates of a rotated triangle.
pub type TriangleKey = [u64; 9];

pub fn angle_key(angle: f64) -> AngleKey {
    angle.to_bits()
}

pub fn triangle_key(vertices: &[Point3<f64>; 3]) -> TriangleKey {
    let mut key = [0u64; 9];
    for (i, vertex) in vertices.iter().enumerate() {
        key[i * 3] = vertex.x.to_bits();
        key[i * 3 + 1] = vertex.y.to_bits();
        key[i * 3 + 2] = vertex.z.to_bits();
    }
    key
}

/// Number of entries currently held by each map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub rotations: usize,
    pub frames: usize,
    pub normals: usize,
}

/// A map that empties itself once it reaches its capacity.
#[derive(Debug)]
struct BoundedMap<K, V> {
    entries: HashMap<K, V>,
    capacity: usize,
}

impl<K: Eq + Hash, V: Clone> BoundedMap<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            tracing::debug!(capacity = self.capacity, "cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Memoization layer owned by a render session.
///
/// Every map sits behind its own `RwLock`: lookups share the lock, inserts
/// take it exclusively.
#[derive(Debug)]
pub struct RenderCache {
    rotations: RwLock<BoundedMap<AngleKey, RotationState>>,
    frames: RwLock<BoundedMap<AngleKey, Arc<Vec<VisibleTriangle>>>>,
    normals: RwLock<BoundedMap<TriangleKey, Vector3<f64>>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Caps the rotation and normal maps at `capacity` entries; the frame map
    /// never holds more than [`FRAME_CACHE_CAPACITY`]. A capacity of zero
    /// disables memoization entirely.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rotations: RwLock::new(BoundedMap::new(capacity)),
            frames: RwLock::new(BoundedMap::new(capacity.min(FRAME_CACHE_CAPACITY))),
            normals: RwLock::new(BoundedMap::new(capacity)),
        }
    }

    pub fn rotation(&self, angle: f64) -> Option<RotationState> {
        read(&self.rotations, &angle_key(angle))
    }

    pub fn store_rotation(&self, angle: f64, rotation: RotationState) {
        write(&self.rotations, angle_key(angle), rotation);
    }

    pub fn frame(&self, angle: f64) -> Option<Arc<Vec<VisibleTriangle>>> {
        read(&self.frames, &angle_key(angle))
    }

    pub fn store_frame(&self, angle: f64, triangles: Arc<Vec<VisibleTriangle>>) {
        write(&self.frames, angle_key(angle), triangles);
    }

    pub fn normal(&self, vertices: &[Point3<f64>; 3]) -> Option<Vector3<f64>> {
        read(&self.normals, &triangle_key(vertices))
    }

    pub fn store_normal(&self, vertices: &[Point3<f64>; 3], normal: Vector3<f64>) {
        write(&self.normals, triangle_key(vertices), normal);
    }

    /// Drop every memoized entry.
    pub fn clear(&self) {
        lock_mut(&self.rotations).clear();
        lock_mut(&self.frames).clear();
        lock_mut(&self.normals).clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            rotations: lock(&self.rotations).len(),
            frames: lock(&self.frames).len(),
            normals: lock(&self.normals).len(),
        }
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

// Lock poisoning is ignored: the maps only ever hold complete values.
fn lock<T>(map: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    map.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_mut<T>(map: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    map.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read<K: Eq + Hash, V: Clone>(map: &RwLock<BoundedMap<K, V>>, key: &K) -> Option<V> {
    lock(map).get(key)
}

fn write<K: Eq + Hash, V: Clone>(map: &RwLock<BoundedMap<K, V>>, key: K, value: V) {
    lock_mut(map).insert(key, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_roundtrip_and_clear() {
        let cache = RenderCache::new();
        assert!(cache.rotation(0.5).is_none());

        let rotation = RotationState::from_angle(0.5);
        cache.store_rotation(0.5, rotation);
        assert_eq!(cache.rotation(0.5), Some(rotation));
        assert!(cache.rotation(0.5000001).is_none());

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_normal_key_distinguishes_winding() {
        let cache = RenderCache::new();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        cache.store_normal(&[a, b, c], Vector3::z());
        assert_eq!(cache.normal(&[a, b, c]), Some(Vector3::z()));
        assert_eq!(cache.normal(&[a, c, b]), None);
    }

    #[test]
    fn test_capacity_bounds_growth() {
        let cache = RenderCache::with_capacity(3);
        for i in 0..10 {
            let angle = i as f64 * 0.03;
            cache.store_rotation(angle, RotationState::from_angle(angle));
            assert!(cache.stats().rotations <= 3);
        }
        assert!(cache.rotation(9.0 * 0.03).is_some());
    }

    #[test]
    fn test_frame_map_keeps_only_recent_angles() {
        let cache = RenderCache::new();
        let triangle = VisibleTriangle {
            vertices: [Point3::origin(); 3],
            normal: Vector3::z(),
        };
        let triangles = Arc::new(vec![triangle; 64]);
        for i in 0..600 {
            let angle = i as f64 * 0.03;
            cache.store_frame(angle, Arc::clone(&triangles));
            cache.store_rotation(angle, RotationState::from_angle(angle));
            assert!(cache.stats().frames <= FRAME_CACHE_CAPACITY);
        }
        assert_eq!(cache.stats().rotations, 600);
        assert!(cache.frame(599.0 * 0.03).is_some());
        assert!(cache.frame(0.0).is_none());
    }

    #[test]
    fn test_zero_capacity_disables_memoization() {
        let cache = RenderCache::with_capacity(0);
        cache.store_frame(0.0, Arc::new(Vec::new()));
        assert!(cache.frame(0.0).is_none());
    }
}
