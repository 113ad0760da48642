/// A render session: one mesh, one viewport, one buffer pair
use std::io::Write;
use std::thread;

use crate::cache::{RenderCache, DEFAULT_CACHE_CAPACITY};
use crate::depth::sorted_back_to_front;
use crate::error::RenderError;
use crate::frame::{run_output_loop, AngleCell, FrontBuffer, LoopConfig, Shutdown};
use crate::geometry::Mesh;
use crate::pipeline::visible_triangles;
use crate::projection::Viewport;
use crate::raster::{Canvas, Rasterizer};

/// Frame counters reported when an animated render stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationStats {
    /// Frames written to the output.
    pub shown: u64,
    /// Frames rasterized and published by the render loop.
    pub rendered: u64,
}

/// Owns everything a render needs: the immutable mesh, the shared angle, the
/// memoization caches and the display buffer.
#[derive(Debug)]
pub struct RenderSession {
    mesh: Mesh,
    viewport: Viewport,
    angle: AngleCell,
    cache: RenderCache,
    front: FrontBuffer,
}

impl RenderSession {
    /// Fails fast when either dimension is zero.
    pub fn new(mesh: Mesh, cols: usize, rows: usize) -> Result<Self, RenderError> {
        Self::with_cache_capacity(mesh, cols, rows, DEFAULT_CACHE_CAPACITY)
    }

    /// Like [`RenderSession::new`] with a custom cache size; zero disables
    /// memoization. Cached frames are keyed by angle only, so the cache is
    /// always built here and never shared with another mesh.
    pub fn with_cache_capacity(
        mesh: Mesh,
        cols: usize,
        rows: usize,
        cache_capacity: usize,
    ) -> Result<Self, RenderError> {
        let viewport = Viewport::new(cols, rows)?;
        tracing::debug!(cols, rows, triangles = mesh.len(), "render session created");
        Ok(Self {
            mesh,
            viewport,
            angle: AngleCell::new(0.0),
            cache: RenderCache::with_capacity(cache_capacity),
            front: FrontBuffer::new(Canvas::new(viewport)),
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn angle(&self) -> f64 {
        self.angle.get()
    }

    pub fn set_angle(&self, angle: f64) {
        self.angle.set(angle);
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Drop all memoized rotations, frames and normals.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Copy of the frame currently on display.
    pub fn display(&self) -> Canvas {
        self.front.snapshot()
    }

    /// Rasterize the mesh at `angle` into `target`, which is cleared first.
    pub fn render_into(&self, angle: f64, rasterizer: &mut Rasterizer, target: &mut Canvas) {
        target.clear();
        let visible = visible_triangles(&self.mesh, angle, &self.cache);
        let sorted = sorted_back_to_front(&visible);
        rasterizer.draw_triangles(target, &sorted);
    }

    /// Rasterize the mesh at `angle` into a fresh canvas.
    pub fn render_frame(&self, angle: f64) -> Canvas {
        let mut canvas = Canvas::new(self.viewport);
        let mut rasterizer = Rasterizer::new(self.viewport);
        self.render_into(angle, &mut rasterizer, &mut canvas);
        canvas
    }

    /// Still image at angle 0, rows joined by `\n`.
    ///
    /// Uses a private canvas; neither the display buffer nor the session
    /// angle is modified.
    pub fn render_still_preview(&self) -> String {
        self.render_frame(0.0).to_text()
    }

    /// Run the render loop and the output loop until `shutdown` is requested
    /// (or the frame limit in `config` is reached).
    ///
    /// The render loop runs unthrottled on a scoped thread; the output loop
    /// runs on the calling thread and owns `writer`.
    pub fn render_animated<W: Write>(
        &self,
        mut writer: W,
        config: LoopConfig,
        shutdown: &Shutdown,
    ) -> Result<AnimationStats, RenderError> {
        config.validate()?;
        tracing::info!(
            cols = self.viewport.cols(),
            rows = self.viewport.rows(),
            fps = config.fps,
            triangles = self.mesh.len(),
            "starting animated render"
        );

        let published_before = self.front.published();
        let shown = thread::scope(|scope| {
            scope.spawn(|| self.run_render_loop(shutdown));

            let result = run_output_loop(&mut writer, &self.front, &self.angle, config, shutdown);
            // Stop the render loop on error as well.
            shutdown.request();
            result
        })?;

        let stats = AnimationStats {
            shown,
            rendered: self.front.published() - published_before,
        };
        tracing::info!(
            shown = stats.shown,
            rendered = stats.rendered,
            cache = ?self.cache.stats(),
            "animated render stopped"
        );
        Ok(stats)
    }

    fn run_render_loop(&self, shutdown: &Shutdown) {
        let mut write = Canvas::new(self.viewport);
        let mut rasterizer = Rasterizer::new(self.viewport);

        while !shutdown.is_requested() {
            self.render_into(self.angle.get(), &mut rasterizer, &mut write);
            self.front.publish(&mut write);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::angle_step;
    use crate::obj::parse_obj;
    use crate::raster::SHADING_RAMP;
    use std::time::Duration;

    const UNIT_CUBE: &str = include_str!("../../models/cube.obj");

    fn unit_cube() -> Mesh {
        let loaded = parse_obj(UNIT_CUBE).into_mesh();
        assert!(loaded.warnings.is_empty());
        loaded.mesh
    }

    #[test]
    fn test_cube_file_matches_builtin_cube() {
        assert_eq!(unit_cube(), Mesh::cube(1.0));
    }

    #[test]
    fn test_preview_of_unit_cube_contains_ramp_glyphs() {
        let session = RenderSession::new(unit_cube(), 10, 10).unwrap();
        let preview = session.render_still_preview();

        let lines: Vec<&str> = preview.split('\n').collect();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|line| line.chars().count() == 10));
        assert!(preview.chars().any(|c| SHADING_RAMP.contains(&c)));
        assert!(preview.contains('@'));
    }

    #[test]
    fn test_zero_sized_preview_fails_fast() {
        assert!(matches!(
            RenderSession::new(unit_cube(), 0, 10),
            Err(RenderError::EmptyViewport { cols: 0, rows: 10 })
        ));
        assert!(matches!(
            RenderSession::new(unit_cube(), 10, 0),
            Err(RenderError::EmptyViewport { .. })
        ));
    }

    #[test]
    fn test_preview_is_idempotent_and_keeps_angle() {
        let session = RenderSession::new(unit_cube(), 16, 12).unwrap();
        session.set_angle(1.25);

        let first = session.render_still_preview();
        let second = session.render_still_preview();
        assert_eq!(first, second);
        assert_eq!(session.angle(), 1.25);
        assert!(session.display().is_blank());
    }

    #[test]
    fn test_preview_ignores_cached_state() {
        let cached = RenderSession::new(unit_cube(), 12, 12).unwrap();
        let uncached = RenderSession::with_cache_capacity(unit_cube(), 12, 12, 0).unwrap();
        assert_eq!(cached.render_still_preview(), uncached.render_still_preview());
        assert_eq!(cached.render_still_preview(), uncached.render_still_preview());
        assert_eq!(uncached.cache().stats().frames, 0);
    }

    #[test]
    fn test_preview_of_huge_mesh_stays_on_canvas() {
        let loaded = parse_obj("v 0 0 0\nv 0 1e18 0\nv 1e18 0 0\nf 1 2 3\n").into_mesh();
        let session = RenderSession::new(loaded.mesh, 10, 10).unwrap();
        let preview = session.render_still_preview();

        assert_eq!(preview.split('\n').count(), 10);
        assert!(preview.contains('@'));
    }

    #[test]
    fn test_render_into_clears_stale_cells() {
        let session = RenderSession::new(unit_cube(), 10, 10).unwrap();
        let mut target = Canvas::new(session.viewport());
        for y in 0..10 {
            for x in 0..10 {
                target.set(x, y, 'X');
            }
        }

        let mut rasterizer = Rasterizer::new(session.viewport());
        session.render_into(0.0, &mut rasterizer, &mut target);

        assert!(target.rows().flatten().all(|&c| c != 'X'));
        assert_eq!(target, session.render_frame(0.0));
    }

    #[test]
    fn test_render_frame_changes_with_angle() {
        let session = RenderSession::new(Mesh::cube(1.0), 24, 24).unwrap();
        let front = session.render_frame(0.0);
        let turned = session.render_frame(0.6);
        assert!(!front.is_blank());
        assert_ne!(front, turned);
    }

    #[test]
    fn test_animated_render_stops_at_frame_limit() {
        let session = RenderSession::new(unit_cube(), 10, 10).unwrap();
        let shutdown = Shutdown::new();
        let mut out = Vec::new();

        let stats = session
            .render_animated(&mut out, LoopConfig::new(200).with_frame_limit(5), &shutdown)
            .unwrap();

        assert_eq!(stats.shown, 5);
        assert!(shutdown.is_requested());
        assert!((session.angle() - 5.0 * angle_step(200)).abs() < 1e-9);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\x1b[1;1H").count(), 5);
        for frame in text.split("\x1b[1;1H").skip(1) {
            assert_eq!(frame.lines().count(), 10);
        }
    }

    #[test]
    fn test_animated_render_stops_on_shutdown() {
        let session = RenderSession::new(unit_cube(), 8, 8).unwrap();
        let shutdown = Shutdown::new();

        let stats = thread::scope(|scope| {
            let handle = scope.spawn(|| {
                session.render_animated(std::io::sink(), LoopConfig::default(), &shutdown)
            });
            thread::sleep(Duration::from_millis(100));
            shutdown.request();
            handle.join().unwrap()
        })
        .unwrap();

        assert!(stats.shown >= 1);
        assert!(stats.rendered >= 1);
        assert!(!session.display().is_blank());
    }
}
