/// ASCII rasterizer: character canvas, Bresenham edges and span fill
use nalgebra::Vector3;
use std::io::{self, Write};

use crate::geometry::VisibleTriangle;
use crate::math::clamp;
use crate::projection::{project, Viewport};

/// Glyph of an untouched cell.
pub const BLANK: char = ' ';

/// Luminance ramp, darkest to brightest.
pub const SHADING_RAMP: [char; 12] = ['.', ',', '-', '~', ':', ';', '=', '!', '*', '#', '$', '@'];

/// Scale applied to the light dot product before it is clamped into the ramp.
const SHADING_SCALE: f64 = 12.0;

/// Direction the single light shines from, pointing at the viewer side.
pub fn light_direction() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, -1.0).normalize()
}

/// Ramp glyph for a face with the given unit normal.
pub fn shading_glyph(normal: &Vector3<f64>) -> char {
    let intensity = normal.dot(&light_direction()) * SHADING_SCALE;
    SHADING_RAMP[clamp(intensity, 0, SHADING_RAMP.len() - 1)]
}

/// A fixed-size grid of glyphs, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    viewport: Viewport,
    cells: Vec<char>,
}

impl Canvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            cells: vec![BLANK; viewport.cell_count()],
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == BLANK)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        if x < self.viewport.cols() && y < self.viewport.rows() {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, glyph: char) {
        if x < self.viewport.cols() && y < self.viewport.rows() {
            let idx = self.index(x, y);
            self.cells[idx] = glyph;
        }
    }

    pub fn row(&self, y: usize) -> &[char] {
        let cols = self.viewport.cols();
        &self.cells[y * cols..(y + 1) * cols]
    }

    fn row_mut(&mut self, y: usize) -> &mut [char] {
        let cols = self.viewport.cols();
        &mut self.cells[y * cols..(y + 1) * cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks(self.viewport.cols())
    }

    /// Copy every cell of `source` that holds `glyph` into this canvas.
    pub fn overlay(&mut self, source: &Canvas, glyph: char) {
        for (dst, &src) in self.cells.iter_mut().zip(&source.cells) {
            if src == glyph {
                *dst = src;
            }
        }
    }

    /// Rows joined by `\n`, without a trailing newline.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.cells.len() + self.viewport.rows());
        for (y, row) in self.rows().enumerate() {
            if y > 0 {
                text.push('\n');
            }
            text.extend(row);
        }
        text
    }

    /// Stream every row followed by `\n`.
    pub fn draw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut line = String::with_capacity(self.viewport.cols() + 1);
        for row in self.rows() {
            line.clear();
            line.extend(row);
            line.push('\n');
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.viewport.cols() + x
    }
}

/// Cells kept around the canvas when clipping, so edges entering from outside
/// still step into the first row and column.
const CLIP_MARGIN: f64 = 1.0;

/// Draw a line between two screen positions with integer Bresenham steps.
///
/// Endpoints are truncated toward zero. Only blank cells are written;
/// cells outside the canvas are skipped. Segments reaching beyond the canvas
/// are clipped to it (plus a one-cell margin) before stepping.
pub fn draw_line(canvas: &mut Canvas, from: (f64, f64), to: (f64, f64), glyph: char) {
    let viewport = canvas.viewport();
    let Some(((x1, y1), (x2, y2))) = clip_segment(from, to, viewport) else {
        return;
    };

    let dx = (x2 - x1).abs() as i64;
    let dy = (y2 - y1).abs() as i64;
    let dx2 = 2 * dx;
    let dy2 = 2 * dy;
    let ix = if x1 > x2 { -1 } else { 1 };
    let iy = if y1 > y2 { -1 } else { 1 };

    let mut x = x1 as i64;
    let mut y = y1 as i64;
    let end_x = x2 as i64;
    let end_y = y2 as i64;
    let mut d = 0;

    let plot = |canvas: &mut Canvas, x: i64, y: i64| {
        if viewport.contains(x, y) && canvas.get(x as usize, y as usize) == Some(BLANK) {
            canvas.set(x as usize, y as usize, glyph);
        }
    };

    if dx >= dy {
        loop {
            plot(canvas, x, y);
            if x == end_x {
                break;
            }
            x += ix;
            d += dy2;
            if d > dx {
                y += iy;
                d -= dx2;
            }
        }
    } else {
        loop {
            plot(canvas, x, y);
            if y == end_y {
                break;
            }
            y += iy;
            d += dx2;
            if d > dy {
                x += ix;
                d -= dy2;
            }
        }
    }
}

/// Liang-Barsky clip of a segment against the viewport grown by
/// [`CLIP_MARGIN`]. Endpoints already inside are returned unchanged.
/// `None` when the segment misses the area or is not finite.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    viewport: Viewport,
) -> Option<((f64, f64), (f64, f64))> {
    let (x1, y1) = from;
    let (x2, y2) = to;
    let dx = x2 - x1;
    let dy = y2 - y1;
    if ![x1, y1, x2, y2, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }

    let min = -CLIP_MARGIN;
    let max_x = viewport.cols() as f64 + CLIP_MARGIN;
    let max_y = viewport.rows() as f64 + CLIP_MARGIN;

    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, x1 - min),
        (dx, max_x - x1),
        (-dy, y1 - min),
        (dy, max_y - y1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 > 0.0 {
        (x1 + t0 * dx, y1 + t0 * dy)
    } else {
        from
    };
    let end = if t1 < 1.0 {
        (x1 + t1 * dx, y1 + t1 * dy)
    } else {
        to
    };
    Some((start, end))
}

/// Fill each row between the first and last occurrence of `glyph`.
pub fn fill_spans(canvas: &mut Canvas, glyph: char) {
    for y in 0..canvas.viewport().rows() {
        let row = canvas.row_mut(y);
        let first = row.iter().position(|&c| c == glyph);
        let last = row.iter().rposition(|&c| c == glyph);
        if let (Some(first), Some(last)) = (first, last) {
            if first < last {
                row[first..last].fill(glyph);
            }
        }
    }
}

/// Draws shaded triangles, one at a time, through a private scratch canvas.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    scratch: Canvas,
}

impl Rasterizer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            scratch: Canvas::new(viewport),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.scratch.viewport()
    }

    /// Draw triangles in the given order; later ones overwrite earlier ones.
    pub fn draw_triangles(&mut self, target: &mut Canvas, triangles: &[VisibleTriangle]) {
        for triangle in triangles {
            self.draw_triangle(target, triangle);
        }
    }

    /// Project, outline, fill and composite a single triangle onto `target`.
    pub fn draw_triangle(&mut self, target: &mut Canvas, triangle: &VisibleTriangle) {
        let viewport = self.viewport();
        let glyph = shading_glyph(&triangle.normal);
        let [a, b, c] = triangle
            .vertices
            .map(|vertex| viewport.to_screen(&project(&vertex)));

        self.scratch.clear();
        draw_line(&mut self.scratch, a, b, glyph);
        draw_line(&mut self.scratch, b, c, glyph);
        draw_line(&mut self.scratch, c, a, glyph);
        fill_spans(&mut self.scratch, glyph);

        target.overlay(&self.scratch, glyph);
    }
}
