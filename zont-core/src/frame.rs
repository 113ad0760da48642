/// Double-buffered frame publishing and the fixed-rate terminal output loop
use crossterm::{cursor, queue};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::RenderError;
use crate::raster::Canvas;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 60;

/// Angle advanced per frame at the default frame rate, in radians.
pub const BASE_ANGLE_STEP: f64 = 0.03;

/// Angle advance per output frame; constant angular speed across frame rates.
pub fn angle_step(fps: u32) -> f64 {
    BASE_ANGLE_STEP * (f64::from(DEFAULT_FPS) / f64::from(fps))
}

/// Cooperative cancellation shared by the render and output loops.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Rotation angle shared between threads, stored as raw f64 bits.
#[derive(Debug, Default)]
pub struct AngleCell {
    bits: AtomicU64,
}

impl AngleCell {
    pub fn new(angle: f64) -> Self {
        Self {
            bits: AtomicU64::new(angle.to_bits()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn set(&self, angle: f64) {
        self.bits.store(angle.to_bits(), Ordering::Release);
    }

    /// Add `delta` and return the new angle.
    pub fn advance(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return f64::from_bits(next),
                Err(actual) => current = actual,
            }
        }
    }
}

/// The display half of the buffer pair.
///
/// The renderer owns its write canvas and swaps it in under the lock, so a
/// reader always sees a complete frame.
#[derive(Debug)]
pub struct FrontBuffer {
    display: Mutex<Canvas>,
    published: AtomicU64,
}

impl FrontBuffer {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            display: Mutex::new(canvas),
            published: AtomicU64::new(0),
        }
    }

    /// Swap a finished write canvas with the display canvas.
    ///
    /// Afterwards `write` holds the previous display frame; callers clear it
    /// before drawing the next one.
    pub fn publish(&self, write: &mut Canvas) {
        std::mem::swap(&mut *self.lock(), write);
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of frames published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Canvas {
        self.lock().clone()
    }

    /// Stream the current display frame, holding the lock while writing.
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.lock().draw(writer)
    }

    fn lock(&self) -> MutexGuard<'_, Canvas> {
        self.display.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Settings for the output loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub fps: u32,
    /// Stop after this many output frames; `None` runs until shutdown.
    pub frame_limit: Option<u64>,
}

impl LoopConfig {
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.fps == 0 {
            return Err(RenderError::ZeroFrameRate);
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

/// Fixed-rate output loop.
///
/// Each tick writes cursor-home plus the display frame, advances the angle
/// and sleeps for whatever remains of the frame budget. Ticks that overrun
/// the budget are followed immediately by the next one. Returns the number
/// of frames written.
pub fn run_output_loop<W: Write>(
    writer: &mut W,
    front: &FrontBuffer,
    angle: &AngleCell,
    config: LoopConfig,
    shutdown: &Shutdown,
) -> Result<u64, RenderError> {
    config.validate()?;
    let budget = config.frame_budget();
    let step = angle_step(config.fps);
    let mut shown = 0u64;

    while !shutdown.is_requested() {
        let frame_start = Instant::now();

        queue!(writer, cursor::MoveTo(0, 0))?;
        front.draw(writer)?;
        writer.flush()?;
        angle.advance(step);
        shown += 1;

        if config.frame_limit.is_some_and(|limit| shown >= limit) {
            tracing::debug!(frames = shown, "frame limit reached");
            shutdown.request();
            break;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }

    Ok(shown)
}
