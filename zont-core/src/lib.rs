/// Zont Core Library - software rasterizer for shaded ASCII meshes
///
/// Loads OBJ meshes, spins them around the Y axis, culls faces with a fixed
/// viewer heuristic, sorts them back to front and rasterizes them into a
/// character grid that is streamed to a terminal at a fixed frame rate.

pub mod cache;
pub mod depth;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod obj;
pub mod pipeline;
pub mod projection;
pub mod raster;
pub mod session;
pub mod transform;

// Re-export commonly used types
pub use cache::RenderCache;
pub use error::{LoadError, ParseWarning, RenderError};
pub use frame::{LoopConfig, Shutdown, DEFAULT_FPS};
pub use geometry::{Mesh, Triangle, VisibleTriangle};
pub use obj::{load_mesh, parse_obj, LoadedMesh};
pub use projection::Viewport;
pub use raster::{Canvas, SHADING_RAMP};
pub use session::{AnimationStats, RenderSession};
pub use transform::RotationState;
