//! Low-resolution software rasterizer
//!
//! Features:
//! - Perspective projection with a deliberately degenerate mapping for
//!   points behind the camera (no near-plane clipping)
//! - Screen-space backface culling
//! - Flat-colored triangles, barycentric coverage test
//! - Z-buffer with nearest-wins, first-writer-wins pixel writes

mod camera;
mod math;
mod render;
mod types;

pub use camera::*;
pub use math::*;
pub use render::*;
pub use types::*;

/// Default output resolution
pub const WIDTH: usize = 96;
pub const HEIGHT: usize = 54;
