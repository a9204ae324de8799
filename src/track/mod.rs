//! Procedural race tracks
//!
//! Generation, the segment ring with its meshes, point location on the
//! ring, and shareable track codes.

mod code;
mod generator;
mod heightmap;
mod locate;
mod race_track;

pub use code::*;
pub use generator::*;
pub use heightmap::*;
pub use locate::*;
pub use race_track::*;
