//! Racing on a generated track

mod car;
mod coupling;

pub use car::*;
pub use coupling::*;
