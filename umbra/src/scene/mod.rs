//! Scene data the lighting subsystem draws but doesn't own.

mod camera;
mod model;

pub use camera::*;
pub use model::*;
