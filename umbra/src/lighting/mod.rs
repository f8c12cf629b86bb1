//! Multi-light forward lighting with atlas packed shadow maps.
//!
//! [`Lights3D`] owns the lighting shader and every [`Light3D`]. Lights that
//! cast shadows get a tile of one shared [`ShadowMap`]; shaders shared between
//! shadow maps live in a [`ShaderRegistry`].

mod error;
mod light;
mod manager;
mod pass;
mod registry;
mod settings;
mod shadow_map;

pub mod shaders;

pub use error::*;
pub use light::*;
pub use manager::*;
pub use pass::*;
pub use registry::*;
pub use settings::*;
pub use shadow_map::*;
