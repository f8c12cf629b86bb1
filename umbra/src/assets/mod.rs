//! GPU resource containers. Each owns one context object and releases it on drop.

mod shader;
mod texture;

pub use shader::*;
pub use texture::*;
