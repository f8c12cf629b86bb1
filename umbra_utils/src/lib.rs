pub mod color;
mod engine_args;
mod logging;
mod rect;

pub use color::Color;
pub use engine_args::EngineArgs;
pub use rect::Rect;

pub use tracing;

use std::fmt::Debug;

/// Trait implemented by closed enums naming the uniforms of one shader interface.
///
/// Usually derived with `#[derive(UniformIndex)]`, which maps every variant to its
/// lowerCamelCase GLSL name unless overridden with `#[uniform(name = "...")]`.
pub trait ShaderUniformIndex: Debug + Copy + Sized + 'static {
    const MAX: usize;
    fn index(&self) -> usize;
    fn by_index(index: usize) -> Option<Self>;
    fn name() -> &'static str;
    fn uniform_name(&self) -> &'static str;

    fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX).filter_map(Self::by_index)
    }
}
