//! The graphics context contract the lighting subsystem draws through.
//!
//! A [`RenderContext`] is a device-like handle: every method takes `&self` and the
//! context is shared as an `Arc<dyn RenderContext>` between the resources that
//! need to release GPU objects when they are dropped. State changes are ordered
//! exactly as they are issued, the way a GL command stream would be.
//!
//! [`HeadlessContext`] is a complete backend that records state instead of
//! submitting it to a driver.

mod error;
mod headless;

pub use error::*;
pub use headless::*;

use crate::scene::{Camera3D, Material, Mesh};
use bitflags::bitflags;
use glamx::{Mat4, Vec2, Vec3, Vec4};
use slotmap::new_key_type;
use umbra_utils::{Color, Rect};
use wgpu::{AddressMode, Face};

new_key_type! {
    pub struct ShaderId;
    pub struct TextureId;
    pub struct FramebufferId;
    pub struct MeshId;
}

/// Location of a single uniform inside a linked shader program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Sampler(TextureId),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

impl From<TextureId> for UniformValue {
    fn from(value: TextureId) -> Self {
        UniformValue::Sampler(value)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1;
        const DEPTH = 1 << 1;
    }
}

pub trait RenderContext: Send + Sync {
    fn load_framebuffer(&self, width: u32, height: u32) -> Result<FramebufferId>;
    fn attach_depth_texture(&self, framebuffer: FramebufferId, texture: TextureId) -> Result<()>;
    fn framebuffer_complete(&self, framebuffer: FramebufferId) -> bool;
    fn enable_framebuffer(&self, framebuffer: FramebufferId);
    /// Returns rendering to the default framebuffer.
    fn disable_framebuffer(&self);
    fn unload_framebuffer(&self, framebuffer: FramebufferId);

    /// Allocates a depth-only texture that can be attached to a framebuffer and sampled.
    fn load_depth_texture(&self, width: u32, height: u32) -> Result<TextureId>;
    fn set_texture_wrap(&self, texture: TextureId, wrap_u: AddressMode, wrap_v: AddressMode);
    fn unbind_texture(&self);
    fn unload_texture(&self, texture: TextureId);

    fn enable_scissor(&self, rect: Rect);
    fn disable_scissor(&self);
    fn viewport(&self) -> Rect;
    fn set_viewport(&self, rect: Rect);
    /// Selects which faces get culled.
    fn set_cull_face(&self, face: Face);
    fn set_color_blend(&self, enabled: bool);
    fn clear(&self, flags: ClearFlags, color: Color);
    /// Submits every draw recorded under the current state before the state changes.
    fn flush_batch(&self);

    fn load_shader(&self, name: &str, vertex: &str, fragment: &str) -> Result<ShaderId>;
    fn unload_shader(&self, shader: ShaderId);
    fn uniform_location(&self, shader: ShaderId, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, shader: ShaderId, location: UniformLocation, value: UniformValue);
    fn begin_shader(&self, shader: ShaderId);
    fn end_shader(&self);

    fn load_mesh(&self, vertex_count: u32) -> Result<MeshId>;
    fn unload_mesh(&self, mesh: MeshId);
    /// Makes the camera's view and projection current until [`RenderContext::end_mode_3d`].
    fn begin_mode_3d(&self, camera: &Camera3D);
    fn end_mode_3d(&self);
    fn draw_mesh(&self, mesh: &Mesh, material: &Material, transform: Mat4);
    fn draw_texture_rect(&self, texture: TextureId, source: Rect, dest: Rect, tint: Color);
}
