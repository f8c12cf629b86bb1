use crate::lighting::{Lights3D, Result};
use crate::scene::Model;
use glamx::Vec3;
use umbra_utils::{Color, Rect};

/// The depth pass of a frame, handed out by [`Lights3D::update`].
///
/// Every model that should throw a shadow goes through
/// [`ShadowCastPass::shadow_cast_model`] before the pass is finished.
#[must_use = "finish the shadow pass to draw lit models"]
#[derive(Debug)]
pub struct ShadowCastPass<'a> {
    lights: &'a mut Lights3D,
}

impl<'a> ShadowCastPass<'a> {
    pub(crate) fn new(lights: &'a mut Lights3D) -> Self {
        Self { lights }
    }

    /// Renders `model` into the atlas tile of every enabled shadow casting light.
    pub fn shadow_cast_model(
        &mut self,
        model: &mut Model,
        position: Vec3,
        rotation_axis: Vec3,
        rotation_angle: f32,
        scale: Vec3,
    ) -> &mut Self {
        self.lights
            .shadow_cast_model(model, position, rotation_axis, rotation_angle, scale);
        self
    }

    pub fn lights(&self) -> &Lights3D {
        &*self.lights
    }

    pub fn finish(self) -> DrawPass<'a> {
        DrawPass {
            lights: self.lights,
        }
    }
}

/// The lit pass of a frame. Models drawn here sample the shadows cast before.
#[derive(Debug)]
pub struct DrawPass<'a> {
    lights: &'a mut Lights3D,
}

impl DrawPass<'_> {
    /// Draws `model` with the lighting shader, its diffuse color multiplied by `tint`.
    pub fn draw_model(
        &mut self,
        model: &mut Model,
        position: Vec3,
        rotation_axis: Vec3,
        rotation_angle: f32,
        scale: Vec3,
        tint: Color,
    ) -> &mut Self {
        self.lights.draw_model(
            model,
            position,
            rotation_axis,
            rotation_angle,
            scale,
            tint,
        );
        self
    }

    pub fn draw_shadow_map(&self, dst: Rect, near: f32, far: f32) -> Result<()> {
        self.lights.draw_shadow_map(dst, near, far)
    }

    pub fn lights(&self) -> &Lights3D {
        &*self.lights
    }
}
