use crate::assets::{Shader, UniformLocations};
use crate::context::UniformValue;
use crate::lighting::settings::LightDesc;
use crate::lighting::shadow_map::ShadowMap;
use crate::scene::Camera3D;
use glamx::{Mat4, Vec3};
use std::ops::Deref;
use tracing::warn;
use umbra_macros::UniformIndex;
use umbra_utils::{Color, Rect};

/// Fields of one entry of the `lights` uniform array, in shader declaration order.
#[repr(u8)]
#[derive(Copy, Clone, Debug, UniformIndex)]
pub enum LightUniformIndex {
    Matrix = 0,
    Position = 1,
    Direction = 2,
    Color = 3,
    Cutoff = 4,
    Radius = 5,
    MapBounds = 6,
    Shadow = 7,
    Spotlight = 8,
    SpotSoftness = 9,
    Enabled = 10,
}

/// Handle to a light owned by a [`Lights3D`](crate::lighting::Lights3D).
///
/// The index is the light's slot in the shader's light array and never changes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub(crate) usize);

impl LightId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One light source and the caster camera its shadow is rendered from.
///
/// Every setter uploads its value to the light's slot of the lighting shader
/// right away. Lights only exist inside a `Lights3D`; mutate them through
/// [`LightMut`].
#[derive(Debug, Clone)]
pub struct Light3D {
    caster: Camera3D,
    color: Color,
    spot_softness: f32,
    radius: f32,
    spotlight: bool,
    enabled: bool,
    shadow: bool,
    bounds_map: Rect,
    slot: usize,
    locations: UniformLocations<LightUniformIndex>,
}

impl Light3D {
    pub(crate) fn new(shader: &Shader, slot: usize, desc: LightDesc, shadow: bool) -> Self {
        let locations = UniformLocations::resolve_prefixed(shader, &format!("lights[{slot}]."));

        let mut caster = desc.caster;
        caster.aspect = 1.0;

        let mut light = Self {
            caster,
            color: desc.color,
            spot_softness: desc.spot_softness,
            radius: desc.radius,
            spotlight: desc.spotlight,
            enabled: desc.enabled,
            shadow,
            bounds_map: Rect::ZERO,
            slot,
            locations,
        };

        light.send(shader, LightUniformIndex::Shadow, shadow);

        light.set_position(shader, caster.position, false);
        light.set_target(shader, caster.target, false);
        light.set_fovy(shader, caster.fovy, false);
        light.update_matrix(shader);

        light.set_color(shader, desc.color);
        light.set_radius(shader, desc.radius);
        light.set_spotlight_softness(shader, desc.spot_softness);
        light.set_spotlight(shader, desc.spotlight);
        light.set_active(shader, desc.enabled);

        light
    }

    #[inline]
    fn send(&self, shader: &Shader, field: LightUniformIndex, value: impl Into<UniformValue>) {
        self.locations.send(shader, field, value);
    }

    pub(crate) fn set_position(&mut self, shader: &Shader, position: Vec3, update_matrix: bool) {
        self.caster.position = position;
        self.send(shader, LightUniformIndex::Position, position);
        self.send(shader, LightUniformIndex::Direction, self.direction());
        if update_matrix {
            self.update_matrix(shader);
        }
    }

    pub(crate) fn set_target(&mut self, shader: &Shader, target: Vec3, update_matrix: bool) {
        self.caster.target = target;
        self.send(shader, LightUniformIndex::Direction, self.direction());
        if update_matrix {
            self.update_matrix(shader);
        }
    }

    pub(crate) fn set_fovy(&mut self, shader: &Shader, fovy: f32, update_matrix: bool) {
        self.caster.fovy = fovy;
        self.send(shader, LightUniformIndex::Cutoff, self.cutoff());
        if update_matrix {
            self.update_matrix(shader);
        }
    }

    pub(crate) fn update_matrix(&self, shader: &Shader) {
        self.send(shader, LightUniformIndex::Matrix, self.matrix());
    }

    /// Negative radii are clamped to zero, which disables attenuation.
    pub(crate) fn set_radius(&mut self, shader: &Shader, radius: f32) {
        self.radius = radius.max(0.);
        self.send(shader, LightUniformIndex::Radius, self.radius);
    }

    pub(crate) fn set_color(&mut self, shader: &Shader, color: Color) {
        self.color = color;
        self.send(shader, LightUniformIndex::Color, color.to_vec3());
    }

    pub(crate) fn set_spotlight_softness(&mut self, shader: &Shader, softness: f32) {
        self.spot_softness = softness;
        self.send(shader, LightUniformIndex::SpotSoftness, softness);
    }

    pub(crate) fn set_spotlight(&mut self, shader: &Shader, spotlight: bool) {
        self.spotlight = spotlight;
        self.send(shader, LightUniformIndex::Spotlight, spotlight);
    }

    pub(crate) fn set_active(&mut self, shader: &Shader, enabled: bool) {
        self.enabled = enabled;
        self.send(shader, LightUniformIndex::Enabled, enabled);
    }

    pub(crate) fn set_shadow_map_bounds(
        &mut self,
        shader: &Shader,
        bounds: Rect,
        atlas_width: f32,
        atlas_height: f32,
    ) {
        self.bounds_map = bounds;
        self.send(
            shader,
            LightUniformIndex::MapBounds,
            bounds.normalized(atlas_width, atlas_height),
        );
    }

    /// Opens the caster scope and the atlas pass. Refused while another pass is active.
    pub(crate) fn begin_shadow_cast(&self, shadow_map: &mut ShadowMap) -> bool {
        if shadow_map.is_active() {
            warn!(
                "Light #{} can't start a shadow cast while another one is active",
                self.slot
            );
            return false;
        }

        shadow_map.context().begin_mode_3d(&self.caster);
        shadow_map.begin(self.bounds_map)
    }

    /// Closes the pass only if it is this light's own.
    pub(crate) fn end_shadow_cast(&self, shadow_map: &mut ShadowMap) -> bool {
        if shadow_map.active_bounds() != Some(self.bounds_map) {
            return false;
        }

        shadow_map.end();
        shadow_map.context().end_mode_3d();
        true
    }

    /// Index into the shader's light array.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn id(&self) -> LightId {
        LightId(self.slot)
    }

    pub fn caster(&self) -> &Camera3D {
        &self.caster
    }

    pub fn position(&self) -> Vec3 {
        self.caster.position
    }

    pub fn target(&self) -> Vec3 {
        self.caster.target
    }

    pub fn fovy(&self) -> f32 {
        self.caster.fovy
    }

    pub fn direction(&self) -> Vec3 {
        self.caster.direction()
    }

    /// Cosine of the half cone angle.
    pub fn cutoff(&self) -> f32 {
        (self.caster.fovy.to_radians() * 0.5).cos()
    }

    /// View projection of the caster, the matrix shadow lookups are done with.
    pub fn matrix(&self) -> Mat4 {
        self.caster.view_projection()
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn spot_softness(&self) -> f32 {
        self.spot_softness
    }

    pub fn is_spotlight(&self) -> bool {
        self.spotlight
    }

    pub fn is_active(&self) -> bool {
        self.enabled
    }

    /// Fixed when the light is added.
    pub fn casts_shadow(&self) -> bool {
        self.shadow
    }

    /// Tile of the shadow atlas in pixels, zero sized for lights without shadows.
    pub fn shadow_map_bounds(&self) -> Rect {
        self.bounds_map
    }
}

/// Mutable access to one light together with the shared state it writes to.
///
/// Borrowed from [`Lights3D::light_mut`](crate::lighting::Lights3D::light_mut), so
/// it can't outlive the shader or shadow map it references.
pub struct LightMut<'a> {
    pub(crate) light: &'a mut Light3D,
    pub(crate) shader: &'a Shader,
    pub(crate) shadow_map: Option<&'a mut ShadowMap>,
}

impl Deref for LightMut<'_> {
    type Target = Light3D;

    fn deref(&self) -> &Self::Target {
        self.light
    }
}

impl LightMut<'_> {
    /// Moves the caster. Pass `update_matrix = false` when more changes follow and
    /// call [`LightMut::update_matrix`] once at the end.
    pub fn set_position(&mut self, position: Vec3, update_matrix: bool) -> &mut Self {
        self.light.set_position(self.shader, position, update_matrix);
        self
    }

    pub fn set_target(&mut self, target: Vec3, update_matrix: bool) -> &mut Self {
        self.light.set_target(self.shader, target, update_matrix);
        self
    }

    pub fn set_fovy(&mut self, fovy: f32, update_matrix: bool) -> &mut Self {
        self.light.set_fovy(self.shader, fovy, update_matrix);
        self
    }

    pub fn update_matrix(&mut self) -> &mut Self {
        self.light.update_matrix(self.shader);
        self
    }

    pub fn set_radius(&mut self, radius: f32) -> &mut Self {
        self.light.set_radius(self.shader, radius);
        self
    }

    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.light.set_color(self.shader, color);
        self
    }

    pub fn set_spotlight_softness(&mut self, softness: f32) -> &mut Self {
        self.light.set_spotlight_softness(self.shader, softness);
        self
    }

    pub fn set_spotlight(&mut self, spotlight: bool) -> &mut Self {
        self.light.set_spotlight(self.shader, spotlight);
        self
    }

    pub fn set_active(&mut self, enabled: bool) -> &mut Self {
        self.light.set_active(self.shader, enabled);
        self
    }

    /// Starts rendering depth from this light's point of view into its atlas tile.
    ///
    /// Returns `false` and does nothing if the light doesn't cast shadows or another
    /// shadow cast is still active.
    pub fn begin_shadow_cast(&mut self) -> bool {
        match self.shadow_map.as_deref_mut() {
            Some(shadow_map) if self.light.casts_shadow() => {
                self.light.begin_shadow_cast(shadow_map)
            }
            _ => {
                warn!("Light #{} doesn't cast shadows", self.light.slot());
                false
            }
        }
    }

    /// Ends this light's shadow cast. Returns `false` if it had none in progress.
    pub fn end_shadow_cast(&mut self) -> bool {
        match self.shadow_map.as_deref_mut() {
            Some(shadow_map) if self.light.casts_shadow() => {
                self.light.end_shadow_cast(shadow_map)
            }
            _ => false,
        }
    }
}
