use crate::assets::{Shader, UniformLocations};
use crate::context::RenderContext;
use crate::lighting::light::{Light3D, LightId, LightMut};
use crate::lighting::pass::ShadowCastPass;
use crate::lighting::settings::{LightDesc, LightsSettings};
use crate::lighting::shaders::{LIGHTING_VS, SHADOW_FS, SHADOW_VS, lighting_fs};
use crate::lighting::shadow_map::ShadowMap;
use crate::lighting::{
    LightingShaderErr, NoLightSlotsErr, Result, ShaderRegistry, ShadowShaderErr,
};
use crate::scene::{Camera3D, Model, model_transform};
use glamx::{Vec2, Vec3};
use snafu::{ResultExt, ensure};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};
use umbra_macros::UniformIndex;
use umbra_utils::{Color, Rect, debug_panic};

#[repr(u8)]
#[derive(Copy, Clone, Debug, UniformIndex)]
pub enum SceneUniformIndex {
    ViewPos = 0,
    #[uniform(name = "texture6")]
    HeightMap = 1,
    ShadowMap = 2,
    Ambient = 3,
    ShadowMapTexelSize = 4,
    UseSpecularMap = 5,
    UseNormalMap = 6,
    UseHeightMap = 7,
}

/// Owner of the lighting shader, the shadow atlas and every light drawn with them.
///
/// A frame goes through [`Lights3D::update`], which hands out a
/// [`ShadowCastPass`] for the depth pass, and [`ShadowCastPass::finish`], which
/// turns it into a [`DrawPass`](crate::lighting::DrawPass) for the lit pass.
///
/// Shadow casting lights share one square atlas. Every time one is added the atlas
/// is split into `buffer_size / next_power_of_two(shadow_lights)` sized tiles and
/// all shadow lights are packed again, row by row from the top left corner.
pub struct Lights3D {
    lights: Vec<Light3D>,
    max_lights: usize,
    shadow_light_count: usize,
    shadow_tile_size: u32,
    ambient: Color,
    locations: UniformLocations<SceneUniformIndex>,
    shadow_map: Option<ShadowMap>,
    shadow_shader: Option<Shader>,
    shader: Shader,
    ctx: Arc<dyn RenderContext>,
}

impl Debug for Lights3D {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lights3D")
            .field("lights", &self.lights.len())
            .field("max_lights", &self.max_lights)
            .field("shadow_light_count", &self.shadow_light_count)
            .field("shadow_tile_size", &self.shadow_tile_size)
            .field("shadow_map", &self.shadow_map)
            .finish_non_exhaustive()
    }
}

impl Lights3D {
    pub fn new(
        ctx: &Arc<dyn RenderContext>,
        registry: &ShaderRegistry,
        ambient: Color,
        max_lights: usize,
        buffer_size: u32,
    ) -> Result<Self> {
        let settings = LightsSettings::builder()
            .ambient(ambient)
            .max_lights(max_lights)
            .buffer_size(buffer_size)
            .build();
        Self::with_settings(ctx, registry, settings)
    }

    /// Same as [`Lights3D::new`] with a gray ambient of the given `0..=1` intensity.
    pub fn with_ambient_intensity(
        ctx: &Arc<dyn RenderContext>,
        registry: &ShaderRegistry,
        ambient: f32,
        max_lights: usize,
        buffer_size: u32,
    ) -> Result<Self> {
        Self::new(
            ctx,
            registry,
            Color::from_intensity(ambient),
            max_lights,
            buffer_size,
        )
    }

    pub fn with_settings(
        ctx: &Arc<dyn RenderContext>,
        registry: &ShaderRegistry,
        settings: LightsSettings,
    ) -> Result<Self> {
        let LightsSettings {
            max_lights,
            buffer_size,
            ambient,
        } = settings;

        ensure!(max_lights > 0, NoLightSlotsErr);

        let shader = Shader::load(
            ctx,
            "Lights3D Lighting",
            LIGHTING_VS,
            &lighting_fs(max_lights),
        )
        .context(LightingShaderErr)?;

        let (shadow_map, shadow_shader) = if buffer_size > 0 {
            let shadow_map = ShadowMap::new(ctx, registry, buffer_size, buffer_size)?;
            let shadow_shader = Shader::load(ctx, "Lights3D Shadow", SHADOW_VS, SHADOW_FS)
                .context(ShadowShaderErr)?;
            (Some(shadow_map), Some(shadow_shader))
        } else {
            debug!("Shadows are disabled, no shadow atlas was allocated");
            (None, None)
        };

        let locations = UniformLocations::resolve(&shader);

        let mut lights = Self {
            lights: Vec::with_capacity(max_lights),
            max_lights,
            shadow_light_count: 0,
            shadow_tile_size: 0,
            ambient,
            locations,
            shadow_map,
            shadow_shader,
            shader,
            ctx: ctx.clone(),
        };
        lights.set_ambient(ambient);

        debug!("Created lighting for {max_lights} lights with a {buffer_size}px shadow atlas");

        Ok(lights)
    }

    /// Adds a light without a shadow. Returns `None` when every slot is taken.
    pub fn add_light(&mut self, desc: LightDesc) -> Option<LightId> {
        self.push_light(desc, false)
    }

    /// Adds a light that renders a shadow into its own atlas tile.
    ///
    /// Without a shadow atlas the light is added as a regular light; check
    /// [`Light3D::casts_shadow`] if that matters.
    pub fn add_shadow_light(&mut self, desc: LightDesc) -> Option<LightId> {
        if self.shadow_map.is_none() {
            warn!("Lights3D has no shadow atlas, adding the shadow light as a regular light");
            return self.add_light(desc);
        }

        let id = self.push_light(desc, true)?;
        self.shadow_light_count += 1;
        self.repack_shadow_tiles();

        Some(id)
    }

    fn push_light(&mut self, desc: LightDesc, shadow: bool) -> Option<LightId> {
        if self.lights.len() >= self.max_lights {
            warn!("Lights3D is full, all {} light slots are taken", self.max_lights);
            return None;
        }

        let slot = self.lights.len();
        self.lights
            .push(Light3D::new(&self.shader, slot, desc, shadow));

        Some(LightId(slot))
    }

    fn repack_shadow_tiles(&mut self) {
        let Some(shadow_map) = &self.shadow_map else {
            return;
        };

        let atlas_width = shadow_map.width();
        let atlas_height = shadow_map.height();
        let divisions = self.shadow_light_count.next_power_of_two() as u32;
        let tile = atlas_width / divisions;
        self.shadow_tile_size = tile;

        if tile == 0 {
            warn!(
                "{} shadow lights don't fit a {atlas_width}px shadow atlas, their tiles are empty",
                self.shadow_light_count
            );
        }

        let mut x = 0;
        let mut y = 0;
        let mut packed = 0;
        for light in self.lights.iter_mut().filter(|l| l.casts_shadow()) {
            if x + tile > atlas_width {
                x = 0;
                y += tile;
            }

            let bounds = Rect::new(x as f32, y as f32, tile as f32, tile as f32);
            light.set_shadow_map_bounds(
                &self.shader,
                bounds,
                atlas_width as f32,
                atlas_height as f32,
            );

            x += tile;
            packed += 1;
        }

        if packed != self.shadow_light_count {
            debug_panic!(
                "Packed {packed} shadow tiles for {} shadow lights",
                self.shadow_light_count
            );
        }

        let texel_size = Vec2::new(1.0 / atlas_width as f32, 1.0 / atlas_height as f32);
        self.locations.send(
            &self.shader,
            SceneUniformIndex::ShadowMapTexelSize,
            texel_size,
        );

        debug!(
            "Packed {} shadow lights into {tile}px tiles",
            self.shadow_light_count
        );
    }

    /// Starts a frame: uploads the view position and clears the shadow atlas.
    #[profiling::function]
    pub fn update(&mut self, camera: &Camera3D) -> ShadowCastPass<'_> {
        self.locations
            .send(&self.shader, SceneUniformIndex::ViewPos, camera.position);

        if let Some(shadow_map) = &mut self.shadow_map {
            shadow_map.clear();
        }

        ShadowCastPass::new(self)
    }

    #[profiling::function]
    pub(crate) fn shadow_cast_model(
        &mut self,
        model: &mut Model,
        position: Vec3,
        rotation_axis: Vec3,
        rotation_angle: f32,
        scale: Vec3,
    ) {
        let (Some(shadow_map), Some(shadow_shader)) = (&mut self.shadow_map, &self.shadow_shader)
        else {
            return;
        };

        let transform = model_transform(position, rotation_axis, rotation_angle, scale)
            * model.transform;
        let ctx = &self.ctx;

        for light in self
            .lights
            .iter()
            .filter(|l| l.is_active() && l.casts_shadow())
        {
            if !light.begin_shadow_cast(shadow_map) {
                continue;
            }

            model.for_each_mesh_mut(|mesh, material| {
                let material_shader = material.shader;
                material.shader = shadow_shader.id();
                ctx.draw_mesh(mesh, material, transform);
                material.shader = material_shader;
            });

            light.end_shadow_cast(shadow_map);
        }
    }

    #[profiling::function]
    pub(crate) fn draw_model(
        &self,
        model: &mut Model,
        position: Vec3,
        rotation_axis: Vec3,
        rotation_angle: f32,
        scale: Vec3,
        tint: Color,
    ) {
        let transform = model_transform(position, rotation_axis, rotation_angle, scale)
            * model.transform;

        if let Some(shadow_map) = &self.shadow_map {
            self.locations.send(
                &self.shader,
                SceneUniformIndex::ShadowMap,
                shadow_map.texture_id(),
            );
        }

        model.for_each_mesh_mut(|mesh, material| {
            let maps = material.maps;
            self.locations.send(
                &self.shader,
                SceneUniformIndex::UseSpecularMap,
                maps.specular.has_texture(),
            );
            self.locations.send(
                &self.shader,
                SceneUniformIndex::UseNormalMap,
                maps.normal.has_texture(),
            );
            self.locations.send(
                &self.shader,
                SceneUniformIndex::UseHeightMap,
                maps.height.has_texture(),
            );
            if maps.height.has_texture() {
                self.locations.send(
                    &self.shader,
                    SceneUniformIndex::HeightMap,
                    maps.height.texture,
                );
            }

            let material_shader = material.shader;
            let diffuse = material.maps.diffuse.color;

            material.shader = self.shader.id();
            material.maps.diffuse.color = diffuse.tinted(tint);
            self.ctx.draw_mesh(mesh, material, transform);

            material.maps.diffuse.color = diffuse;
            material.shader = material_shader;
        });
    }

    /// Draws the shadow atlas into `dst` for debugging. Does nothing without one.
    pub fn draw_shadow_map(&self, dst: Rect, near: f32, far: f32) -> Result<()> {
        match &self.shadow_map {
            Some(shadow_map) => shadow_map.draw(dst, near, far),
            None => Ok(()),
        }
    }

    pub fn light(&self, id: LightId) -> Option<&Light3D> {
        self.lights.get(id.0)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<LightMut<'_>> {
        let light = self.lights.get_mut(id.0)?;
        Some(LightMut {
            light,
            shader: &self.shader,
            shadow_map: self.shadow_map.as_mut(),
        })
    }

    pub fn lights(&self) -> &[Light3D] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn max_lights(&self) -> usize {
        self.max_lights
    }

    pub fn shadow_light_count(&self) -> usize {
        self.shadow_light_count
    }

    /// Side of one atlas tile in pixels, 0 until a shadow light is added.
    pub fn shadow_tile_size(&self) -> u32 {
        self.shadow_tile_size
    }

    pub fn shadow_map(&self) -> Option<&ShadowMap> {
        self.shadow_map.as_ref()
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: Color) {
        self.ambient = ambient;
        self.locations
            .send(&self.shader, SceneUniformIndex::Ambient, ambient.to_vec4());
    }

    /// The lighting shader every lit model is drawn with.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    pub fn context(&self) -> &Arc<dyn RenderContext> {
        &self.ctx
    }
}
