use crate::assets::DepthTexture;
use crate::context::{ClearFlags, FramebufferId, RenderContext, TextureId};
use crate::lighting::registry::{DepthDebugUniformIndex, RegistryLease, ShaderRegistry};
use crate::lighting::{
    DebugShaderErr, IncompleteFramebufferErr, Result, ShadowMapResourceErr,
};
use snafu::ResultExt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};
use umbra_utils::{Color, Rect};
use wgpu::{AddressMode, Face};

/// Depth-only render target shared by every shadow casting light.
///
/// Written between [`ShadowMap::begin`] and [`ShadowMap::end`], sampled by the
/// lighting shader the rest of the time. Nesting `begin` calls is not supported.
pub struct ShadowMap {
    depth: DepthTexture,
    framebuffer: FramebufferId,
    previous_viewport: Rect,
    active_bounds: Option<Rect>,
    ctx: Arc<dyn RenderContext>,
    lease: RegistryLease,
}

impl Debug for ShadowMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowMap")
            .field("depth", &self.depth)
            .field("framebuffer", &self.framebuffer)
            .field("active_bounds", &self.active_bounds)
            .finish_non_exhaustive()
    }
}

impl ShadowMap {
    pub fn new(
        ctx: &Arc<dyn RenderContext>,
        registry: &ShaderRegistry,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let depth = DepthTexture::new(ctx, width, height).context(ShadowMapResourceErr)?;
        ctx.set_texture_wrap(
            depth.id(),
            AddressMode::ClampToEdge,
            AddressMode::ClampToEdge,
        );

        let framebuffer = ctx
            .load_framebuffer(width, height)
            .context(ShadowMapResourceErr)?;

        if let Err(e) = ctx.attach_depth_texture(framebuffer, depth.id()) {
            ctx.unload_framebuffer(framebuffer);
            return Err(e).context(ShadowMapResourceErr);
        }

        if !ctx.framebuffer_complete(framebuffer) {
            ctx.unload_framebuffer(framebuffer);
            return IncompleteFramebufferErr { width, height }.fail();
        }

        ctx.disable_framebuffer();
        debug!("Created {width}x{height} shadow map");

        Ok(Self {
            depth,
            framebuffer,
            previous_viewport: Rect::ZERO,
            active_bounds: None,
            ctx: ctx.clone(),
            lease: registry.lease(ctx),
        })
    }

    /// Starts rendering depth into `bounds`, a tile of this map in pixels.
    ///
    /// Returns `false` without touching any state if a pass is already active.
    pub fn begin(&mut self, bounds: Rect) -> bool {
        if self.active_bounds.is_some() {
            warn!("ShadowMap::begin called while a shadow pass is already active");
            return false;
        }

        self.ctx.flush_batch();
        self.ctx.enable_framebuffer(self.framebuffer);
        self.ctx.enable_scissor(bounds);

        self.previous_viewport = self.ctx.viewport();
        self.ctx.set_viewport(bounds);

        // front face culling keeps lit surfaces from shadowing themselves
        self.ctx.set_cull_face(Face::Front);
        self.ctx.set_color_blend(false);

        self.active_bounds = Some(bounds);
        true
    }

    /// Ends the active pass. Returns `false` if there was none.
    pub fn end(&mut self) -> bool {
        if self.active_bounds.is_none() {
            return false;
        }

        self.ctx.set_color_blend(true);
        self.ctx.unbind_texture();
        self.ctx.disable_scissor();
        self.ctx.flush_batch();
        self.ctx.disable_framebuffer();
        self.ctx.set_viewport(self.previous_viewport);
        self.ctx.set_cull_face(Face::Back);

        self.active_bounds = None;
        true
    }

    /// Resets the depth to the far plane.
    ///
    /// Outside of a pass this binds the whole map for the clear, then restores the
    /// viewport and returns to the default framebuffer. A framebuffer the caller
    /// had bound stays unbound.
    pub fn clear(&mut self) {
        if self.active_bounds.is_some() {
            self.ctx.clear(ClearFlags::DEPTH, Color::WHITE);
            return;
        }

        self.ctx.flush_batch();
        let previous_viewport = self.ctx.viewport();

        self.ctx.enable_framebuffer(self.framebuffer);
        self.ctx.set_viewport(self.bounds());
        self.ctx.clear(ClearFlags::DEPTH, Color::WHITE);

        self.ctx.disable_framebuffer();
        self.ctx.set_viewport(previous_viewport);
    }

    /// Draws the linearized depth into `dst` for debugging.
    pub fn draw(&self, dst: Rect, near: f32, far: f32) -> Result<()> {
        let ctx = &self.ctx;
        let source = Rect::new(0.0, 0.0, self.width() as f32, -(self.height() as f32));

        self.lease
            .with_depth_debug(ctx, |debug_shader| {
                let shader = &debug_shader.shader;
                ctx.begin_shader(shader.id());
                debug_shader
                    .locations
                    .send(shader, DepthDebugUniformIndex::Near, near);
                debug_shader
                    .locations
                    .send(shader, DepthDebugUniformIndex::Far, far);
                ctx.draw_texture_rect(self.depth.id(), source, dst, Color::WHITE);
                ctx.end_shader();
            })
            .context(DebugShaderErr)
    }

    pub fn is_active(&self) -> bool {
        self.active_bounds.is_some()
    }

    /// Tile of the pass in progress, if any.
    pub fn active_bounds(&self) -> Option<Rect> {
        self.active_bounds
    }

    pub fn width(&self) -> u32 {
        self.depth.width()
    }

    pub fn height(&self) -> u32 {
        self.depth.height()
    }

    /// The whole map in pixels.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width() as f32, self.height() as f32)
    }

    pub fn texture_id(&self) -> TextureId {
        self.depth.id()
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    pub fn context(&self) -> &Arc<dyn RenderContext> {
        &self.ctx
    }
}

impl Drop for ShadowMap {
    fn drop(&mut self) {
        if self.is_active() {
            warn!("Shadow map dropped during an active shadow pass");
            self.end();
        }
        self.ctx.unload_framebuffer(self.framebuffer);
    }
}
