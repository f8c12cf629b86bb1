use crate::context::{RenderContext, Result, TextureId};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A depth-only texture. Unloaded from its context when dropped.
pub struct DepthTexture {
    id: TextureId,
    width: u32,
    height: u32,
    ctx: Arc<dyn RenderContext>,
}

impl Debug for DepthTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthTexture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl DepthTexture {
    pub fn new(ctx: &Arc<dyn RenderContext>, width: u32, height: u32) -> Result<Self> {
        let id = ctx.load_depth_texture(width, height)?;
        Ok(Self {
            id,
            width,
            height,
            ctx: ctx.clone(),
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for DepthTexture {
    fn drop(&mut self) {
        self.ctx.unload_texture(self.id);
    }
}
