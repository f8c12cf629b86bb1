use crate::assets::{Shader, UniformLocations};
use crate::context::{RenderContext, Result};
use crate::lighting::shaders::{DEPTH_DEBUG_FS, DEPTH_DEBUG_VS};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use umbra_macros::UniformIndex;

#[repr(u8)]
#[derive(Copy, Clone, Debug, UniformIndex)]
pub enum DepthDebugUniformIndex {
    Near = 0,
    Far = 1,
}

#[derive(Debug)]
pub struct DepthDebugShader {
    pub shader: Shader,
    pub locations: UniformLocations<DepthDebugUniformIndex>,
}

/// Identity of a render context, its `Arc` allocation address.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct ContextKey(usize);

impl ContextKey {
    fn of(ctx: &Arc<dyn RenderContext>) -> Self {
        Self(Arc::as_ptr(ctx) as *const () as usize)
    }
}

#[derive(Debug, Default)]
struct ContextShaders {
    depth_debug: Option<DepthDebugShader>,
    users: usize,
}

/// Owner of shaders shared by every shadow map of a process.
///
/// Shadow maps hold a [`RegistryLease`] for their whole life. Shaders are built
/// per render context on first use and released once the last lease on that
/// context is gone.
#[derive(Debug, Clone, Default)]
pub struct ShaderRegistry {
    inner: Arc<Mutex<HashMap<ContextKey, ContextShaders>>>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(&self, ctx: &Arc<dyn RenderContext>) -> RegistryLease {
        let key = ContextKey::of(ctx);
        self.inner.lock().entry(key).or_default().users += 1;
        RegistryLease {
            registry: self.clone(),
            key,
        }
    }

    /// Leases held across all contexts.
    pub fn users(&self) -> usize {
        self.inner.lock().values().map(|shaders| shaders.users).sum()
    }

    pub fn users_of(&self, ctx: &Arc<dyn RenderContext>) -> usize {
        self.inner
            .lock()
            .get(&ContextKey::of(ctx))
            .map_or(0, |shaders| shaders.users)
    }

    /// Whether any context currently has the depth debug shader built.
    pub fn is_depth_debug_loaded(&self) -> bool {
        self.inner
            .lock()
            .values()
            .any(|shaders| shaders.depth_debug.is_some())
    }

    pub fn is_depth_debug_loaded_for(&self, ctx: &Arc<dyn RenderContext>) -> bool {
        self.inner
            .lock()
            .get(&ContextKey::of(ctx))
            .is_some_and(|shaders| shaders.depth_debug.is_some())
    }

    fn with_depth_debug<R>(
        &self,
        key: ContextKey,
        ctx: &Arc<dyn RenderContext>,
        f: impl FnOnce(&DepthDebugShader) -> R,
    ) -> Result<R> {
        let mut inner = self.inner.lock();
        let shaders = inner.entry(key).or_default();

        let debug_shader = match shaders.depth_debug.take() {
            Some(debug_shader) => shaders.depth_debug.insert(debug_shader),
            None => shaders.depth_debug.insert(Self::build_depth_debug(ctx)?),
        };

        Ok(f(debug_shader))
    }

    fn build_depth_debug(ctx: &Arc<dyn RenderContext>) -> Result<DepthDebugShader> {
        let shader = Shader::load(
            ctx,
            "Shadow Map Depth Debug",
            DEPTH_DEBUG_VS,
            DEPTH_DEBUG_FS,
        )?;
        let locations = UniformLocations::resolve(&shader);
        debug!("Built shared depth debug shader");

        Ok(DepthDebugShader { shader, locations })
    }

    fn release(&self, key: ContextKey) {
        let released = {
            let mut inner = self.inner.lock();
            let Some(shaders) = inner.get_mut(&key) else {
                return;
            };

            shaders.users = shaders.users.saturating_sub(1);
            if shaders.users == 0 {
                inner.remove(&key).and_then(|shaders| shaders.depth_debug)
            } else {
                None
            }
        };

        if released.is_some() {
            debug!("Released shared depth debug shader");
        }
    }
}

/// Keeps the shared shaders of one render context alive in a [`ShaderRegistry`].
#[derive(Debug)]
pub struct RegistryLease {
    registry: ShaderRegistry,
    key: ContextKey,
}

impl RegistryLease {
    pub fn registry(&self) -> &ShaderRegistry {
        &self.registry
    }

    /// Runs `f` with the depth debug shader of `ctx`, building it first if needed.
    ///
    /// `ctx` must be the context the lease was taken for.
    pub(crate) fn with_depth_debug<R>(
        &self,
        ctx: &Arc<dyn RenderContext>,
        f: impl FnOnce(&DepthDebugShader) -> R,
    ) -> Result<R> {
        self.registry.with_depth_debug(self.key, ctx, f)
    }
}

impl Drop for RegistryLease {
    fn drop(&mut self) {
        self.registry.release(self.key);
    }
}
