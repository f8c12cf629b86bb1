use crate::context::{RenderContext, Result, ShaderId, UniformLocation, UniformValue};
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;
use umbra_utils::ShaderUniformIndex;

/// A linked shader program. Unloaded from its context when dropped.
pub struct Shader {
    id: ShaderId,
    name: String,
    ctx: Arc<dyn RenderContext>,
}

impl Debug for Shader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Shader {
    pub fn load(
        ctx: &Arc<dyn RenderContext>,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<Self> {
        let id = ctx.load_shader(name, vertex, fragment)?;
        Ok(Self {
            id,
            name: name.to_string(),
            ctx: ctx.clone(),
        })
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Arc<dyn RenderContext> {
        &self.ctx
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.ctx.uniform_location(self.id, name)
    }

    /// Uploads `value`. Missing locations are ignored, like GL does for `-1`.
    #[inline]
    pub fn set(&self, location: Option<UniformLocation>, value: impl Into<UniformValue>) {
        if let Some(location) = location {
            self.ctx.set_uniform(self.id, location, value.into());
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        trace!("Unloading shader '{}'", self.name);
        self.ctx.unload_shader(self.id);
    }
}

/// Uniform locations of one shader interface, resolved once for every variant of `I`.
#[derive(Debug, Clone)]
pub struct UniformLocations<I: ShaderUniformIndex> {
    locations: SmallVec<[Option<UniformLocation>; 16]>,

    _indexer: PhantomData<I>,
}

impl<I: ShaderUniformIndex> UniformLocations<I> {
    pub fn resolve(shader: &Shader) -> Self {
        Self::resolve_prefixed(shader, "")
    }

    /// Resolves `{prefix}{uniform_name}` for every variant, e.g. `lights[2].` + `position`.
    pub fn resolve_prefixed(shader: &Shader, prefix: &str) -> Self {
        let locations = I::all()
            .map(|field| {
                let name = format!("{prefix}{}", field.uniform_name());
                let location = shader.location(&name);
                if location.is_none() {
                    trace!("{} uniform '{name}' is not used by '{}'", I::name(), shader.name());
                }
                location
            })
            .collect();

        Self {
            locations,
            _indexer: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, field: I) -> Option<UniformLocation> {
        self.locations.get(field.index()).copied().flatten()
    }

    #[inline]
    pub fn send(&self, shader: &Shader, field: I, value: impl Into<UniformValue>) {
        shader.set(self.get(field), value);
    }
}
