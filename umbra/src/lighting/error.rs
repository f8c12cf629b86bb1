use crate::context::ContextError;
use snafu::Snafu;

pub type Result<T, E = LightingError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum LightingError {
    #[snafu(display("ShadowMap: unable to create the depth atlas: {source}"))]
    ShadowMapResource { source: ContextError },

    #[snafu(display("ShadowMap: the {width}x{height} framebuffer is incomplete"))]
    IncompleteFramebuffer { width: u32, height: u32 },

    #[snafu(display("ShadowMap: unable to build the depth debug shader: {source}"))]
    DebugShader { source: ContextError },

    #[snafu(display("Lights3D: unable to build the lighting shader: {source}"))]
    LightingShader { source: ContextError },

    #[snafu(display("Lights3D: unable to build the shadow shader: {source}"))]
    ShadowShader { source: ContextError },

    #[snafu(display("Lights3D: at least one light slot is required"))]
    NoLightSlots,
}
