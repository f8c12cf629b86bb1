use snafu::Snafu;

pub type Result<T, E = ContextError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum ContextError {
    #[snafu(display("Shader '{name}' failed to compile: {log}"))]
    ShaderCompile { name: String, log: String },

    #[snafu(display("Texture of {width}x{height} exceeds the device limit of {max}"))]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[snafu(display("Texture size {width}x{height} is invalid"))]
    InvalidTextureSize { width: u32, height: u32 },

    #[snafu(display("Framebuffer of {width}x{height} could not be created"))]
    FramebufferCreate { width: u32, height: u32 },

    #[snafu(display("The {kind} handle is unknown to this context"))]
    UnknownHandle { kind: &'static str },
}
