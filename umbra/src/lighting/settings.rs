use crate::scene::Camera3D;
use bon::Builder;
use umbra_utils::{Color, EngineArgs};

/// Construction parameters of a [`Lights3D`](crate::lighting::Lights3D).
#[derive(Debug, Copy, Clone, PartialEq, Builder)]
pub struct LightsSettings {
    /// Length of the shader's light array
    #[builder(default = 8)]
    pub max_lights: usize,
    /// Side of the square shadow atlas in pixels, 0 disables shadows
    #[builder(default = 1024)]
    pub buffer_size: u32,
    #[builder(default = LightsSettings::DEFAULT_AMBIENT)]
    pub ambient: Color,
}

impl Default for LightsSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LightsSettings {
    pub const DEFAULT_AMBIENT: Color = Color::new(40, 40, 40, 255);

    /// Defaults with the process' command line overrides applied.
    pub fn from_args() -> Self {
        Self::default().with_args(EngineArgs::get())
    }

    pub fn with_args(mut self, args: &EngineArgs) -> Self {
        self.buffer_size = args.shadow_map_size_or(self.buffer_size);
        if let Some(max_lights) = args.max_lights {
            self.max_lights = max_lights;
        }
        self
    }
}

/// Everything needed to add a light. The caster's aspect ratio is forced to 1.
#[derive(Debug, Copy, Clone, PartialEq, Builder)]
pub struct LightDesc {
    pub caster: Camera3D,
    #[builder(default = Color::WHITE)]
    pub color: Color,
    /// Fraction of the cone that fades out, in `0..=1`
    #[builder(default = 0.65)]
    pub spot_softness: f32,
    /// Distance at which the light fades out completely, 0 for no falloff
    #[builder(default = 0.0)]
    pub radius: f32,
    #[builder(default = false)]
    pub spotlight: bool,
    #[builder(default = true)]
    pub enabled: bool,
}

impl LightDesc {
    pub fn new(caster: Camera3D) -> Self {
        Self::builder().caster(caster).build()
    }
}
