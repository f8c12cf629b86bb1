//! Shadow mapped multi-light 3D lighting.
//!
//! ```no_run
//! use std::sync::Arc;
//! use umbra::context::{HeadlessContext, RenderContext};
//! use umbra::lighting::{LightDesc, Lights3D, LightsSettings, ShaderRegistry};
//! use umbra::scene::Camera3D;
//! use umbra::glamx::Vec3;
//!
//! let ctx: Arc<dyn RenderContext> = Arc::new(HeadlessContext::default());
//! let registry = ShaderRegistry::new();
//! let mut lights = Lights3D::with_settings(&ctx, &registry, LightsSettings::default())?;
//!
//! let caster = Camera3D::perspective(Vec3::new(4.0, 8.0, 4.0), Vec3::ZERO, 60.0);
//! let _sun = lights.add_shadow_light(LightDesc::new(caster));
//! # Ok::<(), umbra::lighting::LightingError>(())
//! ```

pub mod assets;
pub mod context;
pub mod lighting;
pub mod scene;

pub use lighting::{DrawPass, Light3D, LightDesc, LightId, Lights3D, ShadowCastPass, ShadowMap};
pub use umbra_utils::{Color, EngineArgs, Rect};

pub use ::glamx;
pub use ::tracing;
pub use ::umbra_utils;
