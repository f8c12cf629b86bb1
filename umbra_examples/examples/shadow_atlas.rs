//! Lights a small scene with three shadow casting lights and a fill light.
//!
//! Runs on the headless context and logs what a GPU backend would have been asked
//! to do. Try `--max-lights 2` or `--no-shadows`, and `RUST_LOG=debug` for more.

use itertools::Itertools;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use umbra::context::{DrawCall, HeadlessContext, RenderContext};
use umbra::glamx::Vec3;
use umbra::lighting::{LightDesc, Lights3D, LightsSettings, ShaderRegistry};
use umbra::scene::{Camera3D, Material, Mesh, Model};
use umbra::tracing::{info, warn};
use umbra::{Color, Rect};

const FRAMES: usize = 3;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let headless = Arc::new(HeadlessContext::new(1280, 720));
    let ctx: Arc<dyn RenderContext> = headless.clone();
    let registry = ShaderRegistry::new();

    let mut lights = Lights3D::with_settings(&ctx, &registry, LightsSettings::from_args())?;

    let suns = [
        Vec3::new(-6.0, 8.0, 4.0),
        Vec3::new(6.0, 8.0, 4.0),
        Vec3::new(0.0, 10.0, -6.0),
    ];
    for position in suns {
        let desc = LightDesc::builder()
            .caster(Camera3D::perspective(position, Vec3::ZERO, 70.0))
            .radius(30.0)
            .spotlight(true)
            .build();
        if lights.add_shadow_light(desc).is_none() {
            warn!("No slot left for the light at {position}");
        }
    }

    let fill = LightDesc::builder()
        .caster(Camera3D::perspective(Vec3::new(0.0, 3.0, 8.0), Vec3::ZERO, 90.0))
        .color(Color::new(90, 110, 160, 255))
        .build();
    let fill = lights.add_light(fill);

    for light in lights.lights() {
        info!(
            "Light #{} shadow: {}, tile: {:?}",
            light.slot(),
            light.casts_shadow(),
            light.shadow_map_bounds()
        );
    }

    let mut floor = Model::from_mesh(Mesh::load(ctx.as_ref(), 6)?, Material::default());
    let mut crate_model = Model::from_mesh(Mesh::load(ctx.as_ref(), 36)?, Material::default());

    let camera = Camera3D::perspective(Vec3::new(0.0, 6.0, 12.0), Vec3::ZERO, 45.0)
        .with_aspect(1280.0 / 720.0);

    for frame in 0..FRAMES {
        let angle = frame as f32 * 30.0;

        if let Some(fill) = fill
            && let Some(mut fill) = lights.light_mut(fill)
        {
            fill.set_active(frame % 2 == 0);
        }

        let mut shadows = lights.update(&camera);
        shadows.shadow_cast_model(&mut crate_model, Vec3::Y, Vec3::Y, angle, Vec3::ONE);

        let mut draw = shadows.finish();
        ctx.begin_mode_3d(&camera);
        draw.draw_model(
            &mut floor,
            Vec3::ZERO,
            Vec3::ZERO,
            0.0,
            Vec3::new(20.0, 1.0, 20.0),
            Color::WHITE,
        );
        draw.draw_model(
            &mut crate_model,
            Vec3::Y,
            Vec3::Y,
            angle,
            Vec3::ONE,
            Color::new(230, 180, 120, 255),
        );
        ctx.end_mode_3d();

        draw.draw_shadow_map(Rect::new(0.0, 0.0, 256.0, 256.0), 0.01, 50.0)?;

        let draws = headless.take_draws();
        let counts = draws
            .iter()
            .map(|draw| match draw {
                DrawCall::Mesh(mesh) if mesh.framebuffer.is_some() => "shadow",
                DrawCall::Mesh(_) => "lit",
                DrawCall::TextureRect(_) => "debug",
            })
            .counts();
        info!("Frame {frame}: {counts:?}");
    }

    floor.unload(ctx.as_ref());
    crate_model.unload(ctx.as_ref());

    Ok(())
}
