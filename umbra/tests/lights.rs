use argh::FromArgs;
use glamx::{Vec2, Vec3, Vec4};
use itertools::Itertools;
use more_asserts::{assert_gt, assert_le};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use umbra::context::{HeadlessContext, RenderContext, UniformValue};
use umbra::lighting::{LightDesc, LightingError, Lights3D, LightsSettings, ShaderRegistry};
use umbra::scene::{Camera3D, Material, Mesh, Model};
use umbra::{Color, EngineArgs, Rect};
use wgpu::Face;

fn context() -> (Arc<HeadlessContext>, Arc<dyn RenderContext>) {
    let headless = Arc::new(HeadlessContext::default());
    let ctx: Arc<dyn RenderContext> = headless.clone();
    (headless, ctx)
}

fn lights(ctx: &Arc<dyn RenderContext>, max_lights: usize, buffer_size: u32) -> Lights3D {
    Lights3D::new(
        ctx,
        &ShaderRegistry::new(),
        Color::GRAY,
        max_lights,
        buffer_size,
    )
    .unwrap()
}

fn sun(x: f32) -> LightDesc {
    LightDesc::new(Camera3D::perspective(
        Vec3::new(x, 10.0, 5.0),
        Vec3::ZERO,
        60.0,
    ))
}

/// Collects formatted log output while a closure runs.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(umbra::tracing::Level::WARN)
        .with_ansi(false)
        .finish();

    let result = umbra::tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (result, logs)
}

fn cube(ctx: &Arc<dyn RenderContext>) -> Model {
    let mesh = Mesh::load(ctx.as_ref(), 36).unwrap();
    Model::from_mesh(mesh, Material::default())
}

#[test]
fn test_slots_are_numbered_in_order() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 4, 1024);

    let first = lights.add_light(sun(0.0)).unwrap();
    let second = lights.add_shadow_light(sun(1.0)).unwrap();
    let third = lights.add_light(sun(2.0)).unwrap();

    assert_eq!(first.index(), 0);
    assert_eq!(second.index(), 1);
    assert_eq!(third.index(), 2);
    assert_eq!(lights.light(second).unwrap().slot(), 1);
    assert_eq!(lights.len(), 3);
}

#[test]
fn test_capacity_returns_none() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 2, 512);

    assert!(lights.add_light(sun(0.0)).is_some());
    assert!(lights.add_shadow_light(sun(1.0)).is_some());
    assert!(lights.add_light(sun(2.0)).is_none());
    assert!(lights.add_shadow_light(sun(3.0)).is_none());

    assert_eq!(lights.len(), 2);
    assert_eq!(lights.shadow_light_count(), 1);
}

#[test]
fn test_light_ids_stay_valid() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 8, 0);

    let first = lights.add_light(sun(7.0)).unwrap();
    for i in 0..7 {
        lights.add_light(sun(i as f32)).unwrap();
    }

    assert_eq!(lights.light(first).unwrap().position().x, 7.0);
}

#[test]
fn test_shadow_tiles_do_not_overlap() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 9, 1024);
    let atlas = Rect::from_size(1024.0, 1024.0);

    for k in 1..=9usize {
        lights.add_shadow_light(sun(k as f32)).unwrap();

        let tile = 1024 / k.next_power_of_two() as u32;
        assert_eq!(lights.shadow_tile_size(), tile);

        let tiles = lights
            .lights()
            .iter()
            .filter(|l| l.casts_shadow())
            .map(|l| l.shadow_map_bounds())
            .collect::<Vec<_>>();
        assert_eq!(tiles.len(), k);

        for bounds in &tiles {
            assert!(atlas.contains_rect(bounds), "{bounds:?} is outside the atlas");
            assert_eq!(bounds.width, tile as f32);
            assert_eq!(bounds.height, tile as f32);
        }

        for (a, b) in tiles.iter().tuple_combinations() {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn test_tile_size_changes_on_power_of_two() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 8, 2048);

    let sizes = (0..5)
        .map(|i| {
            lights.add_shadow_light(sun(i as f32)).unwrap();
            lights.shadow_tile_size()
        })
        .collect::<Vec<_>>();

    assert_eq!(sizes, [2048, 1024, 512, 512, 256]);
}

#[test]
fn test_three_of_four_lights_packing() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 4, 1024);

    for i in 0..3 {
        lights.add_shadow_light(sun(i as f32)).unwrap();
    }

    assert_eq!(lights.shadow_tile_size(), 256);
    let tiles = lights
        .lights()
        .iter()
        .map(|l| l.shadow_map_bounds())
        .collect::<Vec<_>>();
    assert_eq!(
        tiles,
        [
            Rect::new(0.0, 0.0, 256.0, 256.0),
            Rect::new(256.0, 0.0, 256.0, 256.0),
            Rect::new(512.0, 0.0, 256.0, 256.0),
        ]
    );

    let shader = lights.shader().id();
    assert_eq!(
        headless.uniform(shader, "lights[1].mapBounds"),
        Some(UniformValue::Vec4(Vec4::new(0.25, 0.0, 0.25, 0.25)))
    );
    assert_eq!(
        headless.uniform(shader, "shadowMapTexelSize"),
        Some(UniformValue::Vec2(Vec2::splat(1.0 / 1024.0)))
    );
}

#[test]
fn test_tiles_fill_rows_left_to_right() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 5, 1024);

    for i in 0..5 {
        lights.add_shadow_light(sun(i as f32)).unwrap();
    }

    assert_eq!(lights.shadow_tile_size(), 128);
    let xs = lights
        .lights()
        .iter()
        .map(|l| l.shadow_map_bounds())
        .inspect(|bounds| assert_eq!(bounds.y, 0.0))
        .map(|bounds| bounds.x)
        .collect::<Vec<_>>();
    assert_eq!(xs, [0.0, 128.0, 256.0, 384.0, 512.0]);
}

#[test]
fn test_shadow_light_without_atlas_degrades() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 1, 0);

    assert!(lights.shadow_map().is_none());
    assert_eq!(headless.texture_count(), 0);

    let (id, logs) = capture_logs(|| lights.add_shadow_light(sun(0.0)));
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Lights3D has no shadow atlas, adding the shadow light as a regular light"));

    let light = lights.light(id.unwrap()).unwrap();
    assert!(!light.casts_shadow());
    assert!(light.shadow_map_bounds().is_empty());
    assert_eq!(lights.shadow_light_count(), 0);

    assert!(lights.add_shadow_light(sun(1.0)).is_none());
    assert!(lights.add_light(sun(1.0)).is_none());
}

#[test]
fn test_too_many_shadow_lights_for_atlas_warns() {
    let (_, ctx) = context();
    let mut lights = lights(&ctx, 8, 4);

    for x in 0..4 {
        let (id, logs) = capture_logs(|| lights.add_shadow_light(sun(x as f32)));
        assert!(id.is_some());
        assert!(logs.is_empty(), "unexpected warning: {logs}");
    }
    assert_eq!(lights.shadow_tile_size(), 1);

    let (id, logs) = capture_logs(|| lights.add_shadow_light(sun(4.0)));
    assert!(lights.light(id.unwrap()).unwrap().casts_shadow());
    assert_eq!(lights.shadow_tile_size(), 0);
    assert!(logs.contains("5 shadow lights don't fit a 4px shadow atlas"));
}

#[test]
fn test_zero_light_slots_fail() {
    let (headless, ctx) = context();
    let err = Lights3D::new(&ctx, &ShaderRegistry::new(), Color::GRAY, 0, 1024).unwrap_err();

    assert!(matches!(err, LightingError::NoLightSlots));
    assert!(err.to_string().starts_with("Lights3D:"));
    assert_eq!(headless.shader_count(), 0);
}

#[test]
fn test_oversized_atlas_fails_cleanly() {
    let headless = Arc::new(HeadlessContext::default().with_max_texture_size(512));
    let ctx: Arc<dyn RenderContext> = headless.clone();

    let err = Lights3D::new(&ctx, &ShaderRegistry::new(), Color::GRAY, 4, 1024).unwrap_err();

    assert!(matches!(err, LightingError::ShadowMapResource { .. }));
    assert!(err.to_string().starts_with("ShadowMap:"));
    assert_eq!(headless.shader_count(), 0);
    assert_eq!(headless.texture_count(), 0);
    assert_eq!(headless.framebuffer_count(), 0);
}

#[test]
fn test_ambient_is_uploaded() {
    let (headless, ctx) = context();
    let mut lights = Lights3D::with_ambient_intensity(&ctx, &ShaderRegistry::new(), 0.5, 2, 0)
        .unwrap();
    let shader = lights.shader().id();

    assert_eq!(lights.ambient(), Color::new(128, 128, 128, 255));
    assert_eq!(
        headless.uniform(shader, "ambient"),
        Some(UniformValue::Vec4(Color::new(128, 128, 128, 255).to_vec4()))
    );

    lights.set_ambient(Color::BLACK);
    assert_eq!(
        headless.uniform(shader, "ambient"),
        Some(UniformValue::Vec4(Vec4::new(0.0, 0.0, 0.0, 1.0)))
    );
}

#[test]
fn test_update_uploads_view_and_clears_atlas() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 2, 512);
    let atlas = lights.shadow_map().unwrap().framebuffer();
    let camera = Camera3D::perspective(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 45.0);

    let shader = lights.shader().id();
    let _ = lights.update(&camera).finish();

    assert_eq!(
        headless.uniform(shader, "viewPos"),
        Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
    );

    let clears = headless.clears();
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].framebuffer, Some(atlas));
    assert_eq!(clears[0].viewport, Rect::from_size(512.0, 512.0));
    assert_eq!(headless.bound_framebuffer(), None);
    assert_eq!(headless.screen(), ctx.viewport());
}

#[test]
fn test_shadow_pass_then_lit_pass() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 3, 1024);
    let first = lights.add_shadow_light(sun(0.0)).unwrap();
    let second = lights.add_shadow_light(sun(4.0)).unwrap();
    lights.add_light(sun(8.0)).unwrap();

    let atlas = lights.shadow_map().unwrap().framebuffer();
    let lighting = lights.shader().id();
    let expected_tiles = [first, second].map(|id| lights.light(id).unwrap().shadow_map_bounds());
    let expected_cameras = [first, second].map(|id| lights.light(id).unwrap().matrix());

    let mut model = cube(&ctx);
    let camera = Camera3D::default();

    let mut pass = lights.update(&camera);
    pass.shadow_cast_model(&mut model, Vec3::ZERO, Vec3::Y, 0.0, Vec3::ONE);
    let shadow_draws = headless.take_draws();

    let mut pass = pass.finish();
    pass.draw_model(&mut model, Vec3::ZERO, Vec3::Y, 0.0, Vec3::ONE, Color::WHITE);
    let lit_draws = headless.take_draws();

    assert_eq!(shadow_draws.len(), 2);
    for (i, draw) in shadow_draws.iter().enumerate() {
        let draw = draw.as_mesh().unwrap();
        assert_eq!(draw.framebuffer, Some(atlas));
        assert_eq!(draw.viewport, expected_tiles[i]);
        assert_eq!(draw.scissor, Some(expected_tiles[i]));
        assert_eq!(draw.cull_face, Face::Front);
        assert!(!draw.color_blend);
        assert_eq!(draw.camera, Some(expected_cameras[i]));
        assert_ne!(draw.shader, lighting);
    }

    assert_eq!(lit_draws.len(), 1);
    let draw = lit_draws[0].as_mesh().unwrap();
    assert_eq!(draw.framebuffer, None);
    assert_eq!(draw.viewport, headless.screen());
    assert_eq!(draw.scissor, None);
    assert_eq!(draw.cull_face, Face::Back);
    assert!(draw.color_blend);
    assert_eq!(draw.shader, lighting);
}

#[test]
fn test_disabled_lights_cast_no_shadow() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 2, 1024);
    let first = lights.add_shadow_light(sun(0.0)).unwrap();
    lights.add_shadow_light(sun(1.0)).unwrap();
    lights.light_mut(first).unwrap().set_active(false);

    let mut model = cube(&ctx);
    lights
        .update(&Camera3D::default())
        .shadow_cast_model(&mut model, Vec3::ZERO, Vec3::ZERO, 0.0, Vec3::ONE);

    assert_eq!(headless.draws().len(), 1);
}

#[test]
fn test_model_materials_are_restored() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 1, 256);
    lights.add_shadow_light(sun(0.0)).unwrap();

    let mut model = cube(&ctx);
    model.materials[0].maps.diffuse.color = Color::new(200, 100, 50, 255);
    let original = model.materials[0].clone();

    let mut pass = lights.update(&Camera3D::default());
    pass.shadow_cast_model(&mut model, Vec3::ZERO, Vec3::ZERO, 0.0, Vec3::ONE);
    assert_eq!(model.materials[0], original);

    headless.take_draws();
    let mut draw = pass.finish();
    draw.draw_model(
        &mut model,
        Vec3::ZERO,
        Vec3::ZERO,
        0.0,
        Vec3::ONE,
        Color::new(255, 0, 255, 128),
    );
    assert_eq!(model.materials[0], original);

    // a leftover tint from the first draw would darken the second
    draw.draw_model(
        &mut model,
        Vec3::ZERO,
        Vec3::ZERO,
        0.0,
        Vec3::ONE,
        Color::new(0, 255, 255, 255),
    );
    assert_eq!(model.materials[0], original);

    let diffuse = headless
        .draws()
        .iter()
        .filter_map(|d| d.as_mesh())
        .map(|mesh| mesh.diffuse)
        .collect_vec();
    assert_eq!(
        diffuse,
        [Color::new(200, 0, 50, 128), Color::new(0, 100, 50, 255)]
    );
}

#[test]
fn test_draw_uploads_material_features() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 1, 256);
    let shader = lights.shader().id();
    let atlas = lights.shadow_map().unwrap().texture_id();

    let height = ctx.load_depth_texture(4, 4).unwrap();
    let mut model = cube(&ctx);
    model.materials[0].maps.height.texture = height;

    lights.update(&Camera3D::default()).finish().draw_model(
        &mut model,
        Vec3::ZERO,
        Vec3::ZERO,
        0.0,
        Vec3::ONE,
        Color::WHITE,
    );

    assert_eq!(headless.uniform(shader, "useHeightMap"), Some(UniformValue::Int(1)));
    assert_eq!(headless.uniform(shader, "useNormalMap"), Some(UniformValue::Int(0)));
    assert_eq!(headless.uniform(shader, "useSpecularMap"), Some(UniformValue::Int(0)));
    assert_eq!(headless.uniform(shader, "texture6"), Some(UniformValue::Sampler(height)));
    assert_eq!(headless.uniform(shader, "shadowMap"), Some(UniformValue::Sampler(atlas)));
}

#[test]
fn test_model_transform_is_applied() {
    let (headless, ctx) = context();
    let mut lights = lights(&ctx, 1, 0);
    let mut model = cube(&ctx);

    lights.update(&Camera3D::default()).finish().draw_model(
        &mut model,
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        0.0,
        Vec3::splat(2.0),
        Color::WHITE,
    );

    let draws = headless.draws();
    let draw = draws[0].as_mesh().unwrap();
    let p = draw.transform.transform_point3(Vec3::X);
    assert!((p - Vec3::new(2.0, 0.0, 5.0)).length() < 1e-5);
}

#[test]
fn test_registry_is_shared_between_managers() {
    let (headless, ctx) = context();
    let registry = ShaderRegistry::new();

    let first = Lights3D::new(&ctx, &registry, Color::GRAY, 2, 256).unwrap();
    let second = Lights3D::new(&ctx, &registry, Color::GRAY, 2, 256).unwrap();
    let no_shadows = Lights3D::new(&ctx, &registry, Color::GRAY, 2, 0).unwrap();
    assert_eq!(registry.users(), 2);
    assert!(!registry.is_depth_debug_loaded());

    let shaders = headless.shader_count();
    first
        .draw_shadow_map(Rect::from_size(128.0, 128.0), 0.1, 100.0)
        .unwrap();
    second
        .draw_shadow_map(Rect::from_size(128.0, 128.0), 0.1, 100.0)
        .unwrap();
    assert!(registry.is_depth_debug_loaded());
    assert_eq!(headless.shader_count(), shaders + 1);

    no_shadows
        .draw_shadow_map(Rect::from_size(128.0, 128.0), 0.1, 100.0)
        .unwrap();
    assert_eq!(headless.draws().len(), 2);

    drop(first);
    assert!(registry.is_depth_debug_loaded());

    drop(second);
    assert_eq!(registry.users(), 0);
    assert!(!registry.is_depth_debug_loaded());

    drop(no_shadows);
    assert_eq!(headless.shader_count(), 0);
    assert_eq!(headless.texture_count(), 0);
    assert_eq!(headless.framebuffer_count(), 0);
}

#[test]
fn test_settings_follow_engine_args() {
    let (_, ctx) = context();
    let args = EngineArgs::from_args(&["umbra"], &["--shadow-map-size", "256", "--max-lights", "3"])
        .unwrap();
    let settings = LightsSettings::default().with_args(&args);

    let mut lights = Lights3D::with_settings(&ctx, &ShaderRegistry::new(), settings).unwrap();
    assert_eq!(lights.max_lights(), 3);
    assert_eq!(lights.shadow_map().unwrap().width(), 256);

    for i in 0..3 {
        lights.add_shadow_light(sun(i as f32)).unwrap();
    }
    assert_le!(lights.shadow_tile_size() * 2, 256);
    assert_gt!(lights.shadow_tile_size(), 0);

    let args = EngineArgs::from_args(&["umbra"], &["--no-shadows"]).unwrap();
    let settings = LightsSettings::default().with_args(&args);
    let lights = Lights3D::with_settings(&ctx, &ShaderRegistry::new(), settings).unwrap();
    assert!(lights.shadow_map().is_none());
}
