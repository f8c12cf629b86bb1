use crate::context::{
    ClearFlags, FramebufferCreateErr, FramebufferId, InvalidTextureSizeErr, MeshId, RenderContext,
    Result, ShaderCompileErr, ShaderId, TextureId, TextureTooLargeErr, UniformLocation,
    UniformValue, UnknownHandleErr,
};
use crate::scene::{Camera3D, Material, Mesh};
use glamx::Mat4;
use parking_lot::Mutex;
use slotmap::{Key, SlotMap};
use snafu::ensure;
use std::collections::HashMap;
use tracing::{trace, warn};
use umbra_utils::{Color, Rect};
use wgpu::{AddressMode, Face};

const DEFAULT_MAX_TEXTURE_SIZE: u32 = 16384;

#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub framebuffer: Option<FramebufferId>,
    pub viewport: Rect,
    pub scissor: Option<Rect>,
    pub cull_face: Face,
    pub color_blend: bool,
    /// View projection of the active 3D scope, if any
    pub camera: Option<Mat4>,
    pub transform: Mat4,
    pub diffuse: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRectDraw {
    pub texture: TextureId,
    pub shader: Option<ShaderId>,
    pub framebuffer: Option<FramebufferId>,
    pub source: Rect,
    pub dest: Rect,
    pub tint: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Mesh(MeshDraw),
    TextureRect(TextureRectDraw),
}

impl DrawCall {
    pub fn as_mesh(&self) -> Option<&MeshDraw> {
        match self {
            DrawCall::Mesh(draw) => Some(draw),
            DrawCall::TextureRect(_) => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearRecord {
    pub framebuffer: Option<FramebufferId>,
    pub viewport: Rect,
    pub scissor: Option<Rect>,
    pub flags: ClearFlags,
    pub color: Color,
}

#[derive(Debug)]
struct TextureData {
    width: u32,
    height: u32,
    wrap: (AddressMode, AddressMode),
}

#[derive(Debug)]
struct FramebufferData {
    depth: Option<TextureId>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Declaration {
    Single,
    Array(usize),
}

#[derive(Debug, Default)]
struct ShaderData {
    name: String,
    declarations: HashMap<String, Declaration>,
    locations: HashMap<String, UniformLocation>,
    values: HashMap<UniformLocation, UniformValue>,
}

impl ShaderData {
    fn is_declared(&self, name: &str) -> bool {
        let root_end = name.find(['[', '.']).unwrap_or(name.len());
        let (root, rest) = name.split_at(root_end);

        let Some(declaration) = self.declarations.get(root) else {
            return false;
        };

        match (declaration, rest.strip_prefix('[')) {
            (Declaration::Array(len), Some(rest)) => rest
                .split_once(']')
                .and_then(|(index, _)| index.parse::<usize>().ok())
                .is_some_and(|index| index < *len),
            (Declaration::Array(_), None) => rest.is_empty(),
            (Declaration::Single, Some(_)) => false,
            (Declaration::Single, None) => true,
        }
    }
}

#[derive(Debug)]
struct HeadlessState {
    textures: SlotMap<TextureId, TextureData>,
    framebuffers: SlotMap<FramebufferId, FramebufferData>,
    shaders: SlotMap<ShaderId, ShaderData>,
    meshes: SlotMap<MeshId, u32>,

    screen: Rect,
    viewport: Rect,
    scissor: Option<Rect>,
    cull_face: Face,
    color_blend: bool,
    framebuffer: Option<FramebufferId>,
    shader: Option<ShaderId>,
    camera: Option<Mat4>,

    flushes: usize,
    uploads: usize,
    clears: Vec<ClearRecord>,
    draws: Vec<DrawCall>,
}

/// A [`RenderContext`] that executes nothing and records everything.
///
/// Resource handles behave like real GPU objects: they must be loaded before use,
/// unloading invalidates them, and uniform names only resolve when the shader
/// sources declare them. All state a draw would have been issued under is
/// captured in [`DrawCall`]s.
#[derive(Debug)]
pub struct HeadlessContext {
    state: Mutex<HeadlessState>,
    max_texture_size: u32,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        let screen = Rect::from_size(width as f32, height as f32);
        Self {
            state: Mutex::new(HeadlessState {
                textures: SlotMap::with_key(),
                framebuffers: SlotMap::with_key(),
                shaders: SlotMap::with_key(),
                meshes: SlotMap::with_key(),
                screen,
                viewport: screen,
                scissor: None,
                cull_face: Face::Back,
                color_blend: true,
                framebuffer: None,
                shader: None,
                camera: None,
                flushes: 0,
                uploads: 0,
                clears: Vec::new(),
                draws: Vec::new(),
            }),
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
        }
    }

    pub fn with_max_texture_size(mut self, max: u32) -> Self {
        self.max_texture_size = max;
        self
    }

    pub fn screen(&self) -> Rect {
        self.state.lock().screen
    }

    pub fn scissor(&self) -> Option<Rect> {
        self.state.lock().scissor
    }

    pub fn cull_face(&self) -> Face {
        self.state.lock().cull_face
    }

    pub fn color_blend(&self) -> bool {
        self.state.lock().color_blend
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.lock().framebuffer
    }

    pub fn active_shader(&self) -> Option<ShaderId> {
        self.state.lock().shader
    }

    pub fn camera(&self) -> Option<Mat4> {
        self.state.lock().camera
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    /// Amount of uniform values uploaded so far, including uploads to missing locations.
    pub fn upload_count(&self) -> usize {
        self.state.lock().uploads
    }

    pub fn clears(&self) -> Vec<ClearRecord> {
        self.state.lock().clears.clone()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.lock().draws.clone()
    }

    pub fn take_draws(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.state.lock().draws)
    }

    pub fn shader_count(&self) -> usize {
        self.state.lock().shaders.len()
    }

    pub fn texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.state.lock().framebuffers.len()
    }

    pub fn shader_name(&self, shader: ShaderId) -> Option<String> {
        self.state
            .lock()
            .shaders
            .get(shader)
            .map(|data| data.name.clone())
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.state
            .lock()
            .textures
            .get(texture)
            .map(|data| (data.width, data.height))
    }

    pub fn texture_wrap(&self, texture: TextureId) -> Option<(AddressMode, AddressMode)> {
        self.state.lock().textures.get(texture).map(|data| data.wrap)
    }

    pub fn framebuffer_depth(&self, framebuffer: FramebufferId) -> Option<TextureId> {
        self.state
            .lock()
            .framebuffers
            .get(framebuffer)
            .and_then(|data| data.depth)
    }

    /// Last value uploaded to the named uniform of a shader.
    pub fn uniform(&self, shader: ShaderId, name: &str) -> Option<UniformValue> {
        let state = self.state.lock();
        let data = state.shaders.get(shader)?;
        let location = data.locations.get(name)?;
        data.values.get(location).copied()
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn validate_source(stage: &str, source: &str) -> std::result::Result<(), String> {
    if !source.trim_start().starts_with("#version") {
        return Err(format!("{stage} stage is missing a #version directive"));
    }

    if !source.contains("void main") {
        return Err(format!("{stage} stage has no entry point"));
    }

    let mut depth = 0i32;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("{stage} stage closes a block that was never opened"));
                }
            }
            _ => (),
        }
    }

    if depth != 0 {
        return Err(format!("{stage} stage has {depth} unclosed block(s)"));
    }

    Ok(())
}

fn collect_declarations(source: &str, declarations: &mut HashMap<String, Declaration>) {
    for line in source.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(declaration) = line.strip_prefix("uniform ") else {
            continue;
        };

        let declaration = declaration.trim_end_matches(';').trim();
        let Some(name) = declaration.split_whitespace().last() else {
            continue;
        };

        match name.split_once('[') {
            Some((root, len)) => match len.trim_end_matches(']').parse() {
                Ok(len) => {
                    declarations.insert(root.to_string(), Declaration::Array(len));
                }
                Err(_) => warn!("Uniform array {root} has no constant length"),
            },
            None => {
                declarations.insert(name.to_string(), Declaration::Single);
            }
        }
    }
}

impl RenderContext for HeadlessContext {
    fn load_framebuffer(&self, width: u32, height: u32) -> Result<FramebufferId> {
        ensure!(width > 0 && height > 0, FramebufferCreateErr { width, height });

        let mut state = self.state.lock();
        let id = state.framebuffers.insert(FramebufferData { depth: None });
        trace!("Loaded framebuffer {id:?} ({width}x{height})");
        Ok(id)
    }

    fn attach_depth_texture(&self, framebuffer: FramebufferId, texture: TextureId) -> Result<()> {
        let mut state = self.state.lock();
        ensure!(
            state.textures.contains_key(texture),
            UnknownHandleErr { kind: "texture" }
        );

        let Some(data) = state.framebuffers.get_mut(framebuffer) else {
            return UnknownHandleErr {
                kind: "framebuffer",
            }
            .fail();
        };

        data.depth = Some(texture);
        Ok(())
    }

    fn framebuffer_complete(&self, framebuffer: FramebufferId) -> bool {
        let state = self.state.lock();
        state
            .framebuffers
            .get(framebuffer)
            .and_then(|data| data.depth)
            .is_some_and(|depth| state.textures.contains_key(depth))
    }

    fn enable_framebuffer(&self, framebuffer: FramebufferId) {
        let mut state = self.state.lock();
        if !state.framebuffers.contains_key(framebuffer) {
            warn!("Tried to bind unknown framebuffer {framebuffer:?}");
            return;
        }
        state.framebuffer = Some(framebuffer);
    }

    fn disable_framebuffer(&self) {
        self.state.lock().framebuffer = None;
    }

    fn unload_framebuffer(&self, framebuffer: FramebufferId) {
        let mut state = self.state.lock();
        if state.framebuffer == Some(framebuffer) {
            state.framebuffer = None;
        }
        if state.framebuffers.remove(framebuffer).is_none() {
            warn!("Unloaded framebuffer {framebuffer:?} twice");
        }
    }

    fn load_depth_texture(&self, width: u32, height: u32) -> Result<TextureId> {
        ensure!(
            width > 0 && height > 0,
            InvalidTextureSizeErr { width, height }
        );
        ensure!(
            width <= self.max_texture_size && height <= self.max_texture_size,
            TextureTooLargeErr {
                width,
                height,
                max: self.max_texture_size,
            }
        );

        let id = self.state.lock().textures.insert(TextureData {
            width,
            height,
            wrap: (AddressMode::Repeat, AddressMode::Repeat),
        });
        trace!("Loaded depth texture {id:?} ({width}x{height})");
        Ok(id)
    }

    fn set_texture_wrap(&self, texture: TextureId, wrap_u: AddressMode, wrap_v: AddressMode) {
        match self.state.lock().textures.get_mut(texture) {
            Some(data) => data.wrap = (wrap_u, wrap_v),
            None => warn!("Tried to set the wrap mode of unknown texture {texture:?}"),
        }
    }

    fn unbind_texture(&self) {}

    fn unload_texture(&self, texture: TextureId) {
        if self.state.lock().textures.remove(texture).is_none() {
            warn!("Unloaded texture {texture:?} twice");
        }
    }

    fn enable_scissor(&self, rect: Rect) {
        self.state.lock().scissor = Some(rect);
    }

    fn disable_scissor(&self) {
        self.state.lock().scissor = None;
    }

    fn viewport(&self) -> Rect {
        self.state.lock().viewport
    }

    fn set_viewport(&self, rect: Rect) {
        self.state.lock().viewport = rect;
    }

    fn set_cull_face(&self, face: Face) {
        self.state.lock().cull_face = face;
    }

    fn set_color_blend(&self, enabled: bool) {
        self.state.lock().color_blend = enabled;
    }

    fn clear(&self, flags: ClearFlags, color: Color) {
        let mut state = self.state.lock();
        let record = ClearRecord {
            framebuffer: state.framebuffer,
            viewport: state.viewport,
            scissor: state.scissor,
            flags,
            color,
        };
        state.clears.push(record);
    }

    fn flush_batch(&self) {
        self.state.lock().flushes += 1;
    }

    fn load_shader(&self, name: &str, vertex: &str, fragment: &str) -> Result<ShaderId> {
        if let Err(log) =
            validate_source("vertex", vertex).and_then(|_| validate_source("fragment", fragment))
        {
            return ShaderCompileErr { name, log }.fail();
        }

        let mut data = ShaderData {
            name: name.to_string(),
            ..ShaderData::default()
        };
        collect_declarations(vertex, &mut data.declarations);
        collect_declarations(fragment, &mut data.declarations);

        let id = self.state.lock().shaders.insert(data);
        trace!("Loaded shader '{name}' as {id:?}");
        Ok(id)
    }

    fn unload_shader(&self, shader: ShaderId) {
        let mut state = self.state.lock();
        if state.shader == Some(shader) {
            state.shader = None;
        }
        if state.shaders.remove(shader).is_none() {
            warn!("Unloaded shader {shader:?} twice");
        }
    }

    fn uniform_location(&self, shader: ShaderId, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.lock();
        let data = state.shaders.get_mut(shader)?;

        if !data.is_declared(name) {
            return None;
        }

        let next = UniformLocation(data.locations.len() as u32);
        Some(*data.locations.entry(name.to_string()).or_insert(next))
    }

    fn set_uniform(&self, shader: ShaderId, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.lock();
        state.uploads += 1;

        match state.shaders.get_mut(shader) {
            Some(data) => {
                data.values.insert(location, value);
            }
            None => warn!("Uniform upload to unknown shader {shader:?}"),
        }
    }

    fn begin_shader(&self, shader: ShaderId) {
        self.state.lock().shader = Some(shader);
    }

    fn end_shader(&self) {
        self.state.lock().shader = None;
    }

    fn load_mesh(&self, vertex_count: u32) -> Result<MeshId> {
        Ok(self.state.lock().meshes.insert(vertex_count))
    }

    fn unload_mesh(&self, mesh: MeshId) {
        self.state.lock().meshes.remove(mesh);
    }

    fn begin_mode_3d(&self, camera: &Camera3D) {
        let mut state = self.state.lock();
        state.flushes += 1;
        state.camera = Some(camera.view_projection());
    }

    fn end_mode_3d(&self) {
        let mut state = self.state.lock();
        state.flushes += 1;
        state.camera = None;
    }

    fn draw_mesh(&self, mesh: &Mesh, material: &Material, transform: Mat4) {
        let mut state = self.state.lock();
        if !state.meshes.contains_key(mesh.id) {
            warn!("Tried to draw unknown mesh {:?}", mesh.id);
            return;
        }

        if !material.shader.is_null() && !state.shaders.contains_key(material.shader) {
            warn!("Material references unknown shader {:?}", material.shader);
        }

        let draw = MeshDraw {
            mesh: mesh.id,
            shader: material.shader,
            framebuffer: state.framebuffer,
            viewport: state.viewport,
            scissor: state.scissor,
            cull_face: state.cull_face,
            color_blend: state.color_blend,
            camera: state.camera,
            transform,
            diffuse: material.maps.diffuse.color,
        };
        state.draws.push(DrawCall::Mesh(draw));
    }

    fn draw_texture_rect(&self, texture: TextureId, source: Rect, dest: Rect, tint: Color) {
        let mut state = self.state.lock();
        let draw = TextureRectDraw {
            texture,
            shader: state.shader,
            framebuffer: state.framebuffer,
            source,
            dest,
            tint,
        };
        state.draws.push(DrawCall::TextureRect(draw));
    }
}
