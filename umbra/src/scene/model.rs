use crate::context::{MeshId, RenderContext, ShaderId, TextureId};
use glamx::{Mat4, Quat, Vec3};
use slotmap::Key;
use tracing::warn;
use umbra_utils::Color;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialMap {
    pub texture: TextureId,
    pub color: Color,
    pub value: f32,
}

impl Default for MaterialMap {
    fn default() -> Self {
        Self {
            texture: TextureId::null(),
            color: Color::WHITE,
            value: 0.0,
        }
    }
}

impl MaterialMap {
    pub fn with_texture(texture: TextureId) -> Self {
        Self {
            texture,
            ..Self::default()
        }
    }

    /// Whether a real texture is bound, as opposed to the context's default one.
    pub fn has_texture(&self) -> bool {
        !self.texture.is_null()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MaterialMaps {
    pub diffuse: MaterialMap,
    pub specular: MaterialMap,
    pub normal: MaterialMap,
    pub height: MaterialMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// Null means the context's default shader
    pub shader: ShaderId,
    pub maps: MaterialMaps,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mesh {
    pub id: MeshId,
    pub vertex_count: u32,
}

impl Mesh {
    pub fn load(ctx: &dyn RenderContext, vertex_count: u32) -> crate::context::Result<Self> {
        let id = ctx.load_mesh(vertex_count)?;
        Ok(Self { id, vertex_count })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub transform: Mat4,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    /// Material index for every mesh
    pub mesh_material: Vec<usize>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>, materials: Vec<Material>, mesh_material: Vec<usize>) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            meshes,
            materials,
            mesh_material,
        }
    }

    pub fn from_mesh(mesh: Mesh, material: Material) -> Self {
        Self::new(vec![mesh], vec![material], vec![0])
    }

    /// Calls `f` for every mesh together with the material it is drawn with.
    pub fn for_each_mesh_mut(&mut self, mut f: impl FnMut(&Mesh, &mut Material)) {
        for (i, mesh) in self.meshes.iter().enumerate() {
            let index = self.mesh_material.get(i).copied().unwrap_or(0);
            let Some(material) = self.materials.get_mut(index) else {
                warn!("Mesh #{i} references missing material #{index}");
                continue;
            };
            f(mesh, material);
        }
    }

    pub fn unload(self, ctx: &dyn RenderContext) {
        for mesh in self.meshes {
            ctx.unload_mesh(mesh.id);
        }
    }
}

/// Translation, then rotation by `rotation_angle` degrees around `rotation_axis`, then scale.
/// A zero axis leaves the rotation out.
pub fn model_transform(
    position: Vec3,
    rotation_axis: Vec3,
    rotation_angle: f32,
    scale: Vec3,
) -> Mat4 {
    let rotation = rotation_axis
        .try_normalize()
        .map(|axis| Quat::from_axis_angle(axis, rotation_angle.to_radians()))
        .unwrap_or(Quat::IDENTITY);

    Mat4::from_scale_rotation_translation(scale, rotation, position)
}
