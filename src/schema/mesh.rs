//! Plain mesh schemas and the mesh base shared by every mesh family.
//!
//! | record     | field                           | since | note                           |
//! |------------|---------------------------------|-------|--------------------------------|
//! | CMeshBase  | -                               | 1     | version 0 is rejected          |
//! | CMeshBase  | animated morph count            | 2     | must be zero                   |
//! | CMeshBase  | is_lightable                    | 3     | default `false`                |
//! | CMeshBase  | use_lighting_local_attenuation  | 4     | default `false`                |
//! | CMeshBase  | auto_anim                       | 5     | default `false`                |
//! | CMeshBase  | dist_max                        | 6     | default `0.0`                  |
//! | CMeshBase  | lod_character_texture           | 7     | default null                   |
//! | CMeshBase  | light_infos                     | 8     | old form must be empty         |
//! | CMeshBase  | collision_mesh_generation       | 9     | default `AutoCameraCol`        |
//! | CMeshGeom  | morpher                         | 1     |                                |
//! | CMeshGeom  | mesh_vertex_program             | 3     | default null                   |
//! | CMeshGeom  | bones_name                      | 4     | default empty                  |

use indexmap::IndexMap;

use crate::core::{Ptr, Record, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::{Error, Quat, Result, Vec3};

use super::common::Aabb;
use super::enums::CameraCollisionGenerate;
use super::index_buffer::IndexBuffer;
use super::material::{LightMapInfoList, Material, MaterialBase};
use super::vertex_buffer::{VertexAttributeBlock, VertexBuffer};

/// Per-bone palette of a matrix block.
pub const MATRIX_BLOCK_SIZE: usize = 16;

/// Texture atlas used by the character LOD renderer (`CLodCharacterTexture`).
///
/// Referenced through a non-polymorphic shared pointer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LodCharacterTexture {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    /// T, U, V, Q bytes per texel.
    pub texels: Vec<[u8; 4]>,
}

impl LodCharacterTexture {
    pub const CLASS_NAME: &'static str = "CLodCharacterTexture";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for LodCharacterTexture {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            width: d.read_u32()?,
            height: d.read_u32()?,
            texels: d.sequence_with(|d| d.read_array::<4>())?,
        })
    }
}

/// Fields shared by every mesh kind (`CMeshBase`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshBase {
    pub version: u32,
    pub default_pos: Vec3,
    pub default_pivot: Vec3,
    pub default_rot_euler: Vec3,
    pub default_rot_quat: Quat,
    pub default_scale: Vec3,
    pub materials: Vec<Material>,
    pub animated_materials: IndexMap<u32, MaterialBase>,
    pub light_infos: Vec<LightMapInfoList>,
    pub is_lightable: bool,
    pub use_lighting_local_attenuation: bool,
    pub auto_anim: bool,
    pub dist_max: f32,
    pub lod_character_texture: Ptr,
    pub collision_mesh_generation: CameraCollisionGenerate,
}

impl MeshBase {
    pub const CLASS_NAME: &'static str = "CMeshBase";
    pub const MAX_VERSION: u32 = 9;

    /// The LOD character texture, if one is attached.
    pub fn lod_character_texture(&self) -> Option<&LodCharacterTexture> {
        match self.lod_character_texture.as_deref()? {
            Record::LodCharacterTexture(t) => Some(t),
            _ => None,
        }
    }

    /// Shared records referenced by materials and the LOD texture.
    pub fn children(&self) -> Vec<&RecordRef> {
        let mut out: Vec<&RecordRef> = self.materials.iter().flat_map(Material::textures).collect();
        for base in self.animated_materials.values() {
            out.extend(base.animated_textures.values().filter_map(|t| t.texture.as_ref()));
        }
        out.extend(self.lod_character_texture.as_ref());
        out
    }
}

impl Decode for MeshBase {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let offset = d.position();
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        if version < 1 {
            return Err(Error::unsupported(Self::CLASS_NAME, version, offset, "pre-1 meshes are not supported"));
        }
        if version >= 2 {
            let at = d.position();
            let morphs = d.read_i32()?;
            if morphs != 0 {
                return Err(Error::unsupported(
                    Self::CLASS_NAME,
                    version,
                    at,
                    "animated morphs are not supported",
                ));
            }
        }

        let default_pos = d.versioned()?;
        let default_pivot = d.versioned()?;
        let default_rot_euler = d.versioned()?;
        let default_rot_quat = d.versioned()?;
        let default_scale = d.versioned()?;
        let materials = d.sequence()?;
        let animated_materials = d.map()?;

        let light_infos = if version >= 8 {
            d.sequence()?
        } else {
            let at = d.position();
            let old = d.read_i32()?;
            if old > 0 {
                return Err(Error::unsupported(
                    Self::CLASS_NAME,
                    version,
                    at,
                    "pre-8 light info maps are not supported",
                ));
            }
            Vec::new()
        };

        Ok(Self {
            version,
            default_pos,
            default_pivot,
            default_rot_euler,
            default_rot_quat,
            default_scale,
            materials,
            animated_materials,
            light_infos,
            is_lightable: d.since(version, 3, false, |d| d.read_bool())?,
            use_lighting_local_attenuation: d.since(version, 4, false, |d| d.read_bool())?,
            auto_anim: d.since(version, 5, false, |d| d.read_bool())?,
            dist_max: d.since(version, 6, 0.0, |d| d.read_f32())?,
            lod_character_texture: d.since(version, 7, None, |d| {
                d.read_shared_with(|d| Ok(Record::LodCharacterTexture(d.read()?)))
            })?,
            collision_mesh_generation: d.since_or_default(version, 9)?,
        })
    }
}

/// Blend-shape morpher (`CMeshMorpher`). Only the empty form is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMorpher {
    pub version: u32,
}

impl MeshMorpher {
    pub const CLASS_NAME: &'static str = "CMeshMorpher";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for MeshMorpher {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let at = d.position();
        if d.read_u32()? > 0 {
            return Err(Error::unsupported(Self::CLASS_NAME, version, at, "blend shapes are not supported"));
        }
        Ok(Self { version })
    }
}

/// Draw call: one material over one index list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RdrPass {
    pub version: u32,
    pub material_id: u32,
    pub index_buffer: IndexBuffer,
}

impl RdrPass {
    pub const CLASS_NAME: &'static str = "CMeshGeom::CRdrPass";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for RdrPass {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            material_id: d.read_u32()?,
            index_buffer: d.read()?,
        })
    }
}

/// Render passes sharing one bone palette (`CMatrixBlock`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatrixBlock {
    pub version: u32,
    pub matrix_ids: [u32; MATRIX_BLOCK_SIZE],
    pub num_matrix: u32,
    pub rdr_passes: Vec<RdrPass>,
}

impl MatrixBlock {
    pub const CLASS_NAME: &'static str = "CMeshGeom::CMatrixBlock";
    pub const MAX_VERSION: u32 = 0;

    /// Palette entries actually in use.
    pub fn used_matrix_ids(&self) -> &[u32] {
        let n = (self.num_matrix as usize).min(MATRIX_BLOCK_SIZE);
        &self.matrix_ids[..n]
    }
}

impl Decode for MatrixBlock {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            matrix_ids: d.array_with(|d| d.read_u32())?,
            num_matrix: d.read_u32()?,
            rdr_passes: d.sequence()?,
        })
    }
}

/// Static or skinned geometry of a plain mesh (`CMeshGeom`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshGeom {
    pub version: u32,
    pub bones_name: Vec<String>,
    pub mesh_vertex_program: Ptr,
    pub morpher: Option<MeshMorpher>,
    pub vertex_buffer: VertexBuffer,
    pub matrix_blocks: Vec<MatrixBlock>,
    pub bbox: Aabb,
    pub skinned: bool,
}

impl MeshGeom {
    pub const CLASS_NAME: &'static str = "CMeshGeom";
    pub const MAX_VERSION: u32 = 4;

    #[inline]
    pub fn attributes(&self) -> &VertexAttributeBlock {
        self.vertex_buffer.attributes()
    }

    /// Every render pass of every matrix block, in stream order.
    pub fn rdr_passes(&self) -> impl Iterator<Item = &RdrPass> {
        self.matrix_blocks.iter().flat_map(|b| b.rdr_passes.iter())
    }

    pub fn children(&self) -> Vec<&RecordRef> {
        self.mesh_vertex_program.iter().collect()
    }
}

impl Decode for MeshGeom {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            bones_name: d.since(version, 4, Vec::new(), |d| d.sequence())?,
            mesh_vertex_program: d.since(version, 3, None, |d| d.read_ptr())?,
            morpher: d.since_opt(version, 1, MeshMorpher::decode)?,
            vertex_buffer: d.read()?,
            matrix_blocks: d.sequence()?,
            bbox: d.read()?,
            skinned: d.read_bool()?,
        })
    }
}

/// Plain mesh shape (`CMesh`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mesh {
    pub version: u32,
    pub base: MeshBase,
    pub geom: MeshGeom,
}

impl Mesh {
    pub const CLASS_NAME: &'static str = "CMesh";
    pub const MAX_VERSION: u32 = 0;

    pub fn children(&self) -> Vec<&RecordRef> {
        let mut out = self.base.children();
        out.extend(self.geom.children());
        out
    }
}

impl Decode for Mesh {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            base: d.read()?,
            geom: d.read()?,
        })
    }
}

/// Wind parameters of one tree level.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindLevel {
    pub frequency: f32,
    pub frequency_wind_factor: f32,
    pub power_xy: f32,
    pub power_z: f32,
    pub bias: f32,
}

impl Decode for WindLevel {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            frequency: d.read_f32()?,
            frequency_wind_factor: d.read_f32()?,
            power_xy: d.read_f32()?,
            power_z: d.read_f32()?,
            bias: d.read_f32()?,
        })
    }
}

/// Wind-tree vertex program (`CMeshVPWindTree`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshVpWindTree {
    pub version: u32,
    pub levels: [WindLevel; 3],
    pub specular_lighting: bool,
}

impl MeshVpWindTree {
    pub const CLASS_NAME: &'static str = "CMeshVPWindTree";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for MeshVpWindTree {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            levels: d.array_with(WindLevel::decode)?,
            specular_lighting: d.read_bool()?,
        })
    }
}
