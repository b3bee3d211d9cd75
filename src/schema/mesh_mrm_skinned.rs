//! Progressive skinned meshes with quantized vertices.

use crate::core::RecordRef;
use crate::stream::{
    dequantize_normal, dequantize_position, dequantize_uv, dequantize_weight, Decode, Decoder,
    SKINNED_MAX_MATRIX,
};
use crate::util::{Result, Vec2, Vec3};

use super::common::{Aabb, ShadowSkin, WedgeGeom, SKINNING_MAX_MATRIX};
use super::mesh::MeshBase;
use super::mesh_mrm::LevelDetail;

/// Quantized skinned vertex (`CPackedVertex`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackedVertex {
    pub version: u32,
    pub pos: [i16; 3],
    pub normal: [i16; 3],
    pub uv: [i16; 2],
    /// Interleaved (matrix index, weight) pairs.
    pub influences: [(u8, u8); SKINNED_MAX_MATRIX],
}

impl PackedVertex {
    pub const CLASS_NAME: &'static str = "CPackedVertex";
    pub const MAX_VERSION: u32 = 0;

    /// Expand with the buffer's position scale.
    pub fn unpack(&self, scale: f32) -> SkinnedVertex {
        let mut matrix_ids = [0u8; SKINNED_MAX_MATRIX];
        let mut weights = [0.0f32; SKINNED_MAX_MATRIX];
        for (i, &(m, w)) in self.influences.iter().enumerate() {
            matrix_ids[i] = m;
            weights[i] = dequantize_weight(w);
        }
        SkinnedVertex {
            position: dequantize_position(self.pos, scale),
            normal: dequantize_normal(self.normal),
            uv: dequantize_uv(self.uv),
            matrix_ids,
            weights,
        }
    }
}

impl Decode for PackedVertex {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            pos: d.array_with(|d| d.read_i16())?,
            normal: d.array_with(|d| d.read_i16())?,
            uv: d.array_with(|d| d.read_i16())?,
            influences: d.array_with(|d| Ok((d.read_u8()?, d.read_u8()?)))?,
        })
    }
}

/// Dequantized skinned vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkinnedVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub matrix_ids: [u8; SKINNED_MAX_MATRIX],
    pub weights: [f32; SKINNED_MAX_MATRIX],
}

/// Quantized vertex buffer of a skinned MRM mesh (`CPackedVertexBuffer`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackedVertexBuffer {
    pub version: u32,
    pub vertices: Vec<PackedVertex>,
    pub decompact_scale: f32,
}

impl PackedVertexBuffer {
    pub const CLASS_NAME: &'static str = "CPackedVertexBuffer";
    pub const MAX_VERSION: u32 = 0;

    pub fn unpack(&self) -> Vec<SkinnedVertex> {
        self.vertices.iter().map(|v| v.unpack(self.decompact_scale)).collect()
    }
}

impl Decode for PackedVertexBuffer {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            vertices: d.sequence()?,
            decompact_scale: d.read_f32()?,
        })
    }
}

/// Render pass with 16-bit indices.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkinnedRdrPass {
    pub version: u32,
    pub material_id: u32,
    pub indices: Vec<u16>,
}

impl SkinnedRdrPass {
    pub const CLASS_NAME: &'static str = "CMeshMRMSkinnedGeom::CRdrPass";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for SkinnedRdrPass {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            material_id: d.read_u32()?,
            indices: d.sequence()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkinnedLod {
    pub version: u32,
    pub num_wedges: u32,
    pub rdr_passes: Vec<SkinnedRdrPass>,
    pub geomorphs: Vec<WedgeGeom>,
    pub matrix_influences: Vec<u32>,
    pub influenced_vertices: [Vec<u32>; SKINNING_MAX_MATRIX],
}

impl SkinnedLod {
    pub const CLASS_NAME: &'static str = "CMeshMRMSkinnedGeom::CLod";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for SkinnedLod {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            num_wedges: d.read_u32()?,
            rdr_passes: d.sequence()?,
            geomorphs: d.sequence()?,
            matrix_influences: d.sequence()?,
            influenced_vertices: d.array_with(|d| d.sequence())?,
        })
    }
}

/// Geometry of a skinned progressive mesh (`CMeshMRMSkinnedGeom`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMrmSkinnedGeom {
    pub version: u32,
    pub bones_name: Vec<String>,
    pub bbox: Aabb,
    pub level_detail: LevelDetail,
    pub vertex_buffer: PackedVertexBuffer,
    pub shadow_skin: ShadowSkin,
    pub lods: Vec<SkinnedLod>,
}

impl MeshMrmSkinnedGeom {
    pub const CLASS_NAME: &'static str = "CMeshMRMSkinnedGeom";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for MeshMrmSkinnedGeom {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            bones_name: d.sequence()?,
            bbox: d.read()?,
            level_detail: d.read()?,
            vertex_buffer: d.read()?,
            shadow_skin: d.read()?,
            lods: d.sequence()?,
        })
    }
}

/// Skinned progressive mesh shape (`CMeshMRMSkinned`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMrmSkinned {
    pub version: u32,
    pub base: MeshBase,
    pub geom: MeshMrmSkinnedGeom,
}

impl MeshMrmSkinned {
    pub const CLASS_NAME: &'static str = "CMeshMRMSkinned";
    pub const MAX_VERSION: u32 = 0;

    pub fn children(&self) -> Vec<&RecordRef> {
        self.base.children()
    }
}

impl Decode for MeshMrmSkinned {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            base: d.read()?,
            geom: d.read()?,
        })
    }
}
