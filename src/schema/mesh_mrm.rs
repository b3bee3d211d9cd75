//! Progressive (MRM) meshes.
//!
//! The geometry is stored as a header describing every LOD followed by the
//! LODs themselves. Each LOD adds a wedge range to one shared vertex buffer
//! whose channel layout is declared once in the header, so all LOD infos and
//! the buffer header are read before any vertex subset.
//!
//! ```text
//! header: version, bones, vp, morpher, skinned, bbox, level detail,
//!         lod infos, wedge count, vb header, skin weights, shadow skin,
//!         i32 offset per lod (relative to the table start)
//! lod 0:  CLod, lod vertex data (version + subset [start, end))
//! lod 1:  ...
//! ```
//!
//! | record        | field               | since | note                      |
//! |---------------|---------------------|-------|---------------------------|
//! | CMeshMRMGeom  | morpher             | 1     |                           |
//! | CMeshMRMGeom  | mesh_vertex_program | 2     | default null              |
//! | CMeshMRMGeom  | bones_name          | 3     | default empty             |
//! | CMeshMRMGeom  | skin_weights        | 4     | default empty             |
//! | CMeshMRMGeom  | shadow_skin         | 5     | absent before             |
//! | CLod          | skin_vertex_blocks  | 1     | default empty             |
//! | lod vertices  | -                   | 1     | required when skinned     |

use crate::core::{Ptr, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::{Error, Result, Vec3};

use super::common::{Aabb, ShadowSkin, SkinWeight, WedgeGeom, SKINNING_MAX_MATRIX};
use super::mesh::{MeshBase, MeshMorpher, RdrPass};
use super::vertex_buffer::{VertexBufferHeader, VertexSubset};

/// Distance-to-polycount mapping of a progressive mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LevelDetail {
    pub max_face_used: u32,
    pub min_face_used: u32,
    pub distance_finest: f32,
    pub distance_middle: f32,
    pub distance_coarsest: f32,
    pub oo_distance_delta: f32,
    pub distance_pow: f32,
}

impl Decode for LevelDetail {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            max_face_used: d.read_u32()?,
            min_face_used: d.read_u32()?,
            distance_finest: d.read_f32()?,
            distance_middle: d.read_f32()?,
            distance_coarsest: d.read_f32()?,
            oo_distance_delta: d.read_f32()?,
            distance_pow: d.read_f32()?,
        })
    }
}

/// Wedge range added by one LOD, plus where that LOD starts in the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MrmLodInfo {
    pub version: u32,
    pub start_add_wedge: u32,
    pub end_add_wedges: u32,
    /// Absolute byte offset of the LOD, resolved from the header's offset table.
    pub lod_offset: u64,
}

impl MrmLodInfo {
    pub const CLASS_NAME: &'static str = "CMeshMRMGeom::CLodInfo";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for MrmLodInfo {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            start_add_wedge: d.read_u32()?,
            end_add_wedges: d.read_u32()?,
            lod_offset: 0,
        })
    }
}

/// Run of skinned vertices, unversioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexBlock {
    pub vertex_start: u32,
    pub num_vertices: u32,
}

impl Decode for VertexBlock {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            vertex_start: d.read_u32()?,
            num_vertices: d.read_u32()?,
        })
    }
}

/// One level of detail with the vertices it adds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MrmLod {
    pub version: u32,
    pub num_wedges: u32,
    pub rdr_passes: Vec<RdrPass>,
    pub geomorphs: Vec<WedgeGeom>,
    pub matrix_influences: Vec<u32>,
    pub influenced_vertices: [Vec<u32>; SKINNING_MAX_MATRIX],
    pub skin_vertex_blocks: Vec<VertexBlock>,
    pub vertex_data_version: u32,
    pub vertices: VertexSubset,
}

impl MrmLod {
    pub const CLASS_NAME: &'static str = "CMeshMRMGeom::CLod";
    pub const MAX_VERSION: u32 = 1;
    pub const VERTEX_DATA_NAME: &'static str = "CMeshMRMGeom::serialLodVertexData";
    pub const VERTEX_DATA_MAX_VERSION: u32 = 1;

    /// Read one LOD and the vertex subset it adds.
    fn read(d: &mut Decoder<'_>, info: &MrmLodInfo, header: &VertexBufferHeader, skinned: bool) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let num_wedges = d.read_u32()?;
        let rdr_passes = d.sequence()?;
        let geomorphs = d.sequence()?;
        let matrix_influences = d.sequence()?;
        let influenced_vertices = d.array_with(|d| d.sequence())?;
        let skin_vertex_blocks = d.since(version, 1, Vec::new(), |d| d.sequence())?;

        let offset = d.position();
        let vertex_data_version = d.schema_version(Self::VERTEX_DATA_NAME, Self::VERTEX_DATA_MAX_VERSION)?;
        let vertices = VertexSubset::read(d, header, info.start_add_wedge, info.end_add_wedges)?;
        if skinned && vertex_data_version < 1 {
            return Err(Error::unsupported(
                Self::VERTEX_DATA_NAME,
                vertex_data_version,
                offset,
                "skinned LOD vertex data before version 1 is not supported",
            ));
        }

        Ok(Self {
            version,
            num_wedges,
            rdr_passes,
            geomorphs,
            matrix_influences,
            influenced_vertices,
            skin_vertex_blocks,
            vertex_data_version,
            vertices,
        })
    }
}

/// Geometry of a progressive mesh (`CMeshMRMGeom`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMrmGeom {
    pub version: u32,
    pub bones_name: Vec<String>,
    pub mesh_vertex_program: Ptr,
    pub morpher: Option<MeshMorpher>,
    pub skinned: bool,
    pub bbox: Aabb,
    pub level_detail: LevelDetail,
    pub lod_infos: Vec<MrmLodInfo>,
    pub num_wedges: u32,
    pub vertex_buffer_header: VertexBufferHeader,
    pub skin_weights: Vec<SkinWeight>,
    pub shadow_skin: Option<ShadowSkin>,
    pub lods: Vec<MrmLod>,
}

impl MeshMrmGeom {
    pub const CLASS_NAME: &'static str = "CMeshMRMGeom";
    pub const MAX_VERSION: u32 = 5;

    /// The coarsest LOD comes first; the finest is the last one.
    pub fn finest_lod(&self) -> Option<&MrmLod> {
        self.lods.last()
    }

    /// Positions of every wedge, concatenated across LODs in stream order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.lods
            .iter()
            .filter_map(|lod| lod.vertices.attributes.positions())
            .flatten()
            .collect()
    }

    pub fn children(&self) -> Vec<&RecordRef> {
        self.mesh_vertex_program.iter().collect()
    }
}

impl Decode for MeshMrmGeom {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let bones_name = d.since(version, 3, Vec::new(), |d| d.sequence())?;
        let mesh_vertex_program = d.since(version, 2, None, |d| d.read_ptr())?;
        let morpher = d.since_opt(version, 1, MeshMorpher::decode)?;
        let skinned = d.read_bool()?;
        let bbox = d.read()?;
        let level_detail = d.read()?;
        let mut lod_infos: Vec<MrmLodInfo> = d.sequence()?;
        let num_wedges = d.read_u32()?;
        let vertex_buffer_header = d.read()?;
        let skin_weights = d.since(version, 4, Vec::new(), |d| d.sequence())?;
        let shadow_skin = d.since_opt(version, 5, ShadowSkin::decode)?;

        let table = d.position();
        for info in lod_infos.iter_mut() {
            let at = d.position();
            let relative = d.read_i32()?;
            info.lod_offset = table
                .checked_add_signed(relative as i64)
                .ok_or_else(|| Error::invalid(at, format!("LOD offset {relative} points before the stream")))?;
        }

        let mut lods = Vec::with_capacity(lod_infos.len());
        for (index, info) in lod_infos.iter().enumerate() {
            let at = d.position();
            if at != info.lod_offset {
                tracing::warn!(index, expected = info.lod_offset, actual = at, "MRM LOD offset mismatch");
            }
            lods.push(MrmLod::read(d, info, &vertex_buffer_header, skinned)?);
        }
        tracing::debug!(lods = lods.len(), num_wedges, skinned, "decoded MRM geometry");

        Ok(Self {
            version,
            bones_name,
            mesh_vertex_program,
            morpher,
            skinned,
            bbox,
            level_detail,
            lod_infos,
            num_wedges,
            vertex_buffer_header,
            skin_weights,
            shadow_skin,
            lods,
        })
    }
}

/// Progressive mesh shape (`CMeshMRM`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMrm {
    pub version: u32,
    pub base: MeshBase,
    pub geom: MeshMrmGeom,
}

impl MeshMrm {
    pub const CLASS_NAME: &'static str = "CMeshMRM";
    pub const MAX_VERSION: u32 = 0;

    pub fn children(&self) -> Vec<&RecordRef> {
        let mut out = self.base.children();
        out.extend(self.geom.children());
        out
    }
}

impl Decode for MeshMrm {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            base: d.read()?,
            geom: d.read()?,
        })
    }
}
