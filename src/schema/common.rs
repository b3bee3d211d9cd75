//! Small fragments shared by the mesh, skeleton and scene schemas.

use crate::stream::{Decode, Decoder};
use crate::util::{Result, Vec3, Vec4};

/// State bits of a serialized [`Matrix`].
pub mod matrix_state {
    pub const TRANS: u32 = 1;
    pub const ROT: u32 = 2;
    pub const SCALE_UNI: u32 = 4;
    pub const SCALE_ANY: u32 = 8;
    pub const PROJ: u32 = 16;

    /// Any of these bits means the 3x3 block is stored.
    pub const HAS_ROT_BLOCK: u32 = ROT | SCALE_UNI | SCALE_ANY;
}

/// 4x4 matrix stored sparsely (`CMatrix`).
///
/// A 5-bit state mask selects which blocks follow; absent blocks are the
/// identity's. Floats are kept in stream order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Matrix {
    pub version: u32,
    pub state_bits: u32,
    pub scale33: f32,
    /// 3x3 block, nine floats, present when any rotation/scale bit is set.
    pub rotation: Option<[f32; 9]>,
    pub translation: Option<Vec3>,
    pub projection: Option<Vec4>,
}

impl Matrix {
    pub const CLASS_NAME: &'static str = "CMatrix";
    pub const MAX_VERSION: u32 = 0;

    #[inline]
    pub fn has_rotation(&self) -> bool {
        self.state_bits & matrix_state::HAS_ROT_BLOCK != 0
    }

    #[inline]
    pub fn has_translation(&self) -> bool {
        self.state_bits & matrix_state::TRANS != 0
    }

    #[inline]
    pub fn has_projection(&self) -> bool {
        self.state_bits & matrix_state::PROJ != 0
    }

    /// Check if no block is stored.
    pub fn is_identity(&self) -> bool {
        self.state_bits & (matrix_state::HAS_ROT_BLOCK | matrix_state::TRANS | matrix_state::PROJ) == 0
    }

    /// Place the stored blocks into an identity 4x4, row by row.
    ///
    /// The 3x3 floats fill rows 0..3 columns 0..3, translation fills column 3
    /// of rows 0..3, projection fills row 3.
    pub fn to_rows(&self) -> [[f32; 4]; 4] {
        let mut m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        if let Some(r) = &self.rotation {
            for row in 0..3 {
                m[row][..3].copy_from_slice(&r[row * 3..row * 3 + 3]);
            }
        }
        if let Some(t) = self.translation {
            m[0][3] = t.x;
            m[1][3] = t.y;
            m[2][3] = t.z;
        }
        if let Some(p) = self.projection {
            m[3] = p.to_array();
        }
        m
    }
}

impl Decode for Matrix {
    // The layout is driven by the state bits alone.
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let state_bits = d.read_u32()?;
        let scale33 = d.read_f32()?;

        let mut m = Self {
            version,
            state_bits,
            scale33,
            rotation: None,
            translation: None,
            projection: None,
        };
        if m.has_rotation() {
            m.rotation = Some(d.array_with(|d| d.read_f32())?);
        }
        if m.has_translation() {
            m.translation = Some(d.read()?);
        }
        if m.has_projection() {
            m.projection = Some(d.read()?);
        }
        Ok(m)
    }
}

/// Axis-aligned box as center and half extents (`CAABBox`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Aabb {
    pub version: u32,
    pub center: Vec3,
    pub half_size: Vec3,
}

impl Aabb {
    pub const CLASS_NAME: &'static str = "CAABBox";
    pub const MAX_VERSION: u32 = 0;

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_size
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_size
    }
}

impl Decode for Aabb {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            center: d.read()?,
            half_size: d.read()?,
        })
    }
}

/// Geomorph wedge range of an MRM LOD (`CMRMWedgeGeom`), unversioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WedgeGeom {
    pub start: u32,
    pub end: u32,
}

impl Decode for WedgeGeom {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            start: d.read_u32()?,
            end: d.read_u32()?,
        })
    }
}

/// Maximum bone influences per skinned vertex.
pub const SKINNING_MAX_MATRIX: usize = 4;

/// Bone influences of one skinned vertex (`CMesh::CSkinWeight`), unversioned.
///
/// Stored interleaved as (matrix id, weight) pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkinWeight {
    pub matrix_ids: [u32; SKINNING_MAX_MATRIX],
    pub weights: [f32; SKINNING_MAX_MATRIX],
}

impl Decode for SkinWeight {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let mut w = Self::default();
        for i in 0..SKINNING_MAX_MATRIX {
            w.matrix_ids[i] = d.read_u32()?;
            w.weights[i] = d.read_f32()?;
        }
        Ok(w)
    }
}

/// Vertex of a shadow skin (`CShadowVertex`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadowVertex {
    pub version: u32,
    pub vertex: Vec3,
    pub matrix_id: u32,
}

impl ShadowVertex {
    pub const CLASS_NAME: &'static str = "CShadowVertex";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for ShadowVertex {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            vertex: d.read()?,
            matrix_id: d.read_u32()?,
        })
    }
}

/// Low-poly skinned hull used for shadow casting.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadowSkin {
    pub vertices: Vec<ShadowVertex>,
    pub triangles: Vec<u32>,
}

impl Decode for ShadowSkin {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            vertices: d.sequence()?,
            triangles: d.sequence()?,
        })
    }
}
