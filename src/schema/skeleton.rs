//! Skeleton shapes (`CSkeletonShape`) and their bones.
//!
//! Bones reference their parent by index into the bone sequence, `-1` for
//! roots. Hierarchy composition is left to consumers; only the raw parent
//! index and inverse bind matrix are kept.
//!
//! | record          | field                 | since | note                     |
//! |-----------------|-----------------------|-------|--------------------------|
//! | CBoneBase       | lod_disable_distance  | 1     | default `0.0`            |
//! | CBoneBase       | skin_scale            | 2     | default `(1, 1, 1)`      |
//! | CSkeletonShape  | lods                  | 1     | default one LOD at 0.0   |

use indexmap::IndexMap;

use crate::stream::{Decode, Decoder};
use crate::util::{Result, Vec3, Vec4};

use super::common::Matrix;

/// Bind pose and defaults of one bone (`CBoneBase`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoneBase {
    pub version: u32,
    pub name: String,
    pub inv_bind_pos: Matrix,
    /// Index of the parent bone, `-1` for a root.
    pub father_id: i32,
    pub unherit_scale: bool,
    pub lod_disable_distance: f32,
    pub default_pos: Vec3,
    pub default_rot_euler: Vec3,
    /// Stored as raw x, y, z, w.
    pub default_rot_quat: Vec4,
    pub default_scale: Vec3,
    pub default_pivot: Vec3,
    pub skin_scale: Vec3,
}

impl BoneBase {
    pub const CLASS_NAME: &'static str = "CBoneBase";
    pub const MAX_VERSION: u32 = 2;

    /// Parent index, `None` for roots and any other negative id.
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.father_id).ok()
    }
}

impl Decode for BoneBase {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let name = d.read_string()?;
        tracing::trace!(bone = %name, version, "bone");
        Ok(Self {
            version,
            name,
            inv_bind_pos: d.read()?,
            father_id: d.read_i32()?,
            unherit_scale: d.read_bool()?,
            lod_disable_distance: d.since(version, 1, 0.0, |d| d.read_f32())?,
            default_pos: d.versioned()?,
            default_rot_euler: d.versioned()?,
            default_rot_quat: d.versioned()?,
            default_scale: d.versioned()?,
            default_pivot: d.versioned()?,
            skin_scale: d.since(version, 2, Vec3::ONE, Vec3::decode)?,
        })
    }
}

/// Bone activation set of one skeleton LOD (`CSkeletonShape::CLod`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkeletonLod {
    pub version: u32,
    pub distance: f32,
    /// One byte per bone, nonzero when active.
    pub active_bones: Vec<u8>,
}

impl SkeletonLod {
    pub const CLASS_NAME: &'static str = "CSkeletonShape::CLod";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for SkeletonLod {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            distance: d.read_f32()?,
            active_bones: d.sequence()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkeletonShape {
    pub version: u32,
    pub bones: Vec<BoneBase>,
    pub bone_map: IndexMap<String, u32>,
    pub lods: Vec<SkeletonLod>,
}

impl SkeletonShape {
    pub const CLASS_NAME: &'static str = "CSkeletonShape";
    pub const MAX_VERSION: u32 = 1;

    /// Look a bone up by name through the bone map.
    pub fn bone(&self, name: &str) -> Option<&BoneBase> {
        self.bone_map
            .get(name)
            .and_then(|&id| self.bones.get(id as usize))
    }

    pub fn bone_id(&self, name: &str) -> Option<u32> {
        self.bone_map.get(name).copied()
    }

    /// Parent of the bone at `index`.
    pub fn parent_of(&self, index: usize) -> Option<&BoneBase> {
        self.bones.get(index)?.parent().and_then(|p| self.bones.get(p))
    }

    /// Indices of bones without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent().is_none())
            .map(|(i, _)| i)
    }
}

impl Decode for SkeletonShape {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let bones = d.sequence()?;
        let bone_map = d.map()?;
        let lods = if version >= 1 {
            d.sequence()?
        } else {
            tracing::debug!("skeleton v0: synthesizing a single LOD");
            vec![SkeletonLod::default()]
        };
        Ok(Self {
            version,
            bones,
            bone_map,
            lods,
        })
    }
}
