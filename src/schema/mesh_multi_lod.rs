//! Discrete multi-LOD meshes (`CMeshMultiLod`).

use crate::core::{Ptr, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::Result;

use super::mesh::MeshBase;

/// `CMeshSlot` flag bits.
pub mod slot_flags {
    pub const BLEND_IN: u8 = 0x01;
    pub const BLEND_OUT: u8 = 0x02;
    pub const COARSE_MESH: u8 = 0x04;
    pub const IS_OPAQUE: u8 = 0x08;
    pub const IS_TRANSPARENT: u8 = 0x10;
}

/// One LOD of a multi-LOD mesh.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshSlot {
    pub version: u32,
    /// Any mesh geometry record (`CMeshGeom`, `CMeshMRMGeom`, ...).
    pub mesh_geom: Ptr,
    pub a: f32,
    pub b: f32,
    pub dist_max: f32,
    pub end_polygon_count: f32,
    pub blend_length: f32,
    pub flags: u8,
}

impl MeshSlot {
    pub const CLASS_NAME: &'static str = "CMeshMultiLod::CMeshSlot";
    pub const MAX_VERSION: u32 = 0;

    pub fn is_coarse_mesh(&self) -> bool {
        self.flags & slot_flags::COARSE_MESH != 0
    }
}

impl Decode for MeshSlot {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            mesh_geom: d.read_ptr()?,
            a: d.read_f32()?,
            b: d.read_f32()?,
            dist_max: d.read_f32()?,
            end_polygon_count: d.read_f32()?,
            blend_length: d.read_f32()?,
            flags: d.read_u8()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshMultiLod {
    pub version: u32,
    pub base: MeshBase,
    pub static_lod: bool,
    /// Slots from finest to coarsest.
    pub slots: Vec<MeshSlot>,
}

impl MeshMultiLod {
    pub const CLASS_NAME: &'static str = "CMeshMultiLod";
    pub const MAX_VERSION: u32 = 0;

    pub fn children(&self) -> Vec<&RecordRef> {
        let mut out = self.base.children();
        out.extend(self.slots.iter().filter_map(|s| s.mesh_geom.as_ref()));
        out
    }
}

impl Decode for MeshMultiLod {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            base: d.read()?,
            static_lod: d.read_bool()?,
            slots: d.sequence()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::Record;
    use crate::schema::fixtures::{mesh_base, mesh_geom};
    use crate::stream::testing::ByteWriter;
    use crate::util::Error;

    /// Slot fields after the geometry pointer.
    fn slot_tail(w: ByteWriter, dist_max: f32, flags: u8) -> ByteWriter {
        w.f32(1.0).f32(2.0).f32(dist_max).f32(0.0).f32(5.0).u8(flags)
    }

    #[test]
    fn test_slots_share_geometry() {
        let bytes = ByteWriter::new()
            .version(0)
            .with(|w| mesh_base(w, 9))
            .bool(false)
            .u32(2)
            .version(0)
            .new_ptr(7, "CMeshGeom")
            .with(|w| mesh_geom(w, 4))
            .with(|w| slot_tail(w, 50.0, slot_flags::BLEND_OUT))
            .version(0)
            .ref_ptr(7)
            .with(|w| slot_tail(w, 100.0, slot_flags::COARSE_MESH))
            .finish();
        let mut d = Decoder::new(&bytes);
        let m: MeshMultiLod = d.read().unwrap();
        assert!(d.is_at_end());
        assert!(!m.static_lod);

        let first = m.slots[0].mesh_geom.as_ref().unwrap();
        let second = m.slots[1].mesh_geom.as_ref().unwrap();
        assert!(Arc::ptr_eq(first, second));
        assert!(matches!(first.as_ref(), Record::MeshGeom(_)));
        assert!(!m.slots[0].is_coarse_mesh());
        assert!(m.slots[1].is_coarse_mesh());
        assert_eq!(m.children().len(), 2);
    }

    #[test]
    fn test_null_slot_geometry() {
        let bytes = ByteWriter::new()
            .version(0)
            .with(|w| mesh_base(w, 9))
            .bool(true)
            .u32(1)
            .version(0)
            .null_ptr()
            .with(|w| slot_tail(w, 100.0, slot_flags::COARSE_MESH))
            .finish();
        let mut d = Decoder::new(&bytes);
        let m: MeshMultiLod = d.read().unwrap();
        assert!(m.static_lod);
        assert!(m.slots[0].mesh_geom.is_none());
        assert_eq!(m.slots[0].dist_max, 100.0);
        assert!(m.children().is_empty());
        assert!(d.is_at_end());
    }

    #[test]
    fn test_newer_slot_version_rejected() {
        let bytes = ByteWriter::new()
            .version(0)
            .with(|w| mesh_base(w, 9))
            .bool(false)
            .u32(1)
            .version(1)
            .null_ptr()
            .with(|w| slot_tail(w, 10.0, 0))
            .finish();
        let slot_at = (bytes.len() - 8 - 21 - 1) as u64;
        let err = Decoder::new(&bytes).read::<MeshMultiLod>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "CMeshMultiLod::CMeshSlot", version: 1, offset, .. }
                if offset == slot_at
        ));

        let bytes = ByteWriter::new().version(1).finish();
        let err = Decoder::new(&bytes).read::<MeshMultiLod>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "CMeshMultiLod", version: 1, offset: 0, .. }
        ));
    }
}
