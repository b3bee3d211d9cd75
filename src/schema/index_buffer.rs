//! Index buffers (`CIndexBuffer`).
//!
//! Two encodings exist. Before version 1 the buffer was a triangle primitive
//! block: line and quad lists bracket a triangle list whose counts are in
//! triangles. From version 1 counts are in indices and a memory hint follows.

use crate::stream::{Decode, Decoder};
use crate::util::{Error, Result};

use super::enums::{PreferredMemory, PREFERRED_MEMORY_COUNT};

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexBuffer {
    pub version: u32,
    pub num_indices: u32,
    pub capacity: u32,
    pub indices: Vec<u32>,
    pub preferred_memory: PreferredMemory,
    /// Per-memory-kind residency flags, written by version 1 only.
    pub residency: Option<[bool; PREFERRED_MEMORY_COUNT]>,
    /// Set when the indices came from the pre-1 primitive block.
    pub reconstructed: bool,
}

impl IndexBuffer {
    pub const CLASS_NAME: &'static str = "CIndexBuffer";
    pub const MAX_VERSION: u32 = 2;

    /// Indices grouped as triangles; a trailing partial triangle is dropped.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    fn read_legacy(d: &mut Decoder<'_>, version: u32) -> Result<Self> {
        fn triangle_count(d: &mut Decoder<'_>) -> Result<u32> {
            let at = d.position();
            d.read_u32()?
                .checked_mul(3)
                .ok_or_else(|| Error::invalid(at, "triangle count overflows index count"))
        }

        let offset = d.position();

        // Line list.
        d.read_u32()?;
        d.read_u32()?;
        d.sequence::<u32>()?;

        let num_indices = triangle_count(d)?;
        let capacity = triangle_count(d)?;
        let indices = d.sequence()?;

        // Quad list.
        d.read_u32()?;
        d.read_u32()?;
        d.sequence::<u32>()?;

        tracing::warn!(
            offset,
            num_indices,
            "index buffer v0: indices reconstructed from legacy triangle block, best effort"
        );
        Ok(Self {
            version,
            num_indices,
            capacity,
            indices,
            preferred_memory: PreferredMemory::default(),
            residency: None,
            reconstructed: true,
        })
    }
}

impl Decode for IndexBuffer {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        if version < 1 {
            return Self::read_legacy(d, version);
        }
        let num_indices = d.read_u32()?;
        let capacity = d.read_u32()?;
        let indices = d.sequence()?;
        let preferred_memory = d.read()?;
        let residency = if version == 1 {
            Some(d.array_with(|d| d.read_bool())?)
        } else {
            None
        };
        Ok(Self {
            version,
            num_indices,
            capacity,
            indices,
            preferred_memory,
            residency,
            reconstructed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::testing::ByteWriter;

    #[test]
    fn test_current_form() {
        let bytes = ByteWriter::new()
            .version(2)
            .u32(6)
            .u32(6)
            .u32(6)
            .u32(0)
            .u32(1)
            .u32(2)
            .u32(2)
            .u32(1)
            .u32(3)
            .i32(1)
            .finish();
        let mut d = Decoder::new(&bytes);
        let ib: IndexBuffer = d.read().unwrap();
        assert_eq!(ib.num_indices, 6);
        assert_eq!(ib.preferred_memory, PreferredMemory::AgpPreferred);
        assert_eq!(ib.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [2, 1, 3]]);
        assert_eq!(ib.residency, None);
        assert!(!ib.reconstructed);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_v1_residency_flags() {
        let bytes = ByteWriter::new()
            .version(1)
            .u32(0)
            .u32(0)
            .u32(0)
            .i32(0)
            .bool(true)
            .bool(false)
            .bool(false)
            .bool(false)
            .bool(true)
            .finish();
        let mut d = Decoder::new(&bytes);
        let ib: IndexBuffer = d.read().unwrap();
        assert_eq!(ib.residency, Some([true, false, false, false, true]));
        assert!(d.is_at_end());
    }

    #[test]
    fn test_legacy_form() {
        let bytes = ByteWriter::new()
            .version(0)
            // lines
            .u32(1)
            .u32(1)
            .u32(2)
            .u32(9)
            .u32(9)
            // triangles
            .u32(1)
            .u32(2)
            .u32(3)
            .u32(4)
            .u32(5)
            .u32(6)
            // quads
            .u32(0)
            .u32(0)
            .u32(0)
            .finish();
        let mut d = Decoder::new(&bytes);
        let ib: IndexBuffer = d.read().unwrap();
        assert!(ib.reconstructed);
        assert_eq!(ib.num_indices, 3);
        assert_eq!(ib.capacity, 6);
        assert_eq!(ib.indices, vec![4, 5, 6]);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_too_new() {
        let bytes = ByteWriter::new().version(3).finish();
        let mut d = Decoder::new(&bytes);
        assert!(matches!(
            d.read::<IndexBuffer>().unwrap_err(),
            Error::UnsupportedVersion { version: 3, .. }
        ));
    }
}
