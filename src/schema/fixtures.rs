//! Fragment builders shared by the schema unit tests.

use crate::stream::testing::ByteWriter;

use super::vertex_buffer::{VertexChannel, DEFAULT_VALUE_TYPES, NUM_CHANNELS};

/// Position, normal, first UV set and primary color.
pub const TRIANGLE_FLAGS: u16 = 1 | 2 | 4 | 1024;

pub const TRIANGLE_TYPES: [u8; NUM_CHANNELS] = DEFAULT_VALUE_TYPES;

/// `ITexture` with DXTC5 upload, repeat/clamp wrap and trilinear filtering.
pub fn texture_base(w: ByteWriter, version: u32) -> ByteWriter {
    let w = w.version(version).i32(9).i32(0).i32(1).i32(5).i32(1);
    if version >= 1 {
        w.bool(true)
    } else {
        w
    }
}

/// `CMaterial` with no textures; flag-driven trailing blocks are left to the caller.
pub fn material(w: ByteWriter, version: u32, flags: u32) -> ByteWriter {
    let mut w = w
        .version(version)
        .i32(0)
        .u32(flags)
        .i32(2)
        .i32(3)
        .i32(5)
        .f32(0.0)
        .rgba(255, 255, 255, 255)
        .rgba(0, 0, 0, 255)
        .rgba(64, 64, 64, 255)
        .rgba(200, 200, 200, 255)
        .rgba(0, 0, 0, 255);
    if version >= 2 {
        w = w.f32(10.0);
    }
    if version >= 5 {
        w = w.f32(0.5);
    }
    if version >= 8 {
        w = w.u16(0);
    }
    for _ in 0..4 {
        w = w.null_ptr();
        if version >= 1 {
            let packed = if version >= 9 { 14 } else { 10 };
            w = w.bytes(&vec![0u8; packed]).rgba(0, 0, 0, 0);
        }
    }
    if version >= 7 {
        w = w.u32(0).bool(false);
    } else if version >= 3 {
        w = w.u32(0);
    }
    w
}

/// `CMeshBase` with one material and every optional field set away from its default.
pub fn mesh_base(w: ByteWriter, version: u32) -> ByteWriter {
    let mut w = w.version(version);
    if version >= 2 {
        w = w.i32(0);
    }
    w = w
        .version(0)
        .vec3(1.0, 2.0, 3.0)
        .version(0)
        .vec3(0.0, 0.0, 0.0)
        .version(0)
        .vec3(0.0, 0.0, 0.0)
        .version(0)
        .vec4(0.0, 0.0, 0.0, 1.0)
        .version(0)
        .vec3(1.0, 1.0, 1.0)
        .u32(1)
        .with(|w| material(w, 9, 0))
        .u32(0);
    w = if version >= 8 { w.u32(0) } else { w.i32(0) };
    if version >= 3 {
        w = w.bool(true);
    }
    if version >= 4 {
        w = w.bool(false);
    }
    if version >= 5 {
        w = w.bool(false);
    }
    if version >= 6 {
        w = w.f32(50.0);
    }
    if version >= 7 {
        w = w.null_ptr();
    }
    if version >= 9 {
        w = w.i32(1);
    }
    w
}

/// Vertex buffer header with name `"vb"` and a static memory hint.
pub fn vertex_buffer_header(
    w: ByteWriter,
    version: u32,
    flags: u16,
    types: [u8; NUM_CHANNELS],
    num_vertices: u32,
) -> ByteWriter {
    let mut w = w.version(version).u16(flags).bytes(&types).u32(num_vertices);
    if version >= 2 {
        w = w.u8(0);
    }
    if version >= 3 {
        w = w.i32(2).string("vb");
    }
    w
}

/// Three interleaved vertices in the [`TRIANGLE_FLAGS`] layout.
pub fn triangle_vertices(w: ByteWriter) -> ByteWriter {
    let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
    corners.iter().fold(w, |w, &(x, y)| {
        w.vec3(x, y, 0.0)
            .vec3(0.0, 0.0, 1.0)
            .vec2(x, y)
            .rgba(255, 255, 255, 255)
    })
}

/// Everything of a `CMeshGeom` after its optional fields: one triangle,
/// one matrix block with one render pass, a unit box, not skinned.
pub fn triangle_geom_bytes() -> Vec<u8> {
    let mut w = ByteWriter::new()
        .version(2)
        .with(|w| vertex_buffer_header(w, 3, TRIANGLE_FLAGS, TRIANGLE_TYPES, 3))
        .version(2)
        .with(triangle_vertices)
        .bytes(&[0, 1, 2, 3, 4, 5, 6, 7])
        .u32(1)
        .version(0);
    for i in 0..16 {
        w = w.u32(i);
    }
    w.u32(1)
        .u32(1)
        .version(0)
        .u32(0)
        .with(|w| w.version(2).u32(3).u32(3).u32(3).u32(0).u32(1).u32(2).i32(0))
        .version(0)
        .vec3(0.5, 0.5, 0.0)
        .vec3(0.5, 0.5, 0.0)
        .bool(false)
        .finish()
}

/// `CMeshGeom` wrapping [`triangle_geom_bytes`], with one bone name from version 4.
pub fn mesh_geom(w: ByteWriter, version: u32) -> ByteWriter {
    let mut w = w.version(version);
    if version >= 4 {
        w = w.u32(1).string("root");
    }
    if version >= 3 {
        w = w.null_ptr();
    }
    if version >= 1 {
        w = w.version(0).u32(0);
    }
    w.bytes(&triangle_geom_bytes())
}

/// One MRM LOD adding `positions`, with one render pass when `indices` is non-empty.
fn mrm_lod(positions: &[[f32; 3]], indices: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::new().version(1).u32(positions.len() as u32);
    if indices.is_empty() {
        w = w.u32(0);
    } else {
        w = w
            .u32(1)
            .version(0)
            .u32(0)
            .version(2)
            .u32(indices.len() as u32)
            .u32(indices.len() as u32)
            .u32(indices.len() as u32);
        for &i in indices {
            w = w.u32(i);
        }
        w = w.i32(0);
    }
    // geomorphs, influences, four influenced-vertex lists, skin vertex blocks
    for _ in 0..7 {
        w = w.u32(0);
    }
    w = w.version(1).version(2);
    for p in positions {
        w = w.vec3(p[0], p[1], p[2]);
    }
    w.bytes(&[0, 1, 2, 3, 4, 5, 6, 7]).finish()
}

/// `CMeshMRMGeom` with two LODs adding wedges `[0, 2)` and `[2, 3)`.
///
/// The LOD offset table points at the real LOD starts, shifted by `skew`.
pub fn mrm_geom(w: ByteWriter, version: u32, skinned: bool, skew: i32) -> ByteWriter {
    let mut w = w.version(version);
    if version >= 3 {
        w = w.u32(0);
    }
    if version >= 2 {
        w = w.null_ptr();
    }
    if version >= 1 {
        w = w.version(0).u32(0);
    }
    w = w
        .bool(skinned)
        .version(0)
        .vec3(0.5, 0.5, 0.0)
        .vec3(0.5, 0.5, 0.0)
        .u32(1)
        .u32(1)
        .f32(1.0)
        .f32(10.0)
        .f32(50.0)
        .f32(0.02)
        .f32(1.0)
        .u32(2)
        .version(0)
        .u32(0)
        .u32(2)
        .version(0)
        .u32(2)
        .u32(3)
        .u32(3)
        .with(|w| vertex_buffer_header(w, 3, VertexChannel::Position.flag(), DEFAULT_VALUE_TYPES, 3));
    if version >= 4 {
        w = w.u32(0);
    }
    if version >= 5 {
        w = w.u32(0).u32(0);
    }
    let lod0 = mrm_lod(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[]);
    let lod1 = mrm_lod(&[[0.0, 1.0, 0.0]], &[0, 1, 2]);
    w.i32(8 + skew)
        .i32(8 + lod0.len() as i32 + skew)
        .bytes(&lod0)
        .bytes(&lod1)
}

#[test]
fn test_triangle_flags_layout() {
    assert_eq!(
        TRIANGLE_FLAGS,
        VertexChannel::Position.flag()
            | VertexChannel::Normal.flag()
            | VertexChannel::TexCoord0.flag()
            | VertexChannel::PrimaryColor.flag()
    );
}
