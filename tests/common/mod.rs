//! Byte-level builders for NeL stream fixtures.
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

/// Little-endian stream builder mirroring `NLMISC::IStream` serialization.
#[derive(Default)]
pub struct Stream {
    buf: Vec<u8>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn raw(mut self, b: &[u8]) -> Self {
        self.buf.extend_from_slice(b);
        self
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.buf.push(v);
        self
    }

    pub fn bool(self, v: bool) -> Self {
        self.u8(v as u8)
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.buf.write_u16::<LittleEndian>(v).unwrap();
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buf.write_u32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.buf.write_i32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.buf.write_u64::<LittleEndian>(v).unwrap();
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.buf.write_f32::<LittleEndian>(v).unwrap();
        self
    }

    /// Version tag: one byte, or `0xFF` + u32 from 255 up.
    pub fn version(self, v: u32) -> Self {
        if v < 0xFF {
            self.u8(v as u8)
        } else {
            self.u8(0xFF).u32(v)
        }
    }

    pub fn string(self, s: &str) -> Self {
        self.u32(s.len() as u32).raw(s.as_bytes())
    }

    pub fn vec3(self, x: f32, y: f32, z: f32) -> Self {
        self.f32(x).f32(y).f32(z)
    }

    pub fn vec4(self, x: f32, y: f32, z: f32, w: f32) -> Self {
        self.f32(x).f32(y).f32(z).f32(w)
    }

    pub fn rgba(self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.u8(r).u8(g).u8(b).u8(a)
    }

    pub fn null_ptr(self) -> Self {
        self.u64(0)
    }

    /// First occurrence of a polymorphic pointer; the body follows.
    pub fn new_ptr(self, id: u64, class_name: &str) -> Self {
        self.u64(id).string(class_name)
    }

    pub fn ref_ptr(self, id: u64) -> Self {
        self.u64(id)
    }

    pub fn with(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }
}

/// `CTextureFile` v1 body.
pub fn texture_file(s: Stream, name: &str) -> Stream {
    s.version(1)
        .version(1)
        .i32(9)
        .i32(0)
        .i32(1)
        .i32(5)
        .i32(1)
        .bool(false)
        .string(name)
        .bool(true)
}

/// `CMaterial` v9 without flags; `stage0` writes the first texture pointer.
pub fn material(s: Stream, stage0: impl FnOnce(Stream) -> Stream) -> Stream {
    let mut s = s
        .version(9)
        .i32(0)
        .u32(0)
        .i32(2)
        .i32(3)
        .i32(5)
        .f32(0.0)
        .rgba(255, 255, 255, 255)
        .rgba(0, 0, 0, 255)
        .rgba(64, 64, 64, 255)
        .rgba(200, 200, 200, 255)
        .rgba(0, 0, 0, 255)
        .f32(10.0)
        .f32(0.5)
        .u16(0)
        .with(stage0)
        .raw(&[0; 14])
        .rgba(0, 0, 0, 0);
    for _ in 1..4 {
        s = s.null_ptr().raw(&[0; 14]).rgba(0, 0, 0, 0);
    }
    s.u32(0).bool(false)
}

/// `CMeshBase` at `version` (3..=9); `materials` writes `count` materials.
pub fn mesh_base(
    s: Stream,
    version: u32,
    count: u32,
    materials: impl FnOnce(Stream) -> Stream,
) -> Stream {
    let mut s = s
        .version(version)
        .i32(0)
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
        .u32(count)
        .with(materials)
        .u32(0);
    s = if version >= 8 { s.u32(0) } else { s.i32(0) };
    s = s.bool(true);
    if version >= 4 {
        s = s.bool(false);
    }
    if version >= 5 {
        s = s.bool(false);
    }
    if version >= 6 {
        s = s.f32(50.0);
    }
    if version >= 7 {
        s = s.null_ptr();
    }
    if version >= 9 {
        s = s.i32(1);
    }
    s
}

/// Value types of position/normal (float3), UVs (float2) and colors (uchar4).
pub const VALUE_TYPES: [u8; 16] = [7, 7, 4, 4, 4, 4, 4, 4, 4, 4, 12, 12, 10, 12, 1, 1];

/// Position, normal, first UV set and primary color.
pub const TRIANGLE_FLAGS: u16 = 1 | 2 | 4 | 1024;

/// `CMeshGeom` v4 holding one textured triangle in one render pass.
pub fn triangle_geom(s: Stream) -> Stream {
    let mut s = s
        .version(4)
        .u32(1)
        .string("root")
        .null_ptr()
        .version(0)
        .u32(0)
        // vertex buffer
        .version(2)
        .version(3)
        .u16(TRIANGLE_FLAGS)
        .raw(&VALUE_TYPES)
        .u32(3)
        .u8(0)
        .i32(2)
        .string("vb")
        .version(2);
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
        s = s
            .vec3(x, y, 0.0)
            .vec3(0.0, 0.0, 1.0)
            .f32(x)
            .f32(y)
            .rgba(255, 255, 255, 255);
    }
    s = s.raw(&[0, 1, 2, 3, 4, 5, 6, 7]);
    // one matrix block, one render pass
    s = s.u32(1).version(0);
    for i in 0..16 {
        s = s.u32(i);
    }
    s.u32(1)
        .u32(1)
        .version(0)
        .u32(0)
        .version(2)
        .u32(3)
        .u32(3)
        .u32(3)
        .u32(0)
        .u32(1)
        .u32(2)
        .i32(0)
        // bounding box, skinned
        .version(0)
        .vec3(0.5, 0.5, 0.0)
        .vec3(0.5, 0.5, 0.0)
        .bool(false)
}

/// `SHAP` file whose root is a `CMesh` with two materials sharing one texture.
pub fn shared_texture_mesh() -> Vec<u8> {
    Stream::new()
        .raw(b"SHAP")
        .new_ptr(1, "CMesh")
        .version(0)
        .with(|s| {
            mesh_base(s, 9, 2, |s| {
                let s = material(s, |s| {
                    s.new_ptr(5, "CTextureFile")
                        .with(|s| texture_file(s, "bark.tga"))
                });
                material(s, |s| s.ref_ptr(5))
            })
        })
        .with(triangle_geom)
        .finish()
}

/// `CAnimation` v2 with a position track shared by two channel names.
pub fn animation(s: Stream) -> Stream {
    s.version(2)
        .string("walk")
        .u32(2)
        .string("pos")
        .u32(0)
        .string("alias")
        .u32(0)
        .u32(1)
        .new_ptr(3, "CTrackDefaultVector")
        .version(0)
        .vec3(1.0, 2.0, 3.0)
        .f32(4.0)
        .u32(1)
        .string("skel")
}

/// `CInstance` v2 with a name and no cluster links.
pub fn instance(s: Stream, name: &str, parent: i32) -> Stream {
    s.version(2)
        .string("inst")
        .bool(false)
        .u32(0)
        .string(name)
        .vec3(1.0, 2.0, 3.0)
        .vec4(0.0, 0.0, 0.0, 1.0)
        .vec3(1.0, 1.0, 1.0)
        .i32(parent)
}

/// `CInstanceGroup` v5 with no lights, clusters or portals.
pub fn instance_group(s: Stream) -> Stream {
    s.version(5)
        .bool(true)
        // surface light
        .version(1)
        .f32(1.0)
        .f32(1.0)
        .u32(0)
        // point lights
        .version(1)
        .u32(0)
        .u32(0)
        .vec3(10.0, 20.0, 0.0)
        .u32(0)
        .u32(0)
        .u32(2)
        .with(|s| instance(s, "tr_tree.shape", -1))
        .with(|s| instance(s, "tr_leaves.shape", 0))
}
