//! Byte builders for unit tests.

use byteorder::{LittleEndian, WriteBytesExt};

/// Chainable little-endian writer producing NeL stream bytes.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
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

    pub fn i16(mut self, v: i16) -> Self {
        self.buf.write_i16::<LittleEndian>(v).unwrap();
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

    pub fn f64(mut self, v: f64) -> Self {
        self.buf.write_f64::<LittleEndian>(v).unwrap();
        self
    }

    /// Short form below 0xFF, escaped form otherwise.
    pub fn version(self, v: u32) -> Self {
        if v < 0xFF {
            self.u8(v as u8)
        } else {
            self.u8(0xFF).u32(v)
        }
    }

    pub fn string(self, s: &str) -> Self {
        self.u32(s.len() as u32).bytes(s.as_bytes())
    }

    pub fn vec2(self, x: f32, y: f32) -> Self {
        self.f32(x).f32(y)
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

    /// Null pointer.
    pub fn null_ptr(self) -> Self {
        self.u64(0)
    }

    /// First occurrence of a polymorphic pointer; the body follows.
    pub fn new_ptr(self, id: u64, class_name: &str) -> Self {
        self.u64(id).string(class_name)
    }

    /// Back-reference to an already written pointer.
    pub fn ref_ptr(self, id: u64) -> Self {
        self.u64(id)
    }

    /// Apply a fragment builder.
    pub fn with(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }
}
