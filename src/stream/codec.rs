//! Fixed-size tuple codecs and quantized numeric encodings.
//!
//! Plain values implement [`Decode`] so containers can read them directly.
//! The packed formats (quaternions of animation tracks, skinned vertices of
//! MRM skinned meshes) are decoded to their raw integers and expanded here.

use super::decoder::{Decode, Decoder};
use crate::util::{Quat, Result, Rgba, Vec2, Vec3, Vec4};

/// 1/32767, the unit scale of packed quaternions and normals.
pub const OO_32767: f32 = 1.0 / 32767.0;

/// Packed skinned-vertex weights are stored as `weight * 255`.
pub const SKINNED_WEIGHT_FACTOR: f32 = 255.0;

/// Packed skinned-vertex UVs are stored as `uv * 8192`.
pub const SKINNED_UV_FACTOR: f32 = 8192.0;

/// Packed skinned-vertex normals are stored as `n * 32767`.
pub const SKINNED_NORMAL_FACTOR: f32 = 32767.0;

/// Position scale writers use when no better one fits.
pub const SKINNED_DEFAULT_POS_SCALE: f32 = 8.0 / 32767.0;

/// Maximum bone influences per packed skinned vertex.
pub const SKINNED_MAX_MATRIX: usize = 4;

macro_rules! decode_scalar {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                #[inline]
                fn decode(d: &mut Decoder<'_>) -> Result<Self> {
                    d.$read()
                }
            }
        )*
    };
}

decode_scalar! {
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
    bool => read_bool,
    String => read_string,
}

impl Decode for Vec2 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Vec2::new(d.read_f32()?, d.read_f32()?))
    }
}

impl Decode for Vec3 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Vec3::new(d.read_f32()?, d.read_f32()?, d.read_f32()?))
    }
}

impl Decode for Vec4 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Vec4::new(d.read_f32()?, d.read_f32()?, d.read_f32()?, d.read_f32()?))
    }
}

/// Unpacked quaternions are stored as plain x, y, z, w floats, not renormalized.
impl Decode for Quat {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Quat::from_vec4(Vec4::decode(d)?))
    }
}

impl Decode for Rgba {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let [r, g, b, a] = d.read_array::<4>()?;
        Ok(Rgba::new(r, g, b, a))
    }
}

/// Expand four signed 16-bit components to a unit quaternion.
///
/// Each component is scaled by 1/32767 and the result renormalized. The
/// all-zero quadruple has no direction and maps to identity.
pub fn unpack_quat(x: i16, y: i16, z: i16, w: i16) -> Quat {
    let v = Vec4::new(x as f32, y as f32, z as f32, w as f32) * OO_32767;
    let len = v.length();
    if len <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_vec4(v / len)
}

/// Quaternion packed as four `i16` (x, y, z, w), as stored by sampled tracks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QuatPack {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl QuatPack {
    #[inline]
    pub fn unpack(&self) -> Quat {
        unpack_quat(self.x, self.y, self.z, self.w)
    }
}

impl Decode for QuatPack {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            x: d.read_i16()?,
            y: d.read_i16()?,
            z: d.read_i16()?,
            w: d.read_i16()?,
        })
    }
}

/// Dequantize a packed skinned position with the buffer's scale.
#[inline]
pub fn dequantize_position(p: [i16; 3], scale: f32) -> Vec3 {
    Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) * scale
}

/// Dequantize a packed skinned normal.
#[inline]
pub fn dequantize_normal(n: [i16; 3]) -> Vec3 {
    Vec3::new(n[0] as f32, n[1] as f32, n[2] as f32) / SKINNED_NORMAL_FACTOR
}

/// Dequantize a packed skinned UV.
#[inline]
pub fn dequantize_uv(uv: [i16; 2]) -> Vec2 {
    Vec2::new(uv[0] as f32, uv[1] as f32) / SKINNED_UV_FACTOR
}

/// Dequantize a packed skinning weight.
#[inline]
pub fn dequantize_weight(w: u8) -> f32 {
    w as f32 / SKINNED_WEIGHT_FACTOR
}
