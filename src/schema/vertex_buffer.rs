//! Vertex buffers and their per-channel attribute blocks.
//!
//! A buffer declares which of 16 semantic channels are present (a bit per
//! channel) and, for each, a value type code. Vertex data is interleaved:
//! for every vertex, every present channel in channel order.
//!
//! | fragment       | field              | since | note                                |
//! |----------------|--------------------|-------|-------------------------------------|
//! | CVertexBuffer  | -                  | 2     | older buffers are rejected          |
//! | header         | flags + type table | 1     | legacy u32 flags before, see below  |
//! | header         | color_format       | 2     | default `0` (RGBA)                  |
//! | header         | preferred_memory   | 3     | default `RamPreferred`, name `""`   |
//! | subset         | uv_routing         | 2     | default identity routing            |

use std::collections::BTreeMap;

use crate::stream::{Decode, Decoder};
use crate::util::{Error, Result, Vec2, Vec3, Vec4};

use super::enums::PreferredMemory;

/// Number of semantic vertex channels.
pub const NUM_CHANNELS: usize = 16;

/// Number of texture coordinate sets.
pub const MAX_UV_SETS: usize = 8;

/// Value type codes assumed by headers older than version 1.
pub const DEFAULT_VALUE_TYPES: [u8; NUM_CHANNELS] = [7, 7, 4, 4, 4, 4, 4, 4, 4, 4, 12, 12, 10, 12, 1, 1];

/// Channel flags assumed by headers older than version 1.
///
/// Those headers store flags in an older bit layout that is not remapped.
pub const LEGACY_FLAGS: u16 = 12295;

/// Semantic vertex channel, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum VertexChannel {
    Position = 0,
    Normal = 1,
    TexCoord0 = 2,
    TexCoord1 = 3,
    TexCoord2 = 4,
    TexCoord3 = 5,
    TexCoord4 = 6,
    TexCoord5 = 7,
    TexCoord6 = 8,
    TexCoord7 = 9,
    PrimaryColor = 10,
    SecondaryColor = 11,
    Weight = 12,
    PaletteSkin = 13,
    Fog = 14,
    Empty = 15,
}

impl VertexChannel {
    pub const ALL: [VertexChannel; NUM_CHANNELS] = [
        Self::Position,
        Self::Normal,
        Self::TexCoord0,
        Self::TexCoord1,
        Self::TexCoord2,
        Self::TexCoord3,
        Self::TexCoord4,
        Self::TexCoord5,
        Self::TexCoord6,
        Self::TexCoord7,
        Self::PrimaryColor,
        Self::SecondaryColor,
        Self::Weight,
        Self::PaletteSkin,
        Self::Fog,
        Self::Empty,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Presence bit of this channel in the header flags.
    #[inline]
    pub fn flag(self) -> u16 {
        1 << self as u16
    }

    /// Texture coordinate channel `n`, for `n < 8`.
    pub fn tex_coord(n: usize) -> Option<Self> {
        (n < MAX_UV_SETS).then(|| Self::ALL[Self::TexCoord0.index() + n])
    }
}

/// Element type of one channel: scalar kind times arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValueType {
    Double1 = 0,
    Float1 = 1,
    Short1 = 2,
    Double2 = 3,
    Float2 = 4,
    Short2 = 5,
    Double3 = 6,
    Float3 = 7,
    Short3 = 8,
    Double4 = 9,
    Float4 = 10,
    Short4 = 11,
    UChar4 = 12,
}

impl ValueType {
    pub fn from_code(code: u8) -> Option<Self> {
        use ValueType::*;
        Some(match code {
            0 => Double1,
            1 => Float1,
            2 => Short1,
            3 => Double2,
            4 => Float2,
            5 => Short2,
            6 => Double3,
            7 => Float3,
            8 => Short3,
            9 => Double4,
            10 => Float4,
            11 => Short4,
            12 => UChar4,
            _ => return None,
        })
    }

    /// Components per vertex.
    pub fn arity(self) -> usize {
        match self {
            Self::UChar4 => 4,
            t => t as usize / 3 + 1,
        }
    }

    /// Bytes per vertex.
    pub fn byte_width(self) -> usize {
        let scalar = match self {
            Self::UChar4 => 1,
            t => match t as u8 % 3 {
                0 => 8,
                1 => 4,
                _ => 2,
            },
        };
        scalar * self.arity()
    }

    fn empty_values(self, capacity: usize) -> VertexValues {
        match self {
            Self::UChar4 => VertexValues::U8(Vec::with_capacity(capacity)),
            t => match t as u8 % 3 {
                0 => VertexValues::F64(Vec::with_capacity(capacity)),
                1 => VertexValues::F32(Vec::with_capacity(capacity)),
                _ => VertexValues::I16(Vec::with_capacity(capacity)),
            },
        }
    }
}

/// Flat per-component storage of one channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum VertexValues {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I16(Vec<i16>),
    U8(Vec<u8>),
}

impl VertexValues {
    pub fn len(&self) -> usize {
        match self {
            Self::F64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component `i` widened to `f32`.
    pub fn get_f32(&self, i: usize) -> Option<f32> {
        match self {
            Self::F64(v) => v.get(i).map(|&x| x as f32),
            Self::F32(v) => v.get(i).copied(),
            Self::I16(v) => v.get(i).map(|&x| x as f32),
            Self::U8(v) => v.get(i).map(|&x| x as f32),
        }
    }

    /// Read `arity` components of the storage's scalar kind.
    fn read(&mut self, d: &mut Decoder<'_>, arity: usize) -> Result<()> {
        for _ in 0..arity {
            match self {
                Self::F64(v) => v.push(d.read_f64()?),
                Self::F32(v) => v.push(d.read_f32()?),
                Self::I16(v) => v.push(d.read_i16()?),
                Self::U8(v) => v.push(d.read_u8()?),
            }
        }
        Ok(())
    }
}

/// Values of one channel for a run of vertices.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelData {
    pub value_type: ValueType,
    pub values: VertexValues,
}

impl ChannelData {
    /// Number of vertices stored.
    pub fn len(&self) -> usize {
        self.values.len() / self.value_type.arity()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Components of vertex `i`, widened to `f32`.
    pub fn vertex(&self, i: usize) -> Option<Vec<f32>> {
        let arity = self.value_type.arity();
        (0..arity).map(|c| self.values.get_f32(i * arity + c)).collect()
    }

    fn tuples<const N: usize>(&self) -> Option<Vec<[f32; N]>> {
        if self.value_type.arity() != N {
            return None;
        }
        let mut out = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let mut t = [0.0; N];
            for (c, slot) in t.iter_mut().enumerate() {
                *slot = self.values.get_f32(i * N + c)?;
            }
            out.push(t);
        }
        Some(out)
    }

    /// Vertices as [`Vec2`], if the channel has two components.
    pub fn to_vec2(&self) -> Option<Vec<Vec2>> {
        Some(self.tuples::<2>()?.into_iter().map(Vec2::from_array).collect())
    }

    /// Vertices as [`Vec3`], if the channel has three components.
    pub fn to_vec3(&self) -> Option<Vec<Vec3>> {
        Some(self.tuples::<3>()?.into_iter().map(Vec3::from_array).collect())
    }

    /// Vertices as [`Vec4`], if the channel has four components.
    pub fn to_vec4(&self) -> Option<Vec<Vec4>> {
        Some(self.tuples::<4>()?.into_iter().map(Vec4::from_array).collect())
    }
}

/// Sparse mapping from channel to its per-vertex values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VertexAttributeBlock {
    channels: BTreeMap<VertexChannel, ChannelData>,
}

impl VertexAttributeBlock {
    pub fn channel(&self, channel: VertexChannel) -> Option<&ChannelData> {
        self.channels.get(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = (VertexChannel, &ChannelData)> {
        self.channels.iter().map(|(&k, v)| (k, v))
    }

    pub fn has(&self, channel: VertexChannel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Number of vertices, taken from the first present channel.
    pub fn vertex_count(&self) -> usize {
        self.channels.values().next().map_or(0, ChannelData::len)
    }

    pub fn positions(&self) -> Option<Vec<Vec3>> {
        self.channel(VertexChannel::Position)?.to_vec3()
    }

    pub fn normals(&self) -> Option<Vec<Vec3>> {
        self.channel(VertexChannel::Normal)?.to_vec3()
    }

    /// Texture coordinates of set `n`.
    pub fn uvs(&self, n: usize) -> Option<Vec<Vec2>> {
        self.channel(VertexChannel::tex_coord(n)?)?.to_vec2()
    }
}

/// Layout description of a vertex buffer (`CVertexBuffer::serialHeader`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexBufferHeader {
    pub version: u32,
    /// Raw flags of headers older than version 1, not remapped.
    pub legacy_flags: Option<u32>,
    pub flags: u16,
    /// Value type code per channel, as stored.
    pub value_types: [u8; NUM_CHANNELS],
    pub num_vertices: u32,
    pub color_format: u8,
    pub preferred_memory: PreferredMemory,
    pub name: String,
}

impl VertexBufferHeader {
    pub const CLASS_NAME: &'static str = "CVertexBuffer::serialHeader";
    pub const MAX_VERSION: u32 = 3;

    #[inline]
    pub fn has_channel(&self, channel: VertexChannel) -> bool {
        self.flags & channel.flag() != 0
    }

    /// Present channels with their value types, in stream order.
    ///
    /// Fails on a present channel whose type code is unknown.
    pub fn layout(&self, offset: u64) -> Result<Vec<(VertexChannel, ValueType)>> {
        VertexChannel::ALL
            .iter()
            .filter(|ch| self.has_channel(**ch))
            .map(|&ch| {
                let code = self.value_types[ch.index()];
                ValueType::from_code(code).map(|t| (ch, t)).ok_or_else(|| {
                    Error::invalid(offset, format!("invalid value type {code} for vertex channel {ch:?}"))
                })
            })
            .collect()
    }

    /// Bytes of one interleaved vertex, or `None` if a type code is unknown.
    pub fn vertex_size(&self) -> Option<usize> {
        self.layout(0).ok().map(|l| l.iter().map(|(_, t)| t.byte_width()).sum())
    }
}

impl Decode for VertexBufferHeader {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let (legacy_flags, flags, value_types) = if version < 1 {
            let old = d.read_u32()?;
            tracing::warn!(old_flags = old, "vertex buffer header v0: assuming default channel layout");
            (Some(old), LEGACY_FLAGS, DEFAULT_VALUE_TYPES)
        } else {
            (None, d.read_u16()?, d.read_array::<NUM_CHANNELS>()?)
        };
        let num_vertices = d.read_u32()?;
        let color_format = d.since(version, 2, 0, |d| d.read_u8())?;
        let (preferred_memory, name) = if version >= 3 {
            (d.read()?, d.read_string()?)
        } else {
            (PreferredMemory::default(), String::new())
        };
        Ok(Self {
            version,
            legacy_flags,
            flags,
            value_types,
            num_vertices,
            color_format,
            preferred_memory,
            name,
        })
    }
}

/// Identity routing of texture coordinate sets to stages.
pub const DEFAULT_UV_ROUTING: [u8; MAX_UV_SETS] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Vertices `[start, end)` of a buffer (`CVertexBuffer::serialSubset`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexSubset {
    pub version: u32,
    pub start: u32,
    pub end: u32,
    pub attributes: VertexAttributeBlock,
    pub uv_routing: [u8; MAX_UV_SETS],
}

impl VertexSubset {
    pub const CLASS_NAME: &'static str = "CVertexBuffer::serialSubset";
    pub const MAX_VERSION: u32 = 2;

    /// Read the vertex range `[start, end)` using the channel layout of `header`.
    pub fn read(d: &mut Decoder<'_>, header: &VertexBufferHeader, start: u32, end: u32) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let count = end.saturating_sub(start) as usize;

        let mut attributes = VertexAttributeBlock::default();
        if count > 0 {
            let layout = header.layout(d.position())?;
            let mut storage: Vec<VertexValues> = layout
                .iter()
                .map(|(_, t)| t.empty_values((count * t.arity()).min(d.remaining())))
                .collect();
            for _ in 0..count {
                for ((_, value_type), values) in layout.iter().zip(storage.iter_mut()) {
                    values.read(d, value_type.arity())?;
                }
            }
            attributes.channels = layout
                .into_iter()
                .zip(storage)
                .map(|((ch, value_type), values)| (ch, ChannelData { value_type, values }))
                .collect();
        }

        let uv_routing = d.since(version, 2, DEFAULT_UV_ROUTING, |d| d.read_array())?;
        Ok(Self {
            version,
            start,
            end,
            attributes,
            uv_routing,
        })
    }
}

/// Self-contained vertex buffer (`CVertexBuffer`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexBuffer {
    pub version: u32,
    pub header: VertexBufferHeader,
    pub vertices: VertexSubset,
}

impl VertexBuffer {
    pub const CLASS_NAME: &'static str = "CVertexBuffer";
    pub const MIN_VERSION: u32 = 2;
    pub const MAX_VERSION: u32 = 2;

    #[inline]
    pub fn attributes(&self) -> &VertexAttributeBlock {
        &self.vertices.attributes
    }
}

impl Decode for VertexBuffer {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let offset = d.position();
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        if version < Self::MIN_VERSION {
            return Err(Error::unsupported(
                Self::CLASS_NAME,
                version,
                offset,
                "pre-2 vertex buffers are not supported",
            ));
        }
        let header: VertexBufferHeader = d.read()?;
        let vertices = VertexSubset::read(d, &header, 0, header.num_vertices)?;
        Ok(Self {
            version,
            header,
            vertices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::{vertex_buffer_header, TRIANGLE_FLAGS, TRIANGLE_TYPES};
    use crate::stream::testing::ByteWriter;

    #[test]
    fn test_value_type_widths() {
        assert_eq!(ValueType::Double1.byte_width(), 8);
        assert_eq!(ValueType::Float3.byte_width(), 12);
        assert_eq!(ValueType::Short2.byte_width(), 4);
        assert_eq!(ValueType::Float4.arity(), 4);
        assert_eq!(ValueType::UChar4.byte_width(), 4);
        assert_eq!(ValueType::from_code(13), None);
    }

    #[test]
    fn test_header_current_form() {
        let bytes = ByteWriter::new()
            .with(|w| vertex_buffer_header(w, 3, TRIANGLE_FLAGS, TRIANGLE_TYPES, 3))
            .finish();
        let mut d = Decoder::new(&bytes);
        let h: VertexBufferHeader = d.read().unwrap();
        assert!(h.has_channel(VertexChannel::Position));
        assert!(h.has_channel(VertexChannel::TexCoord0));
        assert!(!h.has_channel(VertexChannel::Weight));
        assert_eq!(h.num_vertices, 3);
        assert_eq!(h.preferred_memory, PreferredMemory::StaticPreferred);
        assert_eq!(h.name, "vb");
        assert_eq!(h.vertex_size(), Some(12 + 12 + 8 + 4));
        assert!(d.is_at_end());
    }

    #[test]
    fn test_header_legacy_form() {
        let bytes = ByteWriter::new().version(0).u32(0xDEAD).u32(0).finish();
        let mut d = Decoder::new(&bytes);
        let h: VertexBufferHeader = d.read().unwrap();
        assert_eq!(h.legacy_flags, Some(0xDEAD));
        assert_eq!(h.flags, LEGACY_FLAGS);
        assert_eq!(h.value_types, DEFAULT_VALUE_TYPES);
        assert_eq!(h.preferred_memory, PreferredMemory::RamPreferred);
        assert!(h.name.is_empty());
        assert!(d.is_at_end());
    }

    #[test]
    fn test_interleaved_subset() {
        let mut w = ByteWriter::new()
            .version(2)
            .with(|w| vertex_buffer_header(w, 3, TRIANGLE_FLAGS, TRIANGLE_TYPES, 2))
            .version(2);
        for i in 0..2 {
            let f = i as f32;
            w = w
                .vec3(f, 0.0, 0.0)
                .vec3(0.0, 0.0, 1.0)
                .vec2(f * 0.5, 1.0)
                .rgba(255, 0, 0, 255);
        }
        let bytes = w.bytes(&[1, 0, 2, 3, 4, 5, 6, 7]).finish();
        let mut d = Decoder::new(&bytes);
        let vb: VertexBuffer = d.read().unwrap();
        let attrs = vb.attributes();
        assert_eq!(attrs.vertex_count(), 2);
        assert_eq!(attrs.positions().unwrap(), vec![Vec3::ZERO, Vec3::X]);
        assert_eq!(attrs.normals().unwrap(), vec![Vec3::Z, Vec3::Z]);
        assert_eq!(attrs.uvs(0).unwrap()[1], Vec2::new(0.5, 1.0));
        assert_eq!(attrs.uvs(1), None);
        let color = attrs.channel(VertexChannel::PrimaryColor).unwrap();
        assert_eq!(color.values, VertexValues::U8(vec![255, 0, 0, 255, 255, 0, 0, 255]));
        assert_eq!(vb.vertices.uv_routing, [1, 0, 2, 3, 4, 5, 6, 7]);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_subset_v1_default_routing() {
        let header = VertexBufferHeader {
            version: 3,
            legacy_flags: None,
            flags: VertexChannel::Fog.flag(),
            value_types: DEFAULT_VALUE_TYPES,
            num_vertices: 10,
            color_format: 0,
            preferred_memory: PreferredMemory::default(),
            name: String::new(),
        };
        let bytes = ByteWriter::new().version(1).f32(0.25).f32(0.75).finish();
        let mut d = Decoder::new(&bytes);
        let sub = VertexSubset::read(&mut d, &header, 4, 6).unwrap();
        assert_eq!(sub.uv_routing, DEFAULT_UV_ROUTING);
        let fog = sub.attributes.channel(VertexChannel::Fog).unwrap();
        assert_eq!(fog.values, VertexValues::F32(vec![0.25, 0.75]));
        assert!(d.is_at_end());
    }

    #[test]
    fn test_invalid_value_type() {
        let mut types = TRIANGLE_TYPES;
        types[VertexChannel::Normal.index()] = 13;
        let bytes = ByteWriter::new()
            .version(2)
            .with(|w| vertex_buffer_header(w, 3, TRIANGLE_FLAGS, types, 1))
            .version(2)
            .finish();
        let mut d = Decoder::new(&bytes);
        let err = d.read::<VertexBuffer>().unwrap_err();
        assert!(matches!(err, Error::InvalidStructure { .. }));
    }

    #[test]
    fn test_old_buffer_rejected() {
        let bytes = ByteWriter::new().version(1).finish();
        let mut d = Decoder::new(&bytes);
        let err = d.read::<VertexBuffer>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "CVertexBuffer", version: 1, offset: 0, .. }
        ));
    }

    #[test]
    fn test_newer_buffer_versions_rejected() {
        let bytes = ByteWriter::new().version(3).finish();
        assert!(matches!(
            Decoder::new(&bytes).read::<VertexBuffer>().unwrap_err(),
            Error::UnsupportedVersion { record: "CVertexBuffer", version: 3, offset: 0, .. }
        ));

        let bytes = ByteWriter::new()
            .version(2)
            .with(|w| vertex_buffer_header(w, 4, TRIANGLE_FLAGS, TRIANGLE_TYPES, 0))
            .finish();
        assert!(matches!(
            Decoder::new(&bytes).read::<VertexBuffer>().unwrap_err(),
            Error::UnsupportedVersion { record: "CVertexBuffer::serialHeader", version: 4, offset: 1, .. }
        ));

        // Subset tag right after an empty v3 header.
        let bytes = ByteWriter::new()
            .version(2)
            .with(|w| vertex_buffer_header(w, 3, TRIANGLE_FLAGS, TRIANGLE_TYPES, 0))
            .version(3)
            .finish();
        let at = (bytes.len() - 1) as u64;
        assert!(matches!(
            Decoder::new(&bytes).read::<VertexBuffer>().unwrap_err(),
            Error::UnsupportedVersion { record: "CVertexBuffer::serialSubset", version: 3, offset, .. }
                if offset == at
        ));
    }
}
