//! Animation tracks.
//!
//! Three families exist: keyframers (a time-keyed map of keys), sampled
//! tracks (fixed-rate samples grouped into time blocks) and default tracks
//! (a single constant value).
//!
//! Keyframer keys are stored as raw tuples; quaternion keys stay `Vec4` in
//! x, y, z, w order. Sampled quaternions are kept packed and unpacked on demand.

use indexmap::IndexMap;

use crate::stream::{Decode, Decoder, QuatPack};
use crate::util::{Error, KeyTime, Quat, Result, Vec3, Vec4};

/// Plain key (`CKey<T>`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Key<T> {
    pub version: u32,
    pub value: T,
}

impl<T> Key<T> {
    pub const CLASS_NAME: &'static str = "CKey";
    pub const MAX_VERSION: u32 = 0;
}

impl<T: Decode> Decode for Key<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            value: d.read()?,
        })
    }
}

/// Tension/continuity/bias key (`CKeyTCB<T>`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyTcb<T> {
    pub version: u32,
    pub value: T,
    pub tension: f32,
    pub continuity: f32,
    pub bias: f32,
    pub ease_to: f32,
    pub ease_from: f32,
}

impl<T> KeyTcb<T> {
    pub const CLASS_NAME: &'static str = "CKeyTCB";
    pub const MAX_VERSION: u32 = 0;
}

impl<T: Decode> Decode for KeyTcb<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            value: d.read()?,
            tension: d.read_f32()?,
            continuity: d.read_f32()?,
            bias: d.read_f32()?,
            ease_to: d.read_f32()?,
            ease_from: d.read_f32()?,
        })
    }
}

/// Keyframed track (`ITrackKeyFramer<K>`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyFramer<K> {
    pub version: u32,
    /// Keys by time, in stream order.
    pub keys: IndexMap<KeyTime, K>,
    pub range_lock: bool,
    pub range_begin: f32,
    pub range_end: f32,
    pub loop_mode: bool,
}

impl<K> KeyFramer<K> {
    pub const CLASS_NAME: &'static str = "ITrackKeyFramer";
    pub const MAX_VERSION: u32 = 0;

    /// Keys sorted by time.
    pub fn sorted_keys(&self) -> Vec<(f32, &K)> {
        let mut keys: Vec<_> = self.keys.iter().map(|(t, k)| (t.get(), k)).collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        keys
    }
}

impl<K: Decode> Decode for KeyFramer<K> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            keys: d.map_with(|d| d.read_f32().map(KeyTime::new), K::decode)?,
            range_lock: d.read_bool()?,
            range_begin: d.read_f32()?,
            range_end: d.read_f32()?,
            loop_mode: d.read_bool()?,
        })
    }
}

pub type KeyFramerLinearQuat = KeyFramer<Key<Vec4>>;
pub type KeyFramerLinearVector = KeyFramer<Key<Vec3>>;
pub type KeyFramerTcbQuat = KeyFramer<KeyTcb<Vec4>>;

pub const KEY_FRAMER_LINEAR_QUAT: &str = "CTrackKeyFramerLinearQuat";
pub const KEY_FRAMER_LINEAR_VECTOR: &str = "CTrackKeyFramerLinearVector";
pub const KEY_FRAMER_TCB_QUAT: &str = "CTrackKeyFramerTCBQuat";

/// Run of up to 256 samples sharing a frame base (`CTrackSampledCommon::CTimeBlock`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeBlock {
    pub version: u32,
    /// First frame of the block.
    pub time_offset: u16,
    /// Index of the block's first key in the track's key array.
    pub key_offset: u32,
    /// Frame of each key relative to `time_offset`.
    pub times: Vec<u8>,
}

impl TimeBlock {
    pub const CLASS_NAME: &'static str = "CTimeBlock";
    pub const MAX_VERSION: u32 = 0;

    /// Key index range covered by the block, `None` on overflow.
    pub fn key_range(&self) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(self.key_offset).ok()?;
        let end = start.checked_add(self.times.len())?;
        Some(start..end)
    }
}

impl Decode for TimeBlock {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            time_offset: d.read_u16()?,
            key_offset: d.read_u32()?,
            times: d.sequence()?,
        })
    }
}

/// Timing shared by sampled tracks (`CTrackSampledCommon`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SampledCommon {
    pub version: u32,
    pub loop_mode: bool,
    pub begin_time: f32,
    pub end_time: f32,
    pub total_range: f32,
    pub oo_total_range: f32,
    pub delta_time: f32,
    pub oo_delta_time: f32,
    pub time_blocks: Vec<TimeBlock>,
}

impl SampledCommon {
    pub const CLASS_NAME: &'static str = "CTrackSampledCommon";
    pub const MAX_VERSION: u32 = 0;

    /// Absolute time of each of `key_count` keys.
    ///
    /// Keys no block covers keep `begin_time`; blocks reaching past
    /// `key_count` are skipped.
    pub fn key_times(&self, key_count: usize) -> Vec<f32> {
        let mut out = vec![self.begin_time; key_count];
        for block in &self.time_blocks {
            let Some(range) = block.key_range().filter(|r| r.end <= key_count) else {
                continue;
            };
            for (slot, &t) in out[range].iter_mut().zip(&block.times) {
                let frame = block.time_offset as f32 + t as f32;
                *slot = self.begin_time + frame * self.delta_time;
            }
        }
        out
    }

    fn read_body(d: &mut Decoder<'_>, version: u32) -> Result<Self> {
        Ok(Self {
            version,
            loop_mode: d.read_bool()?,
            begin_time: d.read_f32()?,
            end_time: d.read_f32()?,
            total_range: d.read_f32()?,
            oo_total_range: d.read_f32()?,
            delta_time: d.read_f32()?,
            oo_delta_time: d.read_f32()?,
            time_blocks: d.sequence()?,
        })
    }

    /// Fail unless every time block indexes inside `key_count` keys.
    fn check_blocks(&self, key_count: usize, offset: u64) -> Result<()> {
        for (i, block) in self.time_blocks.iter().enumerate() {
            if !block.key_range().is_some_and(|r| r.end <= key_count) {
                return Err(Error::invalid(
                    offset,
                    format!(
                        "time block {i} covers keys {}+{} of {key_count}",
                        block.key_offset,
                        block.times.len()
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Decode for SampledCommon {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Self::read_body(d, version)
    }
}

/// Sampled rotation track with packed keys (`CTrackSampledQuat`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackSampledQuat {
    pub version: u32,
    pub common: SampledCommon,
    pub keys: Vec<QuatPack>,
}

impl TrackSampledQuat {
    pub const CLASS_NAME: &'static str = "CTrackSampledQuat";
    pub const MAX_VERSION: u32 = 1;

    /// Absolute time of each key.
    pub fn key_times(&self) -> Vec<f32> {
        self.common.key_times(self.keys.len())
    }

    /// Keys expanded to unit quaternions.
    pub fn rotations(&self) -> Vec<Quat> {
        self.keys.iter().map(QuatPack::unpack).collect()
    }
}

impl Decode for TrackSampledQuat {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let offset = d.position();
        // Version 0 wrote the common block without its own version tag.
        let common = if version >= 1 {
            d.read()?
        } else {
            SampledCommon::read_body(d, 0)?
        };
        let keys: Vec<QuatPack> = d.sequence()?;
        common.check_blocks(keys.len(), offset)?;
        Ok(Self {
            version,
            common,
            keys,
        })
    }
}

/// Sampled vector track (`CTrackSampledVector`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackSampledVector {
    pub version: u32,
    pub common: SampledCommon,
    pub keys: Vec<Vec3>,
}

impl TrackSampledVector {
    pub const CLASS_NAME: &'static str = "CTrackSampledVector";
    pub const MAX_VERSION: u32 = 0;

    /// Absolute time of each key.
    pub fn key_times(&self) -> Vec<f32> {
        self.common.key_times(self.keys.len())
    }
}

impl Decode for TrackSampledVector {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let offset = d.position();
        let common: SampledCommon = d.read()?;
        let keys: Vec<Vec3> = d.sequence()?;
        common.check_blocks(keys.len(), offset)?;
        Ok(Self {
            version,
            common,
            keys,
        })
    }
}

/// Constant track (`CTrackDefaultVector`, `CTrackDefaultQuat`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackDefault<T> {
    pub version: u32,
    pub value: T,
}

impl<T> TrackDefault<T> {
    pub const CLASS_NAME: &'static str = "CTrackDefault";
    pub const MAX_VERSION: u32 = 0;
}

impl<T: Decode> Decode for TrackDefault<T> {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            value: d.read()?,
        })
    }
}

pub type TrackDefaultVector = TrackDefault<Vec3>;
pub type TrackDefaultQuat = TrackDefault<Vec4>;

pub const TRACK_DEFAULT_VECTOR: &str = "CTrackDefaultVector";
pub const TRACK_DEFAULT_QUAT: &str = "CTrackDefaultQuat";
