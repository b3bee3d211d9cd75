//! Animation roots (`CAnimation`), the record of `NEL_ANIM` files.

use indexmap::IndexMap;

use crate::core::{Ptr, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::Result;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Animation {
    pub version: u32,
    pub name: String,
    /// Channel name to track index. Empty when the header was compressed
    /// into an animation set.
    pub id_by_name: IndexMap<String, u32>,
    pub tracks: Vec<Ptr>,
    pub min_end_time: f32,
    /// Skeleton shapes this animation was authored against.
    pub sss_shapes: Vec<String>,
}

impl Animation {
    pub const CLASS_NAME: &'static str = "CAnimation";
    pub const MAX_VERSION: u32 = 2;

    /// Track bound to a channel name.
    pub fn track(&self, name: &str) -> Option<&RecordRef> {
        let id = *self.id_by_name.get(name)?;
        self.tracks.get(id as usize)?.as_ref()
    }

    pub fn children(&self) -> Vec<&RecordRef> {
        self.tracks.iter().flatten().collect()
    }
}

impl Decode for Animation {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            name: d.read_string()?,
            id_by_name: d.map()?,
            tracks: d.sequence_with(|d| d.read_ptr())?,
            min_end_time: d.since(version, 1, -f32::MAX, |d| d.read_f32())?,
            sss_shapes: d.since(version, 2, Vec::new(), |d| d.sequence())?,
        })
    }
}
