//! Container magics and stream-level constants.

use std::fmt;

use crate::util::{Error, Result};

/// Magic of shape files (`.shape`, `.skel`).
pub const SHAPE_MAGIC: &[u8; 4] = b"SHAP";

/// Magic of single animation files (`.anim`).
pub const ANIMATION_MAGIC: &[u8; 8] = b"NEL_ANIM";

/// Magic of animation set files (`.animation_set`).
pub const ANIMATION_SET_MAGIC: &[u8; 12] = b"NEL_ANIM_SET";

/// Magic of instance group files (`.ig`).
pub const INSTANCE_GROUP_MAGIC: &[u8; 4] = b"GRPT";

/// Longest magic; the dispatcher peeks this many bytes.
pub const MAX_MAGIC_LEN: usize = ANIMATION_SET_MAGIC.len();

/// Version byte value announcing a following u32 version.
pub const VERSION_ESCAPE: u8 = 0xFF;

/// Identifier of a null pointer.
pub const NULL_ID: u64 = 0;

/// Top-level container kinds, classified by magic at offset 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ContainerFormat {
    /// `SHAP` + polymorphic root pointer.
    Shape,
    /// `NEL_ANIM` + `CAnimation`.
    Animation,
    /// `NEL_ANIM_SET`; recognised, not decodable.
    AnimationSet,
    /// `GRPT` + `CInstanceGroup`.
    InstanceGroup,
}

impl ContainerFormat {
    /// Classify the leading bytes of a file.
    ///
    /// The animation set magic shares its first eight bytes with the
    /// animation magic, so it is checked first.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(ANIMATION_SET_MAGIC) {
            Ok(Self::AnimationSet)
        } else if bytes.starts_with(ANIMATION_MAGIC) {
            Ok(Self::Animation)
        } else if bytes.starts_with(SHAPE_MAGIC) {
            Ok(Self::Shape)
        } else if bytes.starts_with(INSTANCE_GROUP_MAGIC) {
            Ok(Self::InstanceGroup)
        } else {
            let n = bytes.len().min(MAX_MAGIC_LEN);
            Err(Error::UnknownContainerFormat {
                magic: bytes[..n].to_vec(),
            })
        }
    }

    /// The magic bytes consumed for this format.
    pub fn magic(self) -> &'static [u8] {
        match self {
            Self::Shape => SHAPE_MAGIC,
            Self::Animation => ANIMATION_MAGIC,
            Self::AnimationSet => ANIMATION_SET_MAGIC,
            Self::InstanceGroup => INSTANCE_GROUP_MAGIC,
        }
    }

    /// Whether a decoder exists for this container.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::AnimationSet)
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape => "shape (SHAP)",
            Self::Animation => "animation (NEL_ANIM)",
            Self::AnimationSet => "animation set (NEL_ANIM_SET)",
            Self::InstanceGroup => "instance group (GRPT)",
        };
        f.write_str(name)
    }
}
