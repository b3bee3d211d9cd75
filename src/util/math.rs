//! Math type re-exports and NeL-specific value types.
//!
//! This module re-exports types from `glam` and provides the small value
//! types the stream stores inline (byte colors, keyframe times).

// Re-export glam types
pub use glam::{Quat, Vec2, Vec3, Vec4};

use std::fmt;
use std::hash::{Hash, Hasher};

/// 8-bit per channel color, stored in R, G, B, A order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the default for colors absent in old versions.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a new color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Normalized RGB in `[0, 1]`.
    #[inline]
    pub fn rgb_f32(&self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    /// Normalized RGBA in `[0, 1]`.
    #[inline]
    pub fn rgba_f32(&self) -> Vec4 {
        self.rgb_f32().extend(self.a as f32 / 255.0)
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Keyframe time used as a map key.
///
/// Equality and hashing go through the bit pattern so the time can key an
/// `IndexMap`; `-0.0` is folded into `0.0` first.
#[derive(Clone, Copy)]
pub struct KeyTime(f32);

impl KeyTime {
    #[inline]
    pub fn new(time: f32) -> Self {
        Self(if time == 0.0 { 0.0 } else { time })
    }

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl PartialEq for KeyTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for KeyTime {}

impl Hash for KeyTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Debug for KeyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f32> for KeyTime {
    fn from(time: f32) -> Self {
        Self::new(time)
    }
}

// JSON map keys must be strings.
#[cfg(feature = "serde")]
impl serde::Serialize for KeyTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}
