//! Enumerations stored as 32-bit indices into fixed name tables.

use crate::stream::{Decode, Decoder, StreamEnum};
use crate::util::Result;

macro_rules! stream_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $tag:literal { $($variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum $name {
            $($variant = $value),+
        }

        impl StreamEnum for $name {
            const NAME: &'static str = $tag;

            fn from_index(index: i32) -> Option<Self> {
                match index {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Decode for $name {
            fn decode(d: &mut Decoder<'_>) -> Result<Self> {
                d.read_enum()
            }
        }
    };
}

stream_enum! {
    /// Material shader model.
    Shader as "TShader" {
        Normal = 0,
        Bump = 1,
        UserColor = 2,
        LightMap = 3,
        Specular = 4,
        Caustics = 5,
        PerPixelLighting = 6,
        PerPixelLightingNoSpec = 7,
        Cloud = 8,
        Water = 9,
    }
}

stream_enum! {
    /// Framebuffer blend factor.
    Blend as "TBlend" {
        One = 0,
        Zero = 1,
        SrcAlpha = 2,
        InvSrcAlpha = 3,
        SrcColor = 4,
        InvSrcColor = 5,
        BlendConstantColor = 6,
        BlendConstantInvColor = 7,
        BlendConstantAlpha = 8,
        BlendConstantInvAlpha = 9,
    }
}

stream_enum! {
    /// Depth test function.
    ZFunc as "ZFunc" {
        Always = 0,
        Never = 1,
        Equal = 2,
        NotEqual = 3,
        Less = 4,
        LessEqual = 5,
        Greater = 6,
        GreaterEqual = 7,
    }
}

stream_enum! {
    /// Texture upload pixel format.
    UploadFormat as "TUploadFormat" {
        Auto = 0,
        Rgba8888 = 1,
        Rgba4444 = 2,
        Rgba5551 = 3,
        Rgb888 = 4,
        Rgb565 = 5,
        Dxtc1 = 6,
        Dxtc1Alpha = 7,
        Dxtc3 = 8,
        Dxtc5 = 9,
        Luminance = 10,
        Alpha = 11,
        AlphaLuminance = 12,
        DsDt = 13,
    }
}

stream_enum! {
    MinFilter as "TMinFilter" {
        NearestMipMapOff = 0,
        NearestMipMapNearest = 1,
        NearestMipMapLinear = 2,
        LinearMipMapOff = 3,
        LinearMipMapNearest = 4,
        LinearMipMapLinear = 5,
    }
}

stream_enum! {
    MagFilter as "TMagFilter" {
        Nearest = 0,
        Linear = 1,
    }
}

stream_enum! {
    WrapMode as "TWrapMode" {
        Repeat = 0,
        Clamp = 1,
    }
}

stream_enum! {
    /// Kind of a point light.
    PointLightType as "CPointLight::TType" {
        PointLight = 0,
        SpotLight = 1,
        AmbientLight = 2,
    }
}

stream_enum! {
    /// Whether a mesh generates camera collision.
    CameraCollisionGenerate as "TCameraCollisionGenerate" {
        AutoCameraCol = 0,
        NoCameraCol = 1,
        ForceCameraCol = 2,
    }
}

stream_enum! {
    /// Driver memory placement hint of vertex and index buffers.
    PreferredMemory as "TPreferredMemory" {
        RamPreferred = 0,
        AgpPreferred = 1,
        StaticPreferred = 2,
        RamVolatile = 3,
        AgpVolatile = 4,
    }
}

impl Default for CameraCollisionGenerate {
    fn default() -> Self {
        Self::AutoCameraCol
    }
}

impl Default for PreferredMemory {
    fn default() -> Self {
        Self::RamPreferred
    }
}

impl Default for PointLightType {
    fn default() -> Self {
        Self::PointLight
    }
}

/// Number of entries in the [`PreferredMemory`] table.
pub const PREFERRED_MEMORY_COUNT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::testing::ByteWriter;
    use crate::util::Error;

    #[test]
    fn test_read_enum() {
        let bytes = ByteWriter::new().i32(3).i32(9).finish();
        let mut d = Decoder::new(&bytes);
        assert_eq!(d.read::<Blend>().unwrap(), Blend::InvSrcAlpha);
        assert_eq!(d.read::<Shader>().unwrap(), Shader::Water);
    }

    #[test]
    fn test_read_enum_out_of_range() {
        let bytes = ByteWriter::new().i32(2).finish();
        let mut d = Decoder::new(&bytes);
        let err = d.read::<MagFilter>().unwrap_err();
        match err {
            Error::InvalidEnum { name, value, offset } => {
                assert_eq!(name, "TMagFilter");
                assert_eq!(value, 2);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
