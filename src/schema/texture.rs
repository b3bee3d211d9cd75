//! Texture schemas.
//!
//! | record            | field                      | since | note                    |
//! |-------------------|----------------------------|-------|-------------------------|
//! | ITexture          | load_grayscale_as_alpha    | 1     | default `false`         |
//! | CTextureFile      | allow_degradation          | 1     | default `true`          |
//! | CTextureCube      | legacy_flag                | =1    | only version 1 wrote it |

use crate::core::{Ptr, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::Result;

use super::enums::{MagFilter, MinFilter, UploadFormat, WrapMode};

/// Sampling state shared by every texture (`ITexture`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureBase {
    pub version: u32,
    pub upload_format: UploadFormat,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub load_grayscale_as_alpha: bool,
}

impl TextureBase {
    pub const CLASS_NAME: &'static str = "ITexture";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for TextureBase {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            upload_format: d.read()?,
            wrap_s: d.read()?,
            wrap_t: d.read()?,
            min_filter: d.read()?,
            mag_filter: d.read()?,
            load_grayscale_as_alpha: d.since(version, 1, false, |d| d.read_bool())?,
        })
    }
}

/// Texture loaded from a single image file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureFile {
    pub version: u32,
    pub base: TextureBase,
    pub file_name: String,
    pub allow_degradation: bool,
}

impl TextureFile {
    pub const CLASS_NAME: &'static str = "CTextureFile";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for TextureFile {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            base: d.read()?,
            file_name: d.read_string()?,
            allow_degradation: d.since(version, 1, true, |d| d.read_bool())?,
        })
    }
}

/// Texture selecting one of several image files.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureMultiFile {
    pub version: u32,
    pub base: TextureBase,
    pub file_names: Vec<String>,
    pub current_selected_texture: u32,
}

impl TextureMultiFile {
    pub const CLASS_NAME: &'static str = "CTextureMultiFile";
    pub const MAX_VERSION: u32 = 0;

    /// File name of the selected texture, if the index is valid.
    pub fn selected_file_name(&self) -> Option<&str> {
        self.file_names
            .get(self.current_selected_texture as usize)
            .map(String::as_str)
    }
}

impl Decode for TextureMultiFile {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            base: d.read()?,
            file_names: d.sequence()?,
            current_selected_texture: d.read_u32()?,
        })
    }
}

/// Cube map built from six shared face textures.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureCube {
    pub version: u32,
    pub base: TextureBase,
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub faces: [Ptr; 6],
    pub legacy_flag: Option<bool>,
}

impl TextureCube {
    pub const CLASS_NAME: &'static str = "CTextureCube";
    pub const MAX_VERSION: u32 = 2;

    pub fn children(&self) -> Vec<&RecordRef> {
        self.faces.iter().flatten().collect()
    }
}

impl Decode for TextureCube {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let base = d.read()?;
        let faces = d.array_with(|d| d.read_ptr())?;
        // Written by version 1 only; dropped again in version 2.
        let legacy_flag = if version == 1 { Some(d.read_bool()?) } else { None };
        Ok(Self {
            version,
            base,
            faces,
            legacy_flag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::texture_base;
    use crate::stream::testing::ByteWriter;
    use crate::util::Error;

    #[test]
    fn test_texture_file_v1() {
        let bytes = ByteWriter::new()
            .version(1)
            .with(|w| texture_base(w, 1))
            .string("stone.tga")
            .bool(false)
            .finish();
        let mut d = Decoder::new(&bytes);
        let tex: TextureFile = d.read().unwrap();
        assert_eq!(tex.file_name, "stone.tga");
        assert!(!tex.allow_degradation);
        assert_eq!(tex.base.upload_format, UploadFormat::Dxtc5);
        assert_eq!(tex.base.wrap_t, WrapMode::Clamp);
        assert_eq!(tex.base.min_filter, MinFilter::LinearMipMapLinear);
        assert!(tex.base.load_grayscale_as_alpha);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_texture_file_v0_defaults() {
        let bytes = ByteWriter::new()
            .version(0)
            .with(|w| texture_base(w, 0))
            .string("old.tga")
            .finish();
        let mut d = Decoder::new(&bytes);
        let tex: TextureFile = d.read().unwrap();
        assert!(tex.allow_degradation);
        assert!(!tex.base.load_grayscale_as_alpha);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_texture_cube_legacy_flag() {
        let build = |version: u32| {
            let w = ByteWriter::new()
                .version(version)
                .with(|w| texture_base(w, 1))
                .null_ptr()
                .null_ptr()
                .null_ptr()
                .null_ptr()
                .null_ptr()
                .null_ptr();
            if version == 1 {
                w.bool(true).finish()
            } else {
                w.finish()
            }
        };

        let bytes = build(1);
        let mut d = Decoder::new(&bytes);
        let cube: TextureCube = d.read().unwrap();
        assert_eq!(cube.legacy_flag, Some(true));
        assert!(cube.faces.iter().all(Option::is_none));
        assert!(d.is_at_end());

        let bytes = build(2);
        let mut d = Decoder::new(&bytes);
        let cube: TextureCube = d.read().unwrap();
        assert_eq!(cube.legacy_flag, None);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_multi_file_selection() {
        let bytes = ByteWriter::new()
            .version(0)
            .with(|w| texture_base(w, 1))
            .u32(2)
            .string("a.tga")
            .string("b.tga")
            .u32(1)
            .finish();
        let mut d = Decoder::new(&bytes);
        let tex: TextureMultiFile = d.read().unwrap();
        assert_eq!(tex.selected_file_name(), Some("b.tga"));
    }

    #[test]
    fn test_texture_newer_versions_rejected() {
        let bytes = ByteWriter::new().version(1).with(|w| texture_base(w, 1)).finish();
        let err = Decoder::new(&bytes).read::<TextureMultiFile>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "CTextureMultiFile", version: 1, offset: 0, .. }
        ));

        let bytes = ByteWriter::new().version(3).finish();
        let err = Decoder::new(&bytes).read::<TextureCube>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "CTextureCube", version: 3, offset: 0, .. }
        ));

        let bytes = ByteWriter::new().version(0).with(|w| texture_base(w, 2)).finish();
        let err = Decoder::new(&bytes).read::<TextureMultiFile>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion { record: "ITexture", version: 2, offset: 1, .. }
        ));
    }
}
