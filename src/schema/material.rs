//! Material schemas.
//!
//! | record         | field                   | since | note                              |
//! |----------------|-------------------------|-------|-----------------------------------|
//! | CMaterial      | shininess               | 2     | default `0.0`                     |
//! | CMaterial      | alpha_test_threshold    | 5     | default `0.0`                     |
//! | CMaterial      | tex_coord_gen_mode      | 8     | default `0`                       |
//! | CMaterial      | stage tex env           | 1     | 10 packed bytes, 14 from 9        |
//! | CMaterial      | light maps              | 3     | old form below 7, then + mulx2    |
//! | CMaterial      | tex_addr_mode           | 4     | only with the `TEX_ADDR` flag     |
//! | CMaterial      | user texture matrices   | 6     | one per stage flag                |
//! | CLightMap      | lmc_ambient             | 1     | default transparent black         |
//! | CMaterialBase  | tex_anim_tracks         | 1     | absent before                     |
//! | CTexAnimTracks | w_rot                   | 1     | default `0.0`                     |

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::core::{Ptr, RecordRef};
use crate::stream::{Decode, Decoder};
use crate::util::{Result, Rgba};

use super::common::Matrix;
use super::enums::{Blend, Shader, ZFunc};

/// Texture stages per material.
pub const MAX_TEXTURES: usize = 4;

/// Bits of [`Material::flags`] that change the stream layout.
pub mod material_flags {
    /// Per-stage texture addressing modes follow.
    pub const TEX_ADDR: u32 = 0x0000_0400;
    /// User texture matrix of stage 0; stage `n` uses this bit shifted by `n`.
    pub const USER_TEX_0_MAT: u32 = 0x0010_0000;
}

/// Packed combiner state of one texture stage.
///
/// The bit layout of the packed words is driver-specific; the bytes are
/// kept as stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TexEnv {
    pub packed: SmallVec<[u8; 14]>,
    pub constant_color: Rgba,
}

impl TexEnv {
    const PACKED_LEN_OLD: usize = 10;
    const PACKED_LEN: usize = 14;

    fn read(d: &mut Decoder<'_>, material_version: u32) -> Result<Self> {
        let len = if material_version >= 9 {
            Self::PACKED_LEN
        } else {
            Self::PACKED_LEN_OLD
        };
        Ok(Self {
            packed: SmallVec::from_slice(d.read_bytes(len)?),
            constant_color: d.read()?,
        })
    }
}

/// One texture stage: a shared texture and, from version 1, its combiner.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureStage {
    pub texture: Ptr,
    pub env: Option<TexEnv>,
}

/// Light map of the current form (`CLightMap::serial2`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LightMap {
    pub version: u32,
    pub factor: Rgba,
    pub lmc_diffuse: Rgba,
    pub lmc_ambient: Rgba,
    pub texture: Ptr,
}

impl LightMap {
    pub const CLASS_NAME: &'static str = "CMaterial::CLightMap";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for LightMap {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            factor: d.read()?,
            lmc_diffuse: d.read()?,
            lmc_ambient: d.since(version, 1, Rgba::TRANSPARENT, |d| d.read())?,
            texture: d.read_ptr()?,
        })
    }
}

/// Light map of the pre-7 form, unversioned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegacyLightMap {
    pub factor: Rgba,
    pub texture: Ptr,
}

impl Decode for LegacyLightMap {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            factor: d.read()?,
            texture: d.read_ptr()?,
        })
    }
}

/// Light maps of a material, in whichever form its version wrote.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LightMaps {
    Legacy(Vec<LegacyLightMap>),
    Current { maps: Vec<LightMap>, mulx2: bool },
}

impl LightMaps {
    /// Shared textures of every light map, in stream order.
    pub fn textures(&self) -> Vec<&RecordRef> {
        match self {
            Self::Legacy(maps) => maps.iter().filter_map(|m| m.texture.as_ref()).collect(),
            Self::Current { maps, .. } => maps.iter().filter_map(|m| m.texture.as_ref()).collect(),
        }
    }
}

/// Render state of one mesh material (`CMaterial`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Material {
    pub version: u32,
    pub shader: Shader,
    pub flags: u32,
    pub src_blend: Blend,
    pub dst_blend: Blend,
    pub zfunc: ZFunc,
    pub zbias: f32,
    pub color: Rgba,
    pub emissive: Rgba,
    pub ambient: Rgba,
    pub diffuse: Rgba,
    pub specular: Rgba,
    pub shininess: f32,
    pub alpha_test_threshold: f32,
    pub tex_coord_gen_mode: u16,
    pub stages: [TextureStage; MAX_TEXTURES],
    pub light_maps: Option<LightMaps>,
    pub tex_addr_mode: Option<[u8; MAX_TEXTURES]>,
    pub user_tex_mats: [Option<Matrix>; MAX_TEXTURES],
}

impl Material {
    pub const CLASS_NAME: &'static str = "CMaterial";
    pub const MAX_VERSION: u32 = 9;

    /// Check if stage `stage` carries its own texture matrix.
    #[inline]
    pub fn is_user_tex_mat_enabled(&self, stage: usize) -> bool {
        self.flags & (material_flags::USER_TEX_0_MAT << stage) != 0
    }

    /// Texture bound to `stage`, if any.
    pub fn texture(&self, stage: usize) -> Option<&RecordRef> {
        self.stages.get(stage)?.texture.as_ref()
    }

    /// Every shared texture this material references, stages first.
    pub fn textures(&self) -> Vec<&RecordRef> {
        let mut out: Vec<&RecordRef> = self.stages.iter().filter_map(|s| s.texture.as_ref()).collect();
        if let Some(maps) = &self.light_maps {
            out.extend(maps.textures());
        }
        out
    }
}

impl Decode for Material {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let shader = d.read()?;
        let flags = d.read_u32()?;
        let src_blend = d.read()?;
        let dst_blend = d.read()?;
        let zfunc = d.read()?;
        let zbias = d.read_f32()?;
        let color = d.read()?;
        let emissive = d.read()?;
        let ambient = d.read()?;
        let diffuse = d.read()?;
        let specular = d.read()?;
        let shininess = d.since(version, 2, 0.0, |d| d.read_f32())?;
        let alpha_test_threshold = d.since(version, 5, 0.0, |d| d.read_f32())?;
        let tex_coord_gen_mode = d.since(version, 8, 0, |d| d.read_u16())?;

        let stages = d.array_with(|d| {
            Ok(TextureStage {
                texture: d.read_ptr()?,
                env: d.since_opt(version, 1, |d| TexEnv::read(d, version))?,
            })
        })?;

        let light_maps = d.since_opt(version, 3, |d| {
            if version >= 7 {
                let maps = d.sequence()?;
                let mulx2 = d.read_bool()?;
                Ok(LightMaps::Current { maps, mulx2 })
            } else {
                Ok(LightMaps::Legacy(d.sequence()?))
            }
        })?;

        let tex_addr_mode = if version >= 4 && flags & material_flags::TEX_ADDR != 0 {
            Some(d.read_array::<MAX_TEXTURES>()?)
        } else {
            None
        };

        let mut user_tex_mats: [Option<Matrix>; MAX_TEXTURES] = Default::default();
        if version >= 6 {
            for (stage, slot) in user_tex_mats.iter_mut().enumerate() {
                if flags & (material_flags::USER_TEX_0_MAT << stage) != 0 {
                    *slot = Some(d.read()?);
                }
            }
        }

        Ok(Self {
            version,
            shader,
            flags,
            src_blend,
            dst_blend,
            zfunc,
            zbias,
            color,
            emissive,
            ambient,
            diffuse,
            specular,
            shininess,
            alpha_test_threshold,
            tex_coord_gen_mode,
            stages,
            light_maps,
            tex_addr_mode,
            user_tex_mats,
        })
    }
}

/// Animated texture slot of a [`MaterialBase`], unversioned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnimatedTexture {
    pub texture: Ptr,
}

impl Decode for AnimatedTexture {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self { texture: d.read_ptr()? })
    }
}

/// Default values of the texture-matrix animation tracks of one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TexAnimTracks {
    pub version: u32,
    pub u_trans: f32,
    pub v_trans: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    pub w_rot: f32,
}

impl TexAnimTracks {
    pub const CLASS_NAME: &'static str = "CMaterialBase::CTexAnimTracks";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for TexAnimTracks {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            u_trans: d.versioned()?,
            v_trans: d.versioned()?,
            u_scale: d.versioned()?,
            v_scale: d.versioned()?,
            w_rot: d.since(version, 1, 0.0, |d| d.versioned())?,
        })
    }
}

/// Animatable default values of a material (`CMaterialBase`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaterialBase {
    pub version: u32,
    pub name: String,
    pub default_ambient: Rgba,
    pub default_diffuse: Rgba,
    pub default_specular: Rgba,
    pub default_shininess: f32,
    pub default_emissive: Rgba,
    pub default_opacity: f32,
    pub default_texture: i32,
    pub animated_textures: IndexMap<u32, AnimatedTexture>,
    pub tex_anim_tracks: Option<[TexAnimTracks; MAX_TEXTURES]>,
}

impl MaterialBase {
    pub const CLASS_NAME: &'static str = "CMaterialBase";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for MaterialBase {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            name: d.read_string()?,
            default_ambient: d.versioned()?,
            default_diffuse: d.versioned()?,
            default_specular: d.versioned()?,
            default_shininess: d.versioned()?,
            default_emissive: d.versioned()?,
            default_opacity: d.versioned()?,
            default_texture: d.versioned()?,
            animated_textures: d.map()?,
            tex_anim_tracks: d.since_opt(version, 1, |d| d.array_with(TexAnimTracks::decode))?,
        })
    }
}

/// Material stage driven by a light group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatStage {
    pub version: u32,
    pub mat_id: u8,
    pub stage_id: u8,
}

impl MatStage {
    pub const CLASS_NAME: &'static str = "CMatStage";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for MatStage {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            mat_id: d.read_u8()?,
            stage_id: d.read_u8()?,
        })
    }
}

/// Light-map stages belonging to one light group (`CLightMapInfoList`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LightMapInfoList {
    pub version: u32,
    pub light_group: u32,
    pub animated_light: String,
    pub stage_list: Vec<MatStage>,
}

impl LightMapInfoList {
    pub const CLASS_NAME: &'static str = "CLightMapInfoList";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for LightMapInfoList {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            light_group: d.read_u32()?,
            animated_light: d.read_string()?,
            stage_list: d.sequence()?,
        })
    }
}
