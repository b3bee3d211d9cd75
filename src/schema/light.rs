//! Static lighting of instance groups: named point lights and the surface
//! light grids sampled by walking entities.
//!
//! | record                 | field                         | since | note                      |
//! |------------------------|-------------------------------|-------|---------------------------|
//! | CPointLight            | type, spot direction/angles   | 1     | point light, +Y, pi/4-pi/2 |
//! | CPointLight            | add_ambient_with_sun          | 2     | default `false`           |
//! | CPointLightNamed       | light_group                   | 1     | default `0`               |
//! | CPointLightNamedArray  | -                             | 1     | version 0 is rejected     |
//! | CCellCorner            | local_ambient_id              | 1     | default `0xFF`            |
//! | CIGSurfaceLight        | retriever grid key            | 1     | string before, then u32   |

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use indexmap::IndexMap;

use crate::stream::{Decode, Decoder};
use crate::util::{Error, Result, Rgba, Vec2, Vec3};

use super::enums::PointLightType;

/// Local ambient id meaning "none".
pub const NO_LOCAL_AMBIENT: u8 = 0xFF;

/// Light source parameters (`CPointLight`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointLight {
    pub version: u32,
    pub add_ambient_with_sun: bool,
    pub kind: PointLightType,
    pub spot_direction: Vec3,
    pub spot_angle_begin: f32,
    pub spot_angle_end: f32,
    pub position: Vec3,
    pub ambient: Rgba,
    pub diffuse: Rgba,
    pub specular: Rgba,
    pub attenuation_begin: f32,
    pub attenuation_end: f32,
}

impl PointLight {
    pub const CLASS_NAME: &'static str = "CPointLight";
    pub const MAX_VERSION: u32 = 2;
}

impl Decode for PointLight {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            add_ambient_with_sun: d.since(version, 2, false, |d| d.read_bool())?,
            kind: d.since_or_default(version, 1)?,
            spot_direction: d.since(version, 1, Vec3::Y, Vec3::decode)?,
            spot_angle_begin: d.since(version, 1, FRAC_PI_4, |d| d.read_f32())?,
            spot_angle_end: d.since(version, 1, FRAC_PI_2, |d| d.read_f32())?,
            position: d.read()?,
            ambient: d.read()?,
            diffuse: d.read()?,
            specular: d.read()?,
            attenuation_begin: d.read_f32()?,
            attenuation_end: d.read_f32()?,
        })
    }
}

/// Point light that can be driven by a named light animation (`CPointLightNamed`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointLightNamed {
    pub version: u32,
    pub light: PointLight,
    pub animated_light: String,
    pub default_ambient: Rgba,
    pub default_diffuse: Rgba,
    pub default_specular: Rgba,
    pub light_group: u32,
}

impl PointLightNamed {
    pub const CLASS_NAME: &'static str = "CPointLightNamed";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for PointLightNamed {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            light: d.read()?,
            animated_light: d.read_string()?,
            default_ambient: d.read()?,
            default_diffuse: d.read()?,
            default_specular: d.read()?,
            light_group: d.since(version, 1, 0, |d| d.read_u32())?,
        })
    }
}

/// Range of lights sharing one animation and group (`CPointLightNamedArray::CPointLightGroup`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointLightGroup {
    pub version: u32,
    pub animation_light: String,
    pub light_group: u32,
    pub start_id: u32,
    pub end_id: u32,
}

impl PointLightGroup {
    pub const CLASS_NAME: &'static str = "CPointLightNamedArray::CPointLightGroup";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for PointLightGroup {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            animation_light: d.read_string()?,
            light_group: d.read_u32()?,
            start_id: d.read_u32()?,
            end_id: d.read_u32()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointLightNamedArray {
    pub version: u32,
    pub point_lights: Vec<PointLightNamed>,
    pub groups: Vec<PointLightGroup>,
}

impl PointLightNamedArray {
    pub const CLASS_NAME: &'static str = "CPointLightNamedArray";
    pub const MAX_VERSION: u32 = 1;

    /// Lights of a group, by the group's id range.
    pub fn group_lights(&self, group: &PointLightGroup) -> &[PointLightNamed] {
        let end = (group.end_id as usize).min(self.point_lights.len());
        let start = (group.start_id as usize).min(end);
        &self.point_lights[start..end]
    }
}

impl Decode for PointLightNamedArray {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let offset = d.position();
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let point_lights = d.sequence()?;
        if version == 0 {
            return Err(Error::unsupported(
                Self::CLASS_NAME,
                version,
                offset,
                "pre-1 light group map is not supported",
            ));
        }
        Ok(Self {
            version,
            point_lights,
            groups: d.sequence()?,
        })
    }
}

/// Lighting sample at one grid corner (`CSurfaceLightGrid::CCellCorner`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CellCorner {
    pub version: u32,
    pub local_ambient_id: u8,
    pub sun_contribution: u8,
    /// Ids of the two strongest point lights.
    pub light: [u8; 2],
}

impl CellCorner {
    pub const CLASS_NAME: &'static str = "CSurfaceLightGrid::CCellCorner";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for CellCorner {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        Ok(Self {
            version,
            local_ambient_id: d.since(version, 1, NO_LOCAL_AMBIENT, |d| d.read_u8())?,
            sun_contribution: d.read_u8()?,
            light: d.read_array::<2>()?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SurfaceLightGrid {
    pub version: u32,
    pub origin: Vec2,
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` corners.
    pub cells: Vec<CellCorner>,
}

impl SurfaceLightGrid {
    pub const CLASS_NAME: &'static str = "CSurfaceLightGrid";
    pub const MAX_VERSION: u32 = 0;

    pub fn cell(&self, x: u32, y: u32) -> Option<&CellCorner> {
        if x >= self.width {
            return None;
        }
        let index = (y as usize).checked_mul(self.width as usize)? + x as usize;
        self.cells.get(index)
    }
}

impl Decode for SurfaceLightGrid {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            origin: d.read()?,
            width: d.read_u32()?,
            height: d.read_u32()?,
            cells: d.sequence()?,
        })
    }
}

/// Grids of one collision retriever (`CIGSurfaceLight::CRetrieverLightGrid`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RetrieverLightGrid {
    pub version: u32,
    pub grids: Vec<SurfaceLightGrid>,
}

impl RetrieverLightGrid {
    pub const CLASS_NAME: &'static str = "CIGSurfaceLight::CRetrieverLightGrid";
    pub const MAX_VERSION: u32 = 0;
}

impl Decode for RetrieverLightGrid {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            version: d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?,
            grids: d.sequence()?,
        })
    }
}

/// Key of the retriever grid map: a name in version 0, an id afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum RetrieverKey {
    Name(String),
    Id(u32),
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IgSurfaceLight {
    pub version: u32,
    pub cell_size: f32,
    pub oo_cell_size: f32,
    pub retriever_grids: IndexMap<RetrieverKey, RetrieverLightGrid>,
}

impl IgSurfaceLight {
    pub const CLASS_NAME: &'static str = "CIGSurfaceLight";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for IgSurfaceLight {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let cell_size = d.read_f32()?;
        let oo_cell_size = d.read_f32()?;
        let retriever_grids = if version >= 1 {
            d.map_with(|d| d.read_u32().map(RetrieverKey::Id), RetrieverLightGrid::decode)?
        } else {
            d.map_with(|d| d.read_string().map(RetrieverKey::Name), RetrieverLightGrid::decode)?
        };
        Ok(Self {
            version,
            cell_size,
            oo_cell_size,
            retriever_grids,
        })
    }
}
