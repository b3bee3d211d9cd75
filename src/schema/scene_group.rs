//! Instance groups (`CInstanceGroup`), the record of `GRPT` files.
//!
//! | record                      | field                          | since | note                    |
//! |-----------------------------|--------------------------------|-------|-------------------------|
//! | CInstanceGroup              | clusters, portals, links       | 1     | default empty           |
//! | CInstanceGroup              | global_pos                     | 2     | default origin          |
//! | CInstanceGroup              | point_lights                   | 3     | default empty array     |
//! | CInstanceGroup              | surface_light                  | 4     | default empty           |
//! | CInstanceGroup              | real_time_sun_contribution     | 5     | default `true`          |
//! | CInstance                   | clusters                       | 1     | default empty           |
//! | CInstance                   | instance_name, dont_add        | 2     | default empty, `false`  |
//! | CInstance                   | static light block             | 3     | default `None`          |
//! | CInstance                   | local_ambient_id               | 4     | default `0xFF`          |
//! | CInstance                   | dont_cast_shadow_for_interior  | 5     | default `false`         |
//! | CInstance                   | dont_cast_shadow_for_exterior  | 6     | default `false`         |
//! | CInstance                   | visible                        | 7     | default `true`          |
//! | CCluster                    | name                           | 1     | default empty           |
//! | CCluster                    | sound group, environment fx    | 2     | default empty           |
//! | CCluster                    | audibility flags               | 3     | default `false`         |
//! | CPortal                     | occlusion model ids            | 1     | default empty           |

use crate::stream::{Decode, Decoder};
use crate::util::{Result, Vec3, Vec4};

use super::common::Aabb;
use super::light::{IgSurfaceLight, PointLightNamedArray, NO_LOCAL_AMBIENT};

/// Convex volume of an interior cell (`CCluster`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cluster {
    pub version: u32,
    pub name: String,
    /// Bounding planes as (a, b, c, d).
    pub local_volume: Vec<Vec4>,
    pub local_bbox: Aabb,
    pub father_visible: bool,
    pub visible_from_father: bool,
    pub sound_group: String,
    pub environment_fx: String,
    pub audible_from_father: bool,
    pub father_audible: bool,
}

impl Cluster {
    pub const CLASS_NAME: &'static str = "CCluster";
    pub const MAX_VERSION: u32 = 3;
}

impl Decode for Cluster {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let name = d.since(version, 1, String::new(), |d| d.read_string())?;
        let local_volume = d.sequence()?;
        let local_bbox = d.read()?;
        let father_visible = d.read_bool()?;
        let visible_from_father = d.read_bool()?;
        let (sound_group, environment_fx) = d.since(version, 2, Default::default(), |d| {
            Ok((d.read_string()?, d.read_string()?))
        })?;
        let (audible_from_father, father_audible) =
            d.since(version, 3, (false, false), |d| Ok((d.read_bool()?, d.read_bool()?)))?;
        Ok(Self {
            version,
            name,
            local_volume,
            local_bbox,
            father_visible,
            visible_from_father,
            sound_group,
            environment_fx,
            audible_from_father,
            father_audible,
        })
    }
}

/// Polygon joining two clusters (`CPortal`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Portal {
    pub version: u32,
    pub local_poly: Vec<Vec3>,
    pub name: String,
    pub occlusion_model: String,
    pub open_occlusion_model: String,
}

impl Portal {
    pub const CLASS_NAME: &'static str = "CPortal";
    pub const MAX_VERSION: u32 = 1;
}

impl Decode for Portal {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let local_poly = d.sequence()?;
        let name = d.read_string()?;
        let (occlusion_model, open_occlusion_model) = d.since(version, 1, Default::default(), |d| {
            Ok((d.read_string()?, d.read_string()?))
        })?;
        Ok(Self {
            version,
            local_poly,
            name,
            occlusion_model,
            open_occlusion_model,
        })
    }
}

/// Precomputed static lighting of an instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StaticLight {
    pub avoid_static_light_pre_compute: bool,
    pub dont_cast_shadow: bool,
    pub static_light_enabled: bool,
    pub sun_contribution: u8,
    /// Ids of the two strongest point lights.
    pub light: [u8; 2],
}

impl Decode for StaticLight {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        Ok(Self {
            avoid_static_light_pre_compute: d.read_bool()?,
            dont_cast_shadow: d.read_bool()?,
            static_light_enabled: d.read_bool()?,
            sun_contribution: d.read_u8()?,
            light: d.read_array::<2>()?,
        })
    }
}

/// One placed shape (`CInstanceGroup::CInstance`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Instance {
    pub version: u32,
    pub visible: bool,
    pub dont_cast_shadow_for_exterior: bool,
    pub dont_cast_shadow_for_interior: bool,
    pub local_ambient_id: u8,
    pub static_light: Option<StaticLight>,
    pub instance_name: String,
    pub dont_add_to_scene: bool,
    /// Indices into the group's clusters.
    pub clusters: Vec<i32>,
    /// Shape file name.
    pub name: String,
    pub pos: Vec3,
    /// Stored as raw x, y, z, w.
    pub rot: Vec4,
    pub scale: Vec3,
    /// Index of the parent instance, `-1` for none.
    pub parent: i32,
}

impl Instance {
    pub const CLASS_NAME: &'static str = "CInstanceGroup::CInstance";
    pub const MAX_VERSION: u32 = 7;

    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }
}

impl Decode for Instance {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let visible = d.since(version, 7, true, |d| d.read_bool())?;
        let dont_cast_shadow_for_exterior = d.since(version, 6, false, |d| d.read_bool())?;
        let dont_cast_shadow_for_interior = d.since(version, 5, false, |d| d.read_bool())?;
        let local_ambient_id = d.since(version, 4, NO_LOCAL_AMBIENT, |d| d.read_u8())?;
        let static_light = d.since_opt(version, 3, StaticLight::decode)?;
        let (instance_name, dont_add_to_scene) = d.since(version, 2, (String::new(), false), |d| {
            Ok((d.read_string()?, d.read_bool()?))
        })?;
        let clusters = d.since(version, 1, Vec::new(), |d| d.sequence())?;
        Ok(Self {
            version,
            visible,
            dont_cast_shadow_for_exterior,
            dont_cast_shadow_for_interior,
            local_ambient_id,
            static_light,
            instance_name,
            dont_add_to_scene,
            clusters,
            name: d.read_string()?,
            pos: d.read()?,
            rot: d.read()?,
            scale: d.read()?,
            parent: d.read_i32()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InstanceGroup {
    pub version: u32,
    pub real_time_sun_contribution: bool,
    pub surface_light: IgSurfaceLight,
    pub point_lights: PointLightNamedArray,
    pub global_pos: Vec3,
    pub clusters: Vec<Cluster>,
    pub portals: Vec<Portal>,
    /// Portal indices linked to each cluster, parallel to `clusters`.
    pub cluster_portals: Vec<Vec<i32>>,
    pub instances: Vec<Instance>,
}

impl InstanceGroup {
    pub const CLASS_NAME: &'static str = "CInstanceGroup";
    pub const MAX_VERSION: u32 = 5;

    /// Portals linked to the cluster at `index`, skipping dangling links.
    pub fn portals_of(&self, index: usize) -> impl Iterator<Item = &Portal> + '_ {
        self.cluster_portals
            .get(index)
            .into_iter()
            .flatten()
            .filter_map(|&p| usize::try_from(p).ok().and_then(|p| self.portals.get(p)))
    }
}

impl Decode for InstanceGroup {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let version = d.schema_version(Self::CLASS_NAME, Self::MAX_VERSION)?;
        let real_time_sun_contribution = d.since(version, 5, true, |d| d.read_bool())?;
        let surface_light = d.since_or_default(version, 4)?;
        let point_lights = d.since_or_default(version, 3)?;
        let global_pos = d.since_or_default(version, 2)?;

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut portals = Vec::new();
        let mut cluster_portals = Vec::new();
        if version >= 1 {
            clusters = d.sequence()?;
            portals = d.sequence()?;
            cluster_portals.reserve(clusters.len());
            for _ in 0..clusters.len() {
                cluster_portals.push(d.sequence::<i32>()?);
            }
        }
        let instances: Vec<Instance> = d.sequence()?;
        tracing::debug!(
            version,
            instances = instances.len(),
            clusters = clusters.len(),
            portals = portals.len(),
            "instance group"
        );
        Ok(Self {
            version,
            real_time_sun_contribution,
            surface_light,
            point_lights,
            global_pos,
            clusters,
            portals,
            cluster_portals,
            instances,
        })
    }
}
