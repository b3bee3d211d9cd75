//! Record schemas.
//!
//! One module per schema family. Every record type implements
//! [`Decode`](crate::stream::Decode) and reads its own version tag; records
//! reachable through polymorphic pointers also appear in
//! [`Record`](crate::core::Record).
//!
//! Field names follow the engine's member names with the leading underscore
//! and Hungarian prefixes dropped.

pub mod animation;
pub mod common;
pub mod enums;
pub mod index_buffer;
pub mod light;
pub mod material;
pub mod mesh;
pub mod mesh_mrm;
pub mod mesh_mrm_skinned;
pub mod mesh_multi_lod;
pub mod scene_group;
pub mod skeleton;
pub mod texture;
pub mod track;
pub mod vertex_buffer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use animation::Animation;
pub use common::{Aabb, Matrix, ShadowSkin, ShadowVertex, SkinWeight, WedgeGeom};
pub use enums::*;
pub use index_buffer::IndexBuffer;
pub use light::{IgSurfaceLight, PointLight, PointLightNamed, PointLightNamedArray};
pub use material::{Material, MaterialBase};
pub use mesh::{LodCharacterTexture, Mesh, MeshBase, MeshGeom, MeshVpWindTree};
pub use mesh_mrm::{MeshMrm, MeshMrmGeom, MrmLod};
pub use mesh_mrm_skinned::{MeshMrmSkinned, MeshMrmSkinnedGeom, SkinnedVertex};
pub use mesh_multi_lod::{MeshMultiLod, MeshSlot};
pub use scene_group::{Cluster, Instance, InstanceGroup, Portal};
pub use skeleton::{BoneBase, SkeletonShape};
pub use texture::{TextureBase, TextureCube, TextureFile, TextureMultiFile};
pub use track::{
    KeyFramerLinearQuat, KeyFramerLinearVector, KeyFramerTcbQuat, TrackDefaultQuat, TrackDefaultVector,
    TrackSampledQuat, TrackSampledVector,
};
pub use vertex_buffer::{VertexAttributeBlock, VertexBuffer, VertexChannel};
