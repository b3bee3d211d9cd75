//! The closed set of shareable records and the class-name dispatch table.

use std::sync::Arc;

use crate::schema::{
    Animation, InstanceGroup, KeyFramerLinearQuat, KeyFramerLinearVector, KeyFramerTcbQuat,
    LodCharacterTexture, Mesh, MeshGeom, MeshMrm, MeshMrmGeom, MeshMrmSkinned, MeshMrmSkinnedGeom,
    MeshMultiLod, MeshVpWindTree, SkeletonShape, TextureCube, TextureFile, TextureMultiFile,
    TrackDefaultQuat, TrackDefaultVector, TrackSampledQuat, TrackSampledVector,
};
use crate::stream::{Decode, Decoder};
use crate::util::Result;

/// Shared handle to a decoded record.
pub type RecordRef = Arc<Record>;

/// Polymorphic pointer field: `None` for the null identifier.
pub type Ptr = Option<RecordRef>;

macro_rules! records {
    ($($(#[$meta:meta])* $variant:ident($ty:ty) => $tag:literal,)+) => {
        /// A decoded record, tagged by its engine class name.
        #[derive(Clone, Debug, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum Record {
            $(
                $(#[$meta])*
                #[cfg_attr(feature = "serde", serde(rename = $tag))]
                $variant($ty),
            )+
        }

        impl Record {
            /// Engine class name of the record.
            pub fn type_tag(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $tag,)+
                }
            }

            /// Version tag consumed by the record's outermost decoder.
            pub fn version(&self) -> u32 {
                match self {
                    $(Self::$variant(r) => r.version,)+
                }
            }
        }

        $(
            impl From<$ty> for Record {
                fn from(r: $ty) -> Self {
                    Self::$variant(r)
                }
            }
        )+
    };
}

records! {
    Mesh(Mesh) => "CMesh",
    MeshMultiLod(MeshMultiLod) => "CMeshMultiLod",
    MeshMrm(MeshMrm) => "CMeshMRM",
    MeshMrmSkinned(MeshMrmSkinned) => "CMeshMRMSkinned",
    MeshGeom(MeshGeom) => "CMeshGeom",
    MeshMrmGeom(MeshMrmGeom) => "CMeshMRMGeom",
    MeshMrmSkinnedGeom(MeshMrmSkinnedGeom) => "CMeshMRMSkinnedGeom",
    MeshVpWindTree(MeshVpWindTree) => "CMeshVPWindTree",
    TextureFile(TextureFile) => "CTextureFile",
    TextureMultiFile(TextureMultiFile) => "CTextureMultiFile",
    TextureCube(TextureCube) => "CTextureCube",
    SkeletonShape(SkeletonShape) => "CSkeletonShape",
    TrackSampledQuat(TrackSampledQuat) => "CTrackSampledQuat",
    TrackSampledVector(TrackSampledVector) => "CTrackSampledVector",
    KeyFramerLinearQuat(KeyFramerLinearQuat) => "CTrackKeyFramerLinearQuat",
    KeyFramerLinearVector(KeyFramerLinearVector) => "CTrackKeyFramerLinearVector",
    KeyFramerTcbQuat(KeyFramerTcbQuat) => "CTrackKeyFramerTCBQuat",
    TrackDefaultVector(TrackDefaultVector) => "CTrackDefaultVector",
    TrackDefaultQuat(TrackDefaultQuat) => "CTrackDefaultQuat",
    /// Shared through a pointer without a class name.
    LodCharacterTexture(LodCharacterTexture) => "CLodCharacterTexture",
    /// Root of `NEL_ANIM` files.
    Animation(Animation) => "CAnimation",
    /// Root of `GRPT` files.
    InstanceGroup(InstanceGroup) => "CInstanceGroup",
}

impl Record {
    /// Shared records referenced directly by this one, in field order.
    ///
    /// A record reachable through several fields appears once per field.
    pub fn children(&self) -> Vec<&RecordRef> {
        match self {
            Self::Mesh(r) => r.children(),
            Self::MeshMultiLod(r) => r.children(),
            Self::MeshMrm(r) => r.children(),
            Self::MeshMrmSkinned(r) => r.children(),
            Self::MeshGeom(r) => r.children(),
            Self::MeshMrmGeom(r) => r.children(),
            Self::TextureCube(r) => r.children(),
            Self::Animation(r) => r.children(),
            _ => Vec::new(),
        }
    }

    /// Whether this is a shape that can sit at the root of a `SHAP` file.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            Self::Mesh(_)
                | Self::MeshMultiLod(_)
                | Self::MeshMrm(_)
                | Self::MeshMrmSkinned(_)
                | Self::SkeletonShape(_)
                | Self::MeshVpWindTree(_)
                | Self::TextureFile(_)
                | Self::TextureMultiFile(_)
                | Self::TextureCube(_)
        )
    }
}

/// Decoder of one polymorphic class body.
pub type DecodeFn = fn(&mut Decoder<'_>) -> Result<Record>;

fn decode_as<T: Decode + Into<Record>>(d: &mut Decoder<'_>) -> Result<Record> {
    T::decode(d).map(Into::into)
}

/// Class names a polymorphic pointer may carry, with their decoders.
pub const DISPATCH: &[(&str, DecodeFn)] = &[
    (Mesh::CLASS_NAME, decode_as::<Mesh>),
    (MeshMultiLod::CLASS_NAME, decode_as::<MeshMultiLod>),
    (MeshMrm::CLASS_NAME, decode_as::<MeshMrm>),
    (MeshMrmSkinned::CLASS_NAME, decode_as::<MeshMrmSkinned>),
    (MeshGeom::CLASS_NAME, decode_as::<MeshGeom>),
    (MeshMrmGeom::CLASS_NAME, decode_as::<MeshMrmGeom>),
    (MeshMrmSkinnedGeom::CLASS_NAME, decode_as::<MeshMrmSkinnedGeom>),
    (MeshVpWindTree::CLASS_NAME, decode_as::<MeshVpWindTree>),
    (TextureFile::CLASS_NAME, decode_as::<TextureFile>),
    (TextureMultiFile::CLASS_NAME, decode_as::<TextureMultiFile>),
    (TextureCube::CLASS_NAME, decode_as::<TextureCube>),
    (SkeletonShape::CLASS_NAME, decode_as::<SkeletonShape>),
    (TrackSampledQuat::CLASS_NAME, decode_as::<TrackSampledQuat>),
    (TrackSampledVector::CLASS_NAME, decode_as::<TrackSampledVector>),
    (crate::schema::track::KEY_FRAMER_LINEAR_QUAT, decode_as::<KeyFramerLinearQuat>),
    (crate::schema::track::KEY_FRAMER_LINEAR_VECTOR, decode_as::<KeyFramerLinearVector>),
    (crate::schema::track::KEY_FRAMER_TCB_QUAT, decode_as::<KeyFramerTcbQuat>),
    (crate::schema::track::TRACK_DEFAULT_VECTOR, decode_as::<TrackDefaultVector>),
    (crate::schema::track::TRACK_DEFAULT_QUAT, decode_as::<TrackDefaultQuat>),
];

/// Decoder registered for `class_name`.
pub fn decoder_for(class_name: &str) -> Option<DecodeFn> {
    DISPATCH
        .iter()
        .find(|(name, _)| *name == class_name)
        .map(|&(_, decode)| decode)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::schema::TrackDefaultVector;
    use crate::util::Vec3;

    #[test]
    fn test_dispatch_names_unique() {
        let names: HashSet<&str> = DISPATCH.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), DISPATCH.len());
        assert_eq!(DISPATCH.len(), 19);
    }

    #[test]
    fn test_dispatch_tags_match_records() {
        let bytes = crate::stream::testing::ByteWriter::new()
            .version(0)
            .vec3(1.0, 2.0, 3.0)
            .finish();
        let decode = decoder_for("CTrackDefaultVector").unwrap();
        let record = decode(&mut Decoder::new(&bytes)).unwrap();
        assert_eq!(record.type_tag(), "CTrackDefaultVector");
        assert_eq!(
            record,
            Record::TrackDefaultVector(TrackDefaultVector { version: 0, value: Vec3::new(1.0, 2.0, 3.0) })
        );
    }

    #[test]
    fn test_roots_not_dispatchable() {
        assert!(decoder_for("CAnimation").is_none());
        assert!(decoder_for("CInstanceGroup").is_none());
        assert!(decoder_for("CLodCharacterTexture").is_none());
        assert!(decoder_for("cmesh").is_none());
    }
}
