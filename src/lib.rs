//! # NeL 3D
//!
//! Decoder for the versioned binary asset formats of the NeL 3D engine:
//! shapes (`.shape`, `.skel`), animations (`.anim`) and instance groups (`.ig`).
//!
//! Files are object graphs written by `NLMISC::IStream`. Every record carries
//! its own version tag, and shared objects are written once and referenced by
//! identifier afterwards. Decoding reproduces that sharing: two pointers with
//! the same identifier yield the same [`RecordRef`].
//!
//! ## Modules
//!
//! - [`util`] - Errors and math types
//! - [`stream`] - Primitive reader, version tags, decode combinators
//! - [`core`] - Record set, identity cache, file dispatch
//! - [`schema`] - Record layouts (meshes, textures, skeletons, tracks, ...)
//!
//! ## Example
//!
//! ```no_run
//! use nel3d::{load_file, Record};
//!
//! let asset = load_file("fy_hom_armor01_gilet.shape")?;
//! if let Record::Mesh(mesh) = asset.root.as_ref() {
//!     println!("{} materials", mesh.base.materials.len());
//! }
//! # Ok::<(), nel3d::Error>(())
//! ```

pub mod util;
pub mod stream;
pub mod core;
pub mod schema;

// Re-export commonly used types
pub use crate::core::{
    load, load_file, load_file_with_options, load_files, load_with_options, Asset, LoadOptions,
    LoadStats, Loaded, Ptr, Record, RecordRef,
};
pub use stream::ContainerFormat;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{load, load_file, Asset, LoadOptions, Ptr, Record, RecordRef};
    pub use crate::schema::*;
    pub use crate::stream::ContainerFormat;
    pub use crate::util::{Error, Result};
}
