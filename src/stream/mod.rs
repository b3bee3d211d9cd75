//! Low-level NeL stream format.
//!
//! NeL serializes object graphs with `NLMISC::IStream`: little-endian
//! scalars, per-record version tags and 64-bit pointer identifiers. This
//! module provides the primitive reader and the combinators every schema
//! decoder is built from.
//!
//! ## Container Layout
//!
//! ```text
//! +-------------------+
//! | Magic             |  4, 8 or 12 bytes ("SHAP", "NEL_ANIM", "GRPT")
//! +-------------------+
//! | Root record       |  polymorphic pointer (SHAP) or inline record
//! +-------------------+
//! ```
//!
//! ## Version Tags
//!
//! ```text
//! +------+                 +------+------------------+
//! | v<FF |  version = v    | 0xFF | u32 version      |
//! +------+                 +------+------------------+
//! ```
//!
//! ## Polymorphic Pointers
//!
//! ```text
//! +------------+----------------------+-------------+
//! | u64 id     | u32 len + class name | record body |   first occurrence
//! +------------+----------------------+-------------+
//! | u64 id     |                                        back-reference / null (0)
//! +------------+
//! ```

mod codec;
mod cursor;
mod decoder;
mod format;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::*;
pub use cursor::*;
pub use decoder::*;
pub use format::*;
