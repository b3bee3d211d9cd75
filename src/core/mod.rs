//! Core layer - shared records, identity resolution and file dispatch.
//!
//! This module provides:
//! - [`Record`] / [`RecordRef`] - The closed set of shareable records
//! - [`IdentityCache`] - Per-load map from pointer identifiers to records
//! - [`load`] / [`load_file`] - Container detection and root decoding
//!
//! Pointer reads ([`Decoder::read_ptr`](crate::stream::Decoder::read_ptr))
//! live here because they need the record dispatch table.

mod cache;
mod loader;
mod record;
mod resolver;

pub use cache::IdentityCache;
pub use loader::{
    load, load_file, load_file_with_options, load_files, load_with_options, Asset, LoadOptions,
    LoadStats, Loaded,
};
pub use record::{decoder_for, DecodeFn, Ptr, Record, RecordRef, DISPATCH};
