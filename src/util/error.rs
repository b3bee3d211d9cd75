//! Error types for the NeL decoder.

use std::path::PathBuf;
use thiserror::Error;

use crate::stream::ContainerFormat;

/// Main error type for decode operations.
///
/// Every variant except [`Error::StringDecode`] aborts the whole load: a decode
/// error leaves the cursor misaligned, so nothing read after it can be trusted.
#[derive(Error, Debug)]
pub enum Error {
    /// A read needed more bytes than the source still holds.
    #[error("Unexpected end of stream at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: u64,
        needed: usize,
        remaining: usize,
    },

    /// A polymorphic pointer named a class with no decoder.
    #[error("Unknown record type '{class_name}' (identifier {id}) at offset {offset}")]
    UnknownRecordType {
        class_name: String,
        id: u64,
        offset: u64,
    },

    /// Leading bytes match no known container magic.
    #[error("Unknown container format: leading bytes {magic:02x?}")]
    UnknownContainerFormat { magic: Vec<u8> },

    /// Magic was recognised but the container has no decoder.
    #[error("Unsupported container format: {format}")]
    UnsupportedContainerFormat { format: ContainerFormat },

    /// Version newer than any modelled revision, or a legacy layout that is
    /// recognised but not decodable.
    #[error("Unsupported {record} version {version} at offset {offset}: {reason}")]
    UnsupportedVersion {
        record: &'static str,
        version: u32,
        offset: u64,
        reason: &'static str,
    },

    /// A pointer referenced a record that is still being decoded.
    #[error("Pointer cycle: identifier {id} referenced from inside its own decode at offset {offset}")]
    UnsupportedPointerCycle { id: u64, offset: u64 },

    /// String bytes are not valid UTF-8. Only returned by strict string reads.
    #[error("Invalid UTF-8 in string of {len} bytes at offset {offset}")]
    StringDecode { offset: u64, len: usize },

    /// Enum index outside the known table.
    #[error("Invalid {name} value {value} at offset {offset}")]
    InvalidEnum {
        name: &'static str,
        value: i64,
        offset: u64,
    },

    /// Structurally impossible data (null root, bad vertex value type, ...).
    #[error("Invalid structure at offset {offset}: {message}")]
    InvalidStructure { offset: u64, message: String },

    /// Bytes left after the root record in strict mode.
    #[error("{remaining} trailing bytes after root record at offset {offset}")]
    TrailingBytes { offset: u64, remaining: usize },

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(offset: u64, msg: impl Into<String>) -> Self {
        Self::InvalidStructure {
            offset,
            message: msg.into(),
        }
    }

    /// Create an unsupported version error.
    pub fn unsupported(record: &'static str, version: u32, offset: u64, reason: &'static str) -> Self {
        Self::UnsupportedVersion {
            record,
            version,
            offset,
            reason,
        }
    }

    /// Byte offset at which the error was detected, if it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::UnexpectedEof { offset, .. }
            | Self::UnknownRecordType { offset, .. }
            | Self::UnsupportedVersion { offset, .. }
            | Self::UnsupportedPointerCycle { offset, .. }
            | Self::StringDecode { offset, .. }
            | Self::InvalidEnum { offset, .. }
            | Self::InvalidStructure { offset, .. }
            | Self::TrailingBytes { offset, .. } => Some(*offset),
            Self::UnknownContainerFormat { .. } => Some(0),
            _ => None,
        }
    }

    /// Only lossy string recovery is non-fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::StringDecode { .. })
    }
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, Error>;
