//! Primitive reader over an in-memory byte source.

use byteorder::{ByteOrder, LittleEndian};

use super::format::VERSION_ESCAPE;
use crate::util::{Error, Result};

/// Forward-only little-endian reader for one decode session.
///
/// The cursor never rewinds; the only look-ahead is [`StreamCursor::peek`],
/// used once to classify the container magic.
#[derive(Debug)]
pub struct StreamCursor<'a> {
    data: &'a [u8],
    pos: usize,
    lossy_strings: usize,
}

impl<'a> StreamCursor<'a> {
    /// Create a cursor at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            lossy_strings: 0,
        }
    }

    /// Current absolute byte offset.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes left before the end of the source.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if every byte has been consumed.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Total size of the source.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the source is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of strings recovered with a lossy substitute so far.
    #[inline]
    pub fn lossy_strings(&self) -> usize {
        self.lossy_strings
    }

    /// Look at up to `len` bytes without consuming them.
    pub fn peek(&self, len: usize) -> &'a [u8] {
        let end = (self.pos + len).min(self.data.len());
        &self.data[self.pos..end]
    }

    /// Consume exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::UnexpectedEof {
                offset: self.position(),
                needed: len,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consume `len` bytes without looking at them.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Consume a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.read_bytes(8)?))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    /// Any nonzero byte is `true`.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a version tag: one byte, or `0xFF` followed by a u32.
    pub fn read_version(&mut self) -> Result<u32> {
        match self.read_u8()? {
            VERSION_ESCAPE => self.read_u32(),
            v => Ok(v as u32),
        }
    }

    /// Read the raw bytes of a u32-length-prefixed string.
    pub fn read_string_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// Read a length-prefixed string, failing on invalid UTF-8.
    pub fn read_string_strict(&mut self) -> Result<String> {
        let offset = self.position() + 4;
        let bytes = self.read_string_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::StringDecode {
                offset,
                len: bytes.len(),
            })
    }

    /// Read a length-prefixed string.
    ///
    /// Legacy files contain text in local code pages; invalid UTF-8 is
    /// replaced lossily and decoding continues.
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.position() + 4;
        let bytes = self.read_string_bytes()?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                let err = Error::StringDecode {
                    offset,
                    len: bytes.len(),
                };
                tracing::warn!("{err}; substituting lossy text");
                self.lossy_strings += 1;
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}
