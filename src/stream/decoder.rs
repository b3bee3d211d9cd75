//! Decode session state and the container combinators shared by all schemas.

use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;

use super::cursor::StreamCursor;
use crate::core::IdentityCache;
use crate::util::{Error, Result};

/// Record name reported for the tag read by [`Decoder::versioned`].
pub const WRAPPED_VALUE_RECORD: &str = "CTrackDefault";
pub const WRAPPED_VALUE_MAX_VERSION: u32 = 0;

/// Types that can be read from a decode session.
pub trait Decode: Sized {
    fn decode(d: &mut Decoder<'_>) -> Result<Self>;
}

/// Enums stored in the stream as a 32-bit index into a fixed name table.
pub trait StreamEnum: Sized + Copy {
    /// Name used in error messages.
    const NAME: &'static str;

    fn from_index(index: i32) -> Option<Self>;
}

/// One decode session: the cursor plus the identity cache of this load.
///
/// Both are threaded through every schema decoder. A session is never
/// shared between loads; the dispatcher creates a fresh one per file.
/// Primitive reads are reached through `Deref` to [`StreamCursor`].
pub struct Decoder<'a> {
    cursor: StreamCursor<'a>,
    cache: IdentityCache,
}

impl<'a> Decoder<'a> {
    /// Start a session over `data` with an empty identity cache.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: StreamCursor::new(data),
            cache: IdentityCache::new(),
        }
    }

    /// The identity cache of this session.
    #[inline]
    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    #[inline]
    pub fn cache_mut(&mut self) -> &mut IdentityCache {
        &mut self.cache
    }

    /// Read any [`Decode`] value.
    #[inline]
    pub fn read<T: Decode>(&mut self) -> Result<T> {
        T::decode(self)
    }

    /// Read a value wrapped in a default-track version tag.
    ///
    /// Several legacy fields (default tracks, wrapped colors) were written by
    /// `CTrackDefault*` serializers that only ever wrote revision 0.
    pub fn versioned<T: Decode>(&mut self) -> Result<T> {
        self.schema_version(WRAPPED_VALUE_RECORD, WRAPPED_VALUE_MAX_VERSION)?;
        T::decode(self)
    }

    /// Read a schema's version tag, rejecting revisions newer than `max`.
    pub fn schema_version(&mut self, record: &'static str, max: u32) -> Result<u32> {
        let offset = self.position();
        let version = self.read_version()?;
        if version > max {
            return Err(Error::unsupported(
                record,
                version,
                offset,
                "newer than any known revision",
            ));
        }
        Ok(version)
    }

    /// Read an enum stored as an `i32` index.
    pub fn read_enum<E: StreamEnum>(&mut self) -> Result<E> {
        let offset = self.position();
        let value = self.read_i32()?;
        E::from_index(value).ok_or(Error::InvalidEnum {
            name: E::NAME,
            value: value as i64,
            offset,
        })
    }

    /// `u32` count followed by that many [`Decode`] elements.
    pub fn sequence<T: Decode>(&mut self) -> Result<Vec<T>> {
        self.sequence_with(T::decode)
    }

    /// `u32` count followed by that many elements read by `element`.
    ///
    /// Order is preserved; later records refer to elements by index.
    pub fn sequence_with<T, F>(&mut self, mut element: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let count = self.read_u32()? as usize;
        // Every element takes at least one byte; don't trust the count for allocation.
        let mut out = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            out.push(element(self)?);
        }
        Ok(out)
    }

    /// Exactly `N` elements with no count prefix.
    pub fn array_with<T, F, const N: usize>(&mut self, mut element: F) -> Result<[T; N]>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let offset = self.position();
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(element(self)?);
        }
        items
            .try_into()
            .map_err(|_| Error::invalid(offset, "fixed-size array length mismatch"))
    }

    /// `u32` count followed by that many `(key, value)` pairs.
    pub fn map<K, V>(&mut self) -> Result<IndexMap<K, V>>
    where
        K: Decode + Hash + Eq,
        V: Decode,
    {
        self.map_with(K::decode, V::decode)
    }

    /// `u32` count followed by pairs read by `key` and `value`.
    ///
    /// Duplicate keys keep the later value at the first key's position.
    pub fn map_with<K, V, FK, FV>(&mut self, mut key: FK, mut value: FV) -> Result<IndexMap<K, V>>
    where
        K: Hash + Eq,
        FK: FnMut(&mut Self) -> Result<K>,
        FV: FnMut(&mut Self) -> Result<V>,
    {
        let count = self.read_u32()? as usize;
        let mut out = IndexMap::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let k = key(self)?;
            let v = value(self)?;
            out.insert(k, v);
        }
        Ok(out)
    }

    /// Field introduced at `threshold`: decoded when `version >= threshold`,
    /// otherwise `default` with no bytes consumed.
    #[inline]
    pub fn since<T, F>(&mut self, version: u32, threshold: u32, default: T, decode: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if version >= threshold {
            decode(self)
        } else {
            Ok(default)
        }
    }

    /// [`Decoder::since`] for [`Decode`] types defaulting to `Default`.
    #[inline]
    pub fn since_or_default<T: Decode + Default>(&mut self, version: u32, threshold: u32) -> Result<T> {
        self.since(version, threshold, T::default(), T::decode)
    }

    /// [`Decoder::since`] producing `None` for older versions.
    #[inline]
    pub fn since_opt<T, F>(&mut self, version: u32, threshold: u32, decode: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.since(version, threshold, None, |d| decode(d).map(Some))
    }
}

impl<'a> Deref for Decoder<'a> {
    type Target = StreamCursor<'a>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.cursor
    }
}

impl DerefMut for Decoder<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::testing::ByteWriter;

    #[test]
    fn test_empty_sequence_consumes_count_only() {
        let bytes = ByteWriter::new().u32(0).u8(0xAA).finish();
        let mut d = Decoder::new(&bytes);
        let items: Vec<u32> = d.sequence().unwrap();
        assert!(items.is_empty());
        assert_eq!(d.position(), 4);
    }

    #[test]
    fn test_sequence_order() {
        let bytes = ByteWriter::new().u32(3).u16(30).u16(10).u16(20).finish();
        let mut d = Decoder::new(&bytes);
        let items: Vec<u16> = d.sequence().unwrap();
        assert_eq!(items, vec![30, 10, 20]);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_sequence_huge_count_fails_cleanly() {
        let bytes = ByteWriter::new().u32(u32::MAX).u8(1).finish();
        let mut d = Decoder::new(&bytes);
        let err = d.sequence::<u32>().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_map_last_write_wins() {
        let bytes = ByteWriter::new()
            .u32(3)
            .string("a")
            .u32(1)
            .string("b")
            .u32(2)
            .string("a")
            .u32(3)
            .finish();
        let mut d = Decoder::new(&bytes);
        let map: IndexMap<String, u32> = d.map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 3);
        assert_eq!(map["b"], 2);
        assert_eq!(map.get_index(0).map(|(k, _)| k.as_str()), Some("a"));
        assert!(d.is_at_end());
    }

    #[test]
    fn test_since_gating() {
        // Older version: default, nothing consumed.
        let bytes = ByteWriter::new().f32(2.5).finish();
        let mut d = Decoder::new(&bytes);
        let v = d.since(1, 2, 0.0f32, |d| d.read_f32()).unwrap();
        assert_eq!(v, 0.0);
        assert_eq!(d.position(), 0);

        // Threshold reached: field consumed.
        let v = d.since(2, 2, 0.0f32, |d| d.read_f32()).unwrap();
        assert_eq!(v, 2.5);
        assert_eq!(d.position(), 4);

        let mut d = Decoder::new(&bytes);
        assert_eq!(d.since_opt(0, 1, |d| d.read_f32()).unwrap(), None);
        assert_eq!(d.since_or_default::<f32>(5, 1).unwrap(), 2.5);
    }

    #[test]
    fn test_schema_version_rejects_newer() {
        let bytes = ByteWriter::new().version(9).finish();
        let mut d = Decoder::new(&bytes);
        let err = d.schema_version("CTest", 8).unwrap_err();
        match err {
            Error::UnsupportedVersion { record, version, offset, .. } => {
                assert_eq!(record, "CTest");
                assert_eq!(version, 9);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_versioned_wrapper_is_bounded() {
        let bytes = ByteWriter::new().version(0).f32(1.5).version(1).f32(2.5).finish();
        let mut d = Decoder::new(&bytes);
        assert_eq!(d.versioned::<f32>().unwrap(), 1.5);
        assert!(matches!(
            d.versioned::<f32>().unwrap_err(),
            Error::UnsupportedVersion { record: WRAPPED_VALUE_RECORD, version: 1, offset: 5, .. }
        ));
    }

    #[test]
    fn test_array_with() {
        let bytes = ByteWriter::new().u8(1).u8(2).u8(3).finish();
        let mut d = Decoder::new(&bytes);
        let arr: [u8; 3] = d.array_with(|d| d.read_u8()).unwrap();
        assert_eq!(arr, [1, 2, 3]);
    }
}
