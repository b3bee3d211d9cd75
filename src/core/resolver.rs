//! Pointer resolution against the session's identity cache.

use std::sync::Arc;

use super::record::{decoder_for, Ptr, Record, RecordRef};
use crate::stream::{Decoder, NULL_ID};
use crate::util::{Error, Result};

/// What a pointer identifier resolved to.
enum Target {
    Null,
    Cached(RecordRef),
    /// First occurrence; the body follows.
    New(u64),
}

impl Decoder<'_> {
    /// Read a polymorphic pointer.
    ///
    /// The null identifier yields `None`. A cached identifier yields the
    /// shared record and consumes nothing more. Otherwise the class name and
    /// body follow; the decoded record is cached under its identifier.
    pub fn read_ptr(&mut self) -> Result<Ptr> {
        let offset = self.position();
        let id = match self.pointer_target(offset)? {
            Target::Null => return Ok(None),
            Target::Cached(record) => return Ok(Some(record)),
            Target::New(id) => id,
        };
        let class_name = self.read_string()?;
        let decode = decoder_for(&class_name).ok_or_else(|| Error::UnknownRecordType {
            class_name: class_name.clone(),
            id,
            offset,
        })?;
        tracing::debug!(id, offset, class = %class_name, "decoding shared record");
        self.decode_shared(id, decode)
    }

    /// Read a non-polymorphic shared pointer: identifier, then the body read
    /// by `body` on first occurrence.
    pub fn read_shared_with<F>(&mut self, body: F) -> Result<Ptr>
    where
        F: FnOnce(&mut Self) -> Result<Record>,
    {
        let offset = self.position();
        match self.pointer_target(offset)? {
            Target::Null => Ok(None),
            Target::Cached(record) => Ok(Some(record)),
            Target::New(id) => {
                tracing::debug!(id, offset, "decoding shared record");
                self.decode_shared(id, body)
            }
        }
    }

    fn pointer_target(&mut self, offset: u64) -> Result<Target> {
        let id = self.read_u64()?;
        if id == NULL_ID {
            return Ok(Target::Null);
        }
        if let Some(record) = self.cache_mut().get(id) {
            tracing::trace!(id, offset, class = record.type_tag(), "back-reference");
            return Ok(Target::Cached(record));
        }
        if self.cache().is_pending(id) {
            return Err(Error::UnsupportedPointerCycle { id, offset });
        }
        Ok(Target::New(id))
    }

    fn decode_shared<F>(&mut self, id: u64, body: F) -> Result<Ptr>
    where
        F: FnOnce(&mut Self) -> Result<Record>,
    {
        self.cache_mut().begin(id);
        match body(self) {
            Ok(record) => Ok(Some(self.cache_mut().finish(id, Arc::new(record)))),
            Err(e) => {
                self.cache_mut().abandon(id);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::texture_base;
    use crate::stream::testing::ByteWriter;

    fn texture_file(w: ByteWriter, name: &str) -> ByteWriter {
        w.version(1).with(|w| texture_base(w, 1)).string(name).bool(true)
    }

    #[test]
    fn test_null_pointer() {
        let bytes = ByteWriter::new().null_ptr().u8(0xAA).finish();
        let mut d = Decoder::new(&bytes);
        assert!(d.read_ptr().unwrap().is_none());
        assert_eq!(d.position(), 8);
        assert!(d.cache().is_empty());
    }

    #[test]
    fn test_back_reference_consumes_identifier_only() {
        let bytes = ByteWriter::new()
            .new_ptr(42, "CTextureFile")
            .with(|w| texture_file(w, "a.tga"))
            .ref_ptr(42)
            .finish();
        let mut d = Decoder::new(&bytes);
        let first = d.read_ptr().unwrap().unwrap();
        let before = d.position();
        let second = d.read_ptr().unwrap().unwrap();
        assert_eq!(d.position(), before + 8);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(d.cache().len(), 1);
        assert_eq!(d.cache().hits(), 1);
        assert!(d.is_at_end());
    }

    #[test]
    fn test_unknown_class() {
        let bytes = ByteWriter::new().new_ptr(1, "Unknown").finish();
        let mut d = Decoder::new(&bytes);
        match d.read_ptr().unwrap_err() {
            Error::UnknownRecordType { class_name, id, offset } => {
                assert_eq!(class_name, "Unknown");
                assert_eq!(id, 1);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_cycle() {
        // Cube map whose first face points back at the cube.
        let bytes = ByteWriter::new()
            .new_ptr(9, "CTextureCube")
            .version(2)
            .with(|w| texture_base(w, 1))
            .ref_ptr(9)
            .finish();
        let mut d = Decoder::new(&bytes);
        let err = d.read_ptr().unwrap_err();
        assert!(matches!(err, Error::UnsupportedPointerCycle { id: 9, .. }));
        assert!(!d.cache().is_pending(9));
    }

    #[test]
    fn test_shared_without_class_name() {
        let bytes = ByteWriter::new()
            .u64(3)
            .version(0)
            .u32(1)
            .u32(1)
            .u32(1)
            .bytes(&[1, 2, 3, 4])
            .u64(3)
            .finish();
        fn read(d: &mut Decoder<'_>) -> Result<Ptr> {
            d.read_shared_with(|d| Ok(Record::LodCharacterTexture(d.read()?)))
        }
        let mut d = Decoder::new(&bytes);
        let a = read(&mut d).unwrap().unwrap();
        let b = read(&mut d).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.type_tag(), "CLodCharacterTexture");
        assert!(d.is_at_end());
    }
}
