//! Per-load identity cache.
//!
//! Maps stream-local pointer identifiers to decoded records so every alias of
//! an identifier observes the same shared record. Entries are write-once.
//! Identifiers whose decode is in progress are tracked separately so a
//! self-reference is reported as a cycle instead of recursing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::record::RecordRef;

/// Identity cache of one decode session.
#[derive(Default)]
pub struct IdentityCache {
    /// Finished records by identifier.
    records: HashMap<u64, RecordRef>,
    /// Identifiers whose body is being decoded.
    pending: HashSet<u64>,
    /// Number of back-references served from the cache.
    hits: usize,
}

impl IdentityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a finished record, counting the hit.
    #[inline]
    pub fn get(&mut self, id: u64) -> Option<RecordRef> {
        let record = self.records.get(&id).map(Arc::clone);
        if record.is_some() {
            self.hits += 1;
        }
        record
    }

    /// Whether `id` is being decoded right now.
    #[inline]
    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains(&id)
    }

    /// Mark `id` as in progress. Returns `false` if it already was.
    pub fn begin(&mut self, id: u64) -> bool {
        self.pending.insert(id)
    }

    /// Store the decoded record for `id` and clear its pending mark.
    ///
    /// A second store for the same identifier keeps the first record.
    pub fn finish(&mut self, id: u64, record: RecordRef) -> RecordRef {
        self.pending.remove(&id);
        Arc::clone(self.records.entry(id).or_insert(record))
    }

    /// Clear the pending mark of a failed decode.
    pub fn abandon(&mut self, id: u64) {
        self.pending.remove(&id);
    }

    /// Number of distinct records decoded.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of back-references resolved from the cache.
    #[inline]
    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("records", &self.records.len())
            .field("pending", &self.pending)
            .field("hits", &self.hits)
            .finish()
    }
}
