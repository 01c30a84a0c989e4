//! Session-scoped geocoding memo.
//!
//! Entries are keyed by the exact query string and are never evicted or
//! invalidated for the lifetime of the cache. Region selections are
//! low-cardinality, so the map stays small.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::types::GeoResult;

#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: Mutex<HashMap<String, GeoResult>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str) -> Option<GeoResult> {
        self.entries.lock().get(query).cloned()
    }

    /// Store a result. An existing entry for the same query is kept.
    pub fn insert(&self, query: impl Into<String>, result: GeoResult) {
        self.entries.lock().entry(query.into()).or_insert(result);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
