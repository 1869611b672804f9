// src/crawl/registry.rs
// =============================================================================
// The visited registry: which URLs this crawl has already claimed or fetched.
//
// It is the only map shared between crawl tasks. Every access takes the lock
// for exactly one map operation and releases it before returning, so the lock
// is never held across a fetch or a spawn.
//
// Entries are never removed. Once a URL is present it stays present for the
// lifetime of the registry.
// =============================================================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::Mutex;

/// What the registry remembers about a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitRecord {
    /// Claimed by a task that has not finished fetching it yet
    Reserved,
    /// Fetched successfully; holds the page body
    Fetched { content: String },
}

#[derive(Debug, Default)]
pub struct VisitedRegistry {
    visited: Mutex<HashMap<String, VisitRecord>>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record for `url`.
    pub fn set(&self, url: &str, record: VisitRecord) {
        self.visited.lock().insert(url.to_string(), record);
    }

    /// Returns the record for `url`, if any.
    pub fn get(&self, url: &str) -> Option<VisitRecord> {
        self.visited.lock().get(url).cloned()
    }

    /// Inserts `record` only if `url` has no entry yet.
    ///
    /// Returns `true` for exactly one caller per URL: the one whose call
    /// created the entry. Checking and inserting happen under a single lock
    /// acquisition, so two tasks can never both win.
    pub fn insert_if_absent(&self, url: &str, record: VisitRecord) -> bool {
        match self.visited.lock().entry(url.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.visited.lock().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.visited.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.lock().is_empty()
    }

    /// Sorted snapshot of every URL currently in the registry.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.visited.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
