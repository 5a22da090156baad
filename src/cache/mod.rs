//! Persistent answer cache.
//!
//! The cache maps a derived cache key to the best answer found for it.
//! Lookups are fail-soft: anything wrong with the backing store reads as a
//! miss. Writes report errors, which callers log and drop.

mod json_file;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

pub use json_file::JsonFileStore;

/// A cached answer with its provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Candidate text the answer was synthesized from.
    pub answer: String,
    /// Title of the source page.
    #[serde(default)]
    pub title: String,
    /// URL of the source page.
    #[serde(default)]
    pub url: String,
}

/// Durable key → entry store shared by every session.
///
/// Implementations must be safe under concurrent `get`/`put`. Writes to the
/// same key resolve last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up `key`. Missing, empty, or corrupt backing data yields `None`.
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Inserts or overwrites the entry for `key`.
    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Returns every readable entry, sorted by key.
    async fn entries(&self) -> Vec<(String, CacheEntry)>;
}

/// In-memory store. Not durable; used for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|e| !e.answer.is_empty())
            .cloned()
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn entries(&self) -> Vec<(String, CacheEntry)> {
        let mut all: Vec<_> = self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
