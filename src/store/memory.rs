//! In-memory [`WikiStore`] implementation, used by tests and by callers that
//! build the corpus at runtime.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::WikiEntry;

use super::WikiStore;

/// Wiki corpus held in a `Vec` behind a `RwLock`.
pub struct InMemoryWikiStore {
    entries: RwLock<Vec<WikiEntry>>,
}

impl InMemoryWikiStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn with_entries(entries: Vec<WikiEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Insert or replace an entry, keyed by title.
    pub fn upsert(&self, entry: WikiEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("wiki store lock poisoned"))?;
        match entries.iter_mut().find(|e| e.title == entry.title) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }
}

impl Default for InMemoryWikiStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WikiStore for InMemoryWikiStore {
    async fn entries(&self) -> Result<Vec<WikiEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("wiki store lock poisoned"))?;
        Ok(entries.clone())
    }

    async fn count(&self) -> Result<i64> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("wiki store lock poisoned"))?;
        Ok(entries.len() as i64)
    }
}
