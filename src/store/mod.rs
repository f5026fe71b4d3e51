//! Storage abstraction for the wiki corpus.
//!
//! The [`WikiStore`] trait is the only thing the wiki source needs from
//! persistence, which keeps the matching logic independent of SQLite and
//! lets tests run against [`memory::InMemoryWikiStore`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::WikiEntry;

/// Read access to the persisted wiki corpus.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`entries`](WikiStore::entries) | Every article, in insertion order |
/// | [`count`](WikiStore::count) | Number of articles (health checks) |
#[async_trait]
pub trait WikiStore: Send + Sync {
    /// All entries in stable insertion order.
    ///
    /// Order matters: the first forced match wins.
    async fn entries(&self) -> Result<Vec<WikiEntry>>;

    async fn count(&self) -> Result<i64>;
}
