//! Roster cache value and its JSON side-store.
//!
//! [`RosterCache`] is a plain value: staleness is a pure function of the
//! cache, the current time, and the TTL, so the policy can be tested
//! without a clock or a network.
//!
//! ```text
//!   Empty ──load side-store──▶ DiskLoaded ──┐
//!     │                                     │ age > ttl
//!     └────────fetch remote──▶ Fresh ──────▶ Stale ──fetch remote──▶ Fresh
//! ```
//!
//! The side-store mirrors the last successful fetch as
//! `{ "fetched_at": <rfc3339>, "players": [...] }`. A bare player array
//! (the older format) is accepted and dated with the file's mtime.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::models::PlayerRecord;

/// Where the cached roster came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOrigin {
    #[default]
    None,
    Disk,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    Empty,
    DiskLoaded,
    Fresh,
    Stale,
}

impl CacheState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheState::Empty => "empty",
            CacheState::DiskLoaded => "disk_loaded",
            CacheState::Fresh => "fresh",
            CacheState::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterCache {
    pub players: Option<Arc<Vec<PlayerRecord>>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub origin: CacheOrigin,
}

impl RosterCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_remote(players: Vec<PlayerRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            players: Some(Arc::new(players)),
            fetched_at: Some(fetched_at),
            origin: CacheOrigin::Remote,
        }
    }

    pub fn from_disk(players: Vec<PlayerRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            players: Some(Arc::new(players)),
            fetched_at: Some(fetched_at),
            origin: CacheOrigin::Disk,
        }
    }

    pub fn has_data(&self) -> bool {
        self.players.is_some()
    }

    /// True when there is nothing usable: no data, no timestamp, or data
    /// older than `ttl`. A timestamp in the future counts as fresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let (Some(_), Some(fetched_at)) = (&self.players, self.fetched_at) else {
            return true;
        };
        match (now - fetched_at).to_std() {
            Ok(age) => age > ttl,
            Err(_) => false,
        }
    }

    pub fn state(&self, now: DateTime<Utc>, ttl: Duration) -> CacheState {
        if !self.has_data() {
            CacheState::Empty
        } else if self.is_stale(now, ttl) {
            CacheState::Stale
        } else if self.origin == CacheOrigin::Disk {
            CacheState::DiskLoaded
        } else {
            CacheState::Fresh
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SideStoreFile {
    fetched_at: DateTime<Utc>,
    players: Vec<PlayerRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SideStoreContents {
    Stamped(SideStoreFile),
    Bare(Vec<PlayerRecord>),
}

/// Read the side-store. `Ok(None)` when the file does not exist.
pub async fn load_side_store(path: &Path) -> Result<Option<RosterCache>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read roster cache: {}", path.display()))
        }
    };

    let contents: SideStoreContents = serde_json::from_str(&raw)
        .with_context(|| format!("Corrupt roster cache: {}", path.display()))?;

    let cache = match contents {
        SideStoreContents::Stamped(file) => RosterCache::from_disk(file.players, file.fetched_at),
        SideStoreContents::Bare(players) => {
            let modified = tokio::fs::metadata(path)
                .await
                .and_then(|m| m.modified())
                .with_context(|| format!("Failed to stat roster cache: {}", path.display()))?;
            RosterCache::from_disk(players, DateTime::<Utc>::from(modified))
        }
    };

    Ok(Some(cache))
}

/// Write `cache` to the side-store. A cache without data is not written.
pub async fn save_side_store(path: &Path, cache: &RosterCache) -> Result<()> {
    let (Some(players), Some(fetched_at)) = (&cache.players, cache.fetched_at) else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let file = SideStoreFile {
        fetched_at,
        players: players.as_ref().clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write roster cache: {}", path.display()))?;

    Ok(())
}
