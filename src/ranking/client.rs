//! Remote roster access.
//!
//! The roster panel exposes two endpoints:
//!
//! - `GET {roster_url}` returns every player as a JSON array.
//! - `GET {roster_url}?user={name}` returns one player, either as an
//!   object or as a one-element array depending on the panel version.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::RankingConfig;
use crate::models::PlayerRecord;

#[async_trait]
pub trait RosterClient: Send + Sync {
    /// Fetch the full roster.
    async fn fetch_all(&self) -> Result<Vec<PlayerRecord>>;

    /// Fetch one player by name. Any failure, including "no such player",
    /// is an error.
    async fn fetch_player(&self, name: &str) -> Result<PlayerRecord>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlayerResponse {
    // Array first: an empty array must not parse as an all-default record.
    Many(Vec<PlayerRecord>),
    One(PlayerRecord),
}

/// [`RosterClient`] over HTTP.
pub struct HttpRosterClient {
    http: reqwest::Client,
    url: String,
}

impl HttpRosterClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>, accept_invalid_certs: bool) -> Result<Self> {
        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().context("Failed to build roster HTTP client")?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        Self::new(
            config.roster_url.clone(),
            config.timeout_secs.map(Duration::from_secs),
            config.accept_invalid_certs,
        )
    }
}

#[async_trait]
impl RosterClient for HttpRosterClient {
    async fn fetch_all(&self) -> Result<Vec<PlayerRecord>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch roster from {}", self.url))?;

        if !resp.status().is_success() {
            bail!("Roster fetch failed (HTTP {}): {}", resp.status(), self.url);
        }

        resp.json()
            .await
            .with_context(|| format!("Invalid roster JSON from {}", self.url))
    }

    async fn fetch_player(&self, name: &str) -> Result<PlayerRecord> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[("user", name)])
            .send()
            .await
            .with_context(|| format!("Failed to fetch player '{}'", name))?;

        if !resp.status().is_success() {
            bail!("Player '{}' not found (HTTP {})", name, resp.status());
        }

        let player = match resp.json::<PlayerResponse>().await? {
            PlayerResponse::One(player) => Some(player),
            PlayerResponse::Many(players) => players.into_iter().next(),
        };

        match player {
            Some(player) if !player.name.trim().is_empty() => Ok(player),
            _ => bail!("Player '{}' not found", name),
        }
    }
}
