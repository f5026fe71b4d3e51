//! TOML configuration parsing and validation.
//!
//! Every source has its own section. The wiki database is always
//! configured; the off-game, stats, and ranking sections are optional and
//! their sources are simply not registered when absent.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub wiki: WikiConfig,
    #[serde(default)]
    pub offgame: Option<OffgameConfig>,
    #[serde(default)]
    pub stats: Option<StatsConfig>,
    #[serde(default)]
    pub ranking: Option<RankingConfig>,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub unanswered: Option<UnansweredConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikiConfig {
    pub db_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OffgameConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    /// Full-roster endpoint; the single-player lookup appends `?user=<name>`.
    pub roster_url: String,
    /// Side-store mirroring the last successful fetch.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// The game panel has served an expired certificate before.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_ttl_secs() -> u64 {
    3 * 60 * 60
}

impl RankingConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_global_top_k")]
    pub global_top_k: usize,
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Per-source `top_k` overrides keyed by source name.
    #[serde(default)]
    pub per_source: HashMap<String, usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            global_top_k: default_global_top_k(),
            chunk_chars: default_chunk_chars(),
            per_source: HashMap::new(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_global_top_k() -> usize {
    12
}
fn default_chunk_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnansweredConfig {
    pub path: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let retrieval = &config.retrieval;
    if retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if retrieval.global_top_k < 1 {
        anyhow::bail!("retrieval.global_top_k must be >= 1");
    }
    if retrieval.chunk_chars < 100 {
        anyhow::bail!("retrieval.chunk_chars must be >= 100");
    }
    for (name, k) in &retrieval.per_source {
        if *k < 1 {
            anyhow::bail!("retrieval.per_source.{} must be >= 1", name);
        }
    }

    if let Some(ranking) = &config.ranking {
        if ranking.roster_url.trim().is_empty() {
            anyhow::bail!("ranking.roster_url must not be empty");
        }
        if ranking.ttl_secs < 1 {
            anyhow::bail!("ranking.ttl_secs must be >= 1");
        }
    }

    Ok(())
}
