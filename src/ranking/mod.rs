//! Live player rankings from the game panel's roster.
//!
//! # Read-through cache
//!
//! [`RankingService::get_all_players`] serves the in-memory roster while
//! it is younger than the TTL. With nothing in memory it first tries the
//! JSON side-store; the side-store keeps its own timestamp, so an old file
//! is still considered stale. Missing or stale data triggers exactly one
//! remote fetch, which resets the timestamp and is mirrored back to the
//! side-store (write failures are logged, not returned).
//!
//! The cache sits behind a `std::sync::RwLock` that is never held across
//! an `.await`. Two concurrent queries that both see a stale cache may
//! both refetch; the last write wins.
//!
//! # Query handling
//!
//! [`intent::classify`] decides what a query asks for. Rankings and
//! detail answers score [`RANKING_SCORE`]; a detail query whose player
//! cannot be looked up gets a "not found" fragment scored
//! [`NOT_FOUND_SCORE`] instead of an error. A roster fetch failure while
//! building a ranking is returned as an error.

pub mod cache;
pub mod client;
pub mod codes;
pub mod field;
pub mod intent;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::RankingConfig;
use crate::models::{Fragment, FragmentMetadata, PlayerRecord, SourceKind};
use crate::traits::{KnowledgeSource, RetrieveOptions};

pub use cache::{CacheOrigin, CacheState, RosterCache};
pub use client::{HttpRosterClient, RosterClient};
pub use field::RankField;
pub use intent::Intent;

pub const RANKING_SCORE: f64 = 100.0;
pub const NOT_FOUND_SCORE: f64 = 90.0;

/// Filters for [`RankingService::get_top_by`]. Names that do not resolve
/// to a roster code are ignored.
#[derive(Debug, Clone)]
pub struct TopFilters {
    pub class: Option<String>,
    pub race: Option<String>,
    pub faction: Option<String>,
    pub limit: usize,
}

impl Default for TopFilters {
    fn default() -> Self {
        Self {
            class: None,
            race: None,
            faction: None,
            limit: 1,
        }
    }
}

impl TopFilters {
    /// "Clase x, Raza y, Bando z: " for the filters present, or "".
    fn prefix(&self) -> String {
        let parts: Vec<String> = [
            self.class.as_ref().map(|c| format!("Clase {}", c)),
            self.race.as_ref().map(|r| format!("Raza {}", r)),
            self.faction.as_ref().map(|f| format!("Bando {}", f)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            String::new()
        } else {
            format!("{}: ", parts.join(", "))
        }
    }
}

pub struct RankingService {
    client: Arc<dyn RosterClient>,
    cache: RwLock<RosterCache>,
    side_store: Option<PathBuf>,
    ttl: Duration,
}

impl RankingService {
    pub fn new(client: Arc<dyn RosterClient>, ttl: Duration) -> Self {
        Self {
            client,
            cache: RwLock::new(RosterCache::empty()),
            side_store: None,
            ttl,
        }
    }

    /// Start from a given cache instead of an empty one.
    pub fn with_cache(self, cache: RosterCache) -> Self {
        Self {
            cache: RwLock::new(cache),
            ..self
        }
    }

    pub fn with_side_store(self, path: PathBuf) -> Self {
        Self {
            side_store: Some(path),
            ..self
        }
    }

    /// Build the HTTP-backed service described by `config`.
    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        let client = HttpRosterClient::from_config(config)?;
        let service = Self::new(Arc::new(client), config.ttl());
        Ok(match &config.cache_path {
            Some(path) => service.with_side_store(path.clone()),
            None => service,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current cache state as of now.
    pub fn cache_state(&self) -> Result<CacheState> {
        Ok(self.snapshot()?.state(Utc::now(), self.ttl))
    }

    fn snapshot(&self) -> Result<RosterCache> {
        let cache = self
            .cache
            .read()
            .map_err(|_| anyhow!("roster cache lock poisoned"))?;
        Ok(cache.clone())
    }

    fn replace(&self, next: RosterCache) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| anyhow!("roster cache lock poisoned"))?;
        *cache = next;
        Ok(())
    }

    /// The full roster, refreshed through the cache policy.
    pub async fn get_all_players(&self) -> Result<Arc<Vec<PlayerRecord>>> {
        let mut cache = self.snapshot()?;

        if !cache.has_data() {
            if let Some(path) = &self.side_store {
                match cache::load_side_store(path).await {
                    Ok(Some(disk)) => {
                        tracing::debug!(path = %path.display(), "roster loaded from side-store");
                        self.replace(disk.clone())?;
                        cache = disk;
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "ignoring unreadable roster side-store"),
                }
            }
        }

        if cache.is_stale(Utc::now(), self.ttl) {
            let players = self.client.fetch_all().await?;
            tracing::info!(players = players.len(), "roster refreshed");
            cache = RosterCache::from_remote(players, Utc::now());
            self.replace(cache.clone())?;

            if let Some(path) = &self.side_store {
                if let Err(e) = cache::save_side_store(path, &cache).await {
                    tracing::warn!(error = %e, "failed to persist roster side-store");
                }
            }
        }

        cache
            .players
            .ok_or_else(|| anyhow!("roster unavailable"))
    }

    /// One player by name: the cached roster first (case-insensitive,
    /// trimmed), then the remote single-player lookup.
    pub async fn get_player(&self, name: &str) -> Result<PlayerRecord> {
        let key = name.trim().to_lowercase();
        let players = self.get_all_players().await?;

        if let Some(found) = players
            .iter()
            .find(|p| !p.name.is_empty() && p.name.trim().to_lowercase() == key)
        {
            return Ok(found.clone());
        }

        self.client.fetch_player(name.trim()).await
    }

    /// Players ranked by `field`, filtered, best first. Ties keep roster order.
    pub async fn get_top_by(&self, field: RankField, filters: &TopFilters) -> Result<Vec<PlayerRecord>> {
        let players = self.get_all_players().await?;

        let class = filters.class.as_deref().and_then(codes::class_code);
        let race = filters.race.as_deref().and_then(codes::race_code);
        let faction = filters.faction.as_deref().and_then(codes::faction_code);

        let mut ranked: Vec<&PlayerRecord> = players
            .iter()
            .filter(|p| class.is_none() || p.class == class)
            .filter(|p| race.is_none() || p.race == race)
            .filter(|p| faction.is_none() || p.faction == faction)
            .collect();
        ranked.sort_by(|a, b| field.value(b).cmp(&field.value(a)));

        Ok(ranked.into_iter().take(filters.limit).cloned().collect())
    }

    async fn answer(&self, intent: Intent, limit: usize) -> Result<Vec<String>> {
        match intent {
            Intent::BestOf { class, faction } => {
                let overall = class.is_none();
                let filters = TopFilters {
                    class,
                    race: None,
                    faction,
                    limit,
                };
                let prefix = filters.prefix();
                let top = self.get_top_by(RankField::Level, &filters).await?;
                Ok(top
                    .iter()
                    .map(|p| {
                        if overall {
                            format!("Mejor jugador: **{}** (nivel {})", p.name, p.level)
                        } else {
                            format!("{}**{}** (nivel {})", prefix, p.name, p.level)
                        }
                    })
                    .collect())
            }
            Intent::Top {
                field,
                class,
                race,
                faction,
            } => {
                let filters = TopFilters {
                    class,
                    race,
                    faction,
                    limit,
                };
                let prefix = filters.prefix();
                let top = self.get_top_by(field, &filters).await?;
                Ok(top
                    .iter()
                    .map(|p| format!("🏆 {}**{}** ({})", prefix, p.name, field.value(p)))
                    .collect())
            }
            Intent::Detail { .. } => Ok(Vec::new()),
        }
    }
}

fn fragment(text: String, score: f64) -> Fragment {
    Fragment::new(text, score, FragmentMetadata::source(SourceKind::Ranking))
}

#[async_trait]
impl KnowledgeSource for RankingService {
    fn name(&self) -> &str {
        "ranking"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Ranking
    }

    async fn retrieve(&self, query: &str, opts: &RetrieveOptions) -> Result<Vec<Fragment>> {
        let Some(intent) = intent::classify(query) else {
            return Ok(Vec::new());
        };

        if let Intent::Detail { field, name } = &intent {
            let text = match self.get_player(name).await {
                Ok(player) => return Ok(vec![fragment(field.describe(&player), RANKING_SCORE)]),
                Err(e) => {
                    tracing::debug!(player = %name, error = %e, "player lookup failed");
                    format!("No encontré datos para el jugador **{}**.", name)
                }
            };
            return Ok(vec![fragment(text, NOT_FOUND_SCORE)]);
        }

        Ok(self
            .answer(intent, opts.top_k)
            .await?
            .into_iter()
            .map(|text| fragment(text, RANKING_SCORE))
            .collect())
    }

    async fn health(&self) -> Result<String> {
        Ok(format!("roster cache {}", self.cache_state()?.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(3 * 60 * 60);

    struct CountingClient {
        roster: Vec<PlayerRecord>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl CountingClient {
        fn new(roster: Vec<PlayerRecord>) -> Arc<Self> {
            Arc::new(Self {
                roster,
                fetches: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                roster: Vec::new(),
                fetches: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RosterClient for CountingClient {
        async fn fetch_all(&self) -> Result<Vec<PlayerRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("panel unreachable");
            }
            Ok(self.roster.clone())
        }

        async fn fetch_player(&self, name: &str) -> Result<PlayerRecord> {
            bail!("Player '{}' not found", name)
        }
    }

    fn player(name: &str, level: u64, class: u32, race: u32, faction: u32) -> PlayerRecord {
        serde_json::from_value(serde_json::json!({
            "nombre": name, "elv": level, "kills": level * 2, "murio": 1,
            "npcsmuertes": level * 10, "rganados": 1, "rduosg": 1,
            "clase": class, "raza": race, "bando": faction
        }))
        .unwrap()
    }

    fn roster() -> Vec<PlayerRecord> {
        vec![
            player("Alba", 40, 38, 3, 1),
            player("Bruno", 45, 51, 2, 2),
            player("Cora", 45, 38, 4, 1),
            player("Dante", 20, 38, 1, 0),
        ]
    }

    fn service(client: Arc<CountingClient>) -> RankingService {
        RankingService::new(client, TTL)
    }

    #[tokio::test]
    async fn test_stale_cache_refetches_exactly_once() {
        let client = CountingClient::new(roster());
        let old = Utc::now() - ChronoDuration::hours(4);
        let svc = service(client.clone()).with_cache(RosterCache::from_remote(roster(), old));

        assert_eq!(svc.cache_state().unwrap(), CacheState::Stale);
        svc.get_all_players().await.unwrap();
        assert_eq!(client.fetches(), 1);

        svc.get_all_players().await.unwrap();
        assert_eq!(client.fetches(), 1);
        assert_eq!(svc.cache_state().unwrap(), CacheState::Fresh);
    }

    #[tokio::test]
    async fn test_fresh_cache_does_not_fetch() {
        let client = CountingClient::new(roster());
        let svc = service(client.clone())
            .with_cache(RosterCache::from_remote(roster(), Utc::now() - ChronoDuration::hours(1)));

        assert_eq!(svc.get_all_players().await.unwrap().len(), 4);
        assert_eq!(client.fetches(), 0);
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_and_persists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("livedata.json");
        let client = CountingClient::new(roster());
        let svc = service(client.clone()).with_side_store(path.clone());

        svc.get_all_players().await.unwrap();
        assert_eq!(client.fetches(), 1);

        let saved = cache::load_side_store(&path).await.unwrap().unwrap();
        assert_eq!(saved.players.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_fresh_side_store_avoids_fetch() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("livedata.json");
        cache::save_side_store(&path, &RosterCache::from_remote(roster(), Utc::now()))
            .await
            .unwrap();

        let client = CountingClient::new(Vec::new());
        let svc = service(client.clone()).with_side_store(path);

        assert_eq!(svc.get_all_players().await.unwrap().len(), 4);
        assert_eq!(client.fetches(), 0);
        assert_eq!(svc.cache_state().unwrap(), CacheState::DiskLoaded);
    }

    #[tokio::test]
    async fn test_corrupt_side_store_is_a_cache_miss() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("livedata.json");
        std::fs::write(&path, "{{{").unwrap();

        let client = CountingClient::new(roster());
        let svc = service(client.clone()).with_side_store(path);

        assert_eq!(svc.get_all_players().await.unwrap().len(), 4);
        assert_eq!(client.fetches(), 1);
    }

    #[tokio::test]
    async fn test_top_by_filters_and_stable_ties() {
        let svc = service(CountingClient::new(roster()));

        let all = svc
            .get_top_by(RankField::Level, &TopFilters { limit: 10, ..Default::default() })
            .await
            .unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bruno", "Cora", "Alba", "Dante"]);

        let mages = svc
            .get_top_by(
                RankField::Level,
                &TopFilters {
                    class: Some("Mago".to_string()),
                    faction: Some("ciudadano".to_string()),
                    limit: 5,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = mages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cora", "Alba"]);

        // Unknown class does not filter.
        let any = svc
            .get_top_by(
                RankField::Kills,
                &TopFilters {
                    class: Some("trabajador".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(any.len(), 1);
        assert_eq!(any[0].name, "Bruno");
    }

    #[tokio::test]
    async fn test_get_player_is_case_insensitive() {
        let svc = service(CountingClient::new(roster()));
        assert_eq!(svc.get_player("  cora ").await.unwrap().level, 45);
        assert!(svc.get_player("nadie").await.is_err());
    }

    #[tokio::test]
    async fn test_best_player_fragment() {
        let svc = service(CountingClient::new(roster()));
        let frags = svc
            .retrieve("quien es el mejor jugador", &RetrieveOptions { top_k: 1 })
            .await
            .unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Mejor jugador: **Bruno** (nivel 45)");
        assert_eq!(frags[0].score, RANKING_SCORE);
        assert_eq!(frags[0].metadata.source, SourceKind::Ranking);
    }

    #[tokio::test]
    async fn test_best_of_class_fragment() {
        let svc = service(CountingClient::new(roster()));
        let frags = svc
            .retrieve("el mejor mago ciudadano", &RetrieveOptions { top_k: 2 })
            .await
            .unwrap();
        let texts: Vec<&str> = frags.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Clase mago, Bando ciudadano: **Cora** (nivel 45)",
                "Clase mago, Bando ciudadano: **Alba** (nivel 40)",
            ]
        );
    }

    #[tokio::test]
    async fn test_top_metric_fragment() {
        let svc = service(CountingClient::new(roster()));
        let frags = svc
            .retrieve("top npc enano", &RetrieveOptions { top_k: 3 })
            .await
            .unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "🏆 Raza enano: **Bruno** (450)");
    }

    #[tokio::test]
    async fn test_detail_fragment() {
        let svc = service(CountingClient::new(roster()));
        let frags = svc
            .retrieve("cuantos npcs mato Dante", &RetrieveOptions::default())
            .await
            .unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "**Dante** mató 200 NPCs.");
        assert_eq!(frags[0].score, RANKING_SCORE);
    }

    #[tokio::test]
    async fn test_unknown_player_gets_not_found_fragment() {
        let svc = service(CountingClient::new(roster()));
        let frags = svc
            .retrieve("cuantos npcs mato Fantasma", &RetrieveOptions::default())
            .await
            .unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "No encontré datos para el jugador **fantasma**.");
        assert_eq!(frags[0].score, NOT_FOUND_SCORE);
    }

    #[tokio::test]
    async fn test_detail_survives_roster_outage_but_ranking_does_not() {
        let svc = service(CountingClient::failing());
        let frags = svc
            .retrieve("nivel de Alba", &RetrieveOptions::default())
            .await
            .unwrap();
        assert_eq!(frags[0].score, NOT_FOUND_SCORE);

        assert!(svc
            .retrieve("top nivel", &RetrieveOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unrelated_query_is_empty_without_fetching() {
        let client = CountingClient::new(roster());
        let svc = service(client.clone());
        let frags = svc
            .retrieve("donde vive el dragon", &RetrieveOptions::default())
            .await
            .unwrap();
        assert!(frags.is_empty());
        assert_eq!(client.fetches(), 0);
    }
}
