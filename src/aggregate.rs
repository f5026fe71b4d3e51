//! Fan-out retrieval across every registered source.
//!
//! Each source runs in its own tokio task so a panic stays inside that
//! task. Errors and panics are logged and the source contributes nothing;
//! [`Aggregator::retrieve_all`] itself never fails.
//!
//! Merging is deliberately simple: concatenate in registration order, sort
//! by score (stable, so equal scores keep that order), truncate to the
//! global cap. Sources with constant scores (wiki, calculator) therefore
//! only interleave with each other by registration order, while the
//! off-game and ranking sources compete on their computed scores.

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;

use crate::config::{Config, RetrievalConfig};
use crate::models::Fragment;
use crate::offgame::OffgameSource;
use crate::ranking::RankingService;
use crate::sqlite_store::SqliteWikiStore;
use crate::stats::StatsCalculator;
use crate::traits::{KnowledgeSource, RetrieveOptions, SourceRegistry};
use crate::wiki::WikiSource;

pub struct Aggregator {
    registry: SourceRegistry,
    retrieval: RetrievalConfig,
}

impl Aggregator {
    pub fn new(registry: SourceRegistry, retrieval: RetrievalConfig) -> Self {
        Self {
            registry,
            retrieval,
        }
    }

    /// Register the sources `config` describes, in their canonical order:
    /// wiki, off-game, calculator, ranking.
    ///
    /// Nothing is opened here; files and the roster are read on first use.
    pub fn from_config(config: &Config) -> Result<Self> {
        let chunk_chars = config.retrieval.chunk_chars;
        let mut registry = SourceRegistry::new();

        let store = SqliteWikiStore::new(config.wiki.db_path.clone());
        registry.register(Arc::new(WikiSource::new(Arc::new(store), chunk_chars)));

        if let Some(offgame) = &config.offgame {
            registry.register(Arc::new(OffgameSource::new(offgame.path.clone(), chunk_chars)));
        }

        if let Some(stats) = &config.stats {
            registry.register(Arc::new(StatsCalculator::from_file_or_empty(&stats.path)));
        }

        if let Some(ranking) = &config.ranking {
            registry.register(Arc::new(RankingService::from_config(ranking)?));
        }

        Ok(Self::new(registry, config.retrieval.clone()))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Per-source fragment cap: the override for `name`, else the default.
    pub fn top_k_for(&self, name: &str) -> usize {
        self.retrieval
            .per_source
            .get(name)
            .copied()
            .unwrap_or(self.retrieval.top_k)
    }

    /// Warm every source up, stopping at the first failure.
    pub async fn warm_up(&self) -> Result<()> {
        for source in self.registry.sources() {
            source.warm_up().await?;
            tracing::debug!(source = source.name(), "source ready");
        }
        Ok(())
    }

    /// Query every source concurrently and return the merged, ranked,
    /// truncated fragment list.
    pub async fn retrieve_all(&self, query: &str) -> Vec<Fragment> {
        let sources = self.registry.sources();

        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let source: Arc<dyn KnowledgeSource> = Arc::clone(source);
                let query = query.to_string();
                let opts = RetrieveOptions {
                    top_k: self.top_k_for(source.name()),
                };
                tokio::spawn(async move { source.retrieve(&query, &opts).await })
            })
            .collect();

        let results = join_all(handles).await;

        let mut merged = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(Ok(mut fragments)) => {
                    fragments.retain(|f| !f.text.trim().is_empty());
                    fragments.truncate(self.top_k_for(source.name()));
                    tracing::debug!(source = source.name(), count = fragments.len(), "source answered");
                    merged.extend(fragments);
                }
                Ok(Err(e)) => {
                    tracing::warn!(source = source.name(), error = %e, "source failed, skipping");
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "source task aborted, skipping");
                }
            }
        }

        merged.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
        merged.truncate(self.retrieval.global_top_k);
        merged
    }
}
