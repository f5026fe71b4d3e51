//! The knowledge-source capability and its registry.
//!
//! Every source (wiki, off-game, calculator, ranking, or anything a
//! downstream binary adds) implements [`KnowledgeSource`]. The
//! [`Aggregator`](crate::aggregate::Aggregator) is closed over a
//! [`SourceRegistry`] and never needs to know which concrete sources it
//! is fanning out to.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                SourceRegistry                │
//! │  ┌──────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ │
//! │  │ Wiki │ │ Offgame │ │Calculator│ │Ranking│ │
//! │  └──────┘ └─────────┘ └──────────┘ └───────┘ │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!              Aggregator::retrieve_all()
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use anyhow::Result;
//! use knowledge_harness::models::{Fragment, FragmentMetadata, SourceKind};
//! use knowledge_harness::traits::{KnowledgeSource, RetrieveOptions, SourceRegistry};
//!
//! struct Motd;
//!
//! #[async_trait]
//! impl KnowledgeSource for Motd {
//!     fn name(&self) -> &str { "motd" }
//!     fn kind(&self) -> SourceKind { SourceKind::Offgame }
//!
//!     async fn retrieve(&self, query: &str, _opts: &RetrieveOptions) -> Result<Vec<Fragment>> {
//!         if !query.contains("motd") {
//!             return Ok(vec![]);
//!         }
//!         Ok(vec![Fragment::new("Server restart at 18hs", 5.0,
//!             FragmentMetadata::source(SourceKind::Offgame))])
//!     }
//! }
//!
//! let mut sources = SourceRegistry::new();
//! sources.register(std::sync::Arc::new(Motd));
//! assert_eq!(sources.len(), 1);
//! ```

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{Fragment, SourceKind};

/// Per-call options handed to a source by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// Maximum number of fragments this source should contribute.
    pub top_k: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// A knowledge source the aggregator can query.
///
/// Implementations must return an empty vector, not an error, when a
/// query simply has no answer. Errors are reserved for the source being
/// unavailable (missing file, unreachable endpoint, broken database); the
/// aggregator logs them and carries on without this source.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Source instance name, used in logs and per-source `top_k` overrides.
    fn name(&self) -> &str;

    /// The kind tag stamped on this source's fragments.
    fn kind(&self) -> SourceKind;

    /// Retrieve fragments relevant to the raw user query.
    async fn retrieve(&self, query: &str, opts: &RetrieveOptions) -> Result<Vec<Fragment>>;

    /// Load whatever the source needs before serving. Called once at
    /// startup by `kh serve`; an error aborts startup.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }

    /// Short human-readable readiness summary, or an error when the
    /// source is currently unavailable.
    async fn health(&self) -> Result<String> {
        Ok("ready".to_string())
    }
}

/// Ordered collection of sources. Registration order is the tie-break
/// order for equally scored fragments.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn KnowledgeSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register(&mut self, source: Arc<dyn KnowledgeSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Arc<dyn KnowledgeSource>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}
