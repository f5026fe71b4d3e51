//! Wiki source: exact-topic and all-words matching over the wiki corpus.
//!
//! # Matching policy
//!
//! 1. **Forced match.** If the folded query contains an article title (or
//!    that title's naive singular), the first such article in corpus order
//!    is returned alone. Naming a topic beats keyword overlap.
//! 2. **Conjunctive match.** Otherwise every surviving query word must
//!    appear, in either its surface or singular spelling, somewhere in the
//!    article's title, keywords, or content.
//!
//! There is no OR fallback: a query whose words do not all co-occur in one
//! article returns nothing. Matching articles are chunked and capped at
//! `top_k` fragments, all with the same score.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::chunk::chunk_text;
use crate::models::{Fragment, FragmentMetadata, SourceKind, WikiEntry};
use crate::normalize::{fold, singularize, Normalizer, Term};
use crate::store::WikiStore;
use crate::traits::{KnowledgeSource, RetrieveOptions};

/// Constant score: the wiki does no further ranking among its matches.
pub const WIKI_SCORE: f64 = 1.0;

/// Minimum token length for wiki queries.
const MIN_TERM_LEN: usize = 3;

pub struct WikiSource {
    store: Arc<dyn WikiStore>,
    normalizer: Normalizer,
    chunk_chars: usize,
}

impl WikiSource {
    pub fn new(store: Arc<dyn WikiStore>, chunk_chars: usize) -> Self {
        Self {
            store,
            normalizer: Normalizer::new(MIN_TERM_LEN),
            chunk_chars,
        }
    }

    /// Articles answering `query`, before chunking.
    pub async fn matching_entries(&self, query: &str) -> Result<Vec<WikiEntry>> {
        let terms = self.normalizer.terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self.store.entries().await?;
        let folded_query = fold(query);

        if let Some(forced) = forced_match(&folded_query, &entries) {
            tracing::debug!(title = %forced.title, "wiki forced match");
            return Ok(vec![forced.clone()]);
        }

        Ok(entries
            .into_iter()
            .filter(|e| matches_all_terms(e, &terms))
            .collect())
    }
}

/// First entry whose folded title (or its singular) occurs in the query.
pub fn forced_match<'a>(folded_query: &str, entries: &'a [WikiEntry]) -> Option<&'a WikiEntry> {
    entries.iter().find(|e| {
        let title = fold(&e.title);
        if title.is_empty() {
            return false;
        }
        folded_query.contains(&title) || folded_query.contains(singularize(&title))
    })
}

/// True when every term occurs in the title, keywords, or content.
pub fn matches_all_terms(entry: &WikiEntry, terms: &[Term]) -> bool {
    let haystacks = [fold(&entry.title), fold(&entry.keywords), fold(&entry.content)];
    terms
        .iter()
        .all(|t| haystacks.iter().any(|h| t.found_in(h)))
}

#[async_trait]
impl KnowledgeSource for WikiSource {
    fn name(&self) -> &str {
        "wiki"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Wiki
    }

    async fn retrieve(&self, query: &str, opts: &RetrieveOptions) -> Result<Vec<Fragment>> {
        let entries = self.matching_entries(query).await?;

        let mut fragments = Vec::new();
        'entries: for entry in &entries {
            for piece in chunk_text(&entry.content, self.chunk_chars) {
                if fragments.len() >= opts.top_k {
                    break 'entries;
                }
                fragments.push(Fragment::new(
                    piece,
                    WIKI_SCORE,
                    FragmentMetadata {
                        source: SourceKind::Wiki,
                        title: Some(entry.title.clone()),
                        category: Some(entry.category.clone()),
                        url: Some(entry.url.clone()),
                        domain: None,
                    },
                ));
            }
        }

        Ok(fragments)
    }

    async fn health(&self) -> Result<String> {
        Ok(format!("{} articles", self.store.count().await?))
    }
}
