//! Off-game source: lore, staff, and community notes from a curated JSON file.
//!
//! The file is read once, on first use or on an explicit [`OffgameSource::ingest`],
//! and kept in memory for the life of the process.
//!
//! Matching is disjunctive (any query term in the title or a tag) because
//! the corpus is small and hand-written; ranking compensates:
//!
//! ```text
//! score = 2 × titleHits + contentHits
//! ```
//!
//! where `titleHits` is the number of query terms found in the title and
//! `contentHits` the total number of occurrences of every term in the
//! content. Ties keep file order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::chunk::chunk_text;
use crate::models::{Fragment, FragmentMetadata, OffgameEntry, SourceKind};
use crate::normalize::{fold, Normalizer};
use crate::traits::{KnowledgeSource, RetrieveOptions};

const MIN_TERM_LEN: usize = 2;

pub struct OffgameSource {
    path: PathBuf,
    entries: OnceCell<Vec<OffgameEntry>>,
    normalizer: Normalizer,
    chunk_chars: usize,
}

impl OffgameSource {
    pub fn new(path: PathBuf, chunk_chars: usize) -> Self {
        Self {
            path,
            entries: OnceCell::new(),
            normalizer: Normalizer::new(MIN_TERM_LEN),
            chunk_chars,
        }
    }

    /// Build a source over entries already in memory.
    pub fn with_entries(entries: Vec<OffgameEntry>, chunk_chars: usize) -> Self {
        Self {
            path: PathBuf::new(),
            entries: OnceCell::new_with(Some(entries)),
            normalizer: Normalizer::new(MIN_TERM_LEN),
            chunk_chars,
        }
    }

    /// Load the corpus now instead of on the first query.
    ///
    /// Returns the number of entries. Callers treat failure as fatal.
    pub async fn ingest(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }

    async fn entries(&self) -> Result<&Vec<OffgameEntry>> {
        self.entries
            .get_or_try_init(|| async {
                let raw = tokio::fs::read_to_string(&self.path)
                    .await
                    .with_context(|| format!("Failed to read off-game file: {}", self.path.display()))?;
                let entries: Vec<OffgameEntry> = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse off-game file: {}", self.path.display()))?;
                tracing::info!(count = entries.len(), path = %self.path.display(), "off-game corpus loaded");
                Ok::<_, anyhow::Error>(entries)
            })
            .await
    }

    /// Matching entries with their scores, best first.
    pub async fn scored_entries(&self, query: &str) -> Result<Vec<(&OffgameEntry, f64)>> {
        let terms: Vec<String> = self.normalizer.normalize(query).into_iter().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(&OffgameEntry, f64)> = self
            .entries()
            .await?
            .iter()
            .filter_map(|entry| score_entry(entry, &terms).map(|s| (entry, s)))
            .collect();

        // Stable: equal scores keep file order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }
}

/// Score an entry, or `None` when no term hits its title or tags.
fn score_entry(entry: &OffgameEntry, terms: &[String]) -> Option<f64> {
    let title = fold(&entry.title);
    let tags: Vec<String> = entry.tags.iter().map(|t| fold(t)).collect();

    let title_hits = terms.iter().filter(|t| title.contains(t.as_str())).count();
    let tag_hit = terms
        .iter()
        .any(|t| tags.iter().any(|tag| tag.contains(t.as_str())));
    if title_hits == 0 && !tag_hit {
        return None;
    }

    let content = fold(&entry.content);
    let content_hits: usize = terms.iter().map(|t| content.matches(t.as_str()).count()).sum();

    Some((2 * title_hits + content_hits) as f64)
}

#[async_trait]
impl KnowledgeSource for OffgameSource {
    fn name(&self) -> &str {
        "offgame"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Offgame
    }

    async fn retrieve(&self, query: &str, opts: &RetrieveOptions) -> Result<Vec<Fragment>> {
        let scored = self.scored_entries(query).await?;

        let mut fragments = Vec::new();
        for (entry, score) in scored.into_iter().take(opts.top_k) {
            for piece in chunk_text(&entry.content, self.chunk_chars)
                .into_iter()
                .take(opts.top_k)
            {
                fragments.push(Fragment::new(
                    piece,
                    score,
                    FragmentMetadata {
                        source: SourceKind::Offgame,
                        title: Some(entry.title.clone()),
                        category: None,
                        url: None,
                        domain: Some(entry.domain.clone()),
                    },
                ));
            }
        }
        fragments.truncate(opts.top_k);

        Ok(fragments)
    }

    async fn warm_up(&self) -> Result<()> {
        self.ingest().await.map(|_| ())
    }

    async fn health(&self) -> Result<String> {
        Ok(format!("{} entries", self.ingest().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: &str, tags: &[&str], content: &str) -> OffgameEntry {
        OffgameEntry {
            title: title.to_string(),
            domain: "lore".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content: content.to_string(),
        }
    }

    fn opts(top_k: usize) -> RetrieveOptions {
        RetrieveOptions { top_k }
    }

    #[tokio::test]
    async fn test_title_or_tag_hit_required() {
        let src = OffgameSource::with_entries(
            vec![
                entry("Historia de Ullathorpe", &["ciudad"], "Fundada por reyes."),
                entry("Staff", &["moderadores"], "La ciudad tiene guardias."),
            ],
            1000,
        );
        // Content-only mention of "ciudad" in "Staff" does not qualify.
        let frags = src.retrieve("ciudad", &opts(5)).await.unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].metadata.title.as_deref(), Some("Historia de Ullathorpe"));

        let frags = src.retrieve("guardias", &opts(5)).await.unwrap();
        assert!(frags.is_empty());
    }

    #[tokio::test]
    async fn test_score_formula() {
        let src = OffgameSource::with_entries(
            vec![entry("Dioses", &[], "Los dioses antiguos. Un dios menor.")],
            1000,
        );
        // terms: dioses, diose. title "dioses" contains both (2 hits);
        // content: "dioses" once, "diose" once.
        let scored = src.scored_entries("dioses").await.unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].1, 2.0 * 2.0 + 2.0);
    }

    #[tokio::test]
    async fn test_sorted_by_score_with_stable_ties() {
        let src = OffgameSource::with_entries(
            vec![
                entry("Eventos A", &["evento"], "nada"),
                entry("Eventos B", &["evento"], "nada"),
                entry("Evento grande", &[], "evento evento evento"),
            ],
            1000,
        );
        let frags = src.retrieve("evento", &opts(3)).await.unwrap();
        let titles: Vec<&str> = frags.iter().map(|f| f.metadata.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["Evento grande", "Eventos A", "Eventos B"]);
        assert!(frags[0].score > frags[1].score);
        assert_eq!(frags[1].score, frags[2].score);
        assert_eq!(frags[0].metadata.domain.as_deref(), Some("lore"));
    }

    #[tokio::test]
    async fn test_fragments_truncated_to_top_k() {
        let long = (0..6).map(|i| format!("Parrafo {} {}", i, "y".repeat(200))).collect::<Vec<_>>().join("\n\n");
        let src = OffgameSource::with_entries(
            vec![entry("Reglas", &[], &long), entry("Reglas del chat", &[], &long)],
            250,
        );
        let frags = src.retrieve("reglas", &opts(2)).await.unwrap();
        assert_eq!(frags.len(), 2);
    }

    #[tokio::test]
    async fn test_lazy_load_from_file_and_ingest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("offgame.json");
        std::fs::write(
            &path,
            r#"[{"title":"Staff","domain":"staff","tags":["gm","admin"],"content":"Los GMs moderan."}]"#,
        )
        .unwrap();

        let src = OffgameSource::new(path, 1000);
        assert_eq!(src.ingest().await.unwrap(), 1);
        let frags = src.retrieve("quien es admin", &opts(3)).await.unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Los GMs moderan.");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let src = OffgameSource::new(tmp.path().join("missing.json"), 1000);
        assert!(src.ingest().await.is_err());
        assert!(src.retrieve("staff", &opts(3)).await.is_err());
    }
}
