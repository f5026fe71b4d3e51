//! Core data models used throughout Knowledge Harness.
//!
//! These types represent the corpus rows each source reads and the
//! [`Fragment`]s that flow out of the retrieval pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which knowledge source produced a fragment.
///
/// The prompt builder groups fragments by this value, so the serialized
/// names are part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Wiki,
    Offgame,
    Calculator,
    Ranking,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Wiki => "wiki",
            SourceKind::Offgame => "offgame",
            SourceKind::Calculator => "calculator",
            SourceKind::Ranking => "ranking",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance attached to every fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl FragmentMetadata {
    /// Metadata carrying only the source tag.
    pub fn source(source: SourceKind) -> Self {
        Self {
            source,
            title: None,
            category: None,
            url: None,
            domain: None,
        }
    }
}

/// A scored, sourced unit of retrieved text.
///
/// `score` is only meaningful relative to other fragments of the same
/// source, but the aggregator sorts all fragments by it globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub score: f64,
    pub metadata: FragmentMetadata,
}

impl Fragment {
    pub fn new(text: impl Into<String>, score: f64, metadata: FragmentMetadata) -> Self {
        Self {
            text: text.into(),
            score,
            metadata,
        }
    }

    /// Score used for ranking: non-finite or negative scores count as zero.
    pub fn rank_score(&self) -> f64 {
        if self.score.is_finite() && self.score > 0.0 {
            self.score
        } else {
            0.0
        }
    }
}

/// One article of the persisted wiki corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct WikiEntry {
    pub title: String,
    pub category: String,
    pub url: String,
    pub content: String,
    /// Comma-separated keyword tags.
    pub keywords: String,
}

/// One record of the off-game (lore / staff) corpus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OffgameEntry {
    pub title: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

/// Health breakpoints for one (class group, race group) pair.
///
/// Field names in the data file are the game community's own.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatsEntry {
    #[serde(rename = "clase")]
    pub class: String,
    #[serde(rename = "raza")]
    pub race: String,
    #[serde(rename = "vidaA13")]
    pub hp_at_low: f64,
    #[serde(rename = "promedioDiario")]
    pub daily_average_delta: f64,
    #[serde(rename = "vidaMinima")]
    pub hp_min: f64,
    #[serde(rename = "vidaA45")]
    pub hp_at_high: f64,
    #[serde(rename = "vidaMaxima")]
    pub hp_max: f64,
}

/// A player as reported by the live roster endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerRecord {
    #[serde(rename = "nombre", default, deserialize_with = "empty_if_null")]
    pub name: String,
    #[serde(rename = "elv", default, deserialize_with = "zero_if_null")]
    pub level: u64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub kills: u64,
    #[serde(rename = "murio", default, deserialize_with = "zero_if_null")]
    pub deaths: u64,
    #[serde(rename = "npcsmuertes", default, deserialize_with = "zero_if_null")]
    pub npc_kills: u64,
    #[serde(rename = "rganados", default, deserialize_with = "zero_if_null")]
    pub challenges_won_solo: u64,
    #[serde(rename = "rduosg", default, deserialize_with = "zero_if_null")]
    pub challenges_won_duo: u64,
    #[serde(rename = "clase", default)]
    pub class: Option<u32>,
    #[serde(rename = "raza", default)]
    pub race: Option<u32>,
    #[serde(rename = "bando", default)]
    pub faction: Option<u32>,
}

/// The roster sends `null` for counters a player never touched.
fn zero_if_null<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Rows for deleted characters come back with `"nombre": null`.
fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlayerRecord {
    pub fn challenges_won(&self) -> u64 {
        self.challenges_won_solo + self.challenges_won_duo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_record_from_roster_json() {
        let raw = r#"{"nombre":"Juan","elv":42,"kills":10,"murio":3,"npcsmuertes":900,
                      "rganados":4,"rduosg":2,"clase":38,"raza":4,"bando":1,"extra":"x"}"#;
        let p: PlayerRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(p.name, "Juan");
        assert_eq!(p.level, 42);
        assert_eq!(p.npc_kills, 900);
        assert_eq!(p.challenges_won(), 6);
        assert_eq!(p.class, Some(38));
    }

    #[test]
    fn test_player_record_missing_counters_default_to_zero() {
        let p: PlayerRecord = serde_json::from_str(r#"{"nombre":"Ana","murio":null}"#).unwrap();
        assert_eq!(p.kills, 0);
        assert_eq!(p.challenges_won(), 0);
        assert_eq!(p.faction, None);
    }

    #[test]
    fn test_null_name_does_not_spoil_the_roster() {
        let raw = r#"[{"nombre":"Juan","elv":40},{"nombre":null,"elv":1}]"#;
        let players: Vec<PlayerRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Juan");
        assert_eq!(players[1].name, "");
    }

    #[test]
    fn test_fragment_serializes_source_lowercase() {
        let f = Fragment::new("x", 1.0, FragmentMetadata::source(SourceKind::Calculator));
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["metadata"]["source"], "calculator");
        assert!(v["metadata"].get("title").is_none());
    }

    #[test]
    fn test_rank_score_clamps_non_finite() {
        let meta = FragmentMetadata::source(SourceKind::Wiki);
        assert_eq!(Fragment::new("a", f64::NAN, meta.clone()).rank_score(), 0.0);
        assert_eq!(Fragment::new("a", -3.0, meta.clone()).rank_score(), 0.0);
        assert_eq!(Fragment::new("a", 2.5, meta).rank_score(), 2.5);
    }
}
