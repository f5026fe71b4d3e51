//! Health calculator for class/race/level questions.
//!
//! Answers "how much HP does a dwarf warrior have at level 30" from a
//! table of per-(class group, race group) breakpoints. Health grows
//! linearly between level 13 and level 45 and is flat outside that band:
//!
//! ```text
//! level ≤ 13        hp = vidaA13
//! 13 < level < 45   hp = round(vidaA13 + promedioDiario × (level − 13))
//! level ≥ 45        hp = vidaA45
//! ```
//!
//! The calculator never fails once built. Queries that mention health but
//! name no class or race get a fragment asking for both.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::models::{Fragment, FragmentMetadata, SourceKind, StatsEntry};
use crate::normalize::fold;
use crate::traits::{KnowledgeSource, RetrieveOptions};

pub const STATS_SCORE: f64 = 1.0;

/// Level at which the linear band starts.
pub const LOW_BREAKPOINT: u32 = 13;
/// Level at which health stops growing.
pub const HIGH_BREAKPOINT: u32 = 45;

static RE_HEALTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(vida|hp|puntos de vida)\b").unwrap());

static RE_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:nivel|lvl|al nivel|al)\s*(\d{1,2})\b").unwrap());

/// Class aliases in match order, mapped to the table's class groups.
const CLASS_ALIASES: &[(&str, &str)] = &[
    ("mago", "Mago/Nigromante/Druida"),
    ("nigromante", "Mago/Nigromante/Druida"),
    ("druida", "Mago/Nigromante/Druida"),
    ("clerigo", "Clérigo/Bardo/Asesino"),
    ("bardo", "Clérigo/Bardo/Asesino"),
    ("asesino", "Clérigo/Bardo/Asesino"),
    ("paladin", "Paladín/Cazador"),
    ("cazador", "Paladín/Cazador"),
    ("arquero", "Arquero/Guerrero"),
    ("guerrero", "Arquero/Guerrero"),
    ("bandido", "Bandido"),
    ("trabajadoras", "Trabajadoras"),
    ("trabajadora", "Trabajadoras"),
];

/// Race aliases in match order. `elfo oscuro` must precede `elfo`.
const RACE_ALIASES: &[(&str, &str)] = &[
    ("enano", "Enano"),
    ("humano", "Humano"),
    ("elfo oscuro", "Elfo Oscuro / Gnomo"),
    ("gnomo", "Elfo Oscuro / Gnomo"),
    ("elfo", "Elfo"),
];

/// What a health question asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthQuery {
    pub class: Option<&'static str>,
    pub race: Option<&'static str>,
    pub level: Option<u32>,
}

/// Parse `text`, or `None` when it is not a health question.
pub fn parse_query(text: &str) -> Option<HealthQuery> {
    if !RE_HEALTH.is_match(&text.to_lowercase()) {
        return None;
    }

    let folded = fold(text);
    let lookup = |aliases: &[(&str, &'static str)]| {
        aliases
            .iter()
            .find(|(alias, _)| folded.contains(alias))
            .map(|(_, group)| *group)
    };

    let level = RE_LEVEL
        .captures(&folded)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&level| level > 0);

    Some(HealthQuery {
        class: lookup(CLASS_ALIASES),
        race: lookup(RACE_ALIASES),
        level,
    })
}

/// Health of `entry` at `level`.
pub fn hp_for_level(entry: &StatsEntry, level: u32) -> f64 {
    if level <= LOW_BREAKPOINT {
        entry.hp_at_low
    } else if level >= HIGH_BREAKPOINT {
        entry.hp_at_high
    } else {
        (entry.hp_at_low + entry.daily_average_delta * f64::from(level - LOW_BREAKPOINT)).round()
    }
}

pub struct StatsCalculator {
    table: Vec<StatsEntry>,
}

impl StatsCalculator {
    pub fn new(table: Vec<StatsEntry>) -> Self {
        Self { table }
    }

    /// Load the table from a JSON array file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;
        let table: Vec<StatsEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse stats file: {}", path.display()))?;
        Ok(Self::new(table))
    }

    /// Like [`from_file`](Self::from_file), but an unreadable table only
    /// costs answers: every resolved query then reports missing data.
    pub fn from_file_or_empty(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(calc) => calc,
            Err(e) => {
                tracing::warn!(error = %e, "stats table unavailable, using an empty table");
                Self::new(Vec::new())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn find(&self, class: &str, race: &str) -> Option<&StatsEntry> {
        let (class, race) = (fold(class), fold(race));
        self.table
            .iter()
            .find(|e| fold(&e.class) == class && fold(&e.race) == race)
    }

    /// The answer text for `text`, or `None` when it is not a health question.
    pub fn answer(&self, text: &str) -> Option<String> {
        let query = parse_query(text)?;

        let (Some(class), Some(race)) = (query.class, query.race) else {
            return Some(
                "Podría calcular vida, pero faltan datos (clase o raza). Por favor especificá ambos."
                    .to_string(),
            );
        };

        let Some(entry) = self.find(class, race) else {
            return Some(format!("No encontré datos de vida para {} {}.", class, race));
        };

        Some(match query.level {
            None => format!(
                "La vida de un {} {} va de **{}** a **{}**.",
                class, race, entry.hp_min, entry.hp_max
            ),
            Some(level) => format!(
                "La vida promedio de un {} {} nivel {} es **{}**.",
                class,
                race,
                level,
                hp_for_level(entry, level)
            ),
        })
    }
}

#[async_trait]
impl KnowledgeSource for StatsCalculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Calculator
    }

    async fn retrieve(&self, query: &str, _opts: &RetrieveOptions) -> Result<Vec<Fragment>> {
        Ok(self
            .answer(query)
            .map(|text| {
                Fragment::new(text, STATS_SCORE, FragmentMetadata::source(SourceKind::Calculator))
            })
            .into_iter()
            .collect())
    }

    async fn health(&self) -> Result<String> {
        if self.is_empty() {
            anyhow::bail!("stats table is empty");
        }
        Ok(format!("{} rows", self.len()))
    }
}
