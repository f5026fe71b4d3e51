//! Ranking intent classification.
//!
//! A query is matched against [`RULES`] in order and the first rule that
//! recognises it decides the intent. Inside each rule the patterns are
//! ordered too; the order is part of the contract:
//!
//! 1. `best-of` ("el mejor mago criminal"): rank by level, optionally by
//!    class and faction.
//! 2. `top-by-metric` ("top npc elfo"): rank by a metric with class, race
//!    and faction filters. `npc` is tested before `kill` so "top kills npc"
//!    ranks NPC kills.
//! 3. `player-detail` ("cuantos npcs mato Juan"): one field of one named
//!    player. NPC-kill patterns run before kill patterns, and kill
//!    patterns never fire on a query that mentions `npc`.
//!
//! All patterns run against the lowercased query.

use regex::Regex;
use std::sync::LazyLock;

use super::field::RankField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Highest-level players, overall or for one class.
    BestOf {
        class: Option<String>,
        faction: Option<String>,
    },
    /// Highest values of `field` among the filtered roster.
    Top {
        field: RankField,
        class: Option<String>,
        race: Option<String>,
        faction: Option<String>,
    },
    /// One field of one player.
    Detail { field: RankField, name: String },
}

/// One entry of the ordered rule list.
pub struct IntentRule {
    pub name: &'static str,
    matcher: fn(&str) -> Option<Intent>,
}

impl IntentRule {
    pub fn matches(&self, lowered: &str) -> Option<Intent> {
        (self.matcher)(lowered)
    }
}

pub static RULES: &[IntentRule] = &[
    IntentRule {
        name: "best-of",
        matcher: best_of,
    },
    IntentRule {
        name: "top-by-metric",
        matcher: top_by_metric,
    },
    IntentRule {
        name: "player-detail",
        matcher: player_detail,
    },
];

/// Classify `query`, or `None` when it is not about rankings.
pub fn classify(query: &str) -> Option<Intent> {
    let lowered = query.to_lowercase();
    RULES.iter().find_map(|rule| {
        let intent = rule.matches(&lowered)?;
        tracing::debug!(rule = rule.name, ?intent, "ranking intent");
        Some(intent)
    })
}

static RE_BEST_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(mejor|top)\b.*\b(jugador|player|asesino|bardo|druida|guerrero|nigromante|mago|palad[ií]n|cazador|cl[eé]rigo|arquero|pirata)\b(?:.*\b(ciudadano|criminal|neutro)\b)?",
    )
    .unwrap()
});

fn best_of(q: &str) -> Option<Intent> {
    let caps = RE_BEST_OF.captures(q)?;
    let target = caps.get(2)?.as_str();
    let class = (!matches!(target, "jugador" | "player")).then(|| target.to_string());
    let faction = caps.get(3).map(|m| m.as_str().to_string());
    Some(Intent::BestOf { class, faction })
}

static METRIC_RULES: LazyLock<Vec<(Regex, RankField)>> = LazyLock::new(|| {
    [
        (r"\b(top|mejor)\b.*\bnivel\b", RankField::Level),
        (r"\b(top|mejor)\b.*\bnpc", RankField::NpcKills),
        (r"\b(top|mejor|más|mas)\b.*\bkill", RankField::Kills),
        (r"\b(top|mejor)\b.*\bmuert", RankField::Deaths),
        (r"\b(top|mejor)\b.*\bretos\b", RankField::ChallengesWon),
    ]
    .into_iter()
    .map(|(pattern, field)| (Regex::new(pattern).unwrap(), field))
    .collect()
});

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(asesino|bardo|druida|guerrero|nigromante|mago|palad[ií]n|cazador|cl[eé]rigo|arquero|pirata)\b").unwrap()
});
static RE_RACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(humano|enano|elfo oscuro|elfo|gnomo)\b").unwrap());
static RE_FACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(ciudadano|criminal|neutro)\b").unwrap());

fn top_by_metric(q: &str) -> Option<Intent> {
    let field = METRIC_RULES
        .iter()
        .find(|(re, _)| re.is_match(q))
        .map(|(_, field)| *field)?;

    let find = |re: &Regex| re.find(q).map(|m| m.as_str().to_string());
    Some(Intent::Top {
        field,
        class: find(&RE_CLASS),
        race: find(&RE_RACE),
        faction: find(&RE_FACTION),
    })
}

struct DetailRule {
    pattern: Regex,
    field: RankField,
    /// Kill rules stand aside for anything mentioning NPCs.
    skip_if_npc: bool,
}

static DETAIL_RULES: LazyLock<Vec<DetailRule>> = LazyLock::new(|| {
    let rule = |pattern: &str, field, skip_if_npc| DetailRule {
        pattern: Regex::new(pattern).unwrap(),
        field,
        skip_if_npc,
    };
    vec![
        rule(
            r"(?:cuant[oa]s?)\s*(?:veces\s*)?npcs?\s+\b(?:mato|mata[sn]|kills?)\b\s*([\w ]+)",
            RankField::NpcKills,
            false,
        ),
        rule(r"([\w ]+)\s+\b(?:mata[sn]|kills?)\b\s*npcs?", RankField::NpcKills, false),
        rule(r"([\w ]+)\s+tiene\s+npcs?\s+mat[oó]s?", RankField::NpcKills, false),
        // "kills de X" first so the name does not swallow "de".
        rule(
            r"(?:cuant[oa]s?)\s*(?:veces\s*)?kills?\b\s+de\s+([\w ]+)",
            RankField::Kills,
            true,
        ),
        rule(
            r"(?:cuant[oa]s?)\s*(?:veces\s*)?\b(?:mato|mata[sn]|kills?)\b\s+([\w ]+)",
            RankField::Kills,
            true,
        ),
        rule(r"([\w ]+)\s+\b(?:mata[sn]|kills?)\b", RankField::Kills, true),
        rule(
            r"(?:cuant[oa]s?)\s*(?:veces\s*)?murio\s*([\w ]+)",
            RankField::Deaths,
            false,
        ),
        rule(r"([\w ]+)\s+murio\s*(?:veces)?", RankField::Deaths, false),
        rule(r"([\w ]+)\s+tiene\s+muert[oa]s?", RankField::Deaths, false),
        rule(r"nivel\s+(?:de|tiene)\s*([\w ]+)", RankField::Level, false),
        rule(r"([\w ]+)\s+tiene\s+nivel", RankField::Level, false),
        rule(
            r"retos\s+ganad[oa]s?\s*(?:de|tiene)\s*([\w ]+)",
            RankField::ChallengesWon,
            false,
        ),
    ]
});

fn player_detail(q: &str) -> Option<Intent> {
    let mentions_npc = q.contains("npc");
    DETAIL_RULES
        .iter()
        .filter(|rule| !(rule.skip_if_npc && mentions_npc))
        .find_map(|rule| {
            let name = rule.pattern.captures(q)?.get(1)?.as_str().trim();
            if name.is_empty() {
                return None;
            }
            Some(Intent::Detail {
                field: rule.field,
                name: name.to_string(),
            })
        })
}
