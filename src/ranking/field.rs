//! The numeric player attributes a ranking or detail query can ask about.

use anyhow::bail;
use std::fmt;
use std::str::FromStr;

use crate::models::PlayerRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankField {
    Level,
    Kills,
    Deaths,
    NpcKills,
    ChallengesWon,
}

impl RankField {
    pub const ALL: [RankField; 5] = [
        RankField::Level,
        RankField::Kills,
        RankField::Deaths,
        RankField::NpcKills,
        RankField::ChallengesWon,
    ];

    /// The logical field name used by the roster community.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankField::Level => "nivel",
            RankField::Kills => "kills",
            RankField::Deaths => "murio",
            RankField::NpcKills => "npcsmuertes",
            RankField::ChallengesWon => "retosGanados",
        }
    }

    /// Single lookup from field to record attribute.
    pub fn value(&self, player: &PlayerRecord) -> u64 {
        match self {
            RankField::Level => player.level,
            RankField::Kills => player.kills,
            RankField::Deaths => player.deaths,
            RankField::NpcKills => player.npc_kills,
            RankField::ChallengesWon => player.challenges_won(),
        }
    }

    /// One-line answer for a detail query about `player`.
    pub fn describe(&self, player: &PlayerRecord) -> String {
        let value = self.value(player);
        match self {
            RankField::Level => format!("**{}** es nivel {}.", player.name, value),
            RankField::Kills => format!("**{}** tiene {} kills.", player.name, value),
            RankField::Deaths => format!("**{}** murió {} veces.", player.name, value),
            RankField::NpcKills => format!("**{}** mató {} NPCs.", player.name, value),
            RankField::ChallengesWon => format!("**{}** ganó {} retos.", player.name, value),
        }
    }
}

impl fmt::Display for RankField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankField {
    type Err = anyhow::Error;

    /// Accepts the roster names plus a few English aliases for the CLI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "nivel" | "level" => RankField::Level,
            "kills" => RankField::Kills,
            "murio" | "deaths" => RankField::Deaths,
            "npcsmuertes" | "npc" | "npcs" => RankField::NpcKills,
            "retosganados" | "retos" | "challenges" => RankField::ChallengesWon,
            other => bail!(
                "unknown ranking field '{}' (expected nivel, kills, murio, npcsmuertes or retosGanados)",
                other
            ),
        })
    }
}
