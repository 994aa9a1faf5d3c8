pub mod client;
pub mod identity;
pub mod kspo;
pub mod orchestrator;
pub mod page;
pub mod sources;
pub mod store;
pub mod validator;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Every downstream consumer formats games 1 to 14, so a slate is only usable at exactly this size.
pub const SLATE_SIZE: usize = 14;

// ---------------------------------------------------------------------------
// Domain types, independent of any source's wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// 축구 승무패: win / draw / loss.
    SoccerWdl,
    /// 농구 승5패: win / within-5 / loss.
    BasketballW5l,
}

impl GameType {
    pub const ALL: [GameType; 2] = [GameType::SoccerWdl, GameType::BasketballW5l];

    pub fn key(&self) -> &'static str {
        match self {
            GameType::SoccerWdl => "soccer_wdl",
            GameType::BasketballW5l => "basketball_w5l",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameType::SoccerWdl => "축구 승무패",
            GameType::BasketballW5l => "농구 승5패",
        }
    }

    /// Market name as the sale pages print it next to the round header.
    pub fn market_label(&self) -> &'static str {
        match self {
            GameType::SoccerWdl => "승무패",
            GameType::BasketballW5l => "승5패",
        }
    }

    /// Sport name as the public API spells it in `match_sport_han_nm`.
    pub fn sport_han(&self) -> &'static str {
        match self {
            GameType::SoccerWdl => "축구",
            GameType::BasketballW5l => "농구",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soccer_wdl" | "soccer" => Ok(GameType::SoccerWdl),
            "basketball_w5l" | "basketball" => Ok(GameType::BasketballW5l),
            other => Err(format!("unknown game type: {other}")),
        }
    }
}

/// One source in the fallback chain. Declaration order is priority order,
/// most trusted first: the public API sits last because it drops round
/// identifiers and misorders games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Betman,
    Wisetoto,
    Zentoto,
    KspoApi,
}

impl SourceTier {
    pub const PRIORITY: [SourceTier; 4] = [
        SourceTier::Betman,
        SourceTier::Wisetoto,
        SourceTier::Zentoto,
        SourceTier::KspoApi,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceTier::Betman => "betman",
            SourceTier::Wisetoto => "wisetoto",
            SourceTier::Zentoto => "zentoto",
            SourceTier::KspoApi => "kspo",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "betman" => Ok(SourceTier::Betman),
            "wisetoto" => Ok(SourceTier::Wisetoto),
            "zentoto" => Ok(SourceTier::Zentoto),
            "kspo" | "kspo_api" | "api" => Ok(SourceTier::KspoApi),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// Which tiers an acquisition may consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourcePreference {
    #[default]
    Auto,
    Only(SourceTier),
}

impl SourcePreference {
    /// Tiers in scope, in priority order.
    pub fn tiers(&self) -> Vec<SourceTier> {
        match self {
            SourcePreference::Auto => SourceTier::PRIORITY.to_vec(),
            SourcePreference::Only(tier) => vec![*tier],
        }
    }
}

impl FromStr for SourcePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(SourcePreference::Auto)
        } else {
            s.parse().map(SourcePreference::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Closed,
    Pending,
    #[default]
    Unknown,
}

impl RoundStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RoundStatus::Open => "open",
            RoundStatus::Closed => "closed",
            RoundStatus::Pending => "pending",
            RoundStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round_number: u32,
    pub game_type: GameType,
    pub source_tier: SourceTier,
    pub match_date: String, // YYYYMMDD
    pub deadline: Option<NaiveDateTime>,
    pub status: RoundStatus,
    pub game_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Per-outcome odds. Soccer uses home/draw/away, basketball home/five/away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeOdds {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
    pub five: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    pub game_number: u8,
    pub home_team: String,
    pub away_team: String,
    pub match_date: String, // YYYYMMDD
    pub match_time: String, // HHMM
    pub league_name: Option<String>,
    pub odds: Option<OutcomeOdds>,
}

impl GameEntry {
    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slate {
    pub info: RoundInfo,
    pub games: Vec<GameEntry>,
}

impl Slate {
    /// Build a slate whose `game_count` always reflects the games it carries.
    pub fn new(mut info: RoundInfo, games: Vec<GameEntry>) -> Self {
        info.game_count = games.len();
        Self { info, games }
    }

    /// Exactly 14 games numbered 1..=14, no gaps, no duplicates.
    pub fn is_authoritative(&self) -> bool {
        if self.games.len() != SLATE_SIZE || self.info.game_count != SLATE_SIZE {
            return false;
        }
        let numbers: BTreeSet<u8> = self.games.iter().map(|g| g.game_number).collect();
        numbers.len() == SLATE_SIZE && numbers.into_iter().eq(1..=SLATE_SIZE as u8)
    }
}
