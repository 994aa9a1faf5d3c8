use super::{SourceAdapter, round_info, today};
use crate::client::{HttpClient, SourceError, SourceResult};
use crate::page;
use crate::{GameEntry, GameType, RoundStatus, Slate, SourceTier};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.zentoto.com";

/// Analysis site with one page per market and the sale window in the header.
#[derive(Debug, Clone)]
pub struct ZentotoSource {
    http: HttpClient,
    base_url: String,
}

impl ZentotoSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(timeout),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, game_type: GameType) -> String {
        let sport = match game_type {
            GameType::SoccerWdl => "soccer",
            GameType::BasketballW5l => "basketball",
        };
        format!("{}/toto/{sport}", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for ZentotoSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Zentoto
    }

    async fn fetch(&self, game_type: GameType, force_refresh: bool) -> SourceResult<Slate> {
        let url = self.url(game_type);
        info!("zentoto: loading {} from {url}", game_type.label());
        let html = self.http.get_text(&url, force_refresh).await?;
        let slate = parse_round_page(game_type, &html, today())?;
        debug!(
            "zentoto: {} round {} with {} games",
            game_type, slate.info.round_number, slate.info.game_count
        );
        Ok(slate)
    }
}

/// Each game spans several lines:
///
/// ```text
/// 7
/// 9   6   3   33  6   코모1907      <- stats, home team last
/// 경기분석
/// VS
/// 볼로냐  8   26  7   5   6         <- away team first, then stats
/// ```
pub fn parse_round_page(game_type: GameType, html: &str, today: NaiveDate) -> SourceResult<Slate> {
    let text = page::page_text(html);
    let lines: Vec<&str> = text.lines().collect();

    let mut games: Vec<GameEntry> = Vec::new();
    let (deadline, match_date) = match page::find_sale_period(&text) {
        Some((_, end)) => (Some(end), end.date()),
        None => (None, today),
    };

    for (i, line) in lines.iter().enumerate() {
        let Some(game_number) = page::bare_game_number(line) else {
            continue;
        };
        let home = lines
            .get(i + 1)
            .and_then(|l| l.split('\t').next_back())
            .map(str::trim)
            .filter(|name| page::is_team_like(name));
        let away = (i + 2..(i + 6).min(lines.len()))
            .find(|&j| lines[j].trim() == "VS")
            .and_then(|j| lines.get(j + 1))
            .and_then(|l| l.split('\t').next())
            .map(str::trim)
            .filter(|name| page::is_team_like(name));

        let (Some(home), Some(away)) = (home, away) else {
            continue;
        };
        if games.iter().any(|g| g.home_team == home && g.away_team == away) {
            continue;
        }
        games.push(GameEntry {
            game_number,
            home_team: home.to_owned(),
            away_team: away.to_owned(),
            match_date: String::new(),
            match_time: String::new(),
            league_name: None,
            odds: None,
        });
    }

    if games.is_empty() {
        return Err(SourceError::NotFound(format!(
            "zentoto: no {} games on the page",
            game_type.label()
        )));
    }

    let round_number = page::find_year_round(&text)
        .map(|(_, round)| round)
        .or_else(|| page::find_round_number(&text))
        .unwrap_or_else(|| page::estimate_round_number(game_type, match_date));
    let status = page::find_status(&text).unwrap_or(RoundStatus::Unknown);

    let info = round_info(game_type, SourceTier::Zentoto, round_number, match_date, deadline, status);
    Ok(Slate::new(info, games))
}
