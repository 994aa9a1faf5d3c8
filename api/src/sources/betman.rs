use super::{SourceAdapter, round_info, today, ymd_string};
use crate::client::{HttpClient, SourceError, SourceResult};
use crate::page;
use crate::{GameEntry, GameType, RoundStatus, SLATE_SIZE, Slate, SourceTier};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.betman.co.kr";
const BUYABLE_GAMES_PATH: &str = "/main/mainPage/gamebuy/buyableGameList.do";

/// The official sale site. Most trusted tier: its list is what the tickets are
/// printed from.
#[derive(Debug, Clone)]
pub struct BetmanSource {
    http: HttpClient,
    base_url: String,
}

impl BetmanSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(timeout),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self) -> String {
        format!("{}{BUYABLE_GAMES_PATH}", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for BetmanSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Betman
    }

    async fn fetch(&self, game_type: GameType, force_refresh: bool) -> SourceResult<Slate> {
        let url = self.url();
        info!("betman: loading {} from {url}", game_type.label());
        let html = self.http.get_text(&url, force_refresh).await?;
        let slate = parse_buyable_games(game_type, &html, today())?;
        debug!(
            "betman: {} round {} with {} games",
            game_type, slate.info.round_number, slate.info.game_count
        );
        Ok(slate)
    }
}

/// Rows read `N경기 | MM.DD (요일) HH:MM | 홈팀vs원정팀 | ...`. Games are
/// numbered by their position in the list, and every listed row is kept.
pub fn parse_buyable_games(game_type: GameType, html: &str, today: NaiveDate) -> SourceResult<Slate> {
    let text = page::page_text(html);
    let section = page::market_section(&text, game_type);

    let mut games = Vec::new();
    for line in section.lines() {
        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() < 3 || page::game_label_number(cells[0]).is_none() {
            continue;
        }
        let Some((home, away)) = page::split_versus(cells[2]) else {
            continue;
        };

        let date = page::find_month_day(cells[1]).and_then(|(m, d)| page::nearest_date(m, d, today));
        games.push(GameEntry {
            game_number: u8::try_from(games.len() + 1).unwrap_or(u8::MAX),
            home_team: home.to_owned(),
            away_team: away.to_owned(),
            match_date: date.map(ymd_string).unwrap_or_default(),
            match_time: page::find_clock(cells[1]).unwrap_or_default(),
            league_name: None,
            odds: None,
        });
    }
    if games.len() > SLATE_SIZE {
        debug!("betman: {} rows listed for {}", games.len(), game_type);
    }

    if games.is_empty() {
        return Err(SourceError::NotFound(format!(
            "betman: no {} games on the buyable list",
            game_type.label()
        )));
    }

    let match_date = games
        .iter()
        .find_map(|g| NaiveDate::parse_from_str(&g.match_date, "%Y%m%d").ok())
        .unwrap_or(today);
    let round_number = page::find_labelled_round(section, game_type.market_label())
        .or_else(|| page::find_round_number(section))
        .unwrap_or_else(|| page::estimate_round_number(game_type, match_date));

    let info = round_info(
        game_type,
        SourceTier::Betman,
        round_number,
        match_date,
        None,
        RoundStatus::Open,
    );
    Ok(Slate::new(info, games))
}
