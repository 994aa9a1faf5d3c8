use super::{API_TIMEOUT, SourceAdapter, round_info, today};
use crate::client::{HttpClient, SourceError, SourceResult};
use crate::kspo::{MatchItem, MatchListResponse};
use crate::page;
use crate::{GameEntry, GameType, RoundStatus, SLATE_SIZE, Slate, SourceTier};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://apis.data.go.kr/B551014/SRVC_TODZ_API";
const MATCH_LIST_PATH: &str = "/todz_api_tb_match_mgmt_i";
const TOTO_PRODUCT: &str = "토토/프로토";

#[derive(Debug, Clone)]
pub struct KspoConfig {
    pub base_url: String,
    pub service_key: String,
    /// Consecutive days queried, starting at `start_date`.
    pub days_ahead: u32,
    pub timeout: Duration,
    /// Pause between per-day requests.
    pub pacing: Duration,
    /// Defaults to the local date at fetch time.
    pub start_date: Option<NaiveDate>,
}

impl Default for KspoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            service_key: String::new(),
            days_ahead: 14,
            timeout: API_TIMEOUT,
            pacing: Duration::from_millis(500),
            start_date: None,
        }
    }
}

/// Sports Promotion public data API. Lowest tier: it carries no reliable round
/// number and its row order does not always follow the ticket.
#[derive(Debug, Clone)]
pub struct KspoSource {
    http: HttpClient,
    config: KspoConfig,
}

impl KspoSource {
    pub fn new(config: KspoConfig) -> Self {
        Self {
            http: HttpClient::new(config.timeout),
            config,
        }
    }

    async fn fetch_day(&self, day: NaiveDate, force_refresh: bool) -> SourceResult<Vec<MatchItem>> {
        let base = format!("{}{MATCH_LIST_PATH}", self.config.base_url.trim_end_matches('/'));
        let url = HttpClient::url_with_params(
            &base,
            &[
                ("serviceKey", self.config.service_key.clone()),
                ("pageNo", "1".to_owned()),
                ("numOfRows", "200".to_owned()),
                ("resultType", "JSON".to_owned()),
                ("match_ymd", day.format("%Y%m%d").to_string()),
            ],
        )?;
        let raw: MatchListResponse = self.http.get_json(url.as_str(), force_refresh).await?;
        if let Some(msg) = raw.api_error() {
            return Err(SourceError::Other(msg));
        }
        Ok(raw.into_items())
    }
}

#[async_trait]
impl SourceAdapter for KspoSource {
    fn tier(&self) -> SourceTier {
        SourceTier::KspoApi
    }

    async fn fetch(&self, game_type: GameType, force_refresh: bool) -> SourceResult<Slate> {
        let start = self.config.start_date.unwrap_or_else(today);
        info!(
            "kspo: querying {} days from {start} for {}",
            self.config.days_ahead,
            game_type.label()
        );

        let mut items = Vec::new();
        let mut answered = false;
        let mut last_error = None;
        for offset in 0..self.config.days_ahead {
            if offset > 0 && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
            let Some(day) = start.checked_add_days(Days::new(offset.into())) else {
                break;
            };
            match self.fetch_day(day, force_refresh).await {
                Ok(mut day_items) => {
                    debug!("kspo: {day} returned {} items", day_items.len());
                    answered = true;
                    items.append(&mut day_items);
                }
                Err(e) => {
                    warn!("kspo: skipping {day}: {e}");
                    last_error = Some(e);
                }
            }
        }
        if !answered {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let now = chrono::Local::now().naive_local();
        select_slate(game_type, items, start, now)
    }
}

/// Reduce a multi-day item dump to one round: the game type's toto items on
/// the nearest match day at or after `today`, ordered by `row_num`.
pub fn select_slate(
    game_type: GameType,
    items: Vec<MatchItem>,
    today: NaiveDate,
    now: NaiveDateTime,
) -> SourceResult<Slate> {
    let sport: Vec<MatchItem> = items
        .into_iter()
        .filter(|item| item.match_sport_han_nm.as_deref().map(str::trim) == Some(game_type.sport_han()))
        .collect();

    let exact: Vec<&MatchItem> = sport
        .iter()
        .filter(|item| item.obj_prod_nm.as_deref().map(str::trim) == Some(TOTO_PRODUCT))
        .collect();
    let toto = if exact.is_empty() {
        sport
            .iter()
            .filter(|item| item.obj_prod_nm.as_deref().is_some_and(|p| p.contains("토토")))
            .collect()
    } else {
        exact
    };

    let mut by_date: BTreeMap<String, Vec<&MatchItem>> = BTreeMap::new();
    for item in toto {
        if let Some(ymd) = item.match_ymd.clone() {
            by_date.entry(ymd).or_default().push(item);
        }
    }

    let today_key = today.format("%Y%m%d").to_string();
    let chosen = by_date
        .range(today_key..)
        .next()
        .or_else(|| by_date.iter().next())
        .map(|(date, items)| (date.clone(), items.clone()));

    let Some((date_key, mut day_items)) = chosen else {
        return Err(SourceError::NotFound(format!(
            "kspo: no {} toto matches in range",
            game_type.label()
        )));
    };

    day_items.retain(|item| item.row_num.is_some());
    day_items.sort_by_key(|item| item.row_num);
    day_items.truncate(SLATE_SIZE);

    let games: Vec<GameEntry> = day_items
        .iter()
        .filter_map(|item| {
            let game_number = u8::try_from(item.row_num?).ok()?;
            Some(GameEntry {
                game_number,
                home_team: item.hteam_han_nm.clone().unwrap_or_default().trim().to_owned(),
                away_team: item.ateam_han_nm.clone().unwrap_or_default().trim().to_owned(),
                match_date: item.match_ymd.clone().unwrap_or_else(|| date_key.clone()),
                match_time: page::normalize_time(item.match_tm.as_deref().unwrap_or_default()),
                league_name: item.leag_han_nm.clone(),
                odds: None,
            })
        })
        .collect();

    if games.is_empty() {
        return Err(SourceError::NotFound(format!(
            "kspo: {date_key} has no numbered {} rows",
            game_type.label()
        )));
    }

    let match_date = NaiveDate::parse_from_str(&date_key, "%Y%m%d").unwrap_or(today);
    let round_number = day_items
        .iter()
        .find_map(|item| item.turn_no)
        .unwrap_or_else(|| page::estimate_round_number(game_type, match_date));

    let deadline = games.first().and_then(|g| {
        let date = NaiveDate::parse_from_str(&g.match_date, "%Y%m%d").ok()?;
        let time = NaiveTime::parse_from_str(&g.match_time, "%H%M").ok()?;
        Some(date.and_time(time))
    });
    let status = match deadline {
        Some(d) if d > now => RoundStatus::Open,
        _ => RoundStatus::Closed,
    };

    let info = round_info(game_type, SourceTier::KspoApi, round_number, match_date, deadline, status);
    Ok(Slate::new(info, games))
}
