use super::{SourceAdapter, round_info, today};
use crate::client::{HttpClient, SourceError, SourceResult};
use crate::page;
use crate::{GameEntry, GameType, RoundStatus, SLATE_SIZE, Slate, SourceTier};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.wisetoto.com";
const TOTO_PATH: &str = "/index.htm?tab_type=toto";

/// Community results site mirroring the official list.
#[derive(Debug, Clone)]
pub struct WisetotoSource {
    http: HttpClient,
    base_url: String,
}

impl WisetotoSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(timeout),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl SourceAdapter for WisetotoSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Wisetoto
    }

    async fn fetch(&self, game_type: GameType, force_refresh: bool) -> SourceResult<Slate> {
        let url = format!("{}{TOTO_PATH}", self.base_url);
        info!("wisetoto: loading {} from {url}", game_type.label());
        let html = self.http.get_text(&url, force_refresh).await?;
        let slate = parse_toto_page(game_type, &html, today())?;
        debug!(
            "wisetoto: {} round {} with {} games",
            game_type, slate.info.round_number, slate.info.game_count
        );
        Ok(slate)
    }
}

pub fn parse_toto_page(game_type: GameType, html: &str, today: NaiveDate) -> SourceResult<Slate> {
    let text = page::page_text(html);
    let section = page::market_section(&text, game_type);

    let mut pairs: Vec<(String, String)> = Vec::new();
    for line in section.lines() {
        let Some((left, right)) = page::split_versus(line) else {
            continue;
        };
        // The names sit right against the marker; scores and odds flank them.
        let (Some(home), Some(away)) = (
            left.split_whitespace().next_back(),
            right.split_whitespace().next(),
        ) else {
            continue;
        };
        if !page::is_team_like(home) || !page::is_team_like(away) {
            continue;
        }
        let pair = (home.to_owned(), away.to_owned());
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
        if pairs.len() == SLATE_SIZE {
            break;
        }
    }

    if pairs.is_empty() {
        return Err(SourceError::NotFound(format!(
            "wisetoto: no {} games on the page",
            game_type.label()
        )));
    }

    let round_number = page::find_labelled_round(section, game_type.market_label())
        .or_else(|| page::find_round_number(section))
        .or_else(|| page::find_ordinal_round(section))
        .unwrap_or_else(|| page::estimate_round_number(game_type, today));
    let status = page::find_status(section).unwrap_or(RoundStatus::Unknown);

    let games = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (home_team, away_team))| GameEntry {
            game_number: u8::try_from(i + 1).unwrap_or(u8::MAX),
            home_team,
            away_team,
            // The toto tab lists matchups only; kickoff is unknown here.
            match_date: String::new(),
            match_time: String::new(),
            league_name: None,
            odds: None,
        })
        .collect();

    let info = round_info(game_type, SourceTier::Wisetoto, round_number, today, None, status);
    Ok(Slate::new(info, games))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()
    }

    fn page(header: &str, matchups: &[(&str, &str)]) -> String {
        let rows: String = matchups
            .iter()
            .enumerate()
            .map(|(i, (h, a))| format!("<li>{} {h} vs {a} 1.85</li>", i + 1))
            .collect();
        format!("<div>{header}</div><ul>{rows}</ul>")
    }

    #[test]
    fn parses_labelled_round_and_games() {
        let teams: Vec<(String, String)> = (1..=14)
            .map(|n| (format!("홈팀{n}"), format!("원정팀{n}")))
            .collect();
        let refs: Vec<(&str, &str)> = teams.iter().map(|(h, a)| (h.as_str(), a.as_str())).collect();
        let html = page("축구 승무패4회차 발매중", &refs);

        let slate = parse_toto_page(GameType::SoccerWdl, &html, today()).unwrap();
        assert!(slate.is_authoritative());
        assert_eq!(slate.info.round_number, 4);
        assert_eq!(slate.info.status, RoundStatus::Open);
        assert_eq!(slate.games[13].home_team, "홈팀14");
        assert_eq!(slate.games[13].game_number, 14);
        assert_eq!(slate.games[0].match_date, "");
        assert_eq!(slate.games[0].match_time, "");
    }

    #[test]
    fn duplicates_are_dropped_and_list_is_capped() {
        let mut refs = vec![("레스터C", "리버풀"), ("레스터C", "리버풀")];
        let extra: Vec<(String, String)> =
            (1..=20).map(|n| (format!("팀A{n}"), format!("팀B{n}"))).collect();
        refs.extend(extra.iter().map(|(h, a)| (h.as_str(), a.as_str())));
        let html = page("승무패 10회차 마감", &refs);

        let slate = parse_toto_page(GameType::SoccerWdl, &html, today()).unwrap();
        assert_eq!(slate.games.len(), SLATE_SIZE);
        assert_eq!(slate.games[0].matchup(), "레스터C vs 리버풀");
        assert_eq!(slate.games[1].home_team, "팀A1");
        assert_eq!(slate.info.status, RoundStatus::Closed);
    }

    #[test]
    fn single_letter_names_are_rejected() {
        let html = page("승무패 10회차", &[("A", "B")]);
        assert!(matches!(
            parse_toto_page(GameType::SoccerWdl, &html, today()),
            Err(SourceError::NotFound(_))
        ));
    }
}
