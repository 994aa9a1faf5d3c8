//! Cross-source slate comparison.
//!
//! Lines two slates up game by game and reports every disagreement with a
//! suggestion of which side to trust. Diagnostic only: acquisition never
//! waits on it.
//!
//! # Checks
//! 1. **Game count**: A wins when it alone holds a full slate
//! 2. **Round number**: A wins
//! 3. **Teams**: similarity below 0.9 is a mismatch; A wins from 0.7, below
//!    that a human decides
//! 4. **Order**: a mismatched game whose teams sit at another position of the
//!    other slate also gets an `Order` mismatch next to its team mismatches
//! 5. **Date / time**: differing dates, or kickoffs more than 5 minutes apart.
//!    A side with no kickoff listed (empty) is not compared
//! 6. **Missing games**: tail games present in only one slate

use crate::identity::{IdentityResolver, MatchResult};
use crate::page::normalize_time;
use crate::{GameEntry, SLATE_SIZE, Slate};
use chrono::{DateTime, Utc};
use serde::Serialize;

const TEAM_MATCH_THRESHOLD: f64 = 0.9;
const PREFER_A_THRESHOLD: f64 = 0.7;
const TIME_TOLERANCE_MINUTES: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    TeamName,
    GameCount,
    Order,
    DateTime,
    RoundNumber,
    MissingGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    PreferA,
    PreferB,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// 1-based position; 0 for slate-level mismatches.
    pub game_number: u8,
    pub kind: MismatchKind,
    pub field: String,
    pub value_a: String,
    pub value_b: String,
    pub similarity: Option<f64>,
    pub suggestion: Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub match_rate: f64,
    pub total_games: usize,
    pub matched_games: usize,
    pub mismatches: Vec<Mismatch>,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Both,
    A,
    B,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub match_rate: f64,
    pub total_games: usize,
    pub matched_games: usize,
    pub mismatch_count: usize,
    pub recommended: Recommendation,
}

#[derive(Debug, Clone, Default)]
pub struct ConsistencyValidator {
    resolver: IdentityResolver,
}

impl ConsistencyValidator {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self { resolver }
    }

    pub fn compare(&self, slate_a: &Slate, slate_b: &Slate) -> ValidationResult {
        let (games_a, games_b) = (&slate_a.games, &slate_b.games);
        let mut mismatches = Vec::new();

        if games_a.len() != games_b.len() {
            let suggestion = if games_a.len() == SLATE_SIZE {
                Suggestion::PreferA
            } else {
                Suggestion::Manual
            };
            mismatches.push(slate_level(
                MismatchKind::GameCount,
                "game_count",
                games_a.len(),
                games_b.len(),
                suggestion,
            ));
        }

        if slate_a.info.round_number != slate_b.info.round_number {
            mismatches.push(slate_level(
                MismatchKind::RoundNumber,
                "round_number",
                slate_a.info.round_number,
                slate_b.info.round_number,
                Suggestion::PreferA,
            ));
        }

        let common = games_a.len().min(games_b.len());
        let mut matched_games = 0;
        for i in 0..common {
            let found = self.compare_game(i, games_a, games_b);
            if found.is_empty() {
                matched_games += 1;
            }
            mismatches.extend(found);
        }

        let total_games = games_a.len().max(games_b.len());
        for i in common..total_games {
            let position = position_of(i);
            let mismatch = match (games_a.get(i), games_b.get(i)) {
                (Some(a), _) => Mismatch {
                    game_number: position,
                    kind: MismatchKind::MissingGame,
                    field: "game".into(),
                    value_a: a.matchup(),
                    value_b: String::new(),
                    similarity: None,
                    suggestion: Suggestion::PreferA,
                },
                (None, Some(b)) => Mismatch {
                    game_number: position,
                    kind: MismatchKind::MissingGame,
                    field: "game".into(),
                    value_a: String::new(),
                    value_b: b.matchup(),
                    similarity: None,
                    suggestion: Suggestion::Manual,
                },
                (None, None) => continue,
            };
            mismatches.push(mismatch);
        }

        let match_rate = if total_games == 0 {
            0.0
        } else {
            matched_games as f64 / total_games as f64
        };

        ValidationResult {
            is_valid: mismatches.is_empty(),
            match_rate,
            total_games,
            matched_games,
            mismatches,
            validated_at: Utc::now(),
        }
    }

    fn compare_game(&self, i: usize, games_a: &[GameEntry], games_b: &[GameEntry]) -> Vec<Mismatch> {
        let (a, b) = (&games_a[i], &games_b[i]);
        let position = position_of(i);
        let mut found = Vec::new();

        let home = self.resolver.match_team(&a.home_team, &b.home_team);
        let away = self.resolver.match_team(&a.away_team, &b.away_team);
        let team_issues: Vec<Mismatch> = [
            ("home_team", &a.home_team, &b.home_team, home),
            ("away_team", &a.away_team, &b.away_team, away),
        ]
        .into_iter()
        .filter(|(_, _, _, m)| m.similarity < TEAM_MATCH_THRESHOLD)
        .map(|(field, va, vb, m)| team_mismatch(position, field, va, vb, m))
        .collect();

        let misplaced = !team_issues.is_empty()
            && (self.found_elsewhere(a, games_b, i) || self.found_elsewhere(b, games_a, i));
        found.extend(team_issues);
        if misplaced {
            found.push(Mismatch {
                game_number: position,
                kind: MismatchKind::Order,
                field: "position".into(),
                value_a: a.matchup(),
                value_b: b.matchup(),
                similarity: None,
                suggestion: Suggestion::Manual,
            });
        }

        let dates_known = !a.match_date.is_empty() && !b.match_date.is_empty();
        if dates_known && a.match_date != b.match_date {
            found.push(Mismatch {
                game_number: position,
                kind: MismatchKind::DateTime,
                field: "date".into(),
                value_a: a.match_date.clone(),
                value_b: b.match_date.clone(),
                similarity: None,
                suggestion: Suggestion::PreferA,
            });
        }

        if kickoff_gap_minutes(&a.match_time, &b.match_time) > TIME_TOLERANCE_MINUTES {
            found.push(Mismatch {
                game_number: position,
                kind: MismatchKind::DateTime,
                field: "time".into(),
                value_a: a.match_time.clone(),
                value_b: b.match_time.clone(),
                similarity: None,
                suggestion: Suggestion::PreferA,
            });
        }

        found
    }

    /// Whether `game`'s pairing appears at a position other than `skip` in `others`.
    fn found_elsewhere(&self, game: &GameEntry, others: &[GameEntry], skip: usize) -> bool {
        others.iter().enumerate().any(|(j, other)| {
            j != skip
                && self.resolver.match_team(&game.home_team, &other.home_team).similarity
                    >= TEAM_MATCH_THRESHOLD
                && self.resolver.match_team(&game.away_team, &other.away_team).similarity
                    >= TEAM_MATCH_THRESHOLD
        })
    }
}

pub fn summarize(result: &ValidationResult) -> ValidationSummary {
    let prefer = |s: Suggestion| result.mismatches.iter().filter(|m| m.suggestion == s).count();
    let (for_a, for_b) = (prefer(Suggestion::PreferA), prefer(Suggestion::PreferB));

    let recommended = if result.is_valid {
        Recommendation::Both
    } else if for_a > for_b {
        Recommendation::A
    } else if for_b > for_a {
        Recommendation::B
    } else {
        Recommendation::Manual
    };

    ValidationSummary {
        is_valid: result.is_valid,
        match_rate: result.match_rate,
        total_games: result.total_games,
        matched_games: result.matched_games,
        mismatch_count: result.mismatches.len(),
        recommended,
    }
}

fn slate_level(
    kind: MismatchKind,
    field: &str,
    a: impl ToString,
    b: impl ToString,
    suggestion: Suggestion,
) -> Mismatch {
    Mismatch {
        game_number: 0,
        kind,
        field: field.to_owned(),
        value_a: a.to_string(),
        value_b: b.to_string(),
        similarity: None,
        suggestion,
    }
}

fn team_mismatch(position: u8, field: &str, a: &str, b: &str, m: MatchResult) -> Mismatch {
    Mismatch {
        game_number: position,
        kind: MismatchKind::TeamName,
        field: field.to_owned(),
        value_a: a.to_owned(),
        value_b: b.to_owned(),
        similarity: Some(m.similarity),
        suggestion: if m.similarity >= PREFER_A_THRESHOLD {
            Suggestion::PreferA
        } else {
            Suggestion::Manual
        },
    }
}

fn position_of(index: usize) -> u8 {
    u8::try_from(index + 1).unwrap_or(u8::MAX)
}

/// Absolute difference between two HHMM kickoffs; 0 when either is missing or
/// won't parse.
fn kickoff_gap_minutes(a: &str, b: &str) -> i32 {
    match (minutes_of_day(a), minutes_of_day(b)) {
        (Some(x), Some(y)) => (x - y).abs(),
        _ => 0,
    }
}

fn minutes_of_day(raw: &str) -> Option<i32> {
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let hhmm = normalize_time(raw);
    let hours: i32 = hhmm.get(..2)?.parse().ok()?;
    let minutes: i32 = hhmm.get(2..4)?.parse().ok()?;
    ((0..24).contains(&hours) && (0..60).contains(&minutes)).then_some(hours * 60 + minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameType, RoundInfo, RoundStatus, SourceTier};

    fn slate(round: u32, pairs: &[(&str, &str)]) -> Slate {
        let info = RoundInfo {
            round_number: round,
            game_type: GameType::SoccerWdl,
            source_tier: SourceTier::Betman,
            match_date: "20260110".into(),
            deadline: None,
            status: RoundStatus::Open,
            game_count: 0,
            fetched_at: Utc::now(),
        };
        let games = pairs
            .iter()
            .enumerate()
            .map(|(i, (h, a))| GameEntry {
                game_number: (i + 1) as u8,
                home_team: h.to_string(),
                away_team: a.to_string(),
                match_date: "20260110".into(),
                match_time: "2130".into(),
                ..Default::default()
            })
            .collect();
        Slate::new(info, games)
    }

    fn fourteen() -> Vec<(String, String)> {
        (1..=14).map(|n| (format!("홈팀{n}"), format!("원정팀{n}"))).collect()
    }

    fn refs(v: &[(String, String)]) -> Vec<(&str, &str)> {
        v.iter().map(|(h, a)| (h.as_str(), a.as_str())).collect()
    }

    fn validator() -> ConsistencyValidator {
        ConsistencyValidator::default()
    }

    #[test]
    fn identical_slates_are_valid() {
        let teams = fourteen();
        let a = slate(83, &refs(&teams));
        let result = validator().compare(&a, &a.clone());
        assert!(result.is_valid);
        assert_eq!(result.match_rate, 1.0);
        assert_eq!(result.matched_games, 14);
        assert_eq!(summarize(&result).recommended, Recommendation::Both);
    }

    #[test]
    fn aliased_names_are_not_mismatches() {
        let a = slate(83, &[("레스터C", "A빌라")]);
        let b = slate(83, &[("레스터시티", "아스톤빌라")]);
        assert!(validator().compare(&a, &b).is_valid);
    }

    #[test]
    fn count_and_missing_games() {
        let teams = fourteen();
        let a = slate(83, &refs(&teams));
        let b = slate(83, &refs(&teams[..12]));

        let result = validator().compare(&a, &b);
        let kinds: Vec<MismatchKind> = result.mismatches.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MismatchKind::GameCount, MismatchKind::MissingGame, MismatchKind::MissingGame]
        );
        assert_eq!(result.mismatches[0].suggestion, Suggestion::PreferA);
        assert_eq!(result.mismatches[1].game_number, 13);
        assert!(result.mismatches[1..].iter().all(|m| m.suggestion == Suggestion::PreferA));
        assert_eq!(result.matched_games, 12);
        assert!((result.match_rate - 12.0 / 14.0).abs() < 1e-9);

        let reversed = validator().compare(&b, &a);
        assert_eq!(reversed.mismatches[0].suggestion, Suggestion::Manual);
        assert!(reversed.mismatches[1..].iter().all(|m| m.suggestion == Suggestion::Manual));
    }

    #[test]
    fn round_number_mismatch_prefers_a() {
        let a = slate(83, &[("레스터C", "리버풀")]);
        let b = slate(84, &[("레스터C", "리버풀")]);
        let result = validator().compare(&a, &b);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].kind, MismatchKind::RoundNumber);
        assert_eq!(result.mismatches[0].game_number, 0);
        assert_eq!(result.mismatches[0].suggestion, Suggestion::PreferA);
        // Slate-level mismatches do not spoil the per-game rate.
        assert_eq!(result.match_rate, 1.0);
    }

    #[test]
    fn team_mismatch_suggestion_follows_similarity() {
        // Fuzzy 0.8: A is probably right.
        let a = slate(83, &[("브렌트퍼드", "리버풀")]);
        let b = slate(83, &[("브렌트포드", "리버풀")]);
        let result = validator().compare(&a, &b);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].kind, MismatchKind::TeamName);
        assert_eq!(result.mismatches[0].field, "home_team");
        assert_eq!(result.mismatches[0].suggestion, Suggestion::PreferA);

        // Unrelated clubs: a human decides.
        let c = slate(83, &[("맨체스터시티", "리버풀")]);
        let d = slate(83, &[("첼시", "리버풀")]);
        let result = validator().compare(&c, &d);
        assert_eq!(result.mismatches[0].suggestion, Suggestion::Manual);
        assert_eq!(result.mismatches[0].similarity, Some(0.0));
        assert_eq!(summarize(&result).recommended, Recommendation::Manual);
    }

    #[test]
    fn swapped_games_keep_team_mismatches_and_add_order() {
        let a = slate(83, &[("레스터C", "리버풀"), ("A빌라", "첼시")]);
        let b = slate(83, &[("아스톤빌라", "첼시"), ("레스터시티", "리버풀")]);

        let result = validator().compare(&a, &b);
        let found: Vec<(u8, MismatchKind, &str)> = result
            .mismatches
            .iter()
            .map(|m| (m.game_number, m.kind, m.field.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (1, MismatchKind::TeamName, "home_team"),
                (1, MismatchKind::TeamName, "away_team"),
                (1, MismatchKind::Order, "position"),
                (2, MismatchKind::TeamName, "home_team"),
                (2, MismatchKind::TeamName, "away_team"),
                (2, MismatchKind::Order, "position"),
            ]
        );
        assert_eq!(result.mismatches[0].value_a, "레스터C");
        assert_eq!(result.mismatches[0].value_b, "아스톤빌라");
        assert_eq!(result.mismatches[0].similarity, Some(0.0));
        assert!(result.mismatches.iter().all(|m| m.suggestion == Suggestion::Manual));
    }

    #[test]
    fn order_check_is_symmetric() {
        // A's game 1 appears at B's position 2, but B's game 1 is not in A.
        let a = slate(83, &[("레스터C", "리버풀"), ("토트넘", "풀럼")]);
        let b = slate(83, &[("브렌트포드", "에버턴"), ("레스터시티", "리버풀")]);

        let ab = validator().compare(&a, &b);
        let ba = validator().compare(&b, &a);
        assert_eq!(ab.mismatches.len(), ba.mismatches.len());
        let orders = |r: &ValidationResult| {
            r.mismatches
                .iter()
                .filter(|m| m.kind == MismatchKind::Order)
                .map(|m| m.game_number)
                .collect::<Vec<_>>()
        };
        assert_eq!(orders(&ab), vec![1, 2]);
        assert_eq!(orders(&ba), vec![1, 2]);
    }

    #[test]
    fn kickoff_tolerance() {
        let a = slate(83, &[("레스터C", "리버풀")]);
        let mut b = a.clone();
        b.games[0].match_time = "2134".into();
        assert!(validator().compare(&a, &b).is_valid);

        b.games[0].match_time = "2140".into();
        let result = validator().compare(&a, &b);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].field, "time");

        b.games[0].match_time = "미정".into();
        assert!(validator().compare(&a, &b).is_valid);
    }

    #[test]
    fn unknown_kickoff_on_one_side_is_not_compared() {
        let a = slate(83, &[("레스터C", "리버풀")]);
        let mut b = a.clone();
        b.games[0].match_date = String::new();
        b.games[0].match_time = String::new();

        assert!(validator().compare(&a, &b).is_valid);
        assert!(validator().compare(&b, &a).is_valid);
    }

    #[test]
    fn date_difference_is_reported() {
        let a = slate(83, &[("레스터C", "리버풀")]);
        let mut b = a.clone();
        b.games[0].match_date = "20260111".into();
        let result = validator().compare(&a, &b);
        assert_eq!(result.mismatches[0].kind, MismatchKind::DateTime);
        assert_eq!(result.mismatches[0].field, "date");
        assert_eq!(result.matched_games, 0);
    }

    #[test]
    fn positions_past_255_saturate() {
        let many: Vec<(String, String)> =
            (1..=300).map(|n| (format!("홈팀{n}"), format!("원정팀{n}"))).collect();
        let a = slate(83, &refs(&many));
        let b = slate(83, &[]);

        let result = validator().compare(&a, &b);
        let missing: Vec<u8> = result
            .mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::MissingGame)
            .map(|m| m.game_number)
            .collect();
        assert_eq!(missing.len(), 300);
        assert_eq!(missing[254], 255);
        assert!(missing[255..].iter().all(|&n| n == u8::MAX));
    }

    #[test]
    fn empty_slates() {
        let a = slate(83, &[]);
        let result = validator().compare(&a, &a);
        assert!(result.is_valid);
        assert_eq!(result.match_rate, 0.0);
    }

    #[test]
    fn mismatch_counts_are_symmetric() {
        let teams = fourteen();
        let mut short = refs(&teams[..13]);
        short.swap(2, 5);
        short[7] = ("브렌트포드", "에버턴");
        let a = slate(83, &refs(&teams));
        let b = slate(84, &short);

        let ab = validator().compare(&a, &b);
        let ba = validator().compare(&b, &a);
        assert_eq!(ab.mismatches.len(), ba.mismatches.len());
    }
}
