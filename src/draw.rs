use slate_api::orchestrator::Acquired;
use slate_api::validator::{Recommendation, Suggestion, ValidationResult, ValidationSummary};
use slate_api::{GameEntry, Slate, SourceTier};
use std::fmt::Write;

const TEAM_COLUMN: usize = 18;

pub fn draw_acquired(acquired: &Acquired) -> String {
    let mut out = String::new();
    let info = &acquired.slate.info;

    let _ = writeln!(
        out,
        "{} {}회차 [{}] from {}",
        info.game_type.label(),
        info.round_number,
        info.status.label(),
        acquired.origin
    );
    if let Some(deadline) = info.deadline {
        let _ = writeln!(out, "deadline {}", deadline.format("%Y-%m-%d %H:%M"));
    }
    if let Some(warning) = &acquired.warning {
        let _ = writeln!(
            out,
            "! live sources failed, showing data saved at {}",
            warning.saved_at.format("%Y-%m-%d %H:%M UTC")
        );
        for attempt in &warning.attempts {
            let _ = writeln!(out, "    {attempt}");
        }
    }
    out.push('\n');
    out.push_str(&draw_games(&acquired.slate.games));
    out
}

pub fn draw_games(games: &[GameEntry]) -> String {
    let mut out = String::new();
    for game in games {
        let _ = writeln!(
            out,
            "{:>2}  {}  vs  {}  {} {}",
            game.game_number,
            pad(&game.home_team, TEAM_COLUMN),
            pad(&game.away_team, TEAM_COLUMN),
            format_date(&game.match_date),
            format_time(&game.match_time),
        );
    }
    out
}

pub fn draw_validation(
    slate_a: &Slate,
    slate_b: &Slate,
    result: &ValidationResult,
    summary: &ValidationSummary,
) -> String {
    let (a, b) = (slate_a.info.source_tier, slate_b.info.source_tier);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} vs {}: {}/{} games agree ({:.0}%)",
        slate_a.info.game_type.label(),
        a,
        b,
        result.matched_games,
        result.total_games,
        result.match_rate * 100.0
    );
    let _ = writeln!(out, "recommended: {}", recommendation_label(summary.recommended, a, b));

    if result.mismatches.is_empty() {
        return out;
    }
    out.push('\n');
    for m in &result.mismatches {
        let position = if m.game_number == 0 {
            "--".to_owned()
        } else {
            format!("{:>2}", m.game_number)
        };
        let similarity = m
            .similarity
            .map(|s| format!(" ({:.2})", s))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{position}  {:?} {}: {a}={} / {b}={}{similarity} -> {}",
            m.kind,
            m.field,
            blank_as_dash(&m.value_a),
            blank_as_dash(&m.value_b),
            suggestion_label(m.suggestion, a, b),
        );
    }
    out
}

fn recommendation_label(r: Recommendation, a: SourceTier, b: SourceTier) -> String {
    match r {
        Recommendation::Both => "either source".to_owned(),
        Recommendation::A => a.to_string(),
        Recommendation::B => b.to_string(),
        Recommendation::Manual => "manual review".to_owned(),
    }
}

fn suggestion_label(s: Suggestion, a: SourceTier, b: SourceTier) -> String {
    match s {
        Suggestion::PreferA => format!("use {a}"),
        Suggestion::PreferB => format!("use {b}"),
        Suggestion::Manual => "manual".to_owned(),
    }
}

fn blank_as_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn format_date(ymd: &str) -> String {
    match (ymd.get(4..6), ymd.get(6..8)) {
        (Some(m), Some(d)) if ymd.len() == 8 => format!("{m}/{d}"),
        _ => ymd.to_owned(),
    }
}

fn format_time(hhmm: &str) -> String {
    match (hhmm.get(..2), hhmm.get(2..4)) {
        (Some(h), Some(m)) if hhmm.len() == 4 => format!("{h}:{m}"),
        _ => hhmm.to_owned(),
    }
}

/// Pad to `width` terminal columns; Hangul and other wide glyphs take two.
fn pad(s: &str, width: usize) -> String {
    let used: usize = s.chars().map(column_width).sum();
    format!("{s}{}", " ".repeat(width.saturating_sub(used)))
}

fn column_width(c: char) -> usize {
    match c {
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FF60}' => 2,
        _ => 1,
    }
}
