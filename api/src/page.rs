// Shared page-text helpers for the scraped sources.
//
// The scraped sites render their slates as plain tables and text blocks. Every
// scraped adapter flattens the parsed document to "inner text" (one line per
// row/block, tab between cells) and pulls the round header and the games out of
// those lines with the patterns below. They key on the Korean markers (회차,
// 경기, 발매중) rather than class names, which change between redesigns.

use crate::{GameType, RoundStatus};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("body selector"));

static ROUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*회차").expect("round pattern"));
static ORDINAL_ROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"제\s*(\d+)회").expect("ordinal round pattern"));
static YEAR_ROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})년\s*(\d+)\s*회차").expect("year round pattern"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(20\d{2})년").expect("year pattern"));
static SALE_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{4}-\d{2}-\d{2})\s*\((\d{2}:\d{2})\)\s*~\s*(\d{4}-\d{2}-\d{2})\s*\((\d{2}:\d{2})\)",
    )
    .expect("sale period pattern")
});
static VERSUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)vs").expect("versus pattern"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{2}):(\d{2})").expect("clock pattern"));
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})[./](\d{2})").expect("month/day pattern"));
static GAME_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*경기$").expect("game label pattern"));

// ---------------------------------------------------------------------------
// HTML → text
// ---------------------------------------------------------------------------

/// Flatten an HTML document into trimmed, non-empty lines. Block-level
/// elements end a line, table cells end with a tab, script and style are
/// dropped. Whitespace from the markup collapses to single spaces, as a browser
/// would render it.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut out = String::with_capacity(html.len() / 2);
    push_element(&mut out, root);

    out.lines()
        .map(|line| {
            line.split('\t')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\t")
                .trim()
                .to_owned()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_element(out: &mut String, element: ElementRef<'_>) {
    let name = element.value().name();
    let block = matches!(
        name,
        "tr" | "li" | "p" | "div" | "table" | "ul" | "ol" | "option" | "section" | "article"
            | "header" | "footer" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    );
    match name {
        "script" | "style" | "noscript" | "template" => return,
        "br" => {
            out.push('\n');
            return;
        }
        _ => {}
    }

    if block {
        out.push('\n');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_element(out, child);
                }
            }
            _ => {}
        }
    }
    match name {
        "td" | "th" => out.push('\t'),
        _ if block => out.push('\n'),
        _ => {}
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n', '\t']) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

// ---------------------------------------------------------------------------
// Round header
// ---------------------------------------------------------------------------

/// `제 83회차`, `83회차`. First occurrence wins.
pub fn find_round_number(text: &str) -> Option<u32> {
    ROUND.captures_iter(text).find_map(|c| c[1].parse().ok())
}

/// `<label>\s*N회차`, e.g. `승무패 4회차`, `승5패34회차`.
pub fn find_labelled_round(text: &str, label: &str) -> Option<u32> {
    let pattern = Regex::new(&format!(r"{}\s*(\d+)\s*회차", regex::escape(label))).ok()?;
    pattern.captures_iter(text).find_map(|c| c[1].parse().ok())
}

/// `제83회` without the trailing 차.
pub fn find_ordinal_round(text: &str) -> Option<u32> {
    ORDINAL_ROUND.captures_iter(text).find_map(|c| c[1].parse().ok())
}

/// `2026년 3회차` → (2026, 3).
pub fn find_year_round(text: &str) -> Option<(i32, u32)> {
    YEAR_ROUND
        .captures_iter(text)
        .find_map(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
}

/// `2026년`, only plausible 20xx years.
pub fn find_year(text: &str) -> Option<i32> {
    YEAR.captures(text)?[1].parse().ok()
}

pub fn find_status(text: &str) -> Option<RoundStatus> {
    if text.contains("발매중") {
        Some(RoundStatus::Open)
    } else if text.contains("발매예정") {
        Some(RoundStatus::Pending)
    } else if text.contains("마감") || text.contains("결과발표") {
        Some(RoundStatus::Closed)
    } else {
        None
    }
}

/// `2026-01-08 (08:00) ~ 2026-01-10 (23:00)` → (start, end).
pub fn find_sale_period(text: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
    SALE_PERIOD.captures_iter(text).find_map(|c| {
        let start = parse_stamp(&c[1], &c[2])?;
        let end = parse_stamp(&c[3], &c[4])?;
        Some((start, end))
    })
}

fn parse_stamp(date: &str, clock: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {clock}"), "%Y-%m-%d %H:%M").ok()
}

/// The part of a multi-market page that belongs to `game_type`: from the first
/// line naming its market alongside a round header, up to the first such line
/// for another market. Pages without a header line are returned whole.
pub fn market_section(text: &str, game_type: GameType) -> &str {
    let is_header = |line: &str, label: &str| line.contains(label) && line.contains("회차");
    let own = game_type.market_label();

    let mut offset = 0;
    let mut start = None;
    for line in text.split('\n') {
        let current = start;
        match current {
            None if is_header(line, own) => start = Some(offset),
            Some(s) if offset > s
                && GameType::ALL
                    .iter()
                    .filter(|gt| **gt != game_type)
                    .any(|gt| is_header(line, gt.market_label())) =>
            {
                return &text[s..offset];
            }
            _ => {}
        }
        offset += line.len() + 1;
    }

    match start {
        Some(s) => &text[s..],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Game rows
// ---------------------------------------------------------------------------

/// Split `홈팀vs원정팀` / `홈팀 VS 원정팀` into trimmed halves.
pub fn split_versus(line: &str) -> Option<(&str, &str)> {
    let marker = VERSUS.find(line)?;
    let home = line[..marker.start()].trim();
    let away = line[marker.end()..].trim();
    (!home.is_empty() && !away.is_empty()).then_some((home, away))
}

/// Team names start with Hangul or a Latin letter and are at least two characters.
pub fn is_team_like(s: &str) -> bool {
    let starts_ok = s
        .chars()
        .next()
        .is_some_and(|c| is_hangul(c) || c.is_ascii_alphabetic());
    starts_ok && s.chars().count() >= 2
}

pub fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// First `HH:MM` in the string, as `HHMM`.
pub fn find_clock(s: &str) -> Option<String> {
    CLOCK.captures(s).map(|c| format!("{}{}", &c[1], &c[2]))
}

/// First plausible `MM.DD` / `MM/DD` pair in the string.
pub fn find_month_day(s: &str) -> Option<(u32, u32)> {
    MONTH_DAY.captures_iter(s).find_map(|c| {
        let month: u32 = c[1].parse().ok()?;
        let day: u32 = c[2].parse().ok()?;
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((month, day))
    })
}

/// Place a year-less month/day in whichever of last, this or next year lies
/// closest to `today`. Rounds straddle New Year.
pub fn nearest_date(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;
    [today.year() - 1, today.year(), today.year() + 1]
        .into_iter()
        .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
        .min_by_key(|d| (*d - today).num_days().abs())
}

/// Any time spelling (`930`, `09:30`, `2130`) to a zero-padded `HHMM`. No
/// digits at all means the kickoff is unknown and stays empty.
pub fn normalize_time(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(4).collect();
    if digits.is_empty() {
        String::new()
    } else {
        format!("{digits:0>4}")
    }
}

/// Line holding only a game number, e.g. `7`.
pub fn bare_game_number(line: &str) -> Option<u8> {
    let n: u8 = line.trim().parse().ok()?;
    (1..=crate::SLATE_SIZE as u8).contains(&n).then_some(n)
}

/// Cell reading `N경기`.
pub fn game_label_number(cell: &str) -> Option<u8> {
    GAME_LABEL.captures(cell.trim())?[1].parse().ok()
}

// ---------------------------------------------------------------------------
// Round estimation
// ---------------------------------------------------------------------------

/// Best-effort round number when a source carries none. Soccer rounds run weekly
/// from round 84 on 2025-12-27; basketball rounds run every other day from
/// round 1 at the 2024-25 season tip-off.
pub fn estimate_round_number(game_type: GameType, date: NaiveDate) -> u32 {
    match game_type {
        GameType::SoccerWdl => {
            let (base_date, base_round) = (ymd(2025, 12, 27), 84i64);
            let weeks = (date - base_date).num_days().div_euclid(7);
            (base_round + weeks).max(1) as u32
        }
        GameType::BasketballW5l => {
            let (base_date, base_round) = (ymd(2024, 10, 19), 1i64);
            let days = (date - base_date).num_days();
            (base_round + days.div_euclid(2)).max(1) as u32
        }
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
