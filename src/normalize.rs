//! Date/time normalization: turns the locale-specific `date_raw`/`time_raw`
//! fragments produced by the parsers into an absolute timestamp in local
//! (Vilnius) time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Vilnius;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::DEFAULT_EVENT_HOUR;
use crate::types::EventKind;

/// Month names and abbreviations (Lithuanian nominative/genitive, English)
pub const MONTH_TOKENS: &[(&str, u32)] = &[
    ("sausio", 1),
    ("sausis", 1),
    ("saus", 1),
    ("vasario", 2),
    ("vasaris", 2),
    ("vas", 2),
    ("kovo", 3),
    ("kovas", 3),
    ("kov", 3),
    ("balandžio", 4),
    ("balandis", 4),
    ("bal", 4),
    ("gegužės", 5),
    ("gegužė", 5),
    ("geg", 5),
    ("birželio", 6),
    ("birželis", 6),
    ("birž", 6),
    ("liepos", 7),
    ("liepa", 7),
    ("liep", 7),
    ("rugpjūčio", 8),
    ("rugpjūtis", 8),
    ("rugp", 8),
    ("rugsėjo", 9),
    ("rugsėjis", 9),
    ("rugs", 9),
    ("spalio", 10),
    ("spalis", 10),
    ("spal", 10),
    ("lapkričio", 11),
    ("lapkritis", 11),
    ("lapkr", 11),
    ("gruodžio", 12),
    ("gruodis", 12),
    ("gruod", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sept", 9),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Longest tokens first so "sausio" is tried before "saus"
static MONTHS_BY_LENGTH: Lazy<Vec<(&'static str, u32)>> = Lazy::new(|| {
    let mut tokens = MONTH_TOKENS.to_vec();
    tokens.sort_by_key(|(token, _)| std::cmp::Reverse(token.chars().count()));
    tokens
});

static ISO_INSTANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}").expect("iso instant pattern is valid"));
static ISO_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})\b").expect("iso day pattern is valid"));
static DAY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\b").expect("day pattern is valid"));
static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("year pattern is valid"));
static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})").expect("clock pattern is valid"));

/// Month number for the first (longest) month token found in the text
pub fn month_from_text(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    MONTHS_BY_LENGTH
        .iter()
        .find(|(token, _)| lowered.contains(token))
        .map(|(_, month)| *month)
}

fn parse_clock(time_raw: &str) -> Option<(u32, u32)> {
    let caps = CLOCK.captures(time_raw)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn localize(naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    Vilnius
        .from_local_datetime(&naive)
        .earliest()
        // Wall-clock times skipped by a DST jump land an hour later
        .or_else(|| Vilnius.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

fn at_time(date: NaiveDate, (hour, minute): (u32, u32)) -> Option<DateTime<Tz>> {
    localize(date.and_hms_opt(hour, minute, 0)?)
}

fn parse_iso_instant(raw: &str) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Vilnius));
    }
    let offset = [
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ]
    .iter()
    .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok());
    if let Some(dt) = offset {
        return Some(dt.with_timezone(&Vilnius));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(localize)
}

/// Normalizes against the current wall clock.
pub fn normalize_date(date_raw: &str, time_raw: &str) -> Option<DateTime<Tz>> {
    normalize_date_at(date_raw, time_raw, Utc::now().with_timezone(&Vilnius))
}

/// Resolves `date_raw`/`time_raw` relative to `now`.
///
/// Returns `None` for an empty date or an impossible calendar date. A month
/// name earlier than the current month rolls into next year when the naive
/// result is more than a day old; the current month never rolls over.
pub fn normalize_date_at(date_raw: &str, time_raw: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let raw = date_raw.trim();
    if raw.is_empty() {
        return None;
    }

    if ISO_INSTANT.is_match(raw) {
        return parse_iso_instant(raw);
    }

    let clock = parse_clock(time_raw).unwrap_or((DEFAULT_EVENT_HOUR, 0));

    if let Some(caps) = ISO_DAY.captures(raw) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return at_time(date, clock);
    }

    let matched_month = month_from_text(raw);
    let explicit_year: Option<i32> = YEAR_TOKEN.captures(raw).and_then(|c| c[1].parse().ok());
    let day: u32 = DAY_TOKEN
        .captures(raw)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or_else(|| now.day());
    let month = matched_month.unwrap_or_else(|| now.month());
    let year = explicit_year.unwrap_or_else(|| now.year());

    let resolved = at_time(NaiveDate::from_ymd_opt(year, month, day)?, clock)?;

    let stale = resolved < now - Duration::hours(24);
    if explicit_year.is_none() && matched_month.is_some() && stale && month < now.month() {
        return at_time(NaiveDate::from_ymd_opt(year + 1, month, day)?, clock);
    }
    Some(resolved)
}

const KIND_KEYWORDS: &[(EventKind, &[&str])] = &[
    (EventKind::Festival, &["festival", "festivalis", "fest "]),
    (
        EventKind::Theatre,
        &["spektakl", "teatr", "theatre", "theater", "opera", "balet", "stand-up", "komedij", "comedy"],
    ),
    (
        EventKind::Music,
        &["koncert", "concert", "dj", "live", "gyvai", "džiaz", "jazz", "rock", "orkestr", "orchestra", "tour"],
    ),
    (EventKind::Exhibition, &["paroda", "exhibition", "galerij", "gallery", "muziej", "museum"]),
    (EventKind::Sport, &["sport", "krepšin", "basketball", "futbol", "football", "maraton", "bėgim"]),
];

/// Coarse category by keyword; first matching category wins
pub fn classify_event_kind(title: &str, description: Option<&str>) -> EventKind {
    let haystack = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    KIND_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or(EventKind::Other)
}
