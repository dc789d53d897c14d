//! Text parsers turning a raw candidate's text into a [`ParsedEvent`].
//!
//! Three strategies share one interface and the line heuristics below:
//! - [`GenericParser`]: ticketing-site cards (date, title, venue in some order)
//! - [`ListingParser`]: regional listing pages, which often label their fields
//! - [`SocialParser`]: social posts, where relative dates are common and a
//!   post without any date is skipped instead of defaulted

pub mod generic;
pub mod listing;
pub mod social;

pub use generic::GenericParser;
pub use listing::ListingParser;
pub use social::SocialParser;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};
use crate::normalize::MONTH_TOKENS;
use crate::types::{ParseOutcome, ParsedEvent};

/// A source-family specific strategy for structuring raw candidate text.
pub trait Parser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, raw_text: &str) -> ParseOutcome;
}

const WEEKDAYS: &str = "pirmadienis|antradienis|trečiadienis|ketvirtadienis|penktadienis|šeštadienis|sekmadienis|pirm|antr|treč|ketv|penkt|šešt|sekm|monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thu|fri|sat|sun";

/// Month token (LT full/abbreviated, EN full/abbreviated) with optional day
/// number on either side and optional weekday/year decoration.
pub static DATE_LINE: Lazy<Regex> = Lazy::new(|| {
    let mut months: Vec<&str> = MONTH_TOKENS.iter().map(|(token, _)| *token).collect();
    months.sort_by_key(|token| std::cmp::Reverse(token.chars().count()));
    let months = months
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i)(?:\b(?:{WEEKDAYS})\b\.?,?\s*)?(?:\b\d{{4}}\s*(?:m\.)?\s*)?(?:\b\d{{1,2}}\s*(?:d\.)?\s*)?\b(?:{months})\b\.?(?:\s*\d{{1,2}}\b)?(?:\s*d\.)?(?:,?\s*\d{{4}})?"
    );
    Regex::new(&pattern).expect("date line pattern is valid")
});

static ISO_DATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\b").expect("iso date pattern is valid"));

static TIME_12H: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?\s*m\b\.?").expect("12h pattern is valid")
});

static TIME_24H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("24h pattern is valid"));

static NOISE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:pirkti(?:\s+bilietus?)?|bilietai|buy(?:\s+tickets?)?|get\s+tickets?|tickets?|sold\s+out|išparduota|daugiau|more\s+info|(?:nuo|from|kaina:?)\s*\d+(?:[.,]\d+)?\s*(?:€|eur)?|€\s*\d+(?:[.,]\d+)?|\d+(?:[.,]\d+)?\s*(?:€|eur))\.?$",
    )
    .expect("noise pattern is valid")
});

/// Lithuanian cities and their inflected forms, mapped to the canonical name.
pub const CITY_FORMS: &[(&str, &str)] = &[
    ("vilnius", "Vilnius"),
    ("vilniaus", "Vilnius"),
    ("vilniuje", "Vilnius"),
    ("kaunas", "Kaunas"),
    ("kauno", "Kaunas"),
    ("kaune", "Kaunas"),
    ("klaipėda", "Klaipėda"),
    ("klaipėdos", "Klaipėda"),
    ("klaipėdoje", "Klaipėda"),
    ("šiauliai", "Šiauliai"),
    ("šiaulių", "Šiauliai"),
    ("šiauliuose", "Šiauliai"),
    ("panevėžys", "Panevėžys"),
    ("panevėžio", "Panevėžys"),
    ("panevėžyje", "Panevėžys"),
    ("alytus", "Alytus"),
    ("alytaus", "Alytus"),
    ("alytuje", "Alytus"),
    ("marijampolė", "Marijampolė"),
    ("marijampolės", "Marijampolė"),
    ("marijampolėje", "Marijampolė"),
    ("mažeikiai", "Mažeikiai"),
    ("mažeikių", "Mažeikiai"),
    ("jonava", "Jonava"),
    ("jonavos", "Jonava"),
    ("utena", "Utena"),
    ("utenos", "Utena"),
    ("palanga", "Palanga"),
    ("palangos", "Palanga"),
    ("palangoje", "Palanga"),
    ("druskininkai", "Druskininkai"),
    ("druskininkų", "Druskininkai"),
    ("trakai", "Trakai"),
    ("trakų", "Trakai"),
    ("birštonas", "Birštonas"),
    ("birštono", "Birštonas"),
    ("neringa", "Neringa"),
    ("neringos", "Neringa"),
    ("nida", "Neringa"),
    ("nidoje", "Neringa"),
];

/// Non-empty trimmed lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drops ticket prompts and price tokens from the head of the list
pub fn strip_noise(mut lines: Vec<String>) -> Vec<String> {
    let noise = lines.iter().take_while(|line| is_noise(line)).count();
    lines.drain(..noise);
    lines
}

pub fn is_noise(line: &str) -> bool {
    NOISE_LINE.is_match(line.trim())
}

pub fn is_date_line(line: &str) -> bool {
    DATE_LINE.is_match(line)
}

/// Index of the first month-name date line, else the first strict `YYYY-MM-DD` line
pub fn find_date_line(lines: &[String]) -> Option<usize> {
    lines
        .iter()
        .position(|line| is_date_line(line))
        .or_else(|| lines.iter().position(|line| ISO_DATE_LINE.is_match(line)))
}

/// Line positions shared by every strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLayout {
    pub date: Option<usize>,
    pub title: Option<usize>,
    pub venue: Option<usize>,
}

impl LineLayout {
    pub fn of(lines: &[String]) -> Self {
        Self::with_date(lines, find_date_line(lines))
    }

    /// Title is the first non-date line; venue is the first line after the
    /// date that is not the title, else the last line.
    pub fn with_date(lines: &[String], date: Option<usize>) -> Self {
        let title = (0..lines.len()).find(|&i| Some(i) != date);
        let after_date = date.and_then(|d| (d + 1..lines.len()).find(|&i| Some(i) != title));
        let venue = after_date.or_else(|| {
            let last = lines.len().checked_sub(1)?;
            (Some(last) != title && Some(last) != date).then_some(last)
        });
        Self { date, title, venue }
    }
}

/// First city (by table order) whose name or inflected form occurs in the text
pub fn detect_city(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    CITY_FORMS
        .iter()
        .find(|(form, _)| lowered.contains(form))
        .map(|(_, city)| city.to_string())
}

/// First time token as `HH:MM`, preferring 12-hour `H[:MM] AM/PM` forms
pub fn extract_time(text: &str) -> Option<String> {
    for caps in TIME_12H.captures_iter(text) {
        let Ok(hour) = caps[1].parse::<u32>() else {
            continue;
        };
        if !(1..=12).contains(&hour) {
            continue;
        }
        let minute = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let is_pm = caps[3].eq_ignore_ascii_case("p");
        let hour_24 = match (is_pm, hour) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };
        return Some(format!("{:02}:{:02}", hour_24, minute));
    }

    TIME_24H.captures(text).map(|caps| {
        let hour: u32 = caps[1].parse().unwrap_or(0);
        format!("{:02}:{}", hour, &caps[2])
    })
}

/// Time from the date line first, then from anywhere in the text
pub(crate) fn time_near(date_line: Option<&str>, text: &str) -> String {
    date_line
        .and_then(extract_time)
        .or_else(|| extract_time(text))
        .unwrap_or_default()
}

pub(crate) fn line_or(lines: &[String], idx: Option<usize>, sentinel: &str) -> String {
    idx.and_then(|i| lines.get(i))
        .cloned()
        .unwrap_or_else(|| sentinel.to_string())
}

/// The shared positional algorithm; strategies layer their own rules over it
pub(crate) fn parse_positional(raw_text: &str) -> ParsedEvent {
    let lines = strip_noise(split_lines(raw_text));
    let layout = LineLayout::of(&lines);
    let date_line = layout.date.map(|i| lines[i].as_str());

    ParsedEvent {
        title: line_or(&lines, layout.title, UNKNOWN_TITLE),
        location: line_or(&lines, layout.venue, UNKNOWN_LOCATION),
        date_raw: date_line.unwrap_or_default().to_string(),
        time_raw: time_near(date_line, raw_text),
        detected_city: detect_city(raw_text),
        description: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text)
    }

    #[test]
    fn test_extract_time_variants() {
        assert_eq!(extract_time("Doors: 7 PM").as_deref(), Some("19:00"));
        assert_eq!(extract_time("7:30 PM").as_deref(), Some("19:30"));
        assert_eq!(extract_time("19:00").as_deref(), Some("19:00"));
        assert_eq!(extract_time("12 PM").as_deref(), Some("12:00"));
        assert_eq!(extract_time("12 AM").as_deref(), Some("00:00"));
        assert_eq!(extract_time("Pradžia 8:05").as_deref(), Some("08:05"));
        assert_eq!(extract_time("no time here"), None);
    }

    #[test]
    fn test_extract_time_prefers_12_hour() {
        assert_eq!(extract_time("Doors 18:30, show 8 pm").as_deref(), Some("20:00"));
    }

    #[test]
    fn test_date_line_matches_lithuanian_and_english() {
        for line in [
            "JAN 15",
            "15 Jan",
            "Sausio 15",
            "Sausio 15 d.",
            "2025 m. gegužės 3 d.",
            "Šeštadienis, rugsėjo 6",
            "Saus. 15",
            "Dec 31, 2025",
        ] {
            assert!(is_date_line(line), "expected date line: {line}");
        }
    }

    #[test]
    fn test_date_line_rejects_words_containing_month_tokens() {
        assert!(!is_date_line("Mayday Parade"));
        assert!(!is_date_line("Marijampolės kultūros centras"));
        assert!(!is_date_line("Some Club"));
    }

    #[test]
    fn test_find_date_line_falls_back_to_iso() {
        let text = lines("Koncertas\n2025-03-08\nLoftas");
        assert_eq!(find_date_line(&text), Some(1));
        assert_eq!(find_date_line(&lines("Koncertas\nLoftas")), None);
    }

    #[test]
    fn test_layout_shifts_title_when_date_leads() {
        let text = lines("JAN 15\nConcert Name\nSome Club");
        let layout = LineLayout::of(&text);
        assert_eq!(layout, LineLayout { date: Some(0), title: Some(1), venue: Some(2) });
    }

    #[test]
    fn test_layout_venue_follows_date() {
        let text = lines("Concert Name\nVasario 2\nCompensa\nExtra");
        let layout = LineLayout::of(&text);
        assert_eq!(layout.title, Some(0));
        assert_eq!(layout.venue, Some(2));
    }

    #[test]
    fn test_layout_without_date_uses_last_line() {
        let text = lines("Concert Name\nSupport act\nSome Club");
        let layout = LineLayout::of(&text);
        assert_eq!(layout.date, None);
        assert_eq!(layout.venue, Some(2));

        let single = lines("Only a title");
        assert_eq!(LineLayout::of(&single).venue, None);
    }

    #[test]
    fn test_strip_noise_only_from_head() {
        let stripped = strip_noise(lines("Pirkti bilietus\nNuo 15 €\nKoncertas\n20 €"));
        assert_eq!(stripped, vec!["Koncertas".to_string(), "20 €".to_string()]);
    }

    #[test]
    fn test_detect_city_inflected_forms() {
        assert_eq!(detect_city("Vilniaus kongresų rūmai").as_deref(), Some("Vilnius"));
        assert_eq!(detect_city("Koncertas Kaune").as_deref(), Some("Kaunas"));
        assert_eq!(detect_city("Klaipėdos dramos teatras").as_deref(), Some("Klaipėda"));
        assert_eq!(detect_city("Somewhere else"), None);
    }
}
