use chrono::{Datelike, Duration, NaiveDate};

use super::{detect_city, find_date_line, split_lines, strip_noise, time_near, LineLayout, Parser};
use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};
use crate::types::{ParseOutcome, ParsedEvent};

const MAX_TITLE_CHARS: usize = 100;

const TODAY_WORDS: &[&str] = &["šiandien", "šįvakar", "today", "tonight"];
const TOMORROW_WORDS: &[&str] = &["rytoj", "tomorrow"];
const NEW_YEAR_WORDS: &[&str] = &["naujųjų metų", "naujieji metai", "naujametin", "new year"];
const VENUE_MARKERS: &[&str] = &["📍", "vieta:", "location:", "@"];

/// Social posts. Relative dates are resolved against `today`; a post with no
/// derivable date is skipped rather than defaulted.
#[derive(Debug, Clone, Copy)]
pub struct SocialParser {
    today: NaiveDate,
}

impl SocialParser {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    fn relative_date(&self, text: &str) -> Option<NaiveDate> {
        let lowered = text.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
        if mentions(TODAY_WORDS) {
            Some(self.today)
        } else if mentions(TOMORROW_WORDS) {
            Some(self.today + Duration::days(1))
        } else if mentions(NEW_YEAR_WORDS) {
            NaiveDate::from_ymd_opt(self.today.year(), 12, 31)
        } else {
            None
        }
    }
}

fn venue_line(line: &str) -> Option<String> {
    let lowered = line.to_lowercase();
    VENUE_MARKERS.iter().find_map(|marker| {
        let at = lowered.find(marker)?;
        // `get` returns None if case folding shifted the offset
        let value = line.get(at + marker.len()..)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

impl Parser for SocialParser {
    fn name(&self) -> &'static str {
        "social"
    }

    fn parse(&self, raw_text: &str) -> ParseOutcome {
        let lines = strip_noise(split_lines(raw_text));
        let date_idx = find_date_line(&lines);

        let date_raw = match date_idx {
            Some(i) => lines[i].clone(),
            None => match self.relative_date(raw_text) {
                Some(day) => day.format("%Y-%m-%d").to_string(),
                None => {
                    return ParseOutcome::Skipped {
                        reason: "no date in social post".to_string(),
                    }
                }
            },
        };

        let marked_venue = lines.iter().position(|line| venue_line(line).is_some());
        let content: Vec<String> = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != marked_venue)
            .map(|(_, line)| line.clone())
            .collect();
        let layout = LineLayout::with_date(&content, find_date_line(&content));

        let title = layout
            .title
            .map(|i| truncate(&content[i], MAX_TITLE_CHARS))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let location = marked_venue
            .and_then(|i| venue_line(&lines[i]))
            .or_else(|| layout.venue.map(|i| content[i].clone()))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let description = (lines.len() > 1).then(|| lines.join("\n"));

        ParseOutcome::from_event(ParsedEvent {
            time_raw: time_near(date_idx.map(|i| lines[i].as_str()), raw_text),
            detected_city: detect_city(raw_text),
            title,
            location,
            date_raw,
            description,
        })
    }
}
