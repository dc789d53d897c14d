use super::{detect_city, line_or, split_lines, strip_noise, time_near, LineLayout, Parser};
use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};
use crate::types::{ParseOutcome, ParsedEvent};

const VENUE_LABELS: &[&str] = &["vieta", "venue", "location", "adresas", "address"];
const DATE_LABELS: &[&str] = &["data", "date", "kada", "when"];
const TIME_LABELS: &[&str] = &["laikas", "time", "pradžia", "start"];

/// Regional listing pages. Their cards often label fields (`Vieta: ...`);
/// labelled values win, the positional layout fills whatever is left.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingParser;

impl ListingParser {
    pub fn new() -> Self {
        Self
    }
}

/// Splits `Label: value` when the label is one of `labels`
fn labelled<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim().to_lowercase();
    let value = value.trim();
    (labels.contains(&label.as_str()) && !value.is_empty()).then_some(value)
}

impl Parser for ListingParser {
    fn name(&self) -> &'static str {
        "listing"
    }

    fn parse(&self, raw_text: &str) -> ParseOutcome {
        let lines = strip_noise(split_lines(raw_text));

        let mut venue = None;
        let mut date = None;
        let mut time = None;
        let mut free = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Some(value) = labelled(line, VENUE_LABELS) {
                venue.get_or_insert_with(|| value.to_string());
            } else if let Some(value) = labelled(line, DATE_LABELS) {
                date.get_or_insert_with(|| value.to_string());
            } else if let Some(value) = labelled(line, TIME_LABELS) {
                time.get_or_insert_with(|| value.to_string());
            } else {
                free.push(line.clone());
            }
        }

        let layout = LineLayout::of(&free);
        let date_raw = date
            .or_else(|| layout.date.map(|i| free[i].clone()))
            .unwrap_or_default();
        let time_raw = time
            .and_then(|t| super::extract_time(&t))
            .unwrap_or_else(|| time_near((!date_raw.is_empty()).then_some(date_raw.as_str()), raw_text));
        let location = venue.unwrap_or_else(|| line_or(&free, layout.venue, UNKNOWN_LOCATION));

        ParseOutcome::from_event(ParsedEvent {
            title: line_or(&free, layout.title, UNKNOWN_TITLE),
            detected_city: detect_city(&location).or_else(|| detect_city(raw_text)),
            location,
            date_raw,
            time_raw,
            description: None,
        })
    }
}
