use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};

/// A configured site the crawler visits on each run.
/// Owned by the external API; the pipeline only writes back the two stat fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub last_events_found: u32,
    #[serde(default)]
    pub last_scraped_at: Option<DateTime<Utc>>,
}

impl Target {
    /// Ad-hoc target without an API identity (URL override, hardcoded default)
    pub fn adhoc(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            city: None,
            selector: None,
            last_events_found: 0,
            last_scraped_at: None,
        }
    }
}

/// Stats written back to a target after it has been processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetStats {
    pub last_events_found: u32,
    pub last_scraped_at: DateTime<Utc>,
}

/// Unparsed text+link pair extracted from one matched DOM element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RawCandidate {
    pub text: String,
    pub link: String,
}

/// Structured candidate produced by a parser.
/// `title` and `location` are never empty; sentinels stand in for missing values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedEvent {
    pub title: String,
    pub location: String,
    pub date_raw: String,
    pub time_raw: String,
    pub detected_city: Option<String>,
    pub description: Option<String>,
}

impl ParsedEvent {
    pub fn has_title(&self) -> bool {
        self.title != UNKNOWN_TITLE
    }

    pub fn has_location(&self) -> bool {
        self.location != UNKNOWN_LOCATION
    }

    pub fn has_date(&self) -> bool {
        !self.date_raw.is_empty()
    }
}

/// Fields that can fall back to a default during parsing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParsedField {
    Title,
    Location,
    Date,
    Time,
}

/// Parser result distinguishing clean extraction from extraction with defaults
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Clean(ParsedEvent),
    Defaulted {
        event: ParsedEvent,
        defaulted: Vec<ParsedField>,
    },
    Skipped {
        reason: String,
    },
}

impl ParseOutcome {
    /// Builds the outcome from an event, recording which fields hold defaults
    pub fn from_event(event: ParsedEvent) -> Self {
        let mut defaulted = Vec::new();
        if !event.has_title() {
            defaulted.push(ParsedField::Title);
        }
        if !event.has_location() {
            defaulted.push(ParsedField::Location);
        }
        if !event.has_date() {
            defaulted.push(ParsedField::Date);
        }
        if event.time_raw.is_empty() {
            defaulted.push(ParsedField::Time);
        }
        if defaulted.is_empty() {
            ParseOutcome::Clean(event)
        } else {
            ParseOutcome::Defaulted { event, defaulted }
        }
    }

    pub fn event(&self) -> Option<&ParsedEvent> {
        match self {
            ParseOutcome::Clean(event) | ParseOutcome::Defaulted { event, .. } => Some(event),
            ParseOutcome::Skipped { .. } => None,
        }
    }

    pub fn into_event(self) -> Option<ParsedEvent> {
        match self {
            ParseOutcome::Clean(event) | ParseOutcome::Defaulted { event, .. } => Some(event),
            ParseOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ParseOutcome::Clean(_))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Coarse event category published as the `type` field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    Music,
    Theatre,
    Festival,
    Exhibition,
    Sport,
    Other,
}

/// Final record sent to the external API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishableEvent {
    pub title: String,
    pub venue: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub lat: f64,
    pub lng: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub link: String,
}

/// Server's verdict on an uploaded event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Created,
    Duplicate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissionStatus {
    Running,
    Success,
    Failed,
}

/// Run-level status record pushed to the external API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MissionLog {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: MissionStatus,
    pub events_found: u32,
    pub log_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcome_records_defaults() {
        let event = ParsedEvent {
            title: "Koncertas".to_string(),
            location: UNKNOWN_LOCATION.to_string(),
            date_raw: "Sausio 15".to_string(),
            time_raw: String::new(),
            detected_city: None,
            description: None,
        };
        match ParseOutcome::from_event(event) {
            ParseOutcome::Defaulted { defaulted, .. } => {
                assert_eq!(defaulted, vec![ParsedField::Location, ParsedField::Time]);
            }
            other => panic!("expected defaulted outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_mission_log_wire_format() {
        let log = MissionLog {
            id: Uuid::nil(),
            start_time: "2025-01-15T10:00:00Z".parse().unwrap(),
            end_time: None,
            status: MissionStatus::Running,
            events_found: 0,
            log_summary: String::new(),
        };
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["status"], "RUNNING");
        assert_eq!(value["eventsFound"], 0);
        assert!(value.get("startTime").is_some());
    }

    #[test]
    fn test_target_deserializes_with_missing_stats() {
        let target: Target = serde_json::from_str(
            r#"{"id":"t1","name":"Kablys","url":"https://kablys.lt/renginiai"}"#,
        )
        .unwrap();
        assert_eq!(target.id.as_deref(), Some("t1"));
        assert_eq!(target.last_events_found, 0);
        assert!(target.selector.is_none());
    }
}
