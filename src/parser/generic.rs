use super::{parse_positional, Parser};
use crate::types::ParseOutcome;

/// Ticketing-site cards: a date line, a title and a venue in loosely fixed order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

impl GenericParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn parse(&self, raw_text: &str) -> ParseOutcome {
        ParseOutcome::from_event(parse_positional(raw_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};
    use crate::types::ParsedField;

    #[test]
    fn test_parse_date_first_card() {
        let outcome = GenericParser::new().parse("JAN 15\nConcert Name\nSome Club");
        let event = outcome.event().unwrap();
        assert_eq!(event.title, "Concert Name");
        assert_eq!(event.location, "Some Club");
        assert_eq!(event.date_raw, "JAN 15");
        assert_eq!(event.time_raw, "");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "Pirkti\nAndrius Mamontovas\nGegužės 3 d., 19:00\nŽalgirio arena, Kaunas";
        let parser = GenericParser::new();
        let first = parser.parse(text);
        let second = parser.parse(text);
        assert_eq!(first, second);

        let event = first.event().unwrap();
        assert_eq!(event.title, "Andrius Mamontovas");
        assert_eq!(event.date_raw, "Gegužės 3 d., 19:00");
        assert_eq!(event.time_raw, "19:00");
        assert_eq!(event.location, "Žalgirio arena, Kaunas");
        assert_eq!(event.detected_city.as_deref(), Some("Kaunas"));
        assert!(first.is_clean());
    }

    #[test]
    fn test_empty_text_defaults_to_sentinels() {
        match GenericParser::new().parse("   \n  ") {
            ParseOutcome::Defaulted { event, defaulted } => {
                assert_eq!(event.title, UNKNOWN_TITLE);
                assert_eq!(event.location, UNKNOWN_LOCATION);
                assert!(defaulted.contains(&ParsedField::Date));
            }
            other => panic!("expected defaults, got {:?}", other),
        }
    }

    #[test]
    fn test_twelve_hour_time_anywhere_in_card() {
        let outcome = GenericParser::new().parse("Feb 2\nJazz Night\nKablys\nDoors 7:30 PM");
        let event = outcome.event().unwrap();
        assert_eq!(event.time_raw, "19:30");
        assert_eq!(event.location, "Kablys");
    }
}
