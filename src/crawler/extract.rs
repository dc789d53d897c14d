//! Pure HTML extraction over rendered page content.

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;

use crate::constants::{UNKNOWN_LOCATION, UNKNOWN_TITLE};
use crate::error::{Result, ScraperError};
use crate::parser::{detect_city, extract_time, Parser};
use crate::types::{ParsedEvent, RawCandidate};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("json-ld selector is valid")
});
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector is valid"));
static DOM_LOCATION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".location, .venue, [itemprop=\"location\"]").expect("location selector is valid")
});
static DOM_DATE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".date, [itemprop=\"startDate\"]").expect("date selector is valid")
});
static DOM_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time, .time").expect("time selector is valid"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("meta selector is valid")
});
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("body selector is valid"));

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScraperError::Config(format!("Invalid selector '{}': {}", selector, e)))
}

/// Text runs of an element, trimmed, one per line
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn element_href<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    if let Some(href) = element.value().attr("href") {
        return Some(href);
    }
    if let Some(anchor) = element.select(&ANCHOR).next() {
        return anchor.value().attr("href");
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// One candidate per element matching `selector`, deduplicated.
pub fn extract_candidates(html: &str, selector: &str, base_url: &str) -> Result<Vec<RawCandidate>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for element in document.select(&selector) {
        let text = element_text(element);
        if text.is_empty() {
            continue;
        }
        let link = element_href(element)
            .map(|href| resolve_link(base.as_ref(), href.trim()))
            .unwrap_or_default();
        let candidate = RawCandidate { text, link };
        if seen.insert(candidate.clone()) {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

/// Partially known detail-page fields; `None` means not found yet.
#[derive(Debug, Default, Clone, PartialEq)]
struct DetailFields {
    title: Option<String>,
    location: Option<String>,
    date_raw: Option<String>,
    time_raw: Option<String>,
    city: Option<String>,
    description: Option<String>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl DetailFields {
    fn from_event(event: ParsedEvent) -> Self {
        let (has_title, has_location) = (event.has_title(), event.has_location());
        Self {
            title: has_title.then_some(event.title),
            location: has_location.then_some(event.location),
            date_raw: non_empty(event.date_raw),
            time_raw: non_empty(event.time_raw),
            city: event.detected_city,
            description: event.description,
        }
    }

    fn fill_from(&mut self, other: DetailFields) {
        self.title = self.title.take().or(other.title);
        self.location = self.location.take().or(other.location);
        if self.date_raw.is_none() {
            self.date_raw = other.date_raw;
            self.time_raw = self.time_raw.take().or(other.time_raw);
        } else if self.time_raw.is_none() {
            self.time_raw = other.time_raw;
        }
        self.city = self.city.take().or(other.city);
        self.description = self.description.take().or(other.description);
    }

    fn is_complete(&self) -> bool {
        self.title.is_some() && self.date_raw.is_some() && self.location.is_some()
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.date_raw.is_none() && self.location.is_none()
    }

    fn into_event(self) -> ParsedEvent {
        ParsedEvent {
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            location: self.location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            date_raw: self.date_raw.unwrap_or_default(),
            time_raw: self.time_raw.unwrap_or_default(),
            detected_city: self.city,
            description: self.description,
        }
    }
}

fn json_ld_objects(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| json_ld_objects(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                json_ld_objects(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

fn json_str(value: &Value) -> Option<String> {
    value.as_str().and_then(non_empty)
}

/// `location` is either a plain string or a Place with a name and address
fn json_ld_location(location: &Value) -> (Option<String>, Option<String>) {
    if let Some(text) = json_str(location) {
        return (Some(text), None);
    }
    let name = location.get("name").and_then(json_str);
    let address = location.get("address");
    let street = address.and_then(|a| json_str(a).or_else(|| a.get("streetAddress").and_then(json_str)));
    let locality = address.and_then(|a| a.get("addressLocality")).and_then(json_str);

    let parts: Vec<String> = [name, street, locality.clone()].into_iter().flatten().collect();
    let venue = (!parts.is_empty()).then(|| parts.join(", "));
    (venue, locality)
}

fn from_json_ld(document: &Html) -> Option<DetailFields> {
    let mut objects = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
            json_ld_objects(value, &mut objects);
        }
    }

    let event = objects.into_iter().find(|o| o.get("startDate").and_then(json_str).is_some())?;
    let (location, locality) = event.get("location").map(json_ld_location).unwrap_or_default();
    let city = locality
        .as_deref()
        .and_then(detect_city)
        .or_else(|| location.as_deref().and_then(detect_city));

    Some(DetailFields {
        title: event.get("name").and_then(json_str),
        location,
        date_raw: event.get("startDate").and_then(json_str),
        time_raw: None,
        city,
        description: event.get("description").and_then(json_str),
    })
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).map(element_text).find_map(|t| non_empty(t.replace('\n', " ")))
}

/// `HH:MM` from a `datetime` attribute, which may be a bare clock or a full ISO instant
fn clock_from_datetime(value: &str) -> Option<String> {
    let clock = value.split_once('T').map_or(value, |(_, clock)| clock);
    extract_time(clock)
}

fn from_dom(document: &Html) -> DetailFields {
    let location = first_text(document, &DOM_LOCATION);
    // A machine-readable `datetime`/`content` attribute beats the visible text
    let date_raw = document.select(&DOM_DATE).find_map(|e| {
        e.value()
            .attr("content")
            .or_else(|| e.value().attr("datetime"))
            .and_then(non_empty)
            .or_else(|| non_empty(element_text(e).replace('\n', " ")))
    });
    let time_raw = document.select(&DOM_TIME).find_map(|e| {
        e.value()
            .attr("datetime")
            .and_then(clock_from_datetime)
            .or_else(|| extract_time(&element_text(e)))
    });

    DetailFields {
        title: first_text(document, &HEADING),
        city: location.as_deref().and_then(detect_city),
        location,
        date_raw,
        time_raw,
        description: None,
    }
}

fn from_meta(document: &Html, parser: &dyn Parser) -> Option<DetailFields> {
    let content = document
        .select(&META_DESCRIPTION)
        .find_map(|m| m.value().attr("content").and_then(non_empty))?;
    let mut fields = DetailFields::from_event(parser.parse(&content).into_event()?);
    fields.description = fields.description.or(Some(content));
    Some(fields)
}

fn from_body(document: &Html, parser: &dyn Parser) -> Option<DetailFields> {
    let body = document.select(&BODY).next().map(element_text)?;
    parser.parse(&body).into_event().map(DetailFields::from_event)
}

/// Event details from a detail page.
///
/// JSON-LD with a `startDate` is authoritative. Otherwise DOM selectors, the
/// meta description and finally the body text are consulted in order, each
/// only filling fields the earlier sources left empty.
pub fn extract_detail(html: &str, parser: &dyn Parser) -> Option<ParsedEvent> {
    let document = Html::parse_document(html);

    let mut fields = DetailFields::default();
    if let Some(json_ld) = from_json_ld(&document) {
        fields = json_ld;
        if fields.title.is_some() {
            return Some(fields.into_event());
        }
    }

    fields.fill_from(from_dom(&document));
    if !fields.is_complete() {
        if let Some(meta) = from_meta(&document, parser) {
            fields.fill_from(meta);
        }
    }
    if !fields.is_complete() {
        if let Some(body) = from_body(&document, parser) {
            fields.fill_from(body);
        }
    }

    (!fields.is_empty()).then(|| fields.into_event())
}

/// Overlays the detail-page event on the list-card event
pub fn merge_detail(card: ParsedEvent, detail: ParsedEvent) -> ParsedEvent {
    let mut merged = DetailFields::from_event(detail);
    merged.fill_from(DetailFields::from_event(card));
    merged.into_event()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GenericParser;

    const LIST_PAGE: &str = r#"<html><body>
        <div class="event-card"><a href="/renginys/1">
            <span>Sausio 15</span><h3>Jazz Night</h3><p>Kablys</p></a></div>
        <div class="event-card"><span>Vasario 2</span><h3>Rock Show</h3>
            <a href="https://tickets.example/rock">Pirkti</a></div>
        <div class="event-card">   </div>
        <div class="event-card"><a href="/renginys/1">
            <span>Sausio 15</span><h3>Jazz Night</h3><p>Kablys</p></a></div>
    </body></html>"#;

    #[test]
    fn test_candidates_text_links_and_dedup() {
        let candidates = extract_candidates(LIST_PAGE, ".event-card", "https://bilietai.lt/lit/renginiai/").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "Sausio 15\nJazz Night\nKablys");
        assert_eq!(candidates[0].link, "https://bilietai.lt/renginys/1");
        assert_eq!(candidates[1].link, "https://tickets.example/rock");
    }

    #[test]
    fn test_candidate_link_from_ancestor_anchor() {
        let html = r#"<a href="event/9"><div class="card">Kovo 3<br>Opera</div></a>"#;
        let candidates = extract_candidates(html, ".card", "https://loftas.lt/").unwrap();
        assert_eq!(candidates[0].link, "https://loftas.lt/event/9");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(extract_candidates(LIST_PAGE, "div[[", "https://x.lt").is_err());
    }

    #[test]
    fn test_json_ld_wins_over_dom() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"WebPage","name":"Page"},
              {"@type":"MusicEvent","name":"Andrius Mamontovas","startDate":"2025-03-14T19:00:00+02:00",
               "location":{"@type":"Place","name":"Žalgirio arena","address":{"addressLocality":"Kaunas"}},
               "description":"Koncertas"}]}
        </script></head><body><h1>Wrong title</h1><div class="location">Wrong venue</div></body></html>"#;

        let detail = extract_detail(html, &GenericParser::new()).unwrap();
        assert_eq!(detail.title, "Andrius Mamontovas");
        assert_eq!(detail.location, "Žalgirio arena, Kaunas");
        assert_eq!(detail.date_raw, "2025-03-14T19:00:00+02:00");
        assert_eq!(detail.detected_city.as_deref(), Some("Kaunas"));
        assert_eq!(detail.description.as_deref(), Some("Koncertas"));
    }

    #[test]
    fn test_dom_then_body_fill_gaps() {
        let html = r#"<html><body>
            <h1>Teatro premjera</h1>
            <div class="date">Balandžio 5</div>
            <p>Pradžia 18:30</p>
            <p>Menų fabrikas Loftas</p>
        </body></html>"#;

        let detail = extract_detail(html, &GenericParser::new()).unwrap();
        assert_eq!(detail.title, "Teatro premjera");
        assert_eq!(detail.date_raw, "Balandžio 5");
        assert_eq!(detail.time_raw, "18:30");
        assert!(detail.has_location());
    }

    #[test]
    fn test_time_element_datetime_keeps_clock() {
        let html = r#"<html><body>
            <h1>Džiazo vakaras</h1>
            <div class="date">Balandžio 5</div>
            <time datetime="2025-04-05T18:30">vakare</time>
            <div class="venue">Kablys</div>
        </body></html>"#;

        let detail = extract_detail(html, &GenericParser::new()).unwrap();
        assert_eq!(detail.date_raw, "Balandžio 5");
        assert_eq!(detail.time_raw, "18:30");
        assert_eq!(clock_from_datetime("20:15").as_deref(), Some("20:15"));
        assert_eq!(clock_from_datetime("2025-04-05"), None);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(extract_detail("<html><body></body></html>", &GenericParser::new()).is_none());
    }

    #[test]
    fn test_merge_prefers_detail_and_keeps_card_gaps() {
        let card = ParsedEvent {
            title: "Jazz".to_string(),
            location: "Kablys".to_string(),
            date_raw: "Sausio 15".to_string(),
            time_raw: "20:00".to_string(),
            detected_city: Some("Vilnius".to_string()),
            description: None,
        };
        let detail = ParsedEvent {
            title: "Jazz Night Live".to_string(),
            location: UNKNOWN_LOCATION.to_string(),
            date_raw: String::new(),
            time_raw: String::new(),
            detected_city: None,
            description: Some("Trio".to_string()),
        };

        let merged = merge_detail(card, detail);
        assert_eq!(merged.title, "Jazz Night Live");
        assert_eq!(merged.location, "Kablys");
        assert_eq!(merged.date_raw, "Sausio 15");
        assert_eq!(merged.time_raw, "20:00");
        assert_eq!(merged.description.as_deref(), Some("Trio"));
    }
}
