/// Shared constants used across the Scout pipeline.
/// Selector defaults, sentinels and timing values live here so crawler,
/// parsers and the mission orchestrator agree on them.

// Sentinels for fields that could not be extracted
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Hour used when a date has no recoverable time of day
pub const DEFAULT_EVENT_HOUR: u32 = 19;

/// Events without an explicit end run for this many hours
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 3;

// Default selectors per source family
pub const TICKETING_SELECTOR: &str = ".event-card";
pub const TICKETING_FALLBACK_SELECTOR: &str = ".event-list-item";
pub const LISTING_SELECTOR: &str = "a[href*=\"/renginiai/\"]";
pub const GENERIC_SELECTOR: &str = "a[href*=\"event\"]";
pub const GENERIC_FALLBACK_SELECTOR: &str = "a[href*=\"renginys\"]";
pub const SOCIAL_POST_SELECTOR: &str = "div[role=\"article\"]";

/// Buttons that close login walls and cookie overlays on social feeds
pub const SOCIAL_OVERLAY_DISMISS_SELECTORS: &[&str] = &[
    "div[aria-label=\"Close\"]",
    "div[aria-label=\"Uždaryti\"]",
    "[data-cookiebanner=\"accept_only_essential_button\"]",
    "button[title=\"Decline optional cookies\"]",
];

// Host fragments identifying source families
pub const SOCIAL_HOSTS: &[&str] = &["facebook.com", "instagram.com"];
pub const TICKETING_HOSTS: &[&str] = &["bilietai.lt", "tiketa.lt", "kakava.lt", "piletilevi.lt"];
pub const LISTING_HOSTS: &[&str] = &["vilnius-events.lt", "kaunasevents.lt", "renginiai.kasvyksta.lt"];
pub const LISTING_PATH_HINTS: &[&str] = &["renginiai", "/events"];

// Geocoding
pub const COUNTRY_QUALIFIER: &str = "Lithuania";
pub const DEFAULT_CITY_CENTER: (f64, f64) = (54.6872, 25.2797);
pub const FALLBACK_SCATTER_DEGREES: f64 = 0.02;
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
pub const GEOCODE_USER_AGENT: &str =
    "EventScout/0.1 (event discovery crawler; contact: scout@renginiai.example)";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Target used when neither a URL override nor configured targets exist
pub const DEFAULT_TARGET_NAME: &str = "Bilietai.lt koncertai";
pub const DEFAULT_TARGET_URL: &str = "https://www.bilietai.lt/lit/renginiai/koncertai/";
