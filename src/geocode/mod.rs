//! Rate-limited geocoding of free-text venue strings.
//!
//! A query is normalized (newlines collapsed, venue aliases applied, city and
//! country appended), looked up in the [`GeocodeCache`], and only on a miss
//! sent through the ordered resolver chain. Every resolver call waits on the
//! shared [`MinIntervalLimiter`]; cache hits never do.

pub mod cache;
pub mod resolvers;

pub use cache::GeocodeCache;
pub use resolvers::{coordinates_from_maps_url, GeocodeResolver, MapsSearchResolver, NominatimResolver};

use metrics::counter;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{COUNTRY_QUALIFIER, DEFAULT_CITY_CENTER, FALLBACK_SCATTER_DEGREES};
use crate::metrics::{GEOCODE_CACHE_HITS_TOTAL, GEOCODE_FALLBACKS_TOTAL, GEOCODE_REQUESTS_TOTAL};
use crate::rate_limiter::MinIntervalLimiter;
use crate::types::Coordinates;

/// Venue names that geocode badly on their own, rewritten to a precise address
pub const VENUE_ALIASES: &[(&str, &str)] = &[
    ("compensa", "Ozo g. 18, Vilnius"),
    ("avia solutions group arena", "Ozo g. 14C, Vilnius"),
    ("siemens arena", "Ozo g. 14C, Vilnius"),
    ("žalgirio arena", "Karaliaus Mindaugo pr. 50, Kaunas"),
    ("loftas", "Švitrigailos g. 29, Vilnius"),
    ("kablys", "Kauno g. 5, Vilnius"),
    ("vilniaus kongresų rūmai", "Vilniaus g. 6, Vilnius"),
    ("lnkc", "Vilniaus g. 6, Vilnius"),
    ("tamsta", "Subačiaus g. 11A, Vilnius"),
    ("vasaros estrada", "Kalnų parkas, Vilnius"),
    ("švyturio arena", "Dubysos g. 10, Klaipėda"),
    ("kauno menų dvaras", "Jonavos g. 3, Kaunas"),
];

/// Approximate city centers for the fallback scatter
pub const CITY_CENTERS: &[(&str, (f64, f64))] = &[
    ("Vilnius", DEFAULT_CITY_CENTER),
    ("Kaunas", (54.8985, 23.9036)),
    ("Klaipėda", (55.7033, 21.1443)),
    ("Šiauliai", (55.9349, 23.3137)),
    ("Panevėžys", (55.7348, 24.3575)),
    ("Alytus", (54.3963, 24.0459)),
    ("Palanga", (55.9175, 21.0686)),
    ("Druskininkai", (54.0158, 23.9868)),
];

fn collapse_whitespace(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fully-qualified query used as the cache key
pub fn build_query(address: &str, city: Option<&str>) -> String {
    let cleaned = collapse_whitespace(&address.replace(['\n', '\r'], ", "))
        .replace(" ,", ",")
        .replace(",,", ",");
    let cleaned = cleaned.trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string();

    let lowered = cleaned.to_lowercase();
    let mut query = VENUE_ALIASES
        .iter()
        .find(|(alias, _)| lowered.contains(alias))
        .map(|(_, precise)| precise.to_string())
        .unwrap_or(cleaned);

    if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
        if !query.to_lowercase().contains(&city.to_lowercase()) {
            query = format!("{}, {}", query, city);
        }
    }
    if !query.to_lowercase().contains(&COUNTRY_QUALIFIER.to_lowercase()) {
        query = format!("{}, {}", query, COUNTRY_QUALIFIER);
    }
    query
}

/// Center of a known city, else the default center
pub fn city_center(city: Option<&str>) -> Coordinates {
    let (lat, lon) = city
        .and_then(|name| CITY_CENTERS.iter().find(|(c, _)| c.eq_ignore_ascii_case(name)))
        .map(|(_, center)| *center)
        .unwrap_or(DEFAULT_CITY_CENTER);
    Coordinates { lat, lon }
}

/// Uniform random point within `radius` degrees of `center`
pub fn scatter_around<R: Rng + ?Sized>(center: Coordinates, radius: f64, rng: &mut R) -> Coordinates {
    Coordinates {
        lat: center.lat + rng.gen_range(-radius..=radius),
        lon: center.lon + rng.gen_range(-radius..=radius),
    }
}

/// Placeable-but-approximate coordinates for an event that could not be geocoded
pub fn fallback_coordinates(city: Option<&str>) -> Coordinates {
    counter!(GEOCODE_FALLBACKS_TOTAL).increment(1);
    scatter_around(city_center(city), FALLBACK_SCATTER_DEGREES, &mut rand::thread_rng())
}

pub struct Geocoder {
    resolvers: Vec<Box<dyn GeocodeResolver>>,
    limiter: MinIntervalLimiter,
}

impl Geocoder {
    pub fn new(resolvers: Vec<Box<dyn GeocodeResolver>>, min_interval: Duration) -> Self {
        Self {
            resolvers,
            limiter: MinIntervalLimiter::new(min_interval),
        }
    }

    /// Nominatim first, then the map-search scrape
    pub fn with_default_chain(client: reqwest::Client, nominatim_url: &str, min_interval: Duration) -> Self {
        Self::new(
            vec![
                Box::new(NominatimResolver::new(client.clone(), nominatim_url)),
                Box::new(MapsSearchResolver::new(client, crate::constants::MAPS_SEARCH_URL)),
            ],
            min_interval,
        )
    }

    /// Resolves `address` in `city_context`; `None` once every resolver failed.
    pub async fn geocode(
        &self,
        cache: &mut GeocodeCache,
        address: &str,
        city_context: Option<&str>,
    ) -> Option<Coordinates> {
        let query = build_query(address, city_context);
        if let Some(hit) = cache.get(&query) {
            counter!(GEOCODE_CACHE_HITS_TOTAL).increment(1);
            debug!("Geocode cache hit: {}", query);
            return Some(hit);
        }

        for resolver in &self.resolvers {
            self.limiter.acquire().await;
            counter!(GEOCODE_REQUESTS_TOTAL, "resolver" => resolver.name()).increment(1);
            match resolver.resolve(&query).await {
                Ok(Some(coordinates)) => {
                    info!("Geocoded '{}' via {}: {:.5}, {:.5}", query, resolver.name(), coordinates.lat, coordinates.lon);
                    cache.insert(query, coordinates);
                    return Some(coordinates);
                }
                Ok(None) => debug!("{} found nothing for '{}'", resolver.name(), query),
                Err(e) => warn!("{} failed for '{}': {}", resolver.name(), query, e),
            }
        }
        warn!("All geocoders failed for '{}'", query);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_build_query_collapses_newlines_and_adds_context() {
        assert_eq!(
            build_query("Menų fabrikas\n  Tilto g. 8", Some("Vilnius")),
            "Menų fabrikas, Tilto g. 8, Vilnius, Lithuania"
        );
    }

    #[test]
    fn test_build_query_applies_first_alias() {
        assert_eq!(build_query("Compensa koncertų salė", None), "Ozo g. 18, Vilnius, Lithuania");
        // City already present in the alias address is not repeated
        assert_eq!(build_query("Loftas", Some("vilnius")), "Švitrigailos g. 29, Vilnius, Lithuania");
    }

    #[test]
    fn test_build_query_keeps_existing_country() {
        assert_eq!(build_query("Laisvės al. 1, Kaunas, Lithuania", Some("Kaunas")), "Laisvės al. 1, Kaunas, Lithuania");
    }

    #[test]
    fn test_scatter_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = city_center(Some("Kaunas"));
        for _ in 0..100 {
            let point = scatter_around(center, 0.02, &mut rng);
            assert!((point.lat - center.lat).abs() <= 0.02);
            assert!((point.lon - center.lon).abs() <= 0.02);
        }
    }

    #[test]
    fn test_unknown_city_uses_default_center() {
        let center = city_center(Some("Atlantis"));
        assert_eq!((center.lat, center.lon), DEFAULT_CITY_CENTER);
    }
}
