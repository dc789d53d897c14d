use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, ScraperError};
use crate::types::Coordinates;

/// One strategy in the geocoding fallback chain.
#[async_trait]
pub trait GeocodeResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider answered but found nothing.
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim search; first result wins.
pub struct NominatimResolver {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimResolver {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeocodeResolver for NominatimResolver {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScraperError::Geocode(format!(
                "Nominatim responded with status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let coordinates = places.first().and_then(|place| {
            Some(Coordinates {
                lat: place.lat.parse().ok()?,
                lon: place.lon.parse().ok()?,
            })
        });
        debug!("Nominatim result for '{}': {:?}", query, coordinates);
        Ok(coordinates)
    }
}

static AT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(-?\d{1,3}\.\d+),(-?\d{1,3}\.\d+)").expect("at pattern is valid"));
static PLACE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!3d(-?\d{1,3}\.\d+)!4d(-?\d{1,3}\.\d+)").expect("place pattern is valid"));
static CENTER_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"center=(-?\d{1,3}\.\d+)(?:%2C|,)(-?\d{1,3}\.\d+)").expect("center pattern is valid")
});

/// Coordinates embedded in a map-search URL (`/@lat,lon,zoom`, `!3dlat!4dlon`, `center=lat%2Clon`)
pub fn coordinates_from_maps_url(text: &str) -> Option<Coordinates> {
    [&*PLACE_PAIR, &*AT_PAIR, &*CENTER_PAIR].iter().find_map(|re| {
        re.captures_iter(text).find_map(|caps| {
            let lat: f64 = caps[1].parse().ok()?;
            let lon: f64 = caps[2].parse().ok()?;
            let plausible = (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon)
                && !(lat == 0.0 && lon == 0.0);
            plausible.then_some(Coordinates { lat, lon })
        })
    })
}

/// Fallback: load a map search page and read the coordinates it redirects to.
pub struct MapsSearchResolver {
    client: reqwest::Client,
    search_url: String,
}

impl MapsSearchResolver {
    pub fn new(client: reqwest::Client, search_url: &str) -> Self {
        Self {
            client,
            search_url: search_url.to_string(),
        }
    }

    fn search_url_for(&self, query: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.search_url)
            .map_err(|e| ScraperError::Config(format!("Invalid maps search URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ScraperError::Config("Maps search URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(query);
        Ok(url)
    }
}

#[async_trait]
impl GeocodeResolver for MapsSearchResolver {
    fn name(&self) -> &'static str {
        "maps-search"
    }

    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = self.search_url_for(query)?;
        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        if let Some(coordinates) = coordinates_from_maps_url(&final_url) {
            return Ok(Some(coordinates));
        }
        let body = response.text().await?;
        Ok(coordinates_from_maps_url(&body))
    }
}
