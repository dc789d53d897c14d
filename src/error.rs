use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Target page failed to load or its selector never appeared.
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Geocoding failed: {0}")]
    Geocode(String),

    #[error("API error: {message}")]
    Api { message: String },

    /// Failure before any target started; the mission is marked FAILED.
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl ScraperError {
    pub fn navigation(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ScraperError::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        ScraperError::Api {
            message: message.into(),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ScraperError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScraperError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
