use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::app::ports::ScoutApiPort;
use crate::error::{Result, ScraperError};
use crate::types::{MissionLog, PostOutcome, PublishableEvent, Target, TargetStats};

/// reqwest client for the external events API.
pub struct HttpScoutApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PostEventResponse {
    #[serde(default)]
    duplicate: bool,
}

impl HttpScoutApi {
    pub fn new(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn ensure_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ScraperError::api(format!("{} failed with status {}: {}", what, status, body)))
    }
}

#[async_trait]
impl ScoutApiPort for HttpScoutApi {
    #[instrument(skip(self))]
    async fn get_targets(&self) -> Result<Vec<Target>> {
        let response = self.request(Method::GET, "/targets").send().await?;
        let response = Self::ensure_success(response, "GET /targets").await?;
        let targets: Vec<Target> = response.json().await?;
        debug!("Fetched {} targets", targets.len());
        Ok(targets)
    }

    #[instrument(skip(self, stats))]
    async fn update_target_stats(&self, target_id: &str, stats: &TargetStats) -> Result<()> {
        let path = format!("/targets/{}", target_id);
        let response = self.request(Method::PATCH, &path).json(stats).send().await?;
        Self::ensure_success(response, &format!("PATCH {}", path)).await?;
        Ok(())
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn post_event(&self, event: &PublishableEvent) -> Result<PostOutcome> {
        let response = self.request(Method::POST, "/events").json(event).send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(PostOutcome::Duplicate);
        }
        let response = Self::ensure_success(response, "POST /events").await?;
        let text = response.text().await?;
        let body: PostEventResponse = serde_json::from_str(&text).unwrap_or_default();
        Ok(if body.duplicate {
            PostOutcome::Duplicate
        } else {
            PostOutcome::Created
        })
    }

    #[instrument(skip(self, log), fields(run_id = %log.id, status = ?log.status))]
    async fn post_log(&self, log: &MissionLog) -> Result<()> {
        let response = self.request(Method::POST, "/scout/log").json(log).send().await?;
        Self::ensure_success(response, "POST /scout/log").await?;
        Ok(())
    }
}
