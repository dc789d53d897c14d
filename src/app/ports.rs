use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::types::{MissionLog, PostOutcome, PublishableEvent, Target, TargetStats};

// Browser-side ports

/// Starts the single browser instance a mission reuses across targets.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserPort>>;
}

#[async_trait]
pub trait BrowserPort: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn PagePort>>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// One browser tab. Navigation is strictly sequential on a page.
#[async_trait]
pub trait PagePort: Send {
    /// Navigates and waits for the load to finish, bounded by `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Waits until `selector` matches at least one element.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Clicks the first element matching `selector`; `Ok(false)` if none exists.
    async fn click(&mut self, selector: &str) -> Result<bool>;

    /// Scrolls down by `pixels`; returns true once the bottom of the page is reached.
    async fn scroll_by(&mut self, pixels: u32) -> Result<bool>;

    /// Fully rendered HTML of the current document.
    async fn content(&mut self) -> Result<String>;

    async fn current_url(&mut self) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}

// External API port

/// The storage/API collaborator that owns targets, events and mission logs.
#[async_trait]
pub trait ScoutApiPort: Send + Sync {
    async fn get_targets(&self) -> Result<Vec<Target>>;

    async fn update_target_stats(&self, target_id: &str, stats: &TargetStats) -> Result<()>;

    /// Server-side dedup by link or by title + start time.
    async fn post_event(&self, event: &PublishableEvent) -> Result<PostOutcome>;

    async fn post_log(&self, log: &MissionLog) -> Result<()>;
}
