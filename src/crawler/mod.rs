//! Browser-driven candidate collection for one target at a time.

pub mod extract;
pub mod source;

pub use extract::{extract_candidates, extract_detail, merge_detail};
pub use source::SourceFamily;

use metrics::counter;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::app::ports::PagePort;
use crate::config::CrawlSettings;
use crate::constants::SOCIAL_OVERLAY_DISMISS_SELECTORS;
use crate::error::Result;
use crate::metrics::CANDIDATES_TOTAL;
use crate::parser::Parser;
use crate::types::{ParsedEvent, RawCandidate, Target};

/// Selector a target is crawled with: its own, else the family default
pub fn selector_for(target: &Target, family: SourceFamily) -> &str {
    target
        .selector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| family.default_selector())
}

pub struct TargetCrawler {
    settings: CrawlSettings,
}

impl TargetCrawler {
    pub fn new(settings: CrawlSettings) -> Self {
        Self { settings }
    }

    /// Loads the target page and returns every candidate element on it.
    #[instrument(skip(self, page, target), fields(target = %target.name, url = %target.url))]
    pub async fn crawl(&self, page: &mut dyn PagePort, target: &Target) -> Result<Vec<RawCandidate>> {
        let family = SourceFamily::detect(&target.url);
        let selector = selector_for(target, family);
        debug!("Crawling as {:?} with selector '{}'", family, selector);

        // An unreachable target counts as an empty one
        if let Err(e) = page.goto(&target.url, self.settings.navigation_timeout()).await {
            warn!("{}", e);
            return Ok(Vec::new());
        }

        if family == SourceFamily::Social {
            self.dismiss_overlays(page).await;
        }
        self.auto_scroll(page).await;
        sleep_ms(self.settings.settle_delay_ms).await;

        if let Err(e) = page.wait_for_selector(selector, self.settings.selector_timeout()).await {
            warn!("{}", e);
        }

        let html = page.content().await?;
        let base_url = page
            .current_url()
            .await
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| target.url.clone());

        let mut candidates = extract_candidates(&html, selector, &base_url)?;
        if candidates.is_empty() {
            if let Some(fallback) = family.fallback_selector().filter(|f| *f != selector) {
                info!("No matches for '{}', trying fallback '{}'", selector, fallback);
                candidates = extract_candidates(&html, fallback, &base_url)?;
            }
        }

        counter!(CANDIDATES_TOTAL, "family" => format!("{:?}", family)).increment(candidates.len() as u64);
        info!("Found {} candidates", candidates.len());
        Ok(candidates)
    }

    /// Opens a candidate's detail page and extracts what it can.
    /// A pacing delay follows whether or not the page loaded.
    #[instrument(skip(self, page, parser))]
    pub async fn deep_scrape(
        &self,
        page: &mut dyn PagePort,
        link: &str,
        parser: &dyn Parser,
    ) -> Result<Option<ParsedEvent>> {
        let result = self.load_detail(page, link, parser).await;
        self.pace().await;
        result
    }

    async fn load_detail(&self, page: &mut dyn PagePort, link: &str, parser: &dyn Parser) -> Result<Option<ParsedEvent>> {
        page.goto(link, self.settings.navigation_timeout()).await?;
        sleep_ms(self.settings.hydration_delay_ms).await;
        let html = page.content().await?;
        Ok(extract_detail(&html, parser))
    }

    async fn dismiss_overlays(&self, page: &mut dyn PagePort) {
        for selector in SOCIAL_OVERLAY_DISMISS_SELECTORS {
            match page.click(selector).await {
                Ok(true) => debug!("Dismissed overlay via '{}'", selector),
                Ok(false) => {}
                Err(e) => debug!("Overlay click on '{}' failed: {}", selector, e),
            }
        }
    }

    /// Scrolls until the bottom, the step limit or the time limit, whichever comes first
    async fn auto_scroll(&self, page: &mut dyn PagePort) {
        let started = Instant::now();
        let limit = Duration::from_millis(self.settings.max_scroll_time_ms);
        for step in 0..self.settings.max_scroll_steps {
            if started.elapsed() >= limit {
                debug!("Scroll time limit reached after {} steps", step);
                break;
            }
            match page.scroll_by(self.settings.scroll_step_px).await {
                Ok(true) => {
                    debug!("Reached page bottom after {} steps", step + 1);
                    break;
                }
                Ok(false) => sleep_ms(self.settings.scroll_pause_ms).await,
                Err(e) => {
                    debug!("Scrolling stopped: {}", e);
                    break;
                }
            }
        }
    }

    async fn pace(&self) {
        let (min, max) = (self.settings.pacing_min_ms, self.settings.pacing_max_ms);
        let delay = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        sleep_ms(delay).await;
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
