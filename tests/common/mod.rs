#![allow(dead_code)]

use async_trait::async_trait;
use chrono::TimeZone;
use chrono_tz::Europe::Vilnius;
use chrono_tz::Tz;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use event_scout::app::ports::{BrowserLauncher, BrowserPort, PagePort};
use event_scout::config::{CrawlSettings, ScoutConfig};
use event_scout::error::{Result, ScraperError};
use event_scout::geocode::{GeocodeResolver, Geocoder};
use event_scout::types::{Coordinates, Target};

pub const KABLYS: Coordinates = Coordinates { lat: 54.6915, lon: 25.2891 };

/// 2025-01-10 12:00 in Vilnius
pub fn reference_time() -> chrono::DateTime<Tz> {
    Vilnius.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
}

pub fn card(class: &str, date: &str, title: &str, venue: &str, href: &str) -> String {
    format!(
        r#"<div class="{class}"><a href="{href}"><span>{date}</span><h3>{title}</h3><p>{venue}</p></a></div>"#
    )
}

pub fn page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.join("\n"))
}

pub fn target(id: &str, name: &str, url: &str) -> Target {
    let mut target = Target::adhoc(name, url);
    target.id = Some(id.to_string());
    target
}

pub fn test_config(cache_dir: &Path) -> ScoutConfig {
    ScoutConfig {
        geocode_cache_path: cache_dir.join("geocode_cache.json"),
        batch_size: 2,
        geocode_delay_ms: 0,
        crawl: CrawlSettings {
            selector_timeout_ms: 0,
            ..CrawlSettings::immediate()
        },
        ..ScoutConfig::default()
    }
}

/// Resolver answering every query with the same point, counting calls
#[derive(Clone)]
pub struct CountingResolver {
    pub calls: Arc<AtomicUsize>,
    answer: Option<Coordinates>,
    fail: bool,
}

impl CountingResolver {
    pub fn answering(answer: Coordinates) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: Some(answer),
            fail: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: None,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: None,
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeResolver for CountingResolver {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn resolve(&self, _query: &str) -> Result<Option<Coordinates>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScraperError::Geocode("provider unavailable".to_string()));
        }
        Ok(self.answer)
    }
}

pub fn fixed_geocoder() -> Geocoder {
    Geocoder::new(vec![Box::new(CountingResolver::answering(KABLYS))], Duration::ZERO)
}

/// Browser serving canned HTML per URL
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    pages: Arc<HashMap<String, String>>,
    unreachable: Arc<HashSet<String>>,
    fail_launch: bool,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLauncher {
    pub fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().map(|(url, html)| (url.to_string(), html)).collect()),
            ..Self::default()
        }
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        let mut unreachable = (*self.unreachable).clone();
        unreachable.insert(url.to_string());
        self.unreachable = Arc::new(unreachable);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserPort>> {
        if self.fail_launch {
            return Err(ScraperError::Browser("Could not find Chrome executable".to_string()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl BrowserPort for ScriptedLauncher {
    async fn new_page(&self) -> Result<Box<dyn PagePort>> {
        Ok(Box::new(ScriptedPage {
            browser: self.clone(),
            url: "about:blank".to_string(),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

pub struct ScriptedPage {
    browser: ScriptedLauncher,
    url: String,
}

impl ScriptedPage {
    fn html(&self) -> String {
        self.browser.pages.get(&self.url).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl PagePort for ScriptedPage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.browser.visited.lock().unwrap().push(url.to_string());
        if self.browser.unreachable.contains(url) {
            return Err(ScraperError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        let parsed = Selector::parse(selector).map_err(|e| ScraperError::Config(e.to_string()))?;
        if Html::parse_document(&self.html()).select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(ScraperError::navigation(self.url.clone(), format!("selector '{}' not found", selector)))
        }
    }

    async fn click(&mut self, _selector: &str) -> Result<bool> {
        Ok(false)
    }

    async fn scroll_by(&mut self, _pixels: u32) -> Result<bool> {
        Ok(true)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.html())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Page that records every interaction and never reaches the bottom
pub struct RecordingPage {
    html: String,
    url: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingPage {
    pub fn new(html: String) -> Self {
        Self {
            html,
            url: "about:blank".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scrolls(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("scroll")).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PagePort for RecordingPage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("goto {}", url));
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("wait {}", selector));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<bool> {
        self.record(format!("click {}", selector));
        Ok(true)
    }

    async fn scroll_by(&mut self, pixels: u32) -> Result<bool> {
        self.record(format!("scroll {}", pixels));
        Ok(false)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
