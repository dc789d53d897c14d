//! One scouting run: targets in, published events and a mission log out.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Europe::Vilnius;
use chrono_tz::Tz;
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::{BrowserLauncher, PagePort, ScoutApiPort};
use crate::config::ScoutConfig;
use crate::constants::{DEFAULT_EVENT_DURATION_HOURS, DEFAULT_TARGET_NAME, DEFAULT_TARGET_URL};
use crate::crawler::{merge_detail, SourceFamily, TargetCrawler};
use crate::error::{Result, ScraperError};
use crate::geocode::{city_center, fallback_coordinates, GeocodeCache, Geocoder};
use crate::metrics::{
    EVENTS_DUPLICATE_TOTAL, EVENTS_UPLOADED_TOTAL, PARSE_SKIPPED_TOTAL, TARGETS_TOTAL, TARGET_DURATION_SECONDS,
    TARGET_FAILURES_TOTAL, UPLOAD_FAILURES_TOTAL,
};
use crate::normalize::{classify_event_kind, normalize_date_at};
use crate::types::{
    Coordinates, MissionLog, MissionStatus, ParsedEvent, PostOutcome, PublishableEvent, Target, TargetStats,
};

#[derive(Debug, Clone, Default)]
pub struct MissionOptions {
    /// Stop after the first parsed event; nothing is written anywhere
    pub dry_run: bool,
    /// Crawl only this URL instead of the configured targets
    pub url_override: Option<String>,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub run_id: Uuid,
    pub status: MissionStatus,
    pub targets_processed: usize,
    pub candidates_seen: usize,
    pub events_parsed: usize,
    pub events_uploaded: usize,
    pub duplicates: usize,
    pub upload_failures: usize,
    pub errors: Vec<String>,
    pub dry_run_preview: Option<PublishableEvent>,
}

impl MissionReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            status: MissionStatus::Running,
            targets_processed: 0,
            candidates_seen: 0,
            events_parsed: 0,
            events_uploaded: 0,
            duplicates: 0,
            upload_failures: 0,
            errors: Vec::new(),
            dry_run_preview: None,
        }
    }

    /// Events the API holds after this run: newly created plus recognized duplicates
    pub fn events_found(&self) -> u32 {
        (self.events_uploaded + self.duplicates) as u32
    }
}

/// Per-target counters
#[derive(Debug, Default)]
struct TargetTally {
    candidates: usize,
    events: usize,
    uploaded: usize,
    duplicates: usize,
    upload_failures: usize,
    preview: Option<PublishableEvent>,
}

/// `endTime` is always start plus the default duration
pub fn build_publishable(event: &ParsedEvent, start: DateTime<Tz>, coordinates: Coordinates, link: &str) -> PublishableEvent {
    let start_time = start.with_timezone(&Utc);
    let description = event
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("{} | {}", event.title, event.location));

    PublishableEvent {
        title: event.title.clone(),
        venue: event.location.clone(),
        kind: classify_event_kind(&event.title, event.description.as_deref()),
        description,
        lat: coordinates.lat,
        lng: coordinates.lon,
        start_time,
        end_time: start_time + Duration::hours(DEFAULT_EVENT_DURATION_HOURS),
        link: link.to_string(),
    }
}

pub struct Mission {
    config: ScoutConfig,
    api: Arc<dyn ScoutApiPort>,
    geocoder: Geocoder,
    crawler: TargetCrawler,
    options: MissionOptions,
    reference_time: Option<DateTime<Tz>>,
}

impl Mission {
    pub fn new(config: ScoutConfig, api: Arc<dyn ScoutApiPort>, geocoder: Geocoder, options: MissionOptions) -> Self {
        let crawler = TargetCrawler::new(config.crawl.clone());
        Self {
            config,
            api,
            geocoder,
            crawler,
            options,
            reference_time: None,
        }
    }

    /// Pins "now" for date normalization
    pub fn with_reference_time(mut self, now: DateTime<Tz>) -> Self {
        self.reference_time = Some(now);
        self
    }

    fn now(&self) -> DateTime<Tz> {
        self.reference_time
            .unwrap_or_else(|| Utc::now().with_timezone(&Vilnius))
    }

    /// Override URL, else the API's targets, else the built-in default
    async fn resolve_targets(&self) -> Vec<Target> {
        if let Some(url) = &self.options.url_override {
            info!("Using URL override: {}", url);
            return vec![Target::adhoc(url.clone(), url.clone())];
        }
        match self.api.get_targets().await {
            Ok(targets) if !targets.is_empty() => targets,
            Ok(_) => {
                info!("No targets configured, using default target");
                vec![Target::adhoc(DEFAULT_TARGET_NAME, DEFAULT_TARGET_URL)]
            }
            Err(e) => {
                warn!("Failed to fetch targets ({}), using default target", e);
                vec![Target::adhoc(DEFAULT_TARGET_NAME, DEFAULT_TARGET_URL)]
            }
        }
    }

    async fn push_log(&self, log: &MissionLog) {
        if self.options.dry_run {
            return;
        }
        if let Err(e) = self.api.post_log(log).await {
            warn!("Failed to push mission log ({:?}): {}", log.status, e);
        }
    }

    /// Runs every target once. Only a failure before the first target is fatal.
    #[instrument(skip(self, launcher), fields(dry_run = self.options.dry_run))]
    pub async fn run(&self, launcher: &dyn BrowserLauncher) -> Result<MissionReport> {
        let run_id = Uuid::new_v4();
        let mut report = MissionReport::new(run_id);
        info!("🚀 Starting mission {}", run_id);

        let targets = self.resolve_targets().await;
        let mut cache = GeocodeCache::open(&self.config.geocode_cache_path);
        let mut log = MissionLog {
            id: run_id,
            start_time: Utc::now(),
            end_time: None,
            status: MissionStatus::Running,
            events_found: 0,
            log_summary: format!("Mission started with {} targets", targets.len()),
        };
        self.push_log(&log).await;

        let browser = match launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                error!("Browser launch failed: {}", e);
                log.status = MissionStatus::Failed;
                log.end_time = Some(Utc::now());
                log.log_summary = format!("Browser launch failed: {}", e);
                self.push_log(&log).await;
                if let Err(e) = cache.close() {
                    warn!("Failed to persist geocode cache: {}", e);
                }
                return Err(ScraperError::Fatal(format!("Browser launch failed: {}", e)));
            }
        };

        let mut summary = Vec::new();
        let mut stopped = false;
        for target in &targets {
            counter!(TARGETS_TOTAL).increment(1);
            let started = Instant::now();

            let result = match browser.new_page().await {
                Ok(mut page) => {
                    let result = self.process_target(page.as_mut(), target, &mut cache).await;
                    if let Err(e) = page.close().await {
                        debug!("Page close failed: {}", e);
                    }
                    result
                }
                Err(e) => Err(e),
            };
            histogram!(TARGET_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
            report.targets_processed += 1;

            match result {
                Ok(tally) => {
                    report.candidates_seen += tally.candidates;
                    report.events_parsed += tally.events;
                    report.events_uploaded += tally.uploaded;
                    report.duplicates += tally.duplicates;
                    report.upload_failures += tally.upload_failures;
                    summary.push(format!(
                        "{}: {} candidates, {} events, {} uploaded, {} duplicates",
                        target.name, tally.candidates, tally.events, tally.uploaded, tally.duplicates
                    ));
                    if let Some(preview) = tally.preview {
                        match serde_json::to_string_pretty(&preview) {
                            Ok(json) => info!("Dry run preview: {}", json),
                            Err(e) => warn!("Could not render dry run preview: {}", e),
                        }
                        report.dry_run_preview = Some(preview);
                        stopped = true;
                    } else if !self.options.dry_run {
                        self.write_stats(target, tally.events as u32).await;
                    }
                }
                Err(e) => {
                    counter!(TARGET_FAILURES_TOTAL).increment(1);
                    error!("Target '{}' failed: {}", target.name, e);
                    report.errors.push(format!("{}: {}", target.name, e));
                    summary.push(format!("{}: error: {}", target.name, e));
                }
            }

            if stopped {
                info!("Dry run finished after first parsed event");
                break;
            }

            log.events_found = report.events_found();
            log.log_summary = summary.join("\n");
            self.push_log(&log).await;
            if !self.options.dry_run {
                if let Err(e) = cache.checkpoint() {
                    warn!("Geocode cache checkpoint failed: {}", e);
                }
            }
        }

        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if !self.options.dry_run {
            if let Err(e) = cache.close() {
                warn!("Failed to persist geocode cache: {}", e);
            }
        }

        report.status = MissionStatus::Success;
        log.status = MissionStatus::Success;
        log.end_time = Some(Utc::now());
        log.events_found = report.events_found();
        log.log_summary = summary.join("\n");
        self.push_log(&log).await;

        info!(
            "✅ Mission {} finished: {} targets, {} uploaded, {} duplicates, {} errors",
            run_id,
            report.targets_processed,
            report.events_uploaded,
            report.duplicates,
            report.errors.len()
        );
        Ok(report)
    }

    async fn write_stats(&self, target: &Target, events_found: u32) {
        let Some(id) = target.id.as_deref() else {
            return;
        };
        let stats = TargetStats {
            last_events_found: events_found,
            last_scraped_at: Utc::now(),
        };
        if let Err(e) = self.api.update_target_stats(id, &stats).await {
            warn!("Failed to update stats for target '{}': {}", target.name, e);
        }
    }

    #[instrument(skip(self, page, target, cache), fields(target = %target.name))]
    async fn process_target(
        &self,
        page: &mut dyn PagePort,
        target: &Target,
        cache: &mut GeocodeCache,
    ) -> Result<TargetTally> {
        let family = SourceFamily::detect(&target.url);
        let now = self.now();
        let parser = family.parser(now.date_naive());
        let candidates = self.crawler.crawl(page, target).await?;

        let mut tally = TargetTally {
            candidates: candidates.len(),
            ..TargetTally::default()
        };
        let mut batch = Vec::new();

        for candidate in &candidates {
            let Some(mut event) = parser.parse(&candidate.text).into_event() else {
                counter!(PARSE_SKIPPED_TOTAL).increment(1);
                continue;
            };

            if family.requires_deep_scrape() && !candidate.link.is_empty() {
                match self.crawler.deep_scrape(page, &candidate.link, parser.as_ref()).await {
                    Ok(Some(detail)) => event = merge_detail(event, detail),
                    Ok(None) => debug!("Nothing extracted from {}", candidate.link),
                    Err(e) => warn!("Deep scrape failed for {}: {}", candidate.link, e),
                }
            }

            if !event.has_title() {
                counter!(PARSE_SKIPPED_TOTAL).increment(1);
                debug!("Dropping candidate without title");
                continue;
            }
            let Some(start) = normalize_date_at(&event.date_raw, &event.time_raw, now) else {
                counter!(PARSE_SKIPPED_TOTAL).increment(1);
                debug!("Dropping '{}': no usable date in '{}'", event.title, event.date_raw);
                continue;
            };
            tally.events += 1;

            let city = event.detected_city.clone().or_else(|| target.city.clone());
            let link = if candidate.link.is_empty() { &target.url } else { &candidate.link };

            if self.options.dry_run {
                let preview = build_publishable(&event, start, city_center(city.as_deref()), link);
                tally.preview = Some(preview);
                return Ok(tally);
            }

            let coordinates = self.locate(cache, &event, city.as_deref()).await;
            batch.push(build_publishable(&event, start, coordinates, link));
            if batch.len() >= self.config.batch_size {
                self.upload_batch(&mut batch, &mut tally).await;
            }
        }

        if !batch.is_empty() {
            self.upload_batch(&mut batch, &mut tally).await;
        }
        info!(
            "Target '{}' done: {} events, {} uploaded, {} duplicates",
            target.name, tally.events, tally.uploaded, tally.duplicates
        );
        Ok(tally)
    }

    async fn locate(&self, cache: &mut GeocodeCache, event: &ParsedEvent, city: Option<&str>) -> Coordinates {
        if event.has_location() {
            if let Some(coordinates) = self.geocoder.geocode(cache, &event.location, city).await {
                return coordinates;
            }
        }
        debug!("Scattering '{}' around {}", event.title, city.unwrap_or("default center"));
        fallback_coordinates(city)
    }

    /// Posts and drains `batch`; a rejected event never stops the rest
    async fn upload_batch(&self, batch: &mut Vec<PublishableEvent>, tally: &mut TargetTally) {
        debug!("Uploading batch of {}", batch.len());
        for event in batch.drain(..) {
            match self.api.post_event(&event).await {
                Ok(PostOutcome::Created) => {
                    counter!(EVENTS_UPLOADED_TOTAL).increment(1);
                    tally.uploaded += 1;
                }
                Ok(PostOutcome::Duplicate) => {
                    counter!(EVENTS_DUPLICATE_TOTAL).increment(1);
                    tally.duplicates += 1;
                }
                Err(e) => {
                    counter!(UPLOAD_FAILURES_TOTAL).increment(1);
                    warn!("Upload failed for '{}': {}", event.title, e);
                    tally.upload_failures += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::UNKNOWN_LOCATION;
    use crate::types::EventKind;
    use chrono::TimeZone;

    #[test]
    fn test_publishable_event_defaults() {
        let event = ParsedEvent {
            title: "Jazz koncertas".to_string(),
            location: UNKNOWN_LOCATION.to_string(),
            date_raw: "Sausio 15".to_string(),
            time_raw: String::new(),
            detected_city: None,
            description: None,
        };
        let start = Vilnius.with_ymd_and_hms(2025, 1, 15, 19, 0, 0).unwrap();
        let published = build_publishable(&event, start, Coordinates { lat: 54.7, lon: 25.3 }, "https://x.lt/1");

        assert_eq!(published.end_time - published.start_time, Duration::hours(3));
        assert_eq!(published.start_time.to_rfc3339(), "2025-01-15T17:00:00+00:00");
        assert_eq!(published.kind, EventKind::Music);
        assert_eq!(published.description, "Jazz koncertas | Unknown Location");
        assert_eq!(published.lng, 25.3);
    }
}
