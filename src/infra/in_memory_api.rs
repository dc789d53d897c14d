use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::app::ports::ScoutApiPort;
use crate::error::{Result, ScraperError};
use crate::types::{MissionLog, PostOutcome, PublishableEvent, Target, TargetStats};

/// In-process stand-in for the events API, for tests and local dry runs.
/// Deduplicates events the way the real API does: same link, or same title
/// and start time.
#[derive(Clone, Default)]
pub struct InMemoryScoutApi {
    targets: Arc<Mutex<Vec<Target>>>,
    events: Arc<Mutex<Vec<PublishableEvent>>>,
    logs: Arc<Mutex<Vec<MissionLog>>>,
    stats: Arc<Mutex<HashMap<String, TargetStats>>>,
    rejected_titles: Arc<Mutex<HashSet<String>>>,
    targets_unavailable: Arc<Mutex<bool>>,
}

fn poisoned<T>(_: T) -> ScraperError {
    ScraperError::api("in-memory api lock poisoned")
}

impl InMemoryScoutApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<Target>) -> Self {
        let api = Self::default();
        if let Ok(mut guard) = api.targets.lock() {
            *guard = targets;
        }
        api
    }

    /// Makes `GET /targets` fail
    pub fn fail_targets(&self) {
        if let Ok(mut guard) = self.targets_unavailable.lock() {
            *guard = true;
        }
    }

    /// Makes uploads of events with this title fail
    pub fn reject_title(&self, title: &str) {
        if let Ok(mut guard) = self.rejected_titles.lock() {
            guard.insert(title.to_string());
        }
    }

    pub fn events(&self) -> Vec<PublishableEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<MissionLog> {
        self.logs.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn stats_for(&self, target_id: &str) -> Option<TargetStats> {
        self.stats.lock().ok().and_then(|g| g.get(target_id).cloned())
    }

    pub fn stats_writes(&self) -> usize {
        self.stats.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ScoutApiPort for InMemoryScoutApi {
    async fn get_targets(&self) -> Result<Vec<Target>> {
        if *self.targets_unavailable.lock().map_err(poisoned)? {
            return Err(ScraperError::api("GET /targets failed with status 503"));
        }
        Ok(self.targets.lock().map_err(poisoned)?.clone())
    }

    async fn update_target_stats(&self, target_id: &str, stats: &TargetStats) -> Result<()> {
        let mut targets = self.targets.lock().map_err(poisoned)?;
        let target = targets
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(target_id))
            .ok_or_else(|| ScraperError::api(format!("Unknown target {}", target_id)))?;
        target.last_events_found = stats.last_events_found;
        target.last_scraped_at = Some(stats.last_scraped_at);
        self.stats
            .lock()
            .map_err(poisoned)?
            .insert(target_id.to_string(), stats.clone());
        Ok(())
    }

    async fn post_event(&self, event: &PublishableEvent) -> Result<PostOutcome> {
        if self.rejected_titles.lock().map_err(poisoned)?.contains(&event.title) {
            return Err(ScraperError::api(format!("POST /events rejected '{}'", event.title)));
        }
        let mut events = self.events.lock().map_err(poisoned)?;
        let duplicate = events.iter().any(|existing| {
            existing.link == event.link
                || (existing.title == event.title && existing.start_time == event.start_time)
        });
        if duplicate {
            return Ok(PostOutcome::Duplicate);
        }
        events.push(event.clone());
        Ok(PostOutcome::Created)
    }

    async fn post_log(&self, log: &MissionLog) -> Result<()> {
        self.logs.lock().map_err(poisoned)?.push(log.clone());
        Ok(())
    }
}
