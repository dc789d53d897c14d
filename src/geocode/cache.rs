use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::Coordinates;

/// Persistent map from fully-qualified geocode query to coordinates.
///
/// Append-only within a run. Written as pretty JSON at checkpoints; a
/// checkpoint with nothing new is a no-op.
#[derive(Debug)]
pub struct GeocodeCache {
    path: PathBuf,
    entries: BTreeMap<String, Coordinates>,
    dirty: bool,
}

impl GeocodeCache {
    /// Loads the cache file. A missing file starts empty; an unreadable one
    /// is logged and replaced on the next checkpoint.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Coordinates>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Geocode cache {} is corrupt, starting empty: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read geocode cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        info!("Loaded {} cached geocodes from {}", entries.len(), path.display());
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    /// Cache that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn get(&self, query: &str) -> Option<Coordinates> {
        self.entries.get(query).copied()
    }

    /// Existing entries are never overwritten.
    pub fn insert(&mut self, query: impl Into<String>, coordinates: Coordinates) {
        let query = query.into();
        if !self.entries.contains_key(&query) {
            self.entries.insert(query, coordinates);
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flushes new entries to disk
    pub fn checkpoint(&mut self) -> Result<()> {
        if !self.dirty || self.path.as_os_str().is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        self.dirty = false;
        debug!("Geocode cache checkpoint: {} entries -> {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Final checkpoint
    pub fn close(mut self) -> Result<()> {
        self.checkpoint()
    }
}
