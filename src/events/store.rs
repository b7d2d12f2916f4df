use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::Event;
use crate::shared::AppError;

/// Trait for event snapshot persistence
///
/// Both calls move the whole collection; there is no incremental update.
#[async_trait]
pub trait EventStore {
    /// Loads every persisted event. An absent snapshot loads as empty.
    async fn load(&self) -> Result<Vec<Event>, AppError>;

    /// Atomically replaces the persisted snapshot
    async fn save(&self, events: &[Event]) -> Result<(), AppError>;
}

/// JSON snapshot file on local disk
///
/// Saves go through a `.tmp` sibling that is synced and renamed over the
/// target, so a concurrent reader sees either the old or the new snapshot.
pub struct JsonFileEventStore {
    path: PathBuf,
}

impl JsonFileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> AppError {
    warn!(path = %path.display(), error = %e, "Event snapshot I/O failed");
    AppError::StorageUnavailable(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl EventStore for JsonFileEventStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Event>, AppError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No event snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(storage_error(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let events: Vec<Event> =
            serde_json::from_str(&contents).map_err(|e| storage_error(&self.path, e))?;

        debug!(event_count = events.len(), "Event snapshot loaded");
        Ok(events)
    }

    #[instrument(skip(self, events), fields(path = %self.path.display()))]
    async fn save(&self, events: &[Event]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(events).map_err(|e| storage_error(&self.path, e))?;

        let tmp_path = self.tmp_path();
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        file.sync_data()
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))?;

        debug!(event_count = events.len(), "Event snapshot saved");
        Ok(())
    }
}

/// In-memory implementation of EventStore for development and testing
pub struct InMemoryEventStore {
    snapshot: Mutex<Vec<Event>>,
    saves: AtomicUsize,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::with_events(Vec::new())
    }

    /// Creates a store with a pre-populated snapshot
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            snapshot: Mutex::new(events),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of times `save` has been called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, events: &[Event]) -> Result<(), AppError> {
        *self.snapshot.lock().await = events.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
