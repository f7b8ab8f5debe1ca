// file: src/storage/event_log.rs
// description: append-only newline-delimited json event log
// reference: JSON Lines format

use crate::config::StorageConfig;
use crate::error::{FeedError, Result};
use crate::models::Event;
use crate::storage::rotation::RotationPolicy;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Single-file event store. Writers serialize on an internal lock so lines
/// never interleave; readers take a full snapshot without locking.
pub struct EventLog {
    path: PathBuf,
    rotation: Option<RotationPolicy>,
    write_lock: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.events_path.clone()).with_rotation(RotationPolicy::from_config(config))
    }

    pub fn with_rotation(mut self, policy: RotationPolicy) -> Self {
        self.rotation = Some(policy);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(policy) = &self.rotation {
            policy.apply(&self.path).await;
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FeedError::file(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| FeedError::file(&self.path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FeedError::file(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| FeedError::file(&self.path, e))?;

        debug!("Appended event {} to {}", event.id, self.path.display());
        Ok(())
    }

    /// Every parsable record in file order. A missing or unreadable log is
    /// an empty log.
    pub async fn snapshot(&self) -> Vec<Value> {
        match fs::read(&self.path).await {
            Ok(bytes) => parse_lines(&String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Event log {} does not exist yet", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Cannot read event log {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Parses newline-delimited JSON, skipping blank and malformed lines.
pub fn parse_lines(contents: &str) -> Vec<Value> {
    let mut skipped = 0usize;
    let events: Vec<Value> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => Some(value),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {} malformed event log lines", skipped);
    }
    events
}
