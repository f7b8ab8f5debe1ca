// file: src/storage/rotation.rs
// description: size-based rotation and age-based retention for the event log

use crate::config::StorageConfig;
use crate::error::{FeedError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const STAMP_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub retention_days: u32,
}

impl RotationPolicy {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_bytes: config.rotate_max_bytes,
            retention_days: config.retention_days,
        }
    }

    /// Housekeeping run before every append. Failures are logged and
    /// swallowed so ingestion keeps working.
    pub async fn apply(&self, path: &Path) {
        if let Err(e) = self.roll_if_needed(path, Utc::now()).await {
            warn!("Event log rotation failed: {}", e);
        }
        if let Err(e) = self.prune(path, Utc::now()).await {
            warn!("Event log retention pass failed: {}", e);
        }
    }

    /// Moves `path` aside once it reaches `max_bytes` and starts a new empty
    /// log. Returns the rotated file, if any.
    pub async fn roll_if_needed(&self, path: &Path, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
        let size = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FeedError::file(path, e)),
        };

        if size < self.max_bytes {
            return Ok(None);
        }

        let mut target = rotated_name(path, now, 0);
        let mut attempt = 0;
        while fs::try_exists(&target).await.unwrap_or(false) {
            attempt += 1;
            target = rotated_name(path, now, attempt);
        }

        fs::rename(path, &target)
            .await
            .map_err(|e| FeedError::file(path, e))?;
        fs::File::create(path)
            .await
            .map_err(|e| FeedError::file(path, e))?;

        info!("Rotated event log ({} bytes) to {}", size, target.display());
        Ok(Some(target))
    }

    /// Deletes rotated siblings whose name stamp is older than the
    /// retention window. Names that do not carry a stamp are left alone.
    pub async fn prune(&self, path: &Path, now: DateTime<Utc>) -> Result<usize> {
        let Some(cutoff) = now.checked_sub_signed(Duration::days(i64::from(self.retention_days)))
        else {
            return Ok(0);
        };
        let cutoff = cutoff.naive_utc();
        let dir = log_dir(path);

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(FeedError::file(dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(stamp) = name.to_str().and_then(|n| rotated_stamp(path, n)) else {
                continue;
            };

            if stamp < cutoff {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => {
                        debug!("Pruned rotated event log {:?}", name);
                        removed += 1;
                    }
                    Err(e) => warn!("Failed to prune {:?}: {}", name, e),
                }
            }
        }

        Ok(removed)
    }
}

/// `events.jsonl` -> `events-20251028-101500.jsonl` (`-N` appended on clashes).
pub fn rotated_name(path: &Path, now: DateTime<Utc>, attempt: u32) -> PathBuf {
    let (stem, suffix) = stem_and_suffix(path);
    let stamp = now.format(STAMP_FORMAT);

    let name = if attempt == 0 {
        format!("{}-{}{}", stem, stamp, suffix)
    } else {
        format!("{}-{}-{}{}", stem, stamp, attempt, suffix)
    };
    path.with_file_name(name)
}

fn rotated_stamp(path: &Path, candidate: &str) -> Option<NaiveDateTime> {
    let (stem, suffix) = stem_and_suffix(path);
    let rest = candidate
        .strip_prefix(&format!("{}-", stem))?
        .strip_suffix(&suffix)?;

    NaiveDateTime::parse_from_str(rest.get(..STAMP_LEN)?, STAMP_FORMAT).ok()
}

fn stem_and_suffix(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events".to_string());
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

fn log_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
