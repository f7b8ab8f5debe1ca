// file: src/pipeline/query.rs
// description: bounded, chronological event listing

use crate::models::parse_timestamp;
use crate::pipeline::stats::event_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub limit: Option<usize>,
    pub after_ts: Option<String>,
}

impl EventQuery {
    /// Clamped to `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn after(&self) -> Option<DateTime<Utc>> {
        self.after_ts
            .as_deref()
            .and_then(parse_timestamp)
    }

    /// The newest `limit` events strictly after `after_ts`, oldest first.
    /// An unparsable `after_ts` is ignored.
    pub fn apply(&self, events: Vec<Value>) -> Vec<Value> {
        let filtered: Vec<Value> = match self.after() {
            Some(after) => events
                .into_iter()
                .filter(|event| event_timestamp(event).is_some_and(|ts| ts > after))
                .collect(),
            None => events,
        };

        let skip = filtered.len().saturating_sub(self.effective_limit());
        filtered.into_iter().skip(skip).collect()
    }
}
