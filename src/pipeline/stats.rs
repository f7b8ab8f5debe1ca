// file: src/pipeline/stats.rs
// description: event counts by window, source and type

use crate::extractor::{FieldExtractor, is_public};
use crate::models::{Event, parse_timestamp};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub total: usize,
    pub last_24h: usize,
    pub last_7d: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

/// Serialized as `{"counts": {...}, "unique_ips": n}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub counts: EventCounts,
    /// Distinct public addresses across the log.
    pub unique_ips: usize,
}

impl EventStats {
    /// Events without a readable timestamp count toward the totals but not
    /// toward either window.
    pub fn compute(events: &[Value], now: DateTime<Utc>) -> Self {
        let extractor = FieldExtractor::new();
        let day_ago = now.checked_sub_signed(Duration::hours(24));
        let week_ago = now.checked_sub_signed(Duration::days(7));

        let mut counts = EventCounts::default();
        let mut public_ips = HashSet::new();

        for event in events {
            counts.total += 1;

            let source = label(event, "source", Event::UNKNOWN_SOURCE);
            *counts.by_source.entry(source).or_default() += 1;
            let event_type = label(event, "type", Event::GENERIC_TYPE);
            *counts.by_type.entry(event_type).or_default() += 1;

            if let Some(ts) = event_timestamp(event) {
                if day_ago.is_some_and(|cutoff| ts >= cutoff) {
                    counts.last_24h += 1;
                }
                if week_ago.is_some_and(|cutoff| ts >= cutoff) {
                    counts.last_7d += 1;
                }
            }

            public_ips.extend(extractor.extract(event).ips.into_iter().filter(|ip| is_public(*ip)));
        }

        Self {
            counts,
            unique_ips: public_ips.len(),
        }
    }
}

fn label(event: &Value, key: &str, fallback: &str) -> String {
    event
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub(crate) fn event_timestamp(event: &Value) -> Option<DateTime<Utc>> {
    ["ts", "timestamp"]
        .iter()
        .find_map(|key| event.get(*key).and_then(Value::as_str))
        .and_then(parse_timestamp)
}
