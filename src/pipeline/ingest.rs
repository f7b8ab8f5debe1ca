// file: src/pipeline/ingest.rs
// description: normalize, enrich, persist and announce incoming sensor events

use crate::error::Result;
use crate::models::Event;
use crate::notifier::TelegramNotifier;
use crate::parser::EventNormalizer;
use crate::storage::EventLog;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Optional per-event context (geolocation, reputation, ...). Whatever it
/// returns is stored under `data.enrichment`.
pub trait Enricher: Send + Sync {
    fn enrich(&self, event: &Event) -> Option<Value>;
}

pub struct NoEnrichment;

impl Enricher for NoEnrichment {
    fn enrich(&self, _event: &Event) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
}

pub struct IngestPipeline {
    log: Arc<EventLog>,
    normalizer: EventNormalizer,
    enricher: Arc<dyn Enricher>,
    notifier: Option<Arc<TelegramNotifier>>,
}

impl IngestPipeline {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            log,
            normalizer: EventNormalizer::new(),
            enricher: Arc::new(NoEnrichment),
            notifier: None,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<TelegramNotifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// Raw sensor payload path.
    pub async fn ingest(&self, raw: &Value) -> Result<Event> {
        let event = self.normalizer.normalize(raw);
        self.store(event).await
    }

    /// Already-canonical record path.
    pub async fn submit(&self, payload: &Value) -> Result<Event> {
        let event = self.normalizer.from_submission(payload);
        self.store(event).await
    }

    /// Accepts one JSON document (object or array of objects) or
    /// newline-delimited JSON. Unparsable lines are counted, not fatal.
    pub async fn ingest_text(&self, input: &str) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();

        for item in split_documents(input, &mut summary.rejected) {
            self.ingest(&item).await?;
            summary.accepted += 1;
        }

        info!(
            "Ingested {} events ({} rejected) into {}",
            summary.accepted,
            summary.rejected,
            self.log.path().display()
        );
        Ok(summary)
    }

    async fn store(&self, mut event: Event) -> Result<Event> {
        if let Some(enrichment) = self.enricher.enrich(&event) {
            event.data.insert("enrichment".to_string(), enrichment);
        }

        self.log.append(&event).await?;
        debug!("Stored {}:{} event {}", event.source, event.event_type, event.id);

        if let Some(notifier) = &self.notifier {
            notifier.spawn_notify(event.clone());
        }
        Ok(event)
    }
}

fn split_documents(input: &str, rejected: &mut usize) -> Vec<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(document) = serde_json::from_str::<Value>(trimmed) {
        return match document {
            Value::Array(items) => items,
            other => vec![other],
        };
    }

    let mut items = Vec::new();
    for (index, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => items.push(value),
            Err(e) => {
                debug!("Skipping line {}: {}", index + 1, e);
                *rejected += 1;
            }
        }
    }
    items
}
