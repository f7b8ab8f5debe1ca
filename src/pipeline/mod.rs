// file: src/pipeline/mod.rs
// description: ingest, export and reporting services over the event log
// reference: pipeline orchestration

mod export;
mod ingest;
mod query;
mod stats;

pub use export::{DEMO_INDICATOR, FeedExporter};
pub use ingest::{Enricher, IngestPipeline, IngestSummary, NoEnrichment};
pub use query::{DEFAULT_LIMIT, EventQuery, MAX_LIMIT};
pub use stats::{EventCounts, EventStats};
