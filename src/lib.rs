// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod models;
pub mod notifier;
pub mod parser;
pub mod pipeline;
pub mod privacy;
pub mod server;
pub mod storage;
pub mod utils;

pub use crate::config::{Config, ConfigSummary};
pub use error::{FeedError, Result};
pub use exporter::{ExportFormat, IocFeed, render_deny_list, render_packet_filter_table};
pub use extractor::{FieldExtractor, IocAggregator, is_public};
pub use extractor::ioc::collect;
pub use models::{Event, IndicatorKind, IndicatorRecord};
pub use notifier::TelegramNotifier;
pub use parser::EventNormalizer;
pub use pipeline::{
    Enricher, EventCounts, EventQuery, EventStats, FeedExporter, IngestPipeline, NoEnrichment,
};
pub use privacy::{PrivacyMapper, maybe_map};
pub use server::ServerContext;
pub use storage::{EventLog, RotationPolicy};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _mapper = PrivacyMapper::from_config(&config.privacy).unwrap();
        let _normalizer = EventNormalizer::new();
    }
}
