// file: src/pipeline/export.rs
// description: event log snapshot to rendered indicator feed

use crate::error::Result;
use crate::exporter::{ExportFormat, IocFeed, render_deny_list, render_packet_filter_table};
use crate::extractor::IocAggregator;
use crate::models::{IndicatorKind, IndicatorRecord};
use crate::privacy::PrivacyMapper;
use crate::storage::EventLog;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Documentation-only address emitted when a demo feed is requested and the
/// log holds no public indicators.
pub const DEMO_INDICATOR: &str = "1.2.3.4";

pub struct FeedExporter {
    log: Arc<EventLog>,
    aggregator: IocAggregator,
    demo_fallback: bool,
}

impl FeedExporter {
    pub fn new(log: Arc<EventLog>, mapper: PrivacyMapper) -> Self {
        Self {
            log,
            aggregator: IocAggregator::new(mapper),
            demo_fallback: false,
        }
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub async fn indicators(&self) -> Vec<String> {
        let events = self.log.snapshot().await;
        self.indicators_from(&events)
    }

    pub fn indicators_from(&self, events: &[Value]) -> Vec<String> {
        let mut ips = self.aggregator.collect(events);
        if ips.is_empty() {
            if let Some(demo) = self.demo_indicator() {
                ips.push(demo);
            }
        }
        ips
    }

    pub async fn render(&self, format: ExportFormat) -> Result<String> {
        let events = self.log.snapshot().await;
        self.render_from(&events, format)
    }

    /// Rule formats carry addresses only; the JSON feed also lists domains.
    pub fn render_from(&self, events: &[Value], format: ExportFormat) -> Result<String> {
        let rendered = match format {
            ExportFormat::Ufw => render_deny_list(&self.indicators_from(events)),
            ExportFormat::Pf => render_packet_filter_table(&self.indicators_from(events)),
            ExportFormat::Json => {
                let mut records = self.aggregator.collect_records(events);
                if !records.iter().any(|r| r.kind == IndicatorKind::Ipv4) {
                    if let Some(demo) = self.demo_indicator() {
                        records.insert(0, IndicatorRecord::new(IndicatorKind::Ipv4, demo));
                    }
                }
                IocFeed::from_records(&records).to_json(true)?
            }
        };

        info!(
            "Rendered {:?} feed from {} events ({} bytes)",
            format,
            events.len(),
            rendered.len()
        );
        Ok(rendered)
    }

    fn demo_indicator(&self) -> Option<String> {
        if !self.demo_fallback {
            return None;
        }
        warn!("No public indicators found, emitting demo address");
        Some(self.aggregator.mapper().map(DEMO_INDICATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn exporter(mapper: PrivacyMapper) -> FeedExporter {
        FeedExporter::new(Arc::new(EventLog::new("unused.jsonl")), mapper)
    }

    #[test]
    fn test_rule_formats() {
        let events = vec![
            json!({"src_ip": "1.2.3.4"}),
            json!({"src_ip": "5.6.7.8"}),
            json!({"src_ip": "10.0.0.1"}),
        ];
        let exporter = exporter(PrivacyMapper::disabled());

        assert_eq!(
            exporter.render_from(&events, ExportFormat::Ufw).unwrap(),
            "deny from 1.2.3.4\ndeny from 5.6.7.8\n"
        );
        assert_eq!(
            exporter.render_from(&events, ExportFormat::Pf).unwrap(),
            "table <blocked_ips> persist { 1.2.3.4, 5.6.7.8 }\nblock in quick from <blocked_ips> to any\n"
        );
    }

    #[test]
    fn test_empty_log_renders_empty_feeds() {
        let exporter = exporter(PrivacyMapper::disabled());

        assert_eq!(exporter.render_from(&[], ExportFormat::Ufw).unwrap(), "");
        let feed: IocFeed =
            serde_json::from_str(&exporter.render_from(&[], ExportFormat::Json).unwrap()).unwrap();
        assert!(feed.ips.is_empty());
        assert!(feed.domains.is_empty());
    }

    #[test]
    fn test_demo_fallback_only_when_empty() {
        let exporter = exporter(PrivacyMapper::disabled()).with_demo_fallback(true);

        assert_eq!(exporter.indicators_from(&[]), vec![DEMO_INDICATOR]);
        assert_eq!(
            exporter.indicators_from(&[json!({"ip": "8.8.8.8"})]),
            vec!["8.8.8.8"]
        );

        let feed: IocFeed =
            serde_json::from_str(&exporter.render_from(&[], ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(feed.ips, vec![DEMO_INDICATOR]);
    }

    #[test]
    fn test_demo_fallback_is_privacy_mapped() {
        let exporter = exporter(PrivacyMapper::hashed("salt")).with_demo_fallback(true);

        let ips = exporter.indicators_from(&[]);
        assert_eq!(ips.len(), 1);
        assert!(ips[0].starts_with("ip-"));
    }

    #[test]
    fn test_json_feed_with_privacy() {
        let events = vec![json!({"src_ip": "8.8.8.8", "domain": "evil.example.org"})];
        let exporter = exporter(PrivacyMapper::hashed("salt"));

        let rendered = exporter.render_from(&events, ExportFormat::Json).unwrap();
        assert!(!rendered.contains("8.8.8.8"));
        assert!(!rendered.contains("example"));

        let feed: IocFeed = serde_json::from_str(&rendered).unwrap();
        assert_eq!(feed.ips.len(), 1);
        assert_eq!(feed.domains.len(), 1);
        assert!(feed.domains[0].ends_with(".org"));
    }

    #[tokio::test]
    async fn test_render_reads_log_snapshot() {
        let dir = tempdir().unwrap();
        let log = Arc::new(EventLog::new(dir.path().join("events.jsonl")));

        let mut event = Event::new("cowrie", "auth_failed");
        event.data.insert("ip".to_string(), json!("9.9.9.9"));
        log.append(&event).await.unwrap();

        let exporter = FeedExporter::new(log, PrivacyMapper::disabled());
        assert_eq!(exporter.render(ExportFormat::Ufw).await.unwrap(), "deny from 9.9.9.9\n");
        assert_eq!(exporter.indicators().await, vec!["9.9.9.9"]);
    }
}
