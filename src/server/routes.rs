// file: src/server/routes.rs
// description: http api routes and request handlers

use crate::config::ConfigSummary;
use crate::exporter::ExportFormat;
use crate::models::Event;
use crate::pipeline::{EventQuery, EventStats, IngestSummary};
use crate::server::ServerContext;
use crate::server::response::ApiError;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn build_router(context: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/ingest", post(ingest))
        .route("/api/stats", get(stats))
        .route("/api/iocs.json", get(iocs_json))
        .route("/api/iocs/ufw.txt", get(iocs_ufw))
        .route("/api/iocs/pf.conf", get(iocs_pf))
        .route("/api/config", get(config_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// No-op when the server runs without a key.
fn authorize(context: &ServerContext, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = context.api_key() else {
        return Ok(());
    };

    let supplied = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if supplied.is_some_and(|key| keys_match(key, expected)) {
        Ok(())
    } else {
        debug!("Rejected request with missing or wrong API key");
        Err(ApiError::Unauthorized)
    }
}

/// Compares fixed-length digests so the time taken does not depend on
/// where the supplied key first differs.
fn keys_match(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("empty body".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("invalid json: {err}")))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "time": Utc::now().to_rfc3339()}))
}

pub async fn list_events(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    authorize(&context, &headers)?;
    let events = context.log.snapshot().await;
    Ok(Json(query.apply(events)))
}

pub async fn create_event(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    authorize(&context, &headers)?;
    let payload = parse_body(&body)?;
    if !payload.is_object() {
        return Err(ApiError::BadRequest("event must be a json object".to_string()));
    }

    let event = context.ingest.submit(&payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Raw sensor output: one object, an array of objects, or NDJSON.
pub async fn ingest(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestSummary>, ApiError> {
    authorize(&context, &headers)?;
    let text = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("body is not valid utf-8".to_string()))?;
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("empty body".to_string()));
    }

    let summary = context.ingest.ingest_text(text).await?;
    if summary.accepted == 0 {
        return Err(ApiError::BadRequest("no parsable events in body".to_string()));
    }
    Ok(Json(summary))
}

pub async fn stats(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
) -> Result<Json<EventStats>, ApiError> {
    authorize(&context, &headers)?;
    let events = context.log.snapshot().await;
    Ok(Json(EventStats::compute(&events, Utc::now())))
}

async fn render_feed(context: &ServerContext, format: ExportFormat) -> Result<Response, ApiError> {
    let body = context.exporter.render(format).await?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}

pub async fn iocs_json(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&context, &headers)?;
    render_feed(&context, ExportFormat::Json).await
}

pub async fn iocs_ufw(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&context, &headers)?;
    render_feed(&context, ExportFormat::Ufw).await
}

pub async fn iocs_pf(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&context, &headers)?;
    render_feed(&context, ExportFormat::Pf).await
}

pub async fn config_summary(
    State(context): State<Arc<ServerContext>>,
    headers: HeaderMap,
) -> Result<Json<ConfigSummary>, ApiError> {
    authorize(&context, &headers)?;
    Ok(Json(context.config.summary()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;
    use tempfile::{TempDir, tempdir};

    fn context(dir: &TempDir, api_key: Option<&str>) -> Arc<ServerContext> {
        let mut config = Config::default_config();
        config.storage.events_path = dir.path().join("events.jsonl");
        config.server.api_key = api_key.map(str::to_string);
        Arc::new(ServerContext::from_config(config).unwrap())
    }

    fn keyed(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_api_key_enforced_when_configured() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Some("s3cret"));

        let denied = stats(State(Arc::clone(&ctx)), HeaderMap::new()).await;
        assert!(matches!(denied, Err(ApiError::Unauthorized)));

        let wrong = stats(State(Arc::clone(&ctx)), keyed("nope")).await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized)));

        assert!(stats(State(ctx), keyed("s3cret")).await.is_ok());
    }

    #[test]
    fn test_key_comparison() {
        assert!(keys_match("s3cret", "s3cret"));
        assert!(!keys_match("s3cres", "s3cret"));
        assert!(!keys_match("s3cret-and-more", "s3cret"));
        assert!(!keys_match("", "s3cret"));
        assert!(!keys_match("S3CRET", "s3cret"));
    }

    #[tokio::test]
    async fn test_open_when_no_key() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, None);

        assert!(config_summary(State(ctx), HeaderMap::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_then_export() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Some("k"));

        let body = Bytes::from(r#"{"eventid": "cowrie.login.failed", "src_ip": "8.8.8.8"}"#);
        let Json(summary) = ingest(State(Arc::clone(&ctx)), keyed("k"), body).await.unwrap();
        assert_eq!(summary.accepted, 1);

        let denied = iocs_ufw(State(Arc::clone(&ctx)), HeaderMap::new()).await;
        assert!(matches!(denied, Err(ApiError::Unauthorized)));

        let response = iocs_ufw(State(Arc::clone(&ctx)), keyed("k")).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "deny from 8.8.8.8\n");

        let response = iocs_pf(State(Arc::clone(&ctx)), keyed("k")).await.unwrap();
        assert!(body_text(response).await.contains("{ 8.8.8.8 }"));

        let response = iocs_json(State(ctx), keyed("k")).await.unwrap();
        let feed: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(feed["ips"], json!(["8.8.8.8"]));
    }

    #[tokio::test]
    async fn test_bad_bodies_rejected() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, None);

        let empty = ingest(State(Arc::clone(&ctx)), HeaderMap::new(), Bytes::from("  ")).await;
        assert!(matches!(empty, Err(ApiError::BadRequest(_))));

        let garbage = ingest(State(Arc::clone(&ctx)), HeaderMap::new(), Bytes::from("nope")).await;
        assert!(matches!(garbage, Err(ApiError::BadRequest(_))));

        let not_object = create_event(State(ctx), HeaderMap::new(), Bytes::from("[1, 2]")).await;
        assert!(matches!(not_object, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_and_list_events() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, None);

        for i in 0..3 {
            let body = Bytes::from(json!({"source": "manual", "type": "scan", "id": format!("e{i}")}).to_string());
            let (status, Json(event)) = create_event(State(Arc::clone(&ctx)), HeaderMap::new(), body)
                .await
                .unwrap();
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(event.id, format!("e{i}"));
        }

        let query = EventQuery {
            limit: Some(2),
            after_ts: None,
        };
        let Json(events) = list_events(State(ctx), HeaderMap::new(), Query(query)).await.unwrap();
        let ids: Vec<&str> = events.iter().filter_map(|e| e["id"].as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_health_needs_no_key() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
