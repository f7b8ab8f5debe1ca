// file: src/server/mod.rs
// description: http api server bootstrap and shared request context

mod response;
mod routes;

pub use response::ApiError;
pub use routes::build_router;

use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::notifier::TelegramNotifier;
use crate::pipeline::{FeedExporter, IngestPipeline};
use crate::privacy::PrivacyMapper;
use crate::storage::EventLog;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct ServerContext {
    pub config: Config,
    pub log: Arc<EventLog>,
    pub ingest: IngestPipeline,
    pub exporter: FeedExporter,
}

impl ServerContext {
    pub fn from_config(config: Config) -> Result<Self> {
        let mapper = PrivacyMapper::from_config(&config.privacy)?;
        let log = Arc::new(EventLog::from_config(&config.storage));
        let notifier = TelegramNotifier::from_config(&config.notifier, mapper.clone())?.map(Arc::new);

        let ingest = IngestPipeline::new(Arc::clone(&log)).with_notifier(notifier);
        let exporter = FeedExporter::new(Arc::clone(&log), mapper)
            .with_demo_fallback(config.export.demo_fallback);

        Ok(Self {
            config,
            log,
            ingest,
            exporter,
        })
    }

    pub fn api_key(&self) -> Option<&str> {
        self.config
            .server
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }
}

pub async fn run(context: ServerContext) -> Result<()> {
    let host = context.config.server.host.clone();
    let port = context.config.server.port;

    if context.api_key().is_none() {
        warn!("No API key configured, every endpoint is unauthenticated");
    }

    let app = build_router(Arc::new(context));

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| FeedError::Server(format!("Failed to bind to {}:{}: {}", host, port, e)))?;

    info!("API server listening on {}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FeedError::Server(format!("Server runtime error: {}", e)))?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
