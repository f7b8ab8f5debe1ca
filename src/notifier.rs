// file: src/notifier.rs
// description: best-effort Telegram alerts for newly ingested events
// reference: https://core.telegram.org/bots/api#sendmessage

use crate::config::NotifierConfig;
use crate::error::{FeedError, Result};
use crate::models::Event;
use crate::privacy::PrivacyMapper;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
    mapper: PrivacyMapper,
}

impl TelegramNotifier {
    /// `None` unless both the bot token and chat id are configured.
    pub fn from_config(config: &NotifierConfig, mapper: PrivacyMapper) -> Result<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }
        let (Some(token), Some(chat_id)) = (&config.telegram_token, &config.telegram_chat_id) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| FeedError::Notify(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            token: token.clone(),
            chat_id: chat_id.clone(),
            mapper,
        }))
    }

    /// Points delivery at a self-hosted Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// One-line summary; the address goes through the privacy mapper.
    pub fn format_message(&self, event: &Event) -> String {
        let ip = event
            .data_str("ip")
            .map(|ip| self.mapper.map(ip))
            .unwrap_or_else(|| "-".to_string());
        let user = event.data_str("username").unwrap_or("-");

        format!(
            "🔔 {}:{} from {} (user={})",
            event.source, event.event_type, ip, user
        )
    }

    pub async fn notify(&self, event: &Event) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: self.format_message(event),
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            // The request url embeds the bot token.
            .map_err(|e| {
                FeedError::Notify(format!("Failed to send Telegram request: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            return Err(FeedError::Notify(format!(
                "Telegram API responded with status {}",
                response.status()
            )));
        }

        debug!("Sent alert for event {}", event.id);
        Ok(())
    }

    /// Fire and forget. Delivery failures are logged, never returned.
    pub fn spawn_notify(self: &Arc<Self>, event: Event) {
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&event).await {
                warn!("Alert for event {} dropped: {}", event.id, e);
            }
        });
    }
}
