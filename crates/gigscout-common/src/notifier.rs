// One-way operator notifications.

use crate::host_context::HostContext;
use crate::telegram::TelegramClient;
use crate::tracing::Tracing;

use anyhow::Result;
use async_trait::async_trait;
use gigscout_sdk::TraceWriter;
use std::sync::Arc;

/// Delivers a human-readable message to the operator. One attempt, no retry;
/// callers decide what a failure means.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Sends to the operator chat through the Telegram Bot API (HTML parse mode).
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.client.send_message(self.chat_id, text).await
    }
}

/// Used when no bot is configured: messages only reach the log.
pub struct LogNotifier {
    trace: Tracing,
}

impl LogNotifier {
    pub fn new(trace: Tracing) -> Self {
        Self { trace }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.trace.info(&format!("[notification] {}", text));
        Ok(())
    }
}

/// Pick the notifier for the current settings.
pub fn create_notifier(context: &HostContext) -> Result<Arc<dyn Notifier>> {
    let settings = context.settings();
    match (settings.telegram_token.as_deref(), settings.chat_id) {
        (Some(token), Some(chat_id)) if settings.telegram_configured() => {
            let client = TelegramClient::new(&settings.telegram_api_url, token)?;
            Ok(Arc::new(TelegramNotifier::new(client, chat_id)))
        }
        _ => {
            let trace = context.get_trace("Notifier");
            trace.warning("Telegram is not configured; notifications go to the log only");
            Ok(Arc::new(LogNotifier::new(trace)))
        }
    }
}
