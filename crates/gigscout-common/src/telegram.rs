// Minimal Telegram Bot API client: `sendMessage` and long-poll `getUpdates`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::http_client_factory::HttpClientFactory;

/// Extra time allowed on top of the long-poll timeout before the HTTP
/// request itself is abandoned.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

// ---------------------------------------------------------------------------
// TelegramClient
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    bot_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http = HttpClientFactory::create_client(Duration::from_secs(30))?;
        Ok(Self {
            http,
            bot_url: format!("{}/bot{}", gigscout_sdk::UrlUtil::trim_trailing_slash(api_url), token),
        })
    }

    /// Send an HTML-formatted message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let _: Message = self.call("sendMessage", &request, None).await?;
        Ok(())
    }

    /// Long-poll for updates with `update_id >= offset`. Returns an empty
    /// list when the poll timeout passes without news.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request, Some(timeout + LONG_POLL_GRACE))
            .await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{}", self.bot_url, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // reqwest errors carry the request URL, which embeds the bot token.
        let response = request
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Telegram {} request failed", method))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to read Telegram {} response", method))?;

        parse_api_response(method, status.as_u16(), &text)
    }
}

fn parse_api_response<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T> {
    let parsed: ApiResponse<T> = serde_json::from_str(body).with_context(|| {
        format!(
            "Telegram {} returned HTTP {} with an unreadable body: {}",
            method,
            status,
            gigscout_sdk::StringUtil::substring_prefix(body, 200)
        )
    })?;

    if !parsed.ok {
        return Err(anyhow::anyhow!(
            "Telegram {} failed ({}): {}",
            method,
            parsed.error_code.unwrap_or(i64::from(status)),
            parsed.description.unwrap_or_else(|| "no description".to_string())
        ));
    }

    parsed
        .result
        .ok_or_else(|| anyhow::anyhow!("Telegram {} response has no result", method))
}
