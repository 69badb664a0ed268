// Operator bot: long-polls Telegram for commands.
//
//   /start          reply with the caller's chat id
//   /edit_keywords  (operator chat only) show the list and wait for a new one
//   /cancel         drop a pending keyword edit

use crate::error_throttler::ErrorThrottler;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gigscout_common::host_context::HostContext;
use gigscout_common::keyword_store::KeywordStore;
use gigscout_common::telegram::{Message, TelegramClient, Update};
use gigscout_common::tracing::Tracing;
use gigscout_sdk::{StringUtil, TraceWriter};
use std::sync::Arc;
use std::time::Duration;

/// Server-side long-poll timeout for `getUpdates`.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// The part of the Bot API the listener uses.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        TelegramClient::get_updates(self, offset, timeout).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        TelegramClient::send_message(self, chat_id, text).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BotCommand {
    Start,
    EditKeywords,
    Cancel,
}

/// Parse a leading `/command` or `/command@botname`.
fn parse_command(text: &str) -> Option<BotCommand> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name {
        "start" => Some(BotCommand::Start),
        "edit_keywords" => Some(BotCommand::EditKeywords),
        "cancel" => Some(BotCommand::Cancel),
        _ => None,
    }
}

pub struct BotListener {
    context: Arc<HostContext>,
    api: Arc<dyn BotApi>,
    keywords: KeywordStore,
    operator_chat: Option<i64>,
    trace: Tracing,
    offset: i64,
    /// The operator asked to edit keywords; their next text is the new list.
    editing: bool,
}

impl BotListener {
    pub fn new(
        context: Arc<HostContext>,
        api: Arc<dyn BotApi>,
        keywords: KeywordStore,
        operator_chat: Option<i64>,
    ) -> Self {
        let trace = context.get_trace("BotListener");
        Self {
            context,
            api,
            keywords,
            operator_chat,
            trace,
            offset: 0,
            editing: false,
        }
    }

    /// Poll for updates until shutdown. Poll errors back off exponentially.
    pub async fn run(&mut self) {
        let cancel = self.context.shutdown_token();
        let mut throttler = ErrorThrottler::new();

        self.skip_backlog().await;
        self.trace.info("Bot started");

        loop {
            let polled = tokio::select! {
                polled = self.api.get_updates(self.offset, POLL_TIMEOUT) => polled,
                _ = cancel.cancelled() => break,
            };

            match polled {
                Ok(updates) => {
                    throttler.reset();
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    self.trace.warning(&format!("Telegram poll failed: {:#}", e));
                    if !throttler.increment_and_wait(cancel.clone()).await {
                        break;
                    }
                }
            }
        }

        self.trace.info("Bot stopped");
    }

    /// Drop updates that queued up while the bot was offline.
    async fn skip_backlog(&mut self) {
        match self.api.get_updates(-1, Duration::ZERO).await {
            Ok(updates) => {
                if let Some(last) = updates.last() {
                    self.offset = last.update_id + 1;
                    self.trace
                        .verbose(&format!("Skipped backlog up to update {}", last.update_id));
                }
            }
            Err(e) => self
                .trace
                .warning(&format!("Failed to skip the update backlog: {:#}", e)),
        }
    }

    pub async fn handle_update(&mut self, update: Update) {
        self.offset = self.offset.max(update.update_id + 1);
        let Some(message) = update.message else {
            return;
        };
        if let Err(e) = self.handle_message(&message).await {
            self.trace.warning(&format!(
                "Failed to handle a message from chat {}: {:#}",
                message.chat.id, e
            ));
        }
    }

    async fn handle_message(&mut self, message: &Message) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        match parse_command(text) {
            Some(BotCommand::Start) => {
                let reply = format!(
                    "Hi! Your chat id is <code>{}</code>. Send /edit_keywords to change the keyword list.",
                    chat_id
                );
                self.api.send_message(chat_id, &reply).await
            }
            Some(BotCommand::EditKeywords) => self.begin_edit(chat_id).await,
            Some(BotCommand::Cancel) => {
                if self.is_operator(chat_id) && self.editing {
                    self.editing = false;
                    self.api.send_message(chat_id, "Keyword edit cancelled.").await?;
                }
                Ok(())
            }
            None if self.editing && self.is_operator(chat_id) => self.finish_edit(chat_id, text).await,
            None => Ok(()),
        }
    }

    fn is_operator(&self, chat_id: i64) -> bool {
        self.operator_chat == Some(chat_id)
    }

    async fn begin_edit(&mut self, chat_id: i64) -> Result<()> {
        if !self.is_operator(chat_id) {
            self.trace
                .warning(&format!("Keyword edit requested from foreign chat {}", chat_id));
            return self
                .api
                .send_message(chat_id, "Only the operator chat may edit keywords.")
                .await;
        }

        let current = self
            .keywords
            .load()
            .context("Failed to read the keyword list")?;
        self.api
            .send_message(
                chat_id,
                "Below is the current keyword list. Send the edited list, separating words with commas.",
            )
            .await?;
        let listing = if current.is_empty() {
            "(empty)".to_string()
        } else {
            StringUtil::escape_html(&current.join(","))
        };
        self.api.send_message(chat_id, &listing).await?;
        self.editing = true;
        Ok(())
    }

    async fn finish_edit(&mut self, chat_id: i64, text: &str) -> Result<()> {
        match self.keywords.replace_from_input(text) {
            Ok(stored) => {
                self.editing = false;
                self.trace
                    .info(&format!("Keyword list replaced ({} keywords)", stored.len()));
                self.api
                    .send_message(chat_id, "Done! The keyword list has been updated.")
                    .await
            }
            Err(e) => {
                self.trace.warning(&format!("Rejected keyword list: {}", e));
                self.api
                    .send_message(
                        chat_id,
                        "Something went wrong. Check the list, make sure the words are separated by commas, and send it again.",
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigscout_common::settings::Settings;
    use gigscout_common::telegram::Chat;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    const OPERATOR: i64 = 100;
    const STRANGER: i64 = 200;

    #[derive(Default)]
    struct FakeBotApi {
        batches: Mutex<VecDeque<Result<Vec<Update>>>>,
        sent: Mutex<Vec<(i64, String)>>,
        offsets: Mutex<Vec<i64>>,
    }

    impl FakeBotApi {
        fn sent_to(&self, chat_id: i64) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .filter(|(id, _)| *id == chat_id)
                .map(|(_, text)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl BotApi for FakeBotApi {
        async fn get_updates(&self, offset: i64, _timeout: Duration) -> Result<Vec<Update>> {
            self.offsets.lock().push(offset);
            let next = self.batches.lock().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    // Behave like an idle long poll.
                    tokio::time::sleep(POLL_TIMEOUT).await;
                    Ok(vec![])
                }
            }
        }

        async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
            self.sent.lock().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn update(id: i64, chat_id: i64, text: &str) -> Update {
        Update {
            update_id: id,
            message: Some(Message {
                message_id: id,
                chat: Chat { id: chat_id },
                text: Some(text.to_string()),
            }),
        }
    }

    fn listener(api: Arc<FakeBotApi>, dir: &tempfile::TempDir) -> (BotListener, KeywordStore) {
        let store = KeywordStore::new(dir.path().join("keywords.json"));
        let listener = BotListener::new(
            HostContext::new(Settings::default()),
            api,
            store.clone(),
            Some(OPERATOR),
        );
        (listener, store)
    }

    #[test]
    fn command_parsing() {
        assert_eq!(parse_command("/start"), Some(BotCommand::Start));
        assert_eq!(parse_command("/start@gigscout_bot payload"), Some(BotCommand::Start));
        assert_eq!(parse_command("/edit_keywords"), Some(BotCommand::EditKeywords));
        assert_eq!(parse_command("сантехник, электрик"), None);
        assert_eq!(parse_command("/unknown"), None);
    }

    #[tokio::test]
    async fn start_replies_with_chat_id() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        let (mut bot, _) = listener(api.clone(), &dir);

        bot.handle_update(update(1, STRANGER, "/start")).await;

        let replies = api.sent_to(STRANGER);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("200"));
        assert_eq!(bot.offset, 2);
    }

    #[tokio::test]
    async fn operator_replaces_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        let (mut bot, store) = listener(api.clone(), &dir);
        store.replace_from_input("сантехник").unwrap();

        bot.handle_update(update(1, OPERATOR, "/edit_keywords")).await;
        assert!(api.sent_to(OPERATOR).contains(&"сантехник".to_string()));

        bot.handle_update(update(2, OPERATOR, "Электрик, сантехник")).await;

        assert_eq!(store.load().unwrap(), vec!["электрик", "сантехник"]);
        assert!(!bot.editing);
    }

    #[tokio::test]
    async fn invalid_list_keeps_edit_armed() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        let (mut bot, store) = listener(api.clone(), &dir);
        store.replace_from_input("сантехник").unwrap();

        bot.handle_update(update(1, OPERATOR, "/edit_keywords")).await;
        bot.handle_update(update(2, OPERATOR, " , , ")).await;

        assert!(bot.editing);
        assert_eq!(store.load().unwrap(), vec!["сантехник"]);

        bot.handle_update(update(3, OPERATOR, "плиточник")).await;
        assert!(!bot.editing);
        assert_eq!(store.load().unwrap(), vec!["плиточник"]);
    }

    #[tokio::test]
    async fn foreign_chat_cannot_edit() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        let (mut bot, store) = listener(api.clone(), &dir);
        store.replace_from_input("сантехник").unwrap();

        bot.handle_update(update(1, STRANGER, "/edit_keywords")).await;
        bot.handle_update(update(2, STRANGER, "спам")).await;

        assert!(!bot.editing);
        assert_eq!(store.load().unwrap(), vec!["сантехник"]);
        assert_eq!(api.sent_to(STRANGER).len(), 1);
    }

    #[tokio::test]
    async fn plain_text_without_edit_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        let (mut bot, store) = listener(api.clone(), &dir);

        bot.handle_update(update(1, OPERATOR, "привет")).await;

        assert!(api.sent.lock().is_empty());
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_skips_backlog_and_advances_offset() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeBotApi::default());
        {
            let mut batches = api.batches.lock();
            batches.push_back(Ok(vec![update(41, OPERATOR, "/start")]));
            batches.push_back(Err(anyhow::anyhow!("connection reset")));
            batches.push_back(Ok(vec![update(42, STRANGER, "/start")]));
        }
        let (mut bot, _) = listener(api.clone(), &dir);
        let context = bot.context.clone();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(120)).await;
            context.shutdown(gigscout_common::ShutdownReason::UserCancelled);
        });
        bot.run().await;
        stopper.await.unwrap();

        let offsets = api.offsets.lock().clone();
        assert_eq!(&offsets[..4], &[-1, 42, 42, 43]);
        // The backlog /start from the operator was never answered.
        assert!(api.sent_to(OPERATOR).is_empty());
        assert_eq!(api.sent_to(STRANGER).len(), 1);
    }
}
