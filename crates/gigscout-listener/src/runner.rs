// Top-level orchestrator: dispatches CLI commands and, for `run`, wires the
// scraper worker, the relay and the operator bot onto their own tasks.

use crate::bot_listener::BotListener;
use crate::command_settings::{Command, KeywordsCommand, ListingsCommand};
use crate::relay::Relay;
use crate::session_supervisor::SessionSupervisor;
use crate::site::UslugiLauncher;

use anyhow::{Context, Result};
use gigscout_common::constants::{return_code, ShutdownReason, WellKnownDataFile};
use gigscout_common::host_context::HostContext;
use gigscout_common::keyword_store::KeywordStore;
use gigscout_common::notifier::create_notifier;
use gigscout_common::repository::{ListingRepository, SqliteListingRepository};
use gigscout_common::telegram::TelegramClient;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::TraceWriter;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct Runner {
    context: Arc<HostContext>,
    trace: Tracing,
}

impl Runner {
    pub fn new(context: Arc<HostContext>) -> Self {
        let trace = context.get_trace("Runner");
        Self { context, trace }
    }

    /// Execute `command`. Returns the process exit code.
    pub async fn execute(&self, command: Command) -> Result<i32> {
        self.trace.verbose(&format!("Command: {:?}", command));

        match command {
            Command::Run => self.run().await,
            Command::Keywords { action: KeywordsCommand::Show } => self.show_keywords(),
            Command::Keywords {
                action: KeywordsCommand::Set { list },
            } => self.set_keywords(&list),
            Command::Listings {
                action: ListingsCommand::Pending,
            } => self.show_pending().await,
        }
    }

    // -----------------------------------------------------------------------
    // run
    // -----------------------------------------------------------------------

    async fn run(&self) -> Result<i32> {
        let settings = self.context.settings();
        let database = self.context.data_file(WellKnownDataFile::Database);
        let repository: Arc<dyn ListingRepository> = Arc::new(
            SqliteListingRepository::open(&database)
                .with_context(|| format!("Failed to open the database '{}'", database.display()))?,
        );
        let notifier = create_notifier(&self.context)?;

        self.trace.info(&format!(
            "gigscout {} starting (data dir '{}', WebDriver {})",
            gigscout_sdk::Package::VERSION,
            settings.data_dir.display(),
            settings.webdriver_url
        ));

        self.listen_for_signals();

        let mut supervisor = SessionSupervisor::new(
            self.context.clone(),
            Arc::new(UslugiLauncher::from_settings(settings)),
            repository.clone(),
            notifier.clone(),
        );
        let scraper = tokio::spawn(async move { supervisor.run().await });

        let relay = Relay::new(self.context.clone(), repository, notifier);
        let relay = tokio::spawn(async move { relay.run().await });

        let bot = self.spawn_bot()?;

        let mut tasks: Vec<(&str, JoinHandle<()>)> = vec![("scraper", scraper), ("relay", relay)];
        if let Some(bot) = bot {
            tasks.push(("bot", bot));
        }

        let mut exit_code = return_code::SUCCESS;
        for (name, task) in tasks {
            if let Err(e) = task.await {
                self.trace.error(&format!("The {} task ended abnormally: {}", name, e));
                exit_code = return_code::TERMINATED_ERROR;
            }
        }

        self.trace.info(&format!(
            "gigscout stopped ({})",
            self.context
                .shutdown_reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "no reason recorded".to_string())
        ));
        Ok(exit_code)
    }

    /// The operator bot needs a token; without a chat id it still answers
    /// `/start` so the operator can find theirs.
    fn spawn_bot(&self) -> Result<Option<JoinHandle<()>>> {
        let settings = self.context.settings();
        let token = match settings.telegram_token.as_deref() {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                self.trace
                    .warning("No Telegram bot token configured; the operator bot is disabled");
                return Ok(None);
            }
        };

        let client = TelegramClient::new(&settings.telegram_api_url, token)?;
        let mut bot = BotListener::new(
            self.context.clone(),
            Arc::new(client),
            KeywordStore::new(self.context.data_file(WellKnownDataFile::Keywords)),
            settings.chat_id,
        );
        Ok(Some(tokio::spawn(async move { bot.run().await })))
    }

    fn listen_for_signals(&self) {
        let context = self.context.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Ctrl-C received, shutting down");
                    context.shutdown(ShutdownReason::UserCancelled);
                }
                Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let context = self.context.clone();
            tokio::spawn(async move {
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        tracing::info!("SIGTERM received, shutting down");
                        context.shutdown(ShutdownReason::OperatingSystemShutdown);
                    }
                    Err(e) => tracing::warn!("Failed to listen for SIGTERM: {}", e),
                }
            });
        }
    }

    // -----------------------------------------------------------------------
    // keywords / listings
    // -----------------------------------------------------------------------

    fn keyword_store(&self) -> KeywordStore {
        KeywordStore::new(self.context.data_file(WellKnownDataFile::Keywords))
    }

    fn show_keywords(&self) -> Result<i32> {
        let store = self.keyword_store();
        let keywords = store
            .load()
            .with_context(|| format!("Failed to read '{}'", store.path().display()))?;

        if keywords.is_empty() {
            println!("No keywords stored in '{}'.", store.path().display());
        }
        for keyword in keywords {
            println!("{}", keyword);
        }
        Ok(return_code::SUCCESS)
    }

    fn set_keywords(&self, input: &str) -> Result<i32> {
        match self.keyword_store().replace_from_input(input) {
            Ok(stored) => {
                println!("Stored {} keywords: {}", stored.len(), stored.join(", "));
                Ok(return_code::SUCCESS)
            }
            Err(e) => {
                eprintln!("Keyword list not changed: {}", e);
                Ok(return_code::INVALID_INPUT)
            }
        }
    }

    async fn show_pending(&self) -> Result<i32> {
        let database = self.context.data_file(WellKnownDataFile::Database);
        let repository = SqliteListingRepository::open(&database)
            .with_context(|| format!("Failed to open the database '{}'", database.display()))?;

        let pending = repository.pending_notifications().await?;
        if pending.is_empty() {
            println!("No listings waiting to be relayed.");
        }
        for listing in pending {
            println!(
                "#{}  {}  {}\n    {}",
                listing.id,
                listing.discovered_at.format("%Y-%m-%d %H:%M"),
                listing.url,
                listing.title
            );
        }
        Ok(return_code::SUCCESS)
    }
}
