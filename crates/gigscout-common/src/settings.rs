// Process settings, resolved from CLI flags with environment variable
// fallbacks (a `.env` file is loaded into the environment first).

use crate::constants::{defaults, env, WellKnownDataFile};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// The fixed offer submitted with every application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Label of the price-type menu item (e.g. "за услугу").
    pub price_type: String,
    pub price: u32,
    /// Optional cover message; empty leaves the text area untouched.
    pub message: String,
}

impl Default for Offer {
    fn default() -> Self {
        Self {
            price_type: defaults::OFFER_PRICE_TYPE.to_string(),
            price: defaults::OFFER_PRICE,
            message: defaults::OFFER_MESSAGE.to_string(),
        }
    }
}

/// All runtime settings.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding cookies.json, keywords.json and the database.
    #[arg(long, env = env::DATA_DIR, default_value = defaults::DATA_DIRECTORY)]
    pub data_dir: PathBuf,

    /// Explicit database path (defaults to <data_dir>/gigscout.db).
    #[arg(long, env = env::DATABASE_PATH)]
    pub database_path: Option<PathBuf>,

    /// WebDriver endpoint (chromedriver).
    #[arg(long, env = env::WEBDRIVER_URL, default_value = defaults::WEBDRIVER_URL)]
    pub webdriver_url: String,

    /// Run the browser headless.
    #[arg(long, env = env::HEADLESS, default_value_t = true, action = clap::ArgAction::Set)]
    pub headless: bool,

    /// Marketplace landing page.
    #[arg(long, env = env::MARKETPLACE_URL, default_value = defaults::MARKETPLACE_URL)]
    pub marketplace_url: String,

    /// Telegram bot token. Without it notifications only go to the log.
    #[arg(long, env = env::TG_BOT_TOKEN, hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Operator chat that receives notifications and may edit keywords.
    #[arg(long, env = env::CHAT_ID)]
    pub chat_id: Option<i64>,

    /// Telegram Bot API root.
    #[arg(long, env = env::TELEGRAM_API_URL, default_value = defaults::TELEGRAM_API_URL)]
    pub telegram_api_url: String,

    #[arg(long, env = env::DISCOVERY_INTERVAL_SECS, default_value_t = defaults::DISCOVERY_INTERVAL.as_secs())]
    pub discovery_interval_secs: u64,

    #[arg(long, env = env::RELAY_INTERVAL_SECS, default_value_t = defaults::RELAY_INTERVAL.as_secs())]
    pub relay_interval_secs: u64,

    #[arg(long, env = env::RESTART_DELAY_SECS, default_value_t = defaults::RESTART_DELAY.as_secs())]
    pub restart_delay_secs: u64,

    #[arg(long, env = env::ELEMENT_WAIT_SECS, default_value_t = defaults::ELEMENT_WAIT.as_secs())]
    pub element_wait_secs: u64,

    #[arg(long, env = env::PAGE_SETTLE_MS, default_value_t = defaults::PAGE_SETTLE.as_millis() as u64)]
    pub page_settle_ms: u64,

    #[arg(long, env = env::OFFER_PRICE_TYPE, default_value = defaults::OFFER_PRICE_TYPE)]
    pub offer_price_type: String,

    #[arg(long, env = env::OFFER_PRICE, default_value_t = defaults::OFFER_PRICE)]
    pub offer_price: u32,

    #[arg(long, env = env::OFFER_MESSAGE, default_value = defaults::OFFER_MESSAGE)]
    pub offer_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIRECTORY),
            database_path: None,
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            headless: true,
            marketplace_url: defaults::MARKETPLACE_URL.to_string(),
            telegram_token: None,
            chat_id: None,
            telegram_api_url: defaults::TELEGRAM_API_URL.to_string(),
            discovery_interval_secs: defaults::DISCOVERY_INTERVAL.as_secs(),
            relay_interval_secs: defaults::RELAY_INTERVAL.as_secs(),
            restart_delay_secs: defaults::RESTART_DELAY.as_secs(),
            element_wait_secs: defaults::ELEMENT_WAIT.as_secs(),
            page_settle_ms: defaults::PAGE_SETTLE.as_millis() as u64,
            offer_price_type: defaults::OFFER_PRICE_TYPE.to_string(),
            offer_price: defaults::OFFER_PRICE,
            offer_message: defaults::OFFER_MESSAGE.to_string(),
        }
    }
}

impl Settings {
    /// Path of a well-known data file. The database honours `database_path`.
    pub fn data_file(&self, file: WellKnownDataFile) -> PathBuf {
        match (file, &self.database_path) {
            (WellKnownDataFile::Database, Some(path)) => path.clone(),
            _ => self.data_dir.join(file.file_name()),
        }
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    pub fn relay_interval(&self) -> Duration {
        Duration::from_secs(self.relay_interval_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn offer(&self) -> Offer {
        Offer {
            price_type: self.offer_price_type.clone(),
            price: self.offer_price,
            message: self.offer_message.clone(),
        }
    }

    /// Whether both halves of the Telegram configuration are present.
    pub fn telegram_configured(&self) -> bool {
        self.telegram_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
            && self.chat_id.is_some()
    }
}
