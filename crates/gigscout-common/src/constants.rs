// Shared enums, default values, and environment variable names.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Well-known files kept under the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownDataFile {
    /// Browser cookie export injected into every new session.
    Cookies,
    /// Operator-maintained keyword list.
    Keywords,
    /// SQLite database holding discovered listings.
    Database,
}

impl WellKnownDataFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            WellKnownDataFile::Cookies => "cookies.json",
            WellKnownDataFile::Keywords => "keywords.json",
            WellKnownDataFile::Database => "gigscout.db",
        }
    }
}

impl fmt::Display for WellKnownDataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// The reason the process is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    UserCancelled,
    OperatingSystemShutdown,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::UserCancelled => write!(f, "UserCancelled"),
            ShutdownReason::OperatingSystemShutdown => write!(f, "OperatingSystemShutdown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub mod defaults {
    use super::Duration;

    pub const DATA_DIRECTORY: &str = "data";
    pub const WEBDRIVER_URL: &str = "http://localhost:9515";
    pub const MARKETPLACE_URL: &str = "https://uslugi.yandex.ru/";
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

    /// Pause between two discovery + invitation cycles.
    pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(60);
    /// Pause between relay polls of the repository.
    pub const RELAY_INTERVAL: Duration = Duration::from_secs(10);
    /// Pause after tearing down a failed browser session.
    pub const RESTART_DELAY: Duration = Duration::from_secs(5);
    /// Upper bound for element waits (visibility / clickability).
    pub const ELEMENT_WAIT: Duration = Duration::from_secs(10);
    /// Fixed pause after navigation or clicks that trigger page loads.
    pub const PAGE_SETTLE: Duration = Duration::from_secs(3);

    pub const OFFER_PRICE_TYPE: &str = "за услугу";
    pub const OFFER_PRICE: u32 = 1000;
    pub const OFFER_MESSAGE: &str = "";
}

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

pub mod env {
    pub const DATA_DIR: &str = "GIGSCOUT_DATA_DIR";
    pub const DATABASE_PATH: &str = "GIGSCOUT_DATABASE_PATH";
    pub const WEBDRIVER_URL: &str = "GIGSCOUT_WEBDRIVER_URL";
    pub const HEADLESS: &str = "GIGSCOUT_HEADLESS";
    pub const MARKETPLACE_URL: &str = "GIGSCOUT_MARKETPLACE_URL";
    pub const TG_BOT_TOKEN: &str = "TG_BOT_TOKEN";
    pub const CHAT_ID: &str = "CHAT_ID";
    pub const TELEGRAM_API_URL: &str = "GIGSCOUT_TELEGRAM_API_URL";
    pub const DISCOVERY_INTERVAL_SECS: &str = "GIGSCOUT_DISCOVERY_INTERVAL_SECS";
    pub const RELAY_INTERVAL_SECS: &str = "GIGSCOUT_RELAY_INTERVAL_SECS";
    pub const RESTART_DELAY_SECS: &str = "GIGSCOUT_RESTART_DELAY_SECS";
    pub const ELEMENT_WAIT_SECS: &str = "GIGSCOUT_ELEMENT_WAIT_SECS";
    pub const PAGE_SETTLE_MS: &str = "GIGSCOUT_PAGE_SETTLE_MS";
    pub const OFFER_PRICE_TYPE: &str = "GIGSCOUT_OFFER_PRICE_TYPE";
    pub const OFFER_PRICE: &str = "GIGSCOUT_OFFER_PRICE";
    pub const OFFER_MESSAGE: &str = "GIGSCOUT_OFFER_MESSAGE";
    pub const PRINT_LOG_TO_STDOUT: &str = "GIGSCOUT_PRINT_LOG_TO_STDOUT";
}

// ---------------------------------------------------------------------------
// Return codes
// ---------------------------------------------------------------------------

pub mod return_code {
    pub const SUCCESS: i32 = 0;
    pub const TERMINATED_ERROR: i32 = 1;
    pub const INVALID_INPUT: i32 = 2;
}
