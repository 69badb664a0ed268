// gigscout-common: Shared services for gigscout.
// Depends on `gigscout-sdk` and provides the host context, settings, the
// WebDriver client, listing storage, the keyword store and notifications.

pub mod constants;
pub mod host_context;
pub mod http_client_factory;
pub mod keyword_store;
pub mod listing;
pub mod notifier;
pub mod repository;
pub mod secret_masker;
pub mod settings;
pub mod telegram;
pub mod tracing;
pub mod webdriver;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use crate::constants::{ShutdownReason, WellKnownDataFile};
pub use crate::host_context::HostContext;
pub use crate::http_client_factory::HttpClientFactory;
pub use crate::keyword_store::{parse_keyword_list, KeywordError, KeywordStore};
pub use crate::listing::{Listing, NewListing};
pub use crate::notifier::{create_notifier, LogNotifier, Notifier, TelegramNotifier};
pub use crate::repository::{ListingRepository, RepositoryError, SqliteListingRepository};
pub use crate::secret_masker::SecretMasker;
pub use crate::settings::{Offer, Settings};
pub use crate::telegram::{TelegramClient, Update};
pub use crate::tracing::{TraceEventType, TraceManager, TraceSetting, Tracing};
