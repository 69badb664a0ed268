// The marketplace as a page object. Everything that knows about selectors
// and page layout lives behind `Marketplace`; the discovery logic only
// talks to this trait.

mod uslugi;

pub use uslugi::{UslugiLauncher, UslugiMarketplace};

use anyhow::Result;
use async_trait::async_trait;
use gigscout_common::settings::Offer;
use gigscout_common::webdriver::{RawCookie, WebDriverError};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// An expected element is not on the page.
    #[error("missing element: {0}")]
    MissingElement(String),

    /// An element did not become visible or clickable within the wait budget.
    #[error("timed out after {}s waiting for {what}", timeout.as_secs_f64())]
    Timeout { what: String, timeout: Duration },

    /// A navigation target could not be built from the configured base URL.
    #[error("invalid marketplace URL: {0}")]
    InvalidUrl(String),

    /// The browser session itself failed.
    #[error("browser driver failure: {0}")]
    Driver(#[source] WebDriverError),
}

impl SiteError {
    /// Whether this is the "control not there" kind of failure rather than
    /// a broken session.
    pub fn is_missing_element(&self) -> bool {
        match self {
            SiteError::MissingElement(_) | SiteError::Timeout { .. } => true,
            SiteError::Driver(e) => e.is_missing_element(),
            SiteError::InvalidUrl(_) => false,
        }
    }
}

impl From<WebDriverError> for SiteError {
    fn from(err: WebDriverError) -> Self {
        match err {
            WebDriverError::NoSuchElement(what) => SiteError::MissingElement(what),
            WebDriverError::Timeout { what, timeout } => SiteError::Timeout { what, timeout },
            other => SiteError::Driver(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Page data
// ---------------------------------------------------------------------------

/// Opaque handle to one listing card on the current feed page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardId(pub String);

/// Handle of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHandle(pub String);

/// The card fields read only once the title matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub url: String,
    pub description: String,
    pub contact: String,
}

/// The two kinds of cards on the connections page that mean a customer
/// reacted to one of our offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationCategory {
    /// Customer opened a chat with us.
    CustomerConnections,
    /// Customer invited us to an order.
    OrderCards,
}

impl InvitationCategory {
    pub const ALL: [InvitationCategory; 2] = [
        InvitationCategory::CustomerConnections,
        InvitationCategory::OrderCards,
    ];
}

impl std::fmt::Display for InvitationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationCategory::CustomerConnections => write!(f, "customer connections"),
            InvitationCategory::OrderCards => write!(f, "order cards"),
        }
    }
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// One live browser session on the marketplace.
#[async_trait]
pub trait Marketplace: Send + Sync {
    // Session setup -------------------------------------------------------

    async fn maximize(&self) -> Result<(), SiteError>;
    async fn open_home(&self) -> Result<(), SiteError>;
    async fn add_cookie(&self, cookie: RawCookie) -> Result<(), SiteError>;
    async fn reload(&self) -> Result<(), SiteError>;
    async fn open_cabinet(&self) -> Result<(), SiteError>;
    /// Click the "order search" link, which carries our category filters.
    async fn open_order_search(&self) -> Result<(), SiteError>;
    /// Set the response-count filter to "any".
    async fn show_all_orders(&self) -> Result<(), SiteError>;

    // Feed -----------------------------------------------------------------

    /// Wait (bounded) until the cards of the current page are visible.
    async fn wait_for_cards(&self) -> Result<Vec<CardId>, SiteError>;
    async fn card_title(&self, card: &CardId) -> Result<String, SiteError>;
    async fn card_details(&self, card: &CardId) -> Result<CardDetails, SiteError>;
    /// Click "next page". Returns `false` when there is no next page.
    async fn next_page(&self) -> Result<bool, SiteError>;
    /// Return to the first feed page.
    async fn back_to_feed(&self) -> Result<(), SiteError>;

    // Tabs -----------------------------------------------------------------

    async fn current_tab(&self) -> Result<TabHandle, SiteError>;
    /// Open a blank tab and focus it.
    async fn open_tab(&self) -> Result<TabHandle, SiteError>;
    /// Close the focused tab and focus `primary`.
    async fn close_tab(&self, primary: &TabHandle) -> Result<(), SiteError>;

    // Listing page ----------------------------------------------------------

    async fn open_listing(&self, url: &str) -> Result<(), SiteError>;
    async fn submit_offer(&self, offer: &Offer) -> Result<(), SiteError>;

    // Connections page ----------------------------------------------------

    async fn open_connections(&self) -> Result<(), SiteError>;
    /// Listing URLs of every card of the given category.
    async fn invitation_links(&self, category: InvitationCategory) -> Result<Vec<String>, SiteError>;

    /// End the browser session.
    async fn quit(&self) -> Result<(), SiteError>;
}

/// Starts fresh browser sessions for the supervisor.
#[async_trait]
pub trait MarketplaceFactory: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Marketplace>>;
}

#[cfg(test)]
pub(crate) mod fake;
