// Listing records as discovered on the marketplace and as stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A listing scraped from a feed card, before it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewListing {
    /// Lower-cased card title.
    pub title: String,
    /// Detail page URL; the natural key.
    pub url: String,
    pub description: String,
    pub contact: String,
}

/// A recorded listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub contact: String,
    /// The customer invited us or opened a chat. Only ever goes false → true.
    pub invited: bool,
    /// The operator has been told about the invitation. Only ever goes false → true.
    pub applied_notified: bool,
    pub discovered_at: DateTime<Utc>,
}

impl Listing {
    /// Operator-facing notification text for an invited listing, in
    /// Telegram HTML.
    pub fn invitation_message(&self) -> String {
        format!(
            "New order.\nTo do: {}\nLink: {}",
            gigscout_sdk::StringUtil::escape_html(&self.title),
            gigscout_sdk::StringUtil::escape_html(&self.url),
        )
    }
}
