// Walks the listing feed page by page, newest first.

use crate::matcher;
use crate::site::Marketplace;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gigscout_common::listing::NewListing;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::{StringUtil, TraceWriter};

/// What the walker should do after handing over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Stop the walk at once; no further cards or pages are read.
    Stop,
}

/// Receives every matching listing in feed order.
#[async_trait]
pub trait ListingSink: Send {
    async fn accept(&mut self, site: &dyn Marketplace, listing: NewListing) -> Result<WalkControl>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub cards: usize,
    pub matched: usize,
    /// The sink asked to stop (a known listing was reached).
    pub stopped: bool,
}

pub struct PaginationWalker {
    trace: Tracing,
}

impl PaginationWalker {
    pub fn new(trace: Tracing) -> Self {
        Self { trace }
    }

    /// Feed every keyword-matching card to `sink` until it answers `Stop`
    /// or the last page is done. A card wait timeout fails the walk.
    pub async fn walk(
        &self,
        site: &dyn Marketplace,
        keywords: &[String],
        sink: &mut dyn ListingSink,
    ) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        loop {
            let cards = site
                .wait_for_cards()
                .await
                .with_context(|| format!("Listing cards of page {} did not show up", summary.pages + 1))?;
            summary.pages += 1;

            for card in &cards {
                summary.cards += 1;
                let title = site
                    .card_title(card)
                    .await
                    .context("Failed to read a card title")?
                    .to_lowercase();
                if !matcher::matches(&title, keywords) {
                    continue;
                }

                summary.matched += 1;
                let details = site
                    .card_details(card)
                    .await
                    .with_context(|| format!("Failed to read the card '{}'", title))?;
                let listing = NewListing {
                    title: StringUtil::normalize_whitespace(&title),
                    url: details.url,
                    description: StringUtil::normalize_whitespace(&details.description.to_lowercase()),
                    contact: StringUtil::normalize_whitespace(&details.contact.to_lowercase()),
                };

                if sink.accept(site, listing).await? == WalkControl::Stop {
                    summary.stopped = true;
                    self.trace.verbose(&format!(
                        "Reached a known listing on page {}; stopping the walk",
                        summary.pages
                    ));
                    return Ok(summary);
                }
            }

            if !site.next_page().await.context("Failed to open the next page")? {
                site.back_to_feed()
                    .await
                    .context("Failed to return to the first feed page")?;
                self.trace.verbose(&format!(
                    "Walked all {} pages ({} cards, {} matching)",
                    summary.pages, summary.cards, summary.matched
                ));
                return Ok(summary);
            }
        }
    }
}
