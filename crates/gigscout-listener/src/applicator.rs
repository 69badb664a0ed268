// Submits our offer on a freshly recorded listing.

use crate::isolated_tab::IsolatedTab;
use crate::site::Marketplace;

use anyhow::{Context, Result};
use gigscout_common::settings::Offer;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::TraceWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Submitted,
    /// A form control was missing; most often the offer was already sent
    /// by hand or in an earlier run whose database write was lost.
    ControlMissing,
}

pub struct Applicator {
    offer: Offer,
    trace: Tracing,
}

impl Applicator {
    pub fn new(offer: Offer, trace: Tracing) -> Self {
        Self { offer, trace }
    }

    /// Open the listing in its own tab and submit the configured offer.
    ///
    /// A missing control is logged and reported as `ControlMissing`; any
    /// other browser failure is returned. The tab is closed either way.
    pub async fn apply(&self, site: &dyn Marketplace, url: &str) -> Result<ApplyOutcome> {
        let tab = IsolatedTab::open(site)
            .await
            .context("Failed to open a tab for the offer")?;
        let result = self.fill_and_submit(site, url).await;
        tab.close_after(result).await
    }

    async fn fill_and_submit(&self, site: &dyn Marketplace, url: &str) -> Result<ApplyOutcome> {
        site.open_listing(url)
            .await
            .with_context(|| format!("Failed to open listing {}", url))?;

        match site.submit_offer(&self.offer).await {
            Ok(()) => {
                self.trace.info(&format!(
                    "Offer submitted for {} ({} {})",
                    url, self.offer.price, self.offer.price_type
                ));
                Ok(ApplyOutcome::Submitted)
            }
            Err(e) if e.is_missing_element() => {
                self.trace.warning(&format!(
                    "Could not submit an offer for {}: {}. An offer was probably sent already",
                    url, e
                ));
                Ok(ApplyOutcome::ControlMissing)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to submit an offer for {}", url)),
        }
    }
}
