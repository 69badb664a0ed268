// Records listings as new and triggers the offer for the ones that are.
//
// The repository's UNIQUE constraint on the URL decides novelty; there is
// no "exists?" query before the insert.

use crate::applicator::{ApplyOutcome, Applicator};
use crate::pagination_walker::{ListingSink, WalkControl};
use crate::site::Marketplace;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gigscout_common::listing::{Listing, NewListing};
use gigscout_common::repository::{ListingRepository, RepositoryError};
use gigscout_common::tracing::Tracing;
use gigscout_sdk::TraceWriter;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Novelty {
    /// First sighting; the row was written and the offer attempted.
    Recorded(Listing, ApplyOutcome),
    /// Already recorded. Nothing was written and nothing applied.
    Duplicate,
}

pub struct NoveltyGate {
    repository: Arc<dyn ListingRepository>,
    applicator: Applicator,
    trace: Tracing,
    recorded: usize,
}

impl NoveltyGate {
    pub fn new(repository: Arc<dyn ListingRepository>, applicator: Applicator, trace: Tracing) -> Self {
        Self {
            repository,
            applicator,
            trace,
            recorded: 0,
        }
    }

    /// Listings recorded by this gate so far.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Insert `listing`; on success apply to it before returning.
    ///
    /// Storage failures other than the uniqueness violation are returned
    /// as errors and nothing is applied.
    pub async fn try_record(&mut self, site: &dyn Marketplace, listing: &NewListing) -> Result<Novelty> {
        let recorded = match self.repository.insert(listing).await {
            Ok(recorded) => recorded,
            Err(RepositoryError::UniqueViolation { .. }) => return Ok(Novelty::Duplicate),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to record listing {}", listing.url))
            }
        };

        self.recorded += 1;
        self.trace.info(&format!(
            "New listing #{}: '{}' {}",
            recorded.id, recorded.title, recorded.url
        ));

        let outcome = self.applicator.apply(site, &recorded.url).await?;
        Ok(Novelty::Recorded(recorded, outcome))
    }
}

#[async_trait]
impl ListingSink for NoveltyGate {
    async fn accept(&mut self, site: &dyn Marketplace, listing: NewListing) -> Result<WalkControl> {
        match self.try_record(site, &listing).await? {
            Novelty::Recorded(..) => Ok(WalkControl::Continue),
            Novelty::Duplicate => Ok(WalkControl::Stop),
        }
    }
}
