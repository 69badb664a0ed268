// Flags recorded listings that a customer responded to.

use crate::isolated_tab::IsolatedTab;
use crate::site::{InvitationCategory, Marketplace};

use anyhow::{Context, Result};
use gigscout_common::repository::ListingRepository;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::TraceWriter;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub links: usize,
    /// Links that belong to a recorded listing (flag set or already set).
    pub marked: usize,
    /// Links with no recorded listing, e.g. listings found by hand.
    pub unknown: usize,
    pub failed: usize,
}

pub struct InvitationScanner {
    repository: Arc<dyn ListingRepository>,
    trace: Tracing,
}

impl InvitationScanner {
    pub fn new(repository: Arc<dyn ListingRepository>, trace: Tracing) -> Self {
        Self { repository, trace }
    }

    /// Visit the connections page in a secondary tab and set `invited` on
    /// every listing linked from it.
    pub async fn scan(&self, site: &dyn Marketplace) -> Result<ScanSummary> {
        let tab = IsolatedTab::open(site)
            .await
            .context("Failed to open a tab for the connections page")?;
        let result = self.scan_connections(site).await;
        tab.close_after(result).await
    }

    async fn scan_connections(&self, site: &dyn Marketplace) -> Result<ScanSummary> {
        site.open_connections()
            .await
            .context("Failed to open the connections page")?;

        let mut summary = ScanSummary::default();
        for category in InvitationCategory::ALL {
            let links = site
                .invitation_links(category)
                .await
                .with_context(|| format!("Failed to read {}", category))?;

            for url in links {
                summary.links += 1;
                match self.repository.mark_invited(&url).await {
                    Ok(true) => summary.marked += 1,
                    Ok(false) => {
                        summary.unknown += 1;
                        self.trace
                            .verbose(&format!("Invitation for unrecorded listing {}", url));
                    }
                    Err(e) => {
                        summary.failed += 1;
                        self.trace
                            .warning(&format!("Failed to mark {} as invited: {}", url, e));
                    }
                }
            }
        }

        self.trace.verbose(&format!(
            "Connections scan: {} links, {} recorded, {} unknown, {} failed",
            summary.links, summary.marked, summary.unknown, summary.failed
        ));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::fake::{FailMode, FakeMarketplace};
    use gigscout_common::listing::NewListing;
    use gigscout_common::repository::SqliteListingRepository;
    use gigscout_common::secret_masker::SecretMasker;
    use gigscout_common::tracing::{TraceManager, TraceSetting};

    fn scanner(repository: Arc<dyn ListingRepository>) -> InvitationScanner {
        let manager = TraceManager::with_setting(Arc::new(SecretMasker::new()), TraceSetting::default());
        InvitationScanner::new(repository, manager.get("InvitationScanner"))
    }

    async fn record(repo: &SqliteListingRepository, url: &str) {
        repo.insert(&NewListing {
            title: "нужен сантехник".into(),
            url: url.into(),
            description: String::new(),
            contact: String::new(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn marks_both_categories() {
        let repo = Arc::new(SqliteListingRepository::open_in_memory().unwrap());
        record(&repo, "https://x/1").await;
        record(&repo, "https://x/2").await;
        record(&repo, "https://x/3").await;
        let site = FakeMarketplace::new(vec![])
            .with_invitations(InvitationCategory::CustomerConnections, &["https://x/1"])
            .with_invitations(InvitationCategory::OrderCards, &["https://x/3", "https://x/404"]);

        let summary = scanner(repo.clone()).scan(&site).await.unwrap();

        assert_eq!(summary, ScanSummary { links: 3, marked: 2, unknown: 1, failed: 0 });
        let pending: Vec<String> = repo
            .pending_notifications()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.url)
            .collect();
        assert_eq!(pending, vec!["https://x/1", "https://x/3"]);
        assert_eq!(site.open_tabs(), 1);
    }

    #[tokio::test]
    async fn repeated_scans_are_idempotent() {
        let repo = Arc::new(SqliteListingRepository::open_in_memory().unwrap());
        record(&repo, "https://x/1").await;
        repo.mark_invited("https://x/1").await.unwrap();
        repo.mark_notified("https://x/1").await.unwrap();
        let site = FakeMarketplace::new(vec![])
            .with_invitations(InvitationCategory::OrderCards, &["https://x/1"]);

        let scanner = scanner(repo.clone());
        scanner.scan(&site).await.unwrap();
        scanner.scan(&site).await.unwrap();

        let listing = repo.find_by_url("https://x/1").await.unwrap().unwrap();
        assert!(listing.invited);
        assert!(listing.applied_notified);
        assert!(repo.pending_notifications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_failure_still_closes_tab() {
        let repo = Arc::new(SqliteListingRepository::open_in_memory().unwrap());
        let site = FakeMarketplace::new(vec![]);
        site.fail("open_connections", FailMode::Broken);

        assert!(scanner(repo).scan(&site).await.is_err());
        assert_eq!(site.count("close_tab"), 1);
        assert_eq!(site.focused_tab(), "main");
    }
}
