// A secondary browser tab that is closed on every exit path of the work
// done inside it.

use crate::site::{Marketplace, SiteError, TabHandle};
use anyhow::Result;

/// Opened with `open`, released with `close_after`. Async drop does not
/// exist, so callers must route every outcome through `close_after`.
#[must_use = "an isolated tab must be closed with close_after"]
pub struct IsolatedTab<'a> {
    site: &'a dyn Marketplace,
    primary: TabHandle,
}

impl<'a> IsolatedTab<'a> {
    /// Remember the focused tab, then open and focus a new one.
    pub async fn open(site: &'a dyn Marketplace) -> Result<IsolatedTab<'a>, SiteError> {
        let primary = site.current_tab().await?;
        site.open_tab().await?;
        Ok(Self { site, primary })
    }

    /// Close the tab, refocus the primary one, and hand back `result`.
    ///
    /// The work's own error wins over a close failure.
    pub async fn close_after<T>(self, result: Result<T>) -> Result<T> {
        let closed = self.site.close_tab(&self.primary).await;
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close)) => {
                Err(anyhow::Error::new(close).context("Failed to close the secondary tab"))
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close)) => Err(e.context(format!("closing the secondary tab also failed: {}", close))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::fake::{FailMode, FakeMarketplace};

    #[tokio::test]
    async fn closes_after_success() {
        let site = FakeMarketplace::new(vec![]);
        let tab = IsolatedTab::open(&site).await.unwrap();
        assert_eq!(site.open_tabs(), 2);

        let value = tab.close_after(Ok(7)).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(site.open_tabs(), 1);
        assert_eq!(site.focused_tab(), "main");
    }

    #[tokio::test]
    async fn closes_after_failure_and_keeps_error() {
        let site = FakeMarketplace::new(vec![]);
        let tab = IsolatedTab::open(&site).await.unwrap();

        let err = tab
            .close_after::<()>(Err(anyhow::anyhow!("listing page did not load")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("listing page did not load"));
        assert_eq!(site.open_tabs(), 1);
        assert_eq!(site.focused_tab(), "main");
    }

    #[tokio::test]
    async fn close_failure_surfaces_when_work_succeeded() {
        let site = FakeMarketplace::new(vec![]);
        let tab = IsolatedTab::open(&site).await.unwrap();
        site.fail("close_tab", FailMode::Broken);

        assert!(tab.close_after(Ok(())).await.is_err());
    }
}
