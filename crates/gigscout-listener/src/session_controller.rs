// Brings a fresh browser session to the filtered order feed.

use crate::site::Marketplace;

use anyhow::{Context, Result};
use gigscout_common::tracing::Tracing;
use gigscout_common::webdriver::{load_cookie_file, normalize_cookie};
use gigscout_sdk::TraceWriter;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieReport {
    /// The cookie cache was absent; the session runs logged out.
    pub missing_file: bool,
    pub injected: usize,
    pub skipped: usize,
}

pub struct SessionController {
    cookie_path: PathBuf,
    trace: Tracing,
}

impl SessionController {
    pub fn new(cookie_path: PathBuf, trace: Tracing) -> Self {
        Self { cookie_path, trace }
    }

    /// Navigate a new session to the order feed with the response filter
    /// set to "any". Any failure other than a bad cookie aborts the attempt.
    pub async fn establish(&self, site: &dyn Marketplace) -> Result<CookieReport> {
        site.maximize().await.context("Failed to maximize the browser window")?;
        site.open_home().await.context("Failed to open the marketplace")?;

        let report = self.inject_cookies(site).await?;

        site.reload().await.context("Failed to reload after cookie injection")?;
        site.open_cabinet().await.context("Failed to open the personal cabinet")?;
        site.open_order_search()
            .await
            .context("Failed to open the order search")?;
        site.show_all_orders()
            .await
            .context("Failed to set the response-count filter")?;

        self.trace.info(&format!(
            "Session established ({} cookies injected, {} skipped)",
            report.injected, report.skipped
        ));
        Ok(report)
    }

    /// Inject the cached cookies one by one; a record that is not an object,
    /// cannot be normalized or is refused by the browser is skipped.
    pub async fn inject_cookies(&self, site: &dyn Marketplace) -> Result<CookieReport> {
        let mut report = CookieReport::default();

        let cookies = match load_cookie_file(&self.cookie_path)? {
            Some(cookies) => cookies,
            None => {
                self.trace.warning(&format!(
                    "Cookie file '{}' not found; continuing without a login. Export the marketplace cookies to that file to log in",
                    self.cookie_path.display()
                ));
                report.missing_file = true;
                return Ok(report);
            }
        };

        for (index, raw) in cookies.into_iter().enumerate() {
            let cookie = match normalize_cookie(raw) {
                Ok(cookie) => cookie,
                Err(e) => {
                    report.skipped += 1;
                    self.trace.warning(&format!("Skipping cookie #{}: {}", index, e));
                    continue;
                }
            };

            let name = cookie
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            match site.add_cookie(cookie).await {
                Ok(()) => report.injected += 1,
                Err(e) => {
                    report.skipped += 1;
                    self.trace
                        .warning(&format!("Failed to add cookie '{}': {}", name, e));
                }
            }
        }

        Ok(report)
    }
}
