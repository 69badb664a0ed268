// Forwards invited listings to the operator, one at a time.

use anyhow::{Context, Result};
use gigscout_common::host_context::HostContext;
use gigscout_common::notifier::Notifier;
use gigscout_common::repository::ListingRepository;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::{StringUtil, TraceWriter};
use std::sync::Arc;

pub struct Relay {
    context: Arc<HostContext>,
    repository: Arc<dyn ListingRepository>,
    notifier: Arc<dyn Notifier>,
    trace: Tracing,
}

impl Relay {
    pub fn new(
        context: Arc<HostContext>,
        repository: Arc<dyn ListingRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let trace = context.get_trace("Relay");
        Self {
            context,
            repository,
            notifier,
            trace,
        }
    }

    /// Poll until shutdown. Failures are reported and retried on the next poll.
    pub async fn run(&self) {
        let interval = self.context.settings().relay_interval();
        self.trace.info(&format!(
            "Relay started (polling every {}s)",
            interval.as_secs()
        ));

        loop {
            if let Err(e) = self.poll_once().await {
                self.trace.error_chain("Relay poll failed", &e);
                self.report(&e).await;
            }

            if !self.context.delay(interval).await {
                break;
            }
        }

        self.trace.info("Relay stopped");
    }

    /// Send every pending listing and flag it. Returns how many were sent.
    ///
    /// A listing is flagged only after its message went out; the first
    /// failure ends the batch.
    pub async fn poll_once(&self) -> Result<usize> {
        let pending = self
            .repository
            .pending_notifications()
            .await
            .context("Failed to load pending listings")?;

        let mut sent = 0;
        for listing in pending {
            self.notifier
                .send(&listing.invitation_message())
                .await
                .with_context(|| format!("Failed to notify about {}", listing.url))?;
            self.repository
                .mark_notified(&listing.url)
                .await
                .with_context(|| format!("Failed to flag {} as notified", listing.url))?;
            sent += 1;
            self.trace.info(&format!("Operator notified about {}", listing.url));
        }
        Ok(sent)
    }

    async fn report(&self, err: &anyhow::Error) {
        let text = format!(
            "Error: {}. See the log for details",
            StringUtil::escape_html(&format!("{:#}", err))
        );
        if let Err(e) = self.notifier.send(&text).await {
            self.trace
                .warning(&format!("Failed to report the error to the operator: {:#}", e));
        }
    }
}
