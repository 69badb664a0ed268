// The scraper worker: keeps one browser session alive and runs discovery
// and invitation passes on it.
//
//        launch + establish ok
//   Restarting ─────────────────────► Running
//       ▲                                │
//       └──── pass failed: quit, wait ───┘

use crate::applicator::Applicator;
use crate::invitation_scanner::{InvitationScanner, ScanSummary};
use crate::novelty_gate::NoveltyGate;
use crate::pagination_walker::{PaginationWalker, WalkSummary};
use crate::session_controller::SessionController;
use crate::site::{Marketplace, MarketplaceFactory};

use anyhow::{Context, Result};
use gigscout_common::constants::WellKnownDataFile;
use gigscout_common::host_context::HostContext;
use gigscout_common::keyword_store::KeywordStore;
use gigscout_common::notifier::Notifier;
use gigscout_common::repository::ListingRepository;
use gigscout_common::tracing::Tracing;
use gigscout_sdk::{StringUtil, TraceWriter};
use std::sync::Arc;

/// A browser session and the number of passes already run on it.
struct LiveSession {
    site: Box<dyn Marketplace>,
    passes: usize,
}

enum SessionState {
    Restarting,
    Running(LiveSession),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// `None` when the keyword list was empty and the feed was not read.
    pub walk: Option<WalkSummary>,
    pub scan: ScanSummary,
}

pub struct SessionSupervisor {
    context: Arc<HostContext>,
    factory: Arc<dyn MarketplaceFactory>,
    notifier: Arc<dyn Notifier>,
    controller: SessionController,
    keywords: KeywordStore,
    walker: PaginationWalker,
    gate: NoveltyGate,
    scanner: InvitationScanner,
    trace: Tracing,
}

impl SessionSupervisor {
    pub fn new(
        context: Arc<HostContext>,
        factory: Arc<dyn MarketplaceFactory>,
        repository: Arc<dyn ListingRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let settings = context.settings();
        let applicator = Applicator::new(settings.offer(), context.get_trace("Applicator"));

        Self {
            controller: SessionController::new(
                context.data_file(WellKnownDataFile::Cookies),
                context.get_trace("SessionController"),
            ),
            keywords: KeywordStore::new(context.data_file(WellKnownDataFile::Keywords)),
            walker: PaginationWalker::new(context.get_trace("PaginationWalker")),
            gate: NoveltyGate::new(repository.clone(), applicator, context.get_trace("NoveltyGate")),
            scanner: InvitationScanner::new(repository, context.get_trace("InvitationScanner")),
            trace: context.get_trace("SessionSupervisor"),
            context,
            factory,
            notifier,
        }
    }

    /// Run passes until shutdown. A failed pass tears the session down and
    /// a new one is established after the restart delay.
    pub async fn run(&mut self) {
        let cancel = self.context.shutdown_token();
        let discovery_interval = self.context.settings().discovery_interval();
        let restart_delay = self.context.settings().restart_delay();

        let mut state = SessionState::Restarting;
        while !cancel.is_cancelled() {
            let (next, keep_going) = match state {
                SessionState::Restarting => match self.start_session().await {
                    Ok(site) => (SessionState::Running(LiveSession { site, passes: 0 }), true),
                    Err(e) => {
                        self.trace.error_chain("Failed to establish a browser session", &e);
                        self.report(&e).await;
                        let keep_going = self.context.delay(restart_delay).await;
                        (SessionState::Restarting, keep_going)
                    }
                },
                SessionState::Running(mut session) => {
                    match self.run_pass(session.site.as_ref(), session.passes).await {
                        Ok(_) => {
                            session.passes += 1;
                            let keep_going = self.context.delay(discovery_interval).await;
                            (SessionState::Running(session), keep_going)
                        }
                        Err(e) => {
                            self.trace
                                .error_chain("Pass failed; restarting the browser session", &e);
                            self.report(&e).await;
                            self.quit(session.site.as_ref()).await;
                            let keep_going = self.context.delay(restart_delay).await;
                            (SessionState::Restarting, keep_going)
                        }
                    }
                }
            };

            state = next;
            if !keep_going {
                break;
            }
        }

        if let SessionState::Running(session) = state {
            self.quit(session.site.as_ref()).await;
        }
        self.trace.info(&format!(
            "Scraper stopped ({} listings recorded)",
            self.gate.recorded()
        ));
    }

    async fn start_session(&self) -> Result<Box<dyn Marketplace>> {
        let site = self
            .factory
            .launch()
            .await
            .context("Failed to start a browser session")?;

        if let Err(e) = self.controller.establish(site.as_ref()).await {
            self.quit(site.as_ref()).await;
            return Err(e);
        }
        Ok(site)
    }

    /// One discovery pass followed by one invitation pass.
    ///
    /// The keyword list is re-read every pass so operator edits apply
    /// without a restart.
    pub async fn run_pass(&mut self, site: &dyn Marketplace, previous_passes: usize) -> Result<PassSummary> {
        if previous_passes > 0 {
            site.back_to_feed()
                .await
                .context("Failed to reload the order feed")?;
        }

        let keywords = self.keywords.load().context("Failed to read the keyword list")?;
        let walk = if keywords.is_empty() {
            self.trace.warning(&format!(
                "The keyword list '{}' is empty; skipping discovery. Set keywords with /edit_keywords or `gigscout keywords set`",
                self.keywords.path().display()
            ));
            None
        } else {
            let summary = self.walker.walk(site, &keywords, &mut self.gate).await?;
            Some(summary)
        };

        let scan = self.scanner.scan(site).await?;

        if let Some(walk) = &walk {
            self.trace.info(&format!(
                "Pass done: {} pages, {} matching, {} invitations",
                walk.pages, walk.matched, scan.marked
            ));
        }
        Ok(PassSummary { walk, scan })
    }

    async fn quit(&self, site: &dyn Marketplace) {
        if let Err(e) = site.quit().await {
            self.trace
                .warning(&format!("Failed to end the browser session: {}", e));
        }
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
