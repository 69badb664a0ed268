// Scriptable in-memory marketplace for unit tests.

use super::{CardDetails, CardId, InvitationCategory, Marketplace, MarketplaceFactory, SiteError, TabHandle};

use async_trait::async_trait;
use gigscout_common::settings::Offer;
use gigscout_common::webdriver::{RawCookie, WebDriverError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct FakeCard {
    pub title: String,
    pub url: String,
    pub description: String,
    pub contact: String,
}

impl FakeCard {
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            description: format!("Описание {}", url),
            contact: "Клиент".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FailMode {
    /// The control is not on the page.
    Missing,
    /// The browser session is broken.
    Broken,
}

impl FailMode {
    fn error(&self, op: &str) -> SiteError {
        match self {
            FailMode::Missing => SiteError::MissingElement(op.to_string()),
            FailMode::Broken => SiteError::Driver(WebDriverError::Protocol {
                error: "invalid session id".to_string(),
                message: format!("{} on a dead session", op),
            }),
        }
    }
}

#[derive(Default)]
struct FakeState {
    page: usize,
    tabs: Vec<String>,
    focused: String,
    next_tab: usize,
    events: Vec<String>,
    cookies: Vec<String>,
    offers: Vec<(String, Offer)>,
    current_url: Option<String>,
}

/// Feed pages are served in order; the event log records every call.
pub(crate) struct FakeMarketplace {
    pages: Vec<Vec<FakeCard>>,
    invitations: HashMap<&'static str, Vec<String>>,
    failures: Mutex<HashMap<&'static str, FailMode>>,
    rejected_cookies: Vec<String>,
    state: Mutex<FakeState>,
}

impl FakeMarketplace {
    pub fn new(pages: Vec<Vec<FakeCard>>) -> Self {
        let state = FakeState {
            tabs: vec!["main".to_string()],
            focused: "main".to_string(),
            ..FakeState::default()
        };
        Self {
            pages,
            invitations: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            rejected_cookies: Vec::new(),
            state: Mutex::new(state),
        }
    }

    pub fn with_invitations(mut self, category: InvitationCategory, urls: &[&str]) -> Self {
        self.invitations
            .insert(category_key(category), urls.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn rejecting_cookie(mut self, name: &str) -> Self {
        self.rejected_cookies.push(name.to_string());
        self
    }

    pub fn fail(&self, op: &'static str, mode: FailMode) {
        self.failures.lock().insert(op, mode);
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().events.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn offers(&self) -> Vec<(String, Offer)> {
        self.state.lock().offers.clone()
    }

    pub fn cookies(&self) -> Vec<String> {
        self.state.lock().cookies.clone()
    }

    pub fn open_tabs(&self) -> usize {
        self.state.lock().tabs.len()
    }

    pub fn focused_tab(&self) -> String {
        self.state.lock().focused.clone()
    }

    fn record(&self, op: &'static str, detail: &str) -> Result<(), SiteError> {
        let event = if detail.is_empty() {
            op.to_string()
        } else {
            format!("{}:{}", op, detail)
        };
        self.state.lock().events.push(event);
        match self.failures.lock().get(op) {
            Some(mode) => Err(mode.error(op)),
            None => Ok(()),
        }
    }

    fn card(&self, card: &CardId) -> Result<FakeCard, SiteError> {
        let (page, index) = card
            .0
            .split_once(':')
            .and_then(|(p, i)| Some((p.parse::<usize>().ok()?, i.parse::<usize>().ok()?)))
            .ok_or_else(|| SiteError::MissingElement(card.0.clone()))?;
        self.pages
            .get(page)
            .and_then(|cards| cards.get(index))
            .cloned()
            .ok_or_else(|| SiteError::MissingElement(card.0.clone()))
    }
}

fn category_key(category: InvitationCategory) -> &'static str {
    match category {
        InvitationCategory::CustomerConnections => "connections",
        InvitationCategory::OrderCards => "orders",
    }
}

#[async_trait]
impl Marketplace for FakeMarketplace {
    async fn maximize(&self) -> Result<(), SiteError> {
        self.record("maximize", "")
    }

    async fn open_home(&self) -> Result<(), SiteError> {
        self.record("open_home", "")
    }

    async fn add_cookie(&self, cookie: RawCookie) -> Result<(), SiteError> {
        let name = cookie
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.record("add_cookie", &name)?;
        if self.rejected_cookies.contains(&name) {
            return Err(SiteError::Driver(WebDriverError::Protocol {
                error: "invalid cookie domain".to_string(),
                message: name,
            }));
        }
        self.state.lock().cookies.push(name);
        Ok(())
    }

    async fn reload(&self) -> Result<(), SiteError> {
        self.record("reload", "")
    }

    async fn open_cabinet(&self) -> Result<(), SiteError> {
        self.record("open_cabinet", "")
    }

    async fn open_order_search(&self) -> Result<(), SiteError> {
        self.record("open_order_search", "")?;
        self.state.lock().page = 0;
        Ok(())
    }

    async fn show_all_orders(&self) -> Result<(), SiteError> {
        self.record("show_all_orders", "")
    }

    async fn wait_for_cards(&self) -> Result<Vec<CardId>, SiteError> {
        let page = self.state.lock().page;
        self.record("wait_for_cards", &page.to_string())?;
        match self.pages.get(page) {
            Some(cards) if !cards.is_empty() => Ok((0..cards.len())
                .map(|i| CardId(format!("{}:{}", page, i)))
                .collect()),
            _ => Err(SiteError::Timeout {
                what: "visibility of order cards".to_string(),
                timeout: Duration::from_secs(10),
            }),
        }
    }

    async fn card_title(&self, card: &CardId) -> Result<String, SiteError> {
        let found = self.card(card)?;
        self.record("card_title", &found.url)?;
        Ok(found.title)
    }

    async fn card_details(&self, card: &CardId) -> Result<CardDetails, SiteError> {
        let found = self.card(card)?;
        self.record("card_details", &found.url)?;
        Ok(CardDetails {
            url: found.url,
            description: found.description,
            contact: found.contact,
        })
    }

    async fn next_page(&self) -> Result<bool, SiteError> {
        self.record("next_page", "")?;
        let mut state = self.state.lock();
        if state.page + 1 < self.pages.len() {
            state.page += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn back_to_feed(&self) -> Result<(), SiteError> {
        self.record("back_to_feed", "")?;
        self.state.lock().page = 0;
        Ok(())
    }

    async fn current_tab(&self) -> Result<TabHandle, SiteError> {
        Ok(TabHandle(self.state.lock().focused.clone()))
    }

    async fn open_tab(&self) -> Result<TabHandle, SiteError> {
        self.record("open_tab", "")?;
        let mut state = self.state.lock();
        state.next_tab += 1;
        let handle = format!("tab-{}", state.next_tab);
        state.tabs.push(handle.clone());
        state.focused = handle.clone();
        Ok(TabHandle(handle))
    }

    async fn close_tab(&self, primary: &TabHandle) -> Result<(), SiteError> {
        self.record("close_tab", "")?;
        let mut state = self.state.lock();
        let focused = state.focused.clone();
        state.tabs.retain(|t| *t != focused);
        state.focused = primary.0.clone();
        Ok(())
    }

    async fn open_listing(&self, url: &str) -> Result<(), SiteError> {
        self.record("open_listing", url)?;
        self.state.lock().current_url = Some(url.to_string());
        Ok(())
    }

    async fn submit_offer(&self, offer: &Offer) -> Result<(), SiteError> {
        let url = self.state.lock().current_url.clone().unwrap_or_default();
        self.record("submit_offer", &url)?;
        self.state.lock().offers.push((url, offer.clone()));
        Ok(())
    }

    async fn open_connections(&self) -> Result<(), SiteError> {
        self.record("open_connections", "")
    }

    async fn invitation_links(&self, category: InvitationCategory) -> Result<Vec<String>, SiteError> {
        let key = category_key(category);
        self.record("invitation_links", key)?;
        Ok(self.invitations.get(key).cloned().unwrap_or_default())
    }

    async fn quit(&self) -> Result<(), SiteError> {
        self.record("quit", "")
    }
}

/// Shares one `FakeMarketplace` across launches so tests can inspect it.
#[async_trait]
impl Marketplace for Arc<FakeMarketplace> {
    async fn maximize(&self) -> Result<(), SiteError> {
        (**self).maximize().await
    }
    async fn open_home(&self) -> Result<(), SiteError> {
        (**self).open_home().await
    }
    async fn add_cookie(&self, cookie: RawCookie) -> Result<(), SiteError> {
        (**self).add_cookie(cookie).await
    }
    async fn reload(&self) -> Result<(), SiteError> {
        (**self).reload().await
    }
    async fn open_cabinet(&self) -> Result<(), SiteError> {
        (**self).open_cabinet().await
    }
    async fn open_order_search(&self) -> Result<(), SiteError> {
        (**self).open_order_search().await
    }
    async fn show_all_orders(&self) -> Result<(), SiteError> {
        (**self).show_all_orders().await
    }
    async fn wait_for_cards(&self) -> Result<Vec<CardId>, SiteError> {
        (**self).wait_for_cards().await
    }
    async fn card_title(&self, card: &CardId) -> Result<String, SiteError> {
        (**self).card_title(card).await
    }
    async fn card_details(&self, card: &CardId) -> Result<CardDetails, SiteError> {
        (**self).card_details(card).await
    }
    async fn next_page(&self) -> Result<bool, SiteError> {
        (**self).next_page().await
    }
    async fn back_to_feed(&self) -> Result<(), SiteError> {
        (**self).back_to_feed().await
    }
    async fn current_tab(&self) -> Result<TabHandle, SiteError> {
        (**self).current_tab().await
    }
    async fn open_tab(&self) -> Result<TabHandle, SiteError> {
        (**self).open_tab().await
    }
    async fn close_tab(&self, primary: &TabHandle) -> Result<(), SiteError> {
        (**self).close_tab(primary).await
    }
    async fn open_listing(&self, url: &str) -> Result<(), SiteError> {
        (**self).open_listing(url).await
    }
    async fn submit_offer(&self, offer: &Offer) -> Result<(), SiteError> {
        (**self).submit_offer(offer).await
    }
    async fn open_connections(&self) -> Result<(), SiteError> {
        (**self).open_connections().await
    }
    async fn invitation_links(&self, category: InvitationCategory) -> Result<Vec<String>, SiteError> {
        (**self).invitation_links(category).await
    }
    async fn quit(&self) -> Result<(), SiteError> {
        (**self).quit().await
    }
}

/// Hands out the same fake on every launch, failing the first
/// `failing_launches` attempts.
pub(crate) struct FakeFactory {
    pub site: Arc<FakeMarketplace>,
    failing_launches: usize,
    launches: AtomicUsize,
}

impl FakeFactory {
    pub fn new(site: Arc<FakeMarketplace>, failing_launches: usize) -> Self {
        Self {
            site,
            failing_launches,
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketplaceFactory for FakeFactory {
    async fn launch(&self) -> anyhow::Result<Box<dyn Marketplace>> {
        let attempt = self.launches.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failing_launches {
            anyhow::bail!("chromedriver is not reachable (attempt {})", attempt + 1);
        }
        Ok(Box::new(self.site.clone()))
    }
}
