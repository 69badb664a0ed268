// Yandex Uslugi page object on top of the WebDriver client.

use super::{
    CardDetails, CardId, InvitationCategory, Marketplace, MarketplaceFactory, SiteError, TabHandle,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use gigscout_common::settings::{Offer, Settings};
use gigscout_common::webdriver::{chrome_capabilities, ElementId, Locator, RawCookie, WebDriverClient};
use gigscout_sdk::UrlUtil;
use serde_json::Value;
use std::time::Duration;

/// Pause after a click that opens a menu rather than loading a page.
const MENU_PAUSE: Duration = Duration::from_secs(1);

const ORDER_SEARCH_LINK: &str = "//a[text()='Поиск заказов']";
const RESPONSE_FILTER_BUTTON: &str = "//span[contains(text(), 'Показывайте мне заказы')]\
     /ancestor::div[contains(@class, 'Row')]/descendant::button";
const ANY_RESPONSES_ITEM: &str = "Любые";
const NEXT_PAGE_LINK: &str = "//a[@rel=\"next\"]";

const ORDER_CARD: &str = ".OrderCard2.Card";
const CARD_TITLE: &str = ".OrderCard2-TitleRow";
const CARD_LINK: &str = ".OrderCard2-TitleLink";
const CARD_DESCRIPTION: &str = ".OrderCard2-Description";
const CARD_CUSTOMER: &str = ".OrderCard2-CustomerBadge";

const PRICE_TYPE_SELECT: &str = "select2__button";
const OFFER_MESSAGE_INPUT: &str = "Textarea-Control";
const OFFER_PRICE_INPUT: &str = "textinput__control";
const OFFER_SUBMIT: &str = "Button2_type_submit";

/// A menu entry whose label is exactly `label`.
fn menu_item(label: &str) -> Locator {
    Locator::xpath(format!(
        "//div[contains(@class, 'menu__item') and .//span[text()={}]]",
        xpath_literal(label)
    ))
}

/// Quote a string for use inside an XPath expression.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value.split('\'').map(|part| format!("'{}'", part)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

impl InvitationCategory {
    fn card_locator(&self) -> Locator {
        match self {
            InvitationCategory::CustomerConnections => Locator::class_name("CustomerConnectionsListItem"),
            InvitationCategory::OrderCards => Locator::class_name("OrderCard2"),
        }
    }

    fn link_locator(&self) -> Locator {
        match self {
            InvitationCategory::CustomerConnections => {
                Locator::css(".CustomerConnectionsListItem-MoreLink")
            }
            InvitationCategory::OrderCards => Locator::css(".OrderCard2-MoreLink"),
        }
    }
}

// ---------------------------------------------------------------------------
// UslugiMarketplace
// ---------------------------------------------------------------------------

pub struct UslugiMarketplace {
    driver: WebDriverClient,
    base_url: String,
    element_wait: Duration,
    page_settle: Duration,
}

impl UslugiMarketplace {
    pub fn new(
        driver: WebDriverClient,
        base_url: &str,
        element_wait: Duration,
        page_settle: Duration,
    ) -> Self {
        Self {
            driver,
            base_url: base_url.to_string(),
            element_wait,
            page_settle,
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(self.page_settle).await;
    }

    async fn goto(&self, path: &str) -> Result<(), SiteError> {
        let url = UrlUtil::join(&self.base_url, path)
            .map_err(|e| SiteError::InvalidUrl(format!("{:#}", e)))?;
        self.driver.navigate(&url).await?;
        self.settle().await;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), SiteError> {
        let element = self.driver.find_element(locator).await?;
        self.driver.click(&element).await?;
        Ok(())
    }

    async fn child_text(&self, card: &ElementId, selector: &str) -> Result<String, SiteError> {
        let child = self.driver.find_child(card, &Locator::css(selector)).await?;
        Ok(self.driver.text(&child).await?)
    }

    async fn child_href(&self, card: &ElementId, locator: &Locator) -> Result<String, SiteError> {
        let link = self.driver.find_child(card, locator).await?;
        self.driver
            .attribute(&link, "href")
            .await?
            .filter(|href| !href.is_empty())
            .ok_or_else(|| SiteError::MissingElement(format!("href of {}", locator)))
    }
}

fn element(card: &CardId) -> ElementId {
    ElementId(card.0.clone())
}

#[async_trait]
impl Marketplace for UslugiMarketplace {
    async fn maximize(&self) -> Result<(), SiteError> {
        Ok(self.driver.maximize_window().await?)
    }

    async fn open_home(&self) -> Result<(), SiteError> {
        self.driver.navigate(&self.base_url).await?;
        Ok(())
    }

    async fn add_cookie(&self, cookie: RawCookie) -> Result<(), SiteError> {
        Ok(self.driver.add_cookie(Value::Object(cookie)).await?)
    }

    async fn reload(&self) -> Result<(), SiteError> {
        self.driver.refresh().await?;
        tokio::time::sleep(MENU_PAUSE).await;
        Ok(())
    }

    async fn open_cabinet(&self) -> Result<(), SiteError> {
        self.goto("cab").await
    }

    async fn open_order_search(&self) -> Result<(), SiteError> {
        self.click(&Locator::xpath(ORDER_SEARCH_LINK)).await?;
        self.settle().await;
        Ok(())
    }

    async fn show_all_orders(&self) -> Result<(), SiteError> {
        self.click(&Locator::xpath(RESPONSE_FILTER_BUTTON)).await?;
        tokio::time::sleep(MENU_PAUSE).await;
        let item = self
            .driver
            .wait_clickable(&menu_item(ANY_RESPONSES_ITEM), self.element_wait)
            .await?;
        self.driver.click(&item).await?;
        self.settle().await;
        Ok(())
    }

    async fn wait_for_cards(&self) -> Result<Vec<CardId>, SiteError> {
        let cards = self
            .driver
            .wait_all_visible(&Locator::css(ORDER_CARD), self.element_wait)
            .await?;
        Ok(cards.into_iter().map(|e| CardId(e.0)).collect())
    }

    async fn card_title(&self, card: &CardId) -> Result<String, SiteError> {
        self.child_text(&element(card), CARD_TITLE).await
    }

    async fn card_details(&self, card: &CardId) -> Result<CardDetails, SiteError> {
        let card = element(card);
        Ok(CardDetails {
            url: self.child_href(&card, &Locator::css(CARD_LINK)).await?,
            description: self.child_text(&card, CARD_DESCRIPTION).await?,
            contact: self.child_text(&card, CARD_CUSTOMER).await?,
        })
    }

    async fn next_page(&self) -> Result<bool, SiteError> {
        match self.driver.find_element(&Locator::xpath(NEXT_PAGE_LINK)).await {
            Ok(link) => {
                self.driver.click(&link).await?;
                self.settle().await;
                Ok(true)
            }
            Err(e) => {
                let err = SiteError::from(e);
                if matches!(err, SiteError::MissingElement(_)) {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn back_to_feed(&self) -> Result<(), SiteError> {
        self.open_order_search().await
    }

    async fn current_tab(&self) -> Result<TabHandle, SiteError> {
        Ok(TabHandle(self.driver.window_handle().await?))
    }

    async fn open_tab(&self) -> Result<TabHandle, SiteError> {
        let handle = self.driver.new_tab().await?;
        self.driver.switch_to_window(&handle).await?;
        Ok(TabHandle(handle))
    }

    async fn close_tab(&self, primary: &TabHandle) -> Result<(), SiteError> {
        let closed = self.driver.close_window().await;
        // Refocus even if the close failed, so the session stays usable.
        self.driver.switch_to_window(&primary.0).await?;
        Ok(closed?)
    }

    async fn open_listing(&self, url: &str) -> Result<(), SiteError> {
        self.driver.navigate(url).await?;
        self.settle().await;
        Ok(())
    }

    async fn submit_offer(&self, offer: &Offer) -> Result<(), SiteError> {
        self.click(&Locator::class_name(PRICE_TYPE_SELECT)).await?;
        tokio::time::sleep(MENU_PAUSE).await;
        let price_type = self
            .driver
            .wait_clickable(&menu_item(&offer.price_type), self.element_wait)
            .await?;
        self.driver.click(&price_type).await?;

        if !offer.message.is_empty() {
            let message = self
                .driver
                .find_element(&Locator::class_name(OFFER_MESSAGE_INPUT))
                .await?;
            self.driver.send_keys(&message, &offer.message).await?;
        }

        let price = self
            .driver
            .find_element(&Locator::class_name(OFFER_PRICE_INPUT))
            .await?;
        self.driver.send_keys(&price, &offer.price.to_string()).await?;
        tokio::time::sleep(MENU_PAUSE).await;

        self.click(&Locator::class_name(OFFER_SUBMIT)).await?;
        self.settle().await;
        Ok(())
    }

    async fn open_connections(&self) -> Result<(), SiteError> {
        self.goto("cab/connections").await
    }

    async fn invitation_links(&self, category: InvitationCategory) -> Result<Vec<String>, SiteError> {
        let cards = self.driver.find_elements(&category.card_locator()).await?;
        let link = category.link_locator();
        let mut urls = Vec::with_capacity(cards.len());
        for card in &cards {
            urls.push(self.child_href(card, &link).await?);
        }
        Ok(urls)
    }

    async fn quit(&self) -> Result<(), SiteError> {
        Ok(self.driver.quit().await?)
    }
}

// ---------------------------------------------------------------------------
// UslugiLauncher
// ---------------------------------------------------------------------------

/// Opens a Chrome session on the configured WebDriver endpoint.
pub struct UslugiLauncher {
    webdriver_url: String,
    headless: bool,
    base_url: String,
    element_wait: Duration,
    page_settle: Duration,
}

impl UslugiLauncher {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            base_url: settings.marketplace_url.clone(),
            element_wait: settings.element_wait(),
            page_settle: settings.page_settle(),
        }
    }
}

#[async_trait]
impl MarketplaceFactory for UslugiLauncher {
    async fn launch(&self) -> Result<Box<dyn Marketplace>> {
        let driver = WebDriverClient::start(&self.webdriver_url, chrome_capabilities(self.headless))
            .await
            .with_context(|| format!("Failed to start a browser session at {}", self.webdriver_url))?;
        Ok(Box::new(UslugiMarketplace::new(
            driver,
            &self.base_url,
            self.element_wait,
            self.page_settle,
        )))
    }
}
