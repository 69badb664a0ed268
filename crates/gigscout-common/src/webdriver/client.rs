use super::{Locator, WebDriverError};
use crate::http_client_factory::HttpClientFactory;
use gigscout_sdk::UrlUtil;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Per-request timeout for driver commands. Page loads are the slow ones.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// How often the polling waits re-query the page.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// An element reference handed out by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

/// Chrome capabilities with the automation banners and prompts switched off.
pub fn chrome_capabilities(headless: bool) -> Value {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled",
        "--disable-notifications",
        "--disable-infobars",
        "--disable-save-password-bubble",
    ];
    if headless {
        args.push("--headless=new");
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                }
            }
        }
    })
}

/// One WebDriver session.
pub struct WebDriverClient {
    http: Client,
    session_url: String,
}

impl WebDriverClient {
    /// Open a new session on the driver at `endpoint`.
    pub async fn start(endpoint: &str, capabilities: Value) -> Result<Self, WebDriverError> {
        let http = HttpClientFactory::create_client(COMMAND_TIMEOUT)
            .map_err(|e| WebDriverError::InvalidResponse(format!("{:#}", e)))?;
        let endpoint = UrlUtil::trim_trailing_slash(endpoint).to_string();

        let response = http
            .post(format!("{}/session", endpoint))
            .json(&capabilities)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let value = parse_response(status.as_u16(), &body)?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::InvalidResponse(format!("no sessionId in {}", body)))?
            .to_string();

        Ok(Self {
            http,
            session_url: format!("{}/session/{}", endpoint, session_id),
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let url = format!("{}{}", self.session_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status.as_u16(), &text)
    }

    /// End the session; the driver closes every window of it.
    pub async fn quit(&self) -> Result<(), WebDriverError> {
        let response = self.http.delete(&self.session_url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status.as_u16(), &text).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Navigation and windows
    // -----------------------------------------------------------------------

    pub async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    pub async fn refresh(&self) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/refresh", None).await.map(|_| ())
    }

    pub async fn maximize_window(&self) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/window/maximize", None)
            .await
            .map(|_| ())
    }

    pub async fn window_handle(&self) -> Result<String, WebDriverError> {
        let value = self.command(Method::GET, "/window", None).await?;
        as_string(value)
    }

    /// Open a new tab and return its handle. Focus stays where it was.
    pub async fn new_tab(&self) -> Result<String, WebDriverError> {
        let value = self
            .command(Method::POST, "/window/new", Some(json!({ "type": "tab" })))
            .await?;
        value
            .get("handle")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WebDriverError::InvalidResponse(format!("no handle in {}", value)))
    }

    pub async fn switch_to_window(&self, handle: &str) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/window", Some(json!({ "handle": handle })))
            .await
            .map(|_| ())
    }

    /// Close the focused window.
    pub async fn close_window(&self) -> Result<(), WebDriverError> {
        self.command(Method::DELETE, "/window", None).await.map(|_| ())
    }

    pub async fn add_cookie(&self, cookie: Value) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie })))
            .await
            .map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    pub async fn find_element(&self, locator: &Locator) -> Result<ElementId, WebDriverError> {
        let value = self
            .command(Method::POST, "/element", Some(locator_body(locator)))
            .await?;
        element_id(&value)
    }

    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>, WebDriverError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator_body(locator)))
            .await?;
        element_ids(&value)
    }

    pub async fn find_child(
        &self,
        parent: &ElementId,
        locator: &Locator,
    ) -> Result<ElementId, WebDriverError> {
        let path = format!("/element/{}/element", parent.0);
        let value = self
            .command(Method::POST, &path, Some(locator_body(locator)))
            .await?;
        element_id(&value)
    }

    pub async fn click(&self, element: &ElementId) -> Result<(), WebDriverError> {
        let path = format!("/element/{}/click", element.0);
        self.command(Method::POST, &path, None).await.map(|_| ())
    }

    pub async fn text(&self, element: &ElementId) -> Result<String, WebDriverError> {
        let path = format!("/element/{}/text", element.0);
        as_string(self.command(Method::GET, &path, None).await?)
    }

    /// The element's attribute, or `None` when it is not set.
    pub async fn attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, WebDriverError> {
        // Properties resolve relative hrefs to absolute URLs, attributes do not.
        let path = format!("/element/{}/property/{}", element.0, name);
        let value = self.command(Method::GET, &path, None).await?;
        Ok(value.as_str().map(str::to_string))
    }

    pub async fn is_displayed(&self, element: &ElementId) -> Result<bool, WebDriverError> {
        let path = format!("/element/{}/displayed", element.0);
        as_bool(self.command(Method::GET, &path, None).await?)
    }

    pub async fn is_enabled(&self, element: &ElementId) -> Result<bool, WebDriverError> {
        let path = format!("/element/{}/enabled", element.0);
        as_bool(self.command(Method::GET, &path, None).await?)
    }

    pub async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), WebDriverError> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })))
            .await
            .map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Waits
    // -----------------------------------------------------------------------

    /// Wait until at least one element matches and every match is displayed.
    pub async fn wait_all_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<ElementId>, WebDriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            let elements = self.find_elements(locator).await?;
            if !elements.is_empty() && self.all_displayed(&elements).await? {
                return Ok(elements);
            }
            if Instant::now() >= deadline {
                return Err(WebDriverError::Timeout {
                    what: format!("visibility of {}", locator),
                    timeout,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    /// Wait until the first match is displayed and enabled.
    pub async fn wait_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementId, WebDriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(locator).await {
                Ok(element) => {
                    if self.ready_to_click(&element).await? {
                        return Ok(element);
                    }
                }
                Err(WebDriverError::NoSuchElement(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(WebDriverError::Timeout {
                    what: format!("clickable {}", locator),
                    timeout,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn all_displayed(&self, elements: &[ElementId]) -> Result<bool, WebDriverError> {
        for element in elements {
            match self.is_displayed(element).await {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                // The page re-rendered under us; poll again.
                Err(e) if e.is_missing_element() => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    async fn ready_to_click(&self, element: &ElementId) -> Result<bool, WebDriverError> {
        let displayed = self.is_displayed(element).await;
        let enabled = self.is_enabled(element).await;
        match (displayed, enabled) {
            (Ok(displayed), Ok(enabled)) => Ok(displayed && enabled),
            (Err(e), _) | (_, Err(e)) => {
                if e.is_missing_element() {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = locator.strategy();
    json!({ "using": using, "value": value })
}

/// Unwrap the `value` member of a driver response, turning W3C error
/// objects and non-2xx statuses into `WebDriverError`.
fn parse_response(status: u16, body: &str) -> Result<Value, WebDriverError> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        WebDriverError::InvalidResponse(format!("HTTP {} with non-JSON body ({}): {}", status, e, body))
    })?;

    let value = parsed.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WebDriverError::from_protocol(error.to_string(), message));
    }

    if !(200..300).contains(&status) {
        return Err(WebDriverError::InvalidResponse(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    Ok(value)
}

fn element_id(value: &Value) -> Result<ElementId, WebDriverError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementId(id.to_string()))
        .ok_or_else(|| WebDriverError::InvalidResponse(format!("not an element reference: {}", value)))
}

fn element_ids(value: &Value) -> Result<Vec<ElementId>, WebDriverError> {
    value
        .as_array()
        .ok_or_else(|| WebDriverError::InvalidResponse(format!("not an element list: {}", value)))?
        .iter()
        .map(element_id)
        .collect()
}

fn as_string(value: Value) -> Result<String, WebDriverError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(WebDriverError::InvalidResponse(format!("expected string, got {}", other))),
    }
}

fn as_bool(value: Value) -> Result<bool, WebDriverError> {
    value
        .as_bool()
        .ok_or_else(|| WebDriverError::InvalidResponse(format!("expected bool, got {}", value)))
}
