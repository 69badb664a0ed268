use std::time::Duration;

/// Errors surfaced by the WebDriver client.
#[derive(Debug, thiserror::Error)]
pub enum WebDriverError {
    /// The element lookup matched nothing.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// A polling wait ran out of time.
    #[error("timed out after {}s waiting for {what}", timeout.as_secs_f64())]
    Timeout { what: String, timeout: Duration },

    /// Any other error object returned by the driver.
    #[error("webdriver error '{error}': {message}")]
    Protocol { error: String, message: String },

    #[error("webdriver request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected webdriver response: {0}")]
    InvalidResponse(String),
}

impl WebDriverError {
    /// Whether the error means "the expected control is not on the page",
    /// as opposed to a broken driver connection.
    pub fn is_missing_element(&self) -> bool {
        match self {
            WebDriverError::NoSuchElement(_) | WebDriverError::Timeout { .. } => true,
            WebDriverError::Protocol { error, .. } => matches!(
                error.as_str(),
                "stale element reference" | "element not interactable" | "element click intercepted"
            ),
            _ => false,
        }
    }

    /// Build the typed error for a W3C error object.
    pub(crate) fn from_protocol(error: String, message: String) -> Self {
        match error.as_str() {
            "no such element" => WebDriverError::NoSuchElement(message),
            _ => WebDriverError::Protocol { error, message },
        }
    }
}
