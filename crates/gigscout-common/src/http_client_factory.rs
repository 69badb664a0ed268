// Builds the reqwest clients used for the WebDriver endpoint and the
// Telegram Bot API.

use anyhow::Result;
use gigscout_sdk::{Package, StringUtil};
use reqwest::Client;
use std::time::Duration;

/// Environment switch that disables TLS certificate verification.
const TLS_NO_VERIFY_ENV: &str = "GIGSCOUT_TLS_NO_VERIFY";

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Create a client with the gigscout user agent and the given overall
    /// request timeout.
    ///
    /// Proxies are taken from the standard `HTTP(S)_PROXY` / `NO_PROXY`
    /// environment variables, which reqwest honours by default.
    pub fn create_client(timeout: Duration) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10));

        if let Ok(val) = std::env::var(TLS_NO_VERIFY_ENV) {
            if StringUtil::convert_to_bool(&val) == Some(true) {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder = builder.user_agent(format!(
            "{}/{}",
            Package::PRODUCT_NAME,
            Package::VERSION,
        ));

        let client = builder.build()?;
        Ok(client)
    }
}
