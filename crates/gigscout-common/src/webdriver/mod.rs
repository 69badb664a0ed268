// Minimal W3C WebDriver client over reqwest.
//
// Only the commands gigscout drives are implemented: session lifecycle,
// navigation, windows/tabs, cookies, element lookup and interaction, plus
// the two polling waits (all-visible, clickable).

mod client;
mod cookie;
mod error;
mod locator;

pub use client::{chrome_capabilities, ElementId, WebDriverClient};
pub use cookie::{load_cookie_file, normalize_cookie, CookieError, RawCookie};
pub use error::WebDriverError;
pub use locator::Locator;
