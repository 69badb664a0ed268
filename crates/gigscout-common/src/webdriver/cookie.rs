// Conversion of browser-extension cookie exports into WebDriver cookies.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// One cookie record as exported by a browser extension.
pub type RawCookie = Map<String, Value>;

/// Export fields the WebDriver `Add Cookie` command rejects.
const UNSUPPORTED_FIELDS: [&str; 5] = ["id", "hostOnly", "session", "storeId", "httpOnly"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CookieError {
    #[error("cookie has no '{0}' field")]
    MissingField(&'static str),

    #[error("cookie record is {0}, not an object")]
    NotAnObject(&'static str),

    #[error("cookie '{name}' has a non-numeric expirationDate: {value}")]
    InvalidExpiry { name: String, value: String },
}

/// Normalize one exported cookie for the WebDriver API:
/// strip unsupported fields, turn `expirationDate` (fractional seconds) into
/// an integer `expiry`, and relax a present `sameSite` to `"None"`.
pub fn normalize_cookie(record: Value) -> Result<RawCookie, CookieError> {
    let mut cookie = match record {
        Value::Object(map) => map,
        Value::Null => return Err(CookieError::NotAnObject("null")),
        Value::Bool(_) => return Err(CookieError::NotAnObject("a boolean")),
        Value::Number(_) => return Err(CookieError::NotAnObject("a number")),
        Value::String(_) => return Err(CookieError::NotAnObject("a string")),
        Value::Array(_) => return Err(CookieError::NotAnObject("an array")),
    };
    let name = match cookie.get("name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => return Err(CookieError::MissingField("name")),
    };
    if !cookie.get("value").is_some_and(Value::is_string) {
        return Err(CookieError::MissingField("value"));
    }

    for field in UNSUPPORTED_FIELDS {
        cookie.remove(field);
    }

    if let Some(expiration) = cookie.remove("expirationDate") {
        let seconds = expiration.as_f64().ok_or_else(|| CookieError::InvalidExpiry {
            name: name.clone(),
            value: expiration.to_string(),
        })?;
        cookie.insert("expiry".to_string(), Value::from(seconds.trunc() as i64));
    }

    if cookie.contains_key("sameSite") {
        cookie.insert("sameSite".to_string(), Value::String("None".to_string()));
    }

    Ok(cookie)
}

/// Read the cookie cache. Returns `Ok(None)` when the file does not exist.
///
/// Records are returned unchecked; `normalize_cookie` rejects them one by one.
pub fn load_cookie_file(path: &Path) -> Result<Option<Vec<Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cookie file '{}'", path.display()))?;
    let cookies: Vec<Value> = serde_json::from_str(&json)
        .with_context(|| format!("Cookie file '{}' is not a JSON array", path.display()))?;
    Ok(Some(cookies))
}
