use anyhow::{Context, Result};
use url::Url;

/// URL utility functions.
pub struct UrlUtil;

impl UrlUtil {
    /// Resolve `path` against `base`, the way a browser resolves a relative
    /// link. Absolute `path` values replace the base entirely.
    pub fn join(base: &str, path: &str) -> Result<String> {
        let base = Url::parse(base).with_context(|| format!("Invalid base URL '{}'", base))?;
        let joined = base
            .join(path)
            .with_context(|| format!("Cannot resolve '{}' against '{}'", path, base))?;
        Ok(joined.to_string())
    }

    /// Strip a single trailing slash so endpoint roots can be concatenated
    /// with `/path` segments.
    pub fn trim_trailing_slash(value: &str) -> &str {
        value.strip_suffix('/').unwrap_or(value)
    }
}
