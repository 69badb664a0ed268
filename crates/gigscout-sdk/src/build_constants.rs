/// Build constants for the gigscout package, taken from compile-time
/// environment variables with sensible defaults.

/// Source control information.
pub struct Source;

impl Source {
    /// The commit hash from which this binary was built.
    /// Set via the `GIGSCOUT_COMMIT_HASH` env var at compile time, or "N/A".
    pub const COMMIT_HASH: &'static str = match option_env!("GIGSCOUT_COMMIT_HASH") {
        Some(h) => h,
        None => "N/A",
    };
}

/// Package metadata.
#[derive(Debug, Clone)]
pub struct Package;

impl Package {
    /// The semantic version, from `CARGO_PKG_VERSION`.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// The product name used in user agents and help output.
    pub const PRODUCT_NAME: &'static str = "gigscout";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!Package::VERSION.is_empty());
        assert!(!Source::COMMIT_HASH.is_empty());
    }
}
