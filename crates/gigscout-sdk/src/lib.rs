// gigscout-sdk: Foundation layer for gigscout.
// This crate has no dependencies on other gigscout crates and provides the
// tracing abstraction plus the small string, URL and file helpers shared
// by the rest of the workspace.

pub mod build_constants;
pub mod io_util;
pub mod string_util;
pub mod trace;
pub mod url_util;

// Re-export commonly used items at crate root
pub use build_constants::{Package, Source};
pub use io_util::IOUtil;
pub use string_util::StringUtil;
pub use trace::TraceWriter;
pub use url_util::UrlUtil;
