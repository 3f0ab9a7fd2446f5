//! Embedded documentation fragment assets.
//!
//! The page and the pristine constants template are stored as standalone
//! files under `src/assets/` and included at compile time, keeping the
//! binary self-contained. Either file can be shadowed by a same-path copy
//! under the docs root at runtime.

pub const DOCS_HTML: &str = include_str!("assets/docs.html");
pub const DEFAULT_CONSTANTS_JS: &str = include_str!("assets/service-constants.js");
