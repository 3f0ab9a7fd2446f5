//! Service constants and their override file.
//!
//! The documentation page reads two optional globals, `serviceTitle` and
//! `swaggerUrl`, from `service-constants.js`. A consuming project customizes
//! the page by shipping its own copy of that file at the same relative
//! location under its docs root; the copy replaces the default wholesale.
//! Any constant the file leaves undefined falls back to the viewer default.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Relative path under the docs root a consuming project shadows to
/// customize the documentation page.
pub const OVERRIDE_RELATIVE_PATH: &str = "documentation/api/service-constants.js";

pub const DEFAULT_SERVICE_TITLE: &str = "REST Services";
pub const DEFAULT_SWAGGER_URL: &str = "../../api/swagger/swagger.json";

/// Constants declared by an override file. Both are optional; an empty
/// string does not count as a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConstants {
    pub service_title: Option<String>,
    pub swagger_url: Option<String>,
}

/// The effective constants after defaults have been applied, as handed to
/// the documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConstants {
    pub service_title: String,
    pub swagger_url: String,
}

impl ServiceConstants {
    /// Extract `var serviceTitle = "…";` / `var swaggerUrl = "…";`
    /// declarations from override-file text. Commented-out declarations do
    /// not count, matching how a browser would (not) see them. Malformed
    /// lines are skipped rather than reported; the file cannot fail.
    pub fn parse(source: &str) -> Self {
        let mut constants = ServiceConstants::default();
        let mut in_block_comment = false;

        for raw in source.lines() {
            let line = strip_comments(raw, &mut in_block_comment);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(value) = declaration_value(line, "serviceTitle") {
                set_constant(&mut constants.service_title, &value);
            }
            if let Some(value) = declaration_value(line, "swaggerUrl") {
                set_constant(&mut constants.swagger_url, &value);
            }
        }

        constants
    }

    pub fn override_path(docs_root: &Path) -> PathBuf {
        docs_root.join(OVERRIDE_RELATIVE_PATH)
    }

    /// Read the override file under `docs_root`, if the consuming project
    /// placed one there.
    pub fn load(docs_root: &Path) -> io::Result<Option<Self>> {
        match std::fs::read_to_string(Self::override_path(docs_root)) {
            Ok(source) => Ok(Some(Self::parse(&source))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Apply viewer defaults for whichever constants are unset.
    pub fn resolve(&self, default_title: &str, default_url: &str) -> ResolvedConstants {
        ResolvedConstants {
            service_title: self
                .service_title
                .clone()
                .unwrap_or_else(|| default_title.to_string()),
            swagger_url: self
                .swagger_url
                .clone()
                .unwrap_or_else(|| default_url.to_string()),
        }
    }
}

// Last declaration wins, as it would for the page's script environment; an
// empty redeclaration unsets the constant rather than reviving an earlier one.
fn set_constant(slot: &mut Option<String>, value: &str) {
    if value.trim().is_empty() {
        *slot = None;
    } else {
        *slot = Some(value.to_string());
    }
}

/// Return `line` with `//` and `/* … */` comments removed. Comment markers
/// inside string literals (e.g. `https://…`) are left alone.
fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string: Option<char> = None;

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
            }
            continue;
        }

        match in_string {
            Some(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    *in_block_comment = true;
                }
                '"' | '\'' => {
                    in_string = Some(c);
                    out.push(c);
                }
                _ => out.push(c),
            },
        }
    }

    out
}

/// Match `var <name> = "<value>";` (the `var` keyword is optional) and
/// return the quoted value. Backslash-escaped quotes and backslashes are
/// resolved; an unterminated literal does not count as a declaration.
fn declaration_value(line: &str, name: &str) -> Option<String> {
    let rest = line.strip_prefix("var ").unwrap_or(line).trim_start();
    let rest = rest.strip_prefix(name)?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();

    let mut chars = rest.chars();
    let quote = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars.next()?;
            if escaped != quote && escaped != '\\' {
                value.push('\\');
            }
            value.push(escaped);
        } else if c == quote {
            return Some(value);
        } else {
            value.push(c);
        }
    }

    None
}
