//! Server-side application of the resolved constants to the documentation
//! page: the `<title>` is rewritten and a bootstrap script is injected so
//! the page sees the effective values even before `service-constants.js`
//! executes.

use crate::constants::ResolvedConstants;

const MARKER: &str = "<!-- SDV: constants -->";

/// Apply `constants` to `content`. Returns `None` when the page already
/// carries the marker or offers no insertion point.
pub fn apply(content: &str, constants: &ResolvedConstants) -> Option<String> {
    if content.contains(MARKER) {
        return None;
    }

    let mut modified = content.to_string();
    let mut did_modify = false;

    if let Some(updated) = replace_title(&modified, &constants.service_title) {
        modified = updated;
        did_modify = true;
    }

    if let Some(idx) = modified.rfind("</head>") {
        let head_inject = format!(
            "{MARKER}\n<script id=\"sdv-constants\">\n{}\n</script>\n",
            bootstrap_assignment(constants)
        );
        modified.insert_str(idx, &head_inject);
        did_modify = true;
    }

    if did_modify {
        Some(modified)
    } else {
        None
    }
}

/// Remove a previously injected bootstrap so `apply` can run fresh. The
/// rewritten `<title>` stays; only the marker and script block are removed.
pub fn strip(content: &str) -> Option<String> {
    if !content.contains(MARKER) {
        return None;
    }

    let mut modified = content.to_string();
    if let Some(start) = modified.find("<script id=\"sdv-constants\">") {
        if let Some(end_rel) = modified[start..].find("</script>") {
            let end = start + end_rel + "</script>".len();
            let end_with_newline = if modified.as_bytes().get(end).copied() == Some(b'\n') {
                end + 1
            } else {
                end
            };
            modified.replace_range(start..end_with_newline, "");
        }
    }

    modified = modified.replace(&format!("{MARKER}\n"), "");
    modified = modified.replace(MARKER, "");

    if modified != content {
        Some(modified)
    } else {
        None
    }
}

fn bootstrap_assignment(constants: &ResolvedConstants) -> String {
    let json = match serde_json::to_string(constants) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("swagger-doc-viewer: Failed to serialise constants: {err}");
            "{}".to_string()
        }
    };

    let safe_json = escape_json_for_script(&json);
    format!("window.__SDV_CONSTANTS__ = {safe_json};")
}

fn escape_json_for_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn replace_title(content: &str, title: &str) -> Option<String> {
    let start = content.find("<title>")? + "<title>".len();
    let end = start + content[start..].find("</title>")?;

    let mut out = String::with_capacity(content.len() + title.len());
    out.push_str(&content[..start]);
    out.push_str(&escape_html(title));
    out.push_str(&content[end..]);
    Some(out)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DOCS_HTML;

    fn resolved(title: &str, url: &str) -> ResolvedConstants {
        ResolvedConstants {
            service_title: title.to_string(),
            swagger_url: url.to_string(),
        }
    }

    #[test]
    fn apply_sets_title_and_bootstrap_once() {
        let constants = resolved("Tone Analyzer", "/v3/swagger.json");
        let first = apply(DOCS_HTML, &constants).expect("first application should modify");

        assert!(first.contains("<title>Tone Analyzer</title>"));
        assert!(first.contains(MARKER));
        assert!(first.contains("\"swaggerUrl\":\"/v3/swagger.json\""));

        assert!(
            apply(&first, &constants).is_none(),
            "second application should be skipped"
        );
    }

    #[test]
    fn bootstrap_keys_match_the_page_globals() {
        let constants = resolved("REST Services", "../../api/swagger/swagger.json");
        let page = apply(DOCS_HTML, &constants).expect("should modify");
        assert!(page.contains("\"serviceTitle\":\"REST Services\""));
    }

    #[test]
    fn title_markup_is_escaped() {
        let constants = resolved("A & B <beta>", "swagger.json");
        let page = apply(DOCS_HTML, &constants).expect("should modify");
        assert!(page.contains("<title>A &amp; B &lt;beta&gt;</title>"));
    }

    #[test]
    fn page_without_insertion_points_is_left_alone() {
        let constants = resolved("T", "u.json");
        assert!(apply("<html><body>plain</body></html>", &constants).is_none());
    }

    #[test]
    fn strip_removes_the_bootstrap() {
        let constants = resolved("Tone Analyzer", "/v3/swagger.json");
        let injected = apply(DOCS_HTML, &constants).expect("apply should modify");

        let stripped = strip(&injected).expect("strip should modify");
        assert!(!stripped.contains(MARKER));
        assert!(!stripped.contains("sdv-constants"));
        // The title rewrite stays.
        assert!(stripped.contains("<title>Tone Analyzer</title>"));

        assert!(
            apply(&stripped, &constants).is_some(),
            "a stripped page should accept a fresh application"
        );
    }

    #[test]
    fn strip_leaves_an_untouched_page_alone() {
        assert!(strip(DOCS_HTML).is_none());
    }

    #[test]
    fn escape_json_handles_script_closers() {
        let raw = r#"{"serviceTitle":"</script><script>"}"#;
        let escaped = escape_json_for_script(raw);
        assert!(escaped.contains("<\\/script>"));
        assert!(!escaped.contains("</script>"));
    }
}
