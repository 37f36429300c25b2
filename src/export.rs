//! Answer report exports.
//!
//! Writes the escaped HTML report and the raw response JSON. File names
//! derive from the current UTC timestamp when the caller does not pick one.

use crate::model::AnswerResult;
use crate::render;
use anyhow::{Context, Result};
use std::path::Path;

const REPORT_STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
.badge{display:inline-block;background:#eef;border-radius:4px;padding:2px 8px;margin-right:6px}\
.kv{margin-top:1rem}.list{margin:4px 0 0 0}";

/// Wrap a rendered answer fragment in a standalone page.
pub fn wrap_html_page(fragment: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Answer</title>\n<style>{REPORT_STYLE}</style>\n</head>\n<body>\n\
         {fragment}</body>\n</html>\n"
    )
}

pub fn export_html(path: &Path, result: &AnswerResult) -> Result<()> {
    let page = wrap_html_page(&render::render_answer(result));
    std::fs::write(path, page).with_context(|| format!("write {}", path.display()))
}

pub fn export_json(path: &Path, raw: &serde_json::Value) -> Result<()> {
    let body = serde_json::to_string_pretty(raw).context("serialize response")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))
}

/// Timestamp-derived file name for exports, safe for filesystems.
pub fn default_report_name(ext: &str) -> String {
    let stamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into());
    format!(
        "kbase-answer-{}.{ext}",
        stamp.replace(':', "-").replace('T', "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_wraps_fragment_exactly_once() {
        let page = wrap_html_page("<h3>Answer</h3>");
        assert_eq!(page.matches("<html").count(), 1);
        assert_eq!(page.matches("</html>").count(), 1);
        assert!(page.contains("<h3>Answer</h3>"));
        assert!(page.starts_with("<!doctype html>"));
    }

    #[test]
    fn report_name_has_no_colons() {
        let name = default_report_name("html");
        assert!(name.starts_with("kbase-answer-"));
        assert!(name.ends_with(".html"));
        assert!(!name.contains(':'));
    }
}
