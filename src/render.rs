//! Escaped HTML rendering of answers.
//!
//! Every string interpolated here originates from the backend and is
//! untrusted; `escape_html` must cover each one before it reaches markup.

use crate::model::AnswerResult;

/// Map `& < > " '` to their entity equivalents.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an answer as an HTML fragment.
///
/// Section order is fixed: header, confidence badge, grounding badge, answer
/// paragraph, then citations, missing info and enrichment suggestions. The
/// last three are emitted only when their source sequence is non-empty.
pub fn render_answer(result: &AnswerResult) -> String {
    let mut html = String::new();

    html.push_str("<h3>Answer</h3>\n");
    html.push_str(&format!(
        "<div class=\"badge\">Confidence: {}%</div>\n",
        result.confidence_pct()
    ));
    if result.is_grounded() {
        html.push_str("<div class=\"badge\">Grounded</div>\n");
    } else {
        html.push_str(&format!(
            "<div class=\"badge\">Missing info: {}</div>\n",
            result.missing_info.len()
        ));
    }
    html.push_str(&format!("<p>{}</p>\n", escape_html(&result.answer)));

    if !result.citations.is_empty() {
        html.push_str("<div class=\"kv\"><b>Citations</b></div>\n<ul class=\"list\">\n");
        for c in &result.citations {
            html.push_str(&format!(
                "<li><b>{}</b> — {} (chunk {})</li>\n",
                escape_html(&c.context_ref),
                escape_html(&c.filename),
                escape_html(&c.chunk_index.to_string()),
            ));
        }
        html.push_str("</ul>\n");
    }

    if !result.missing_info.is_empty() {
        html.push_str("<div class=\"kv\"><b>Missing info</b></div>\n<ul class=\"list\">\n");
        for m in &result.missing_info {
            html.push_str(&format!("<li>{}</li>\n", escape_html(m)));
        }
        html.push_str("</ul>\n");
    }

    if !result.enrichment_suggestions.is_empty() {
        html.push_str(
            "<div class=\"kv\"><b>Enrichment suggestions</b></div>\n<ul class=\"list\">\n",
        );
        for s in &result.enrichment_suggestions {
            html.push_str(&format!(
                "<li><b>{}</b>: {}</li>\n",
                escape_html(&s.kind),
                escape_html(&s.suggestion),
            ));
        }
        html.push_str("</ul>\n");
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChunkIndex, Citation, EnrichmentSuggestion};

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"a & b < c > d " e ' f"#),
            "a &amp; b &lt; c &gt; d &quot; e &#039; f"
        );
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn script_tags_never_survive_as_markup() {
        let r = AnswerResult {
            answer: "<script>alert(1)</script>".into(),
            citations: vec![Citation {
                context_ref: "<script>".into(),
                filename: "\"quoted\".pdf".into(),
                chunk_index: ChunkIndex::Text("<1>".into()),
                ..Default::default()
            }],
            enrichment_suggestions: vec![EnrichmentSuggestion {
                kind: "<b>".into(),
                suggestion: "it's <i>".into(),
            }],
            missing_info: vec!["a & b".into()],
            ..Default::default()
        };
        let html = render_answer(&r);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&quot;quoted&quot;.pdf"));
        assert!(html.contains("(chunk &lt;1&gt;)"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("it&#039;s &lt;i&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn exactly_one_grounding_badge() {
        let grounded = render_answer(&AnswerResult::default());
        assert!(grounded.contains("Grounded"));
        assert!(!grounded.contains("Missing info:"));

        let missing = render_answer(&AnswerResult {
            missing_info: vec!["refund window".into(), "dates".into()],
            ..Default::default()
        });
        assert!(missing.contains("Missing info: 2"));
        assert!(!missing.contains(">Grounded<"));
    }

    #[test]
    fn empty_sequences_emit_no_sections() {
        let html = render_answer(&AnswerResult {
            answer: "30 days".into(),
            confidence: 0.5,
            ..Default::default()
        });
        assert!(!html.contains("Citations"));
        assert!(!html.contains("<div class=\"kv\"><b>Missing info</b></div>"));
        assert!(!html.contains("Enrichment suggestions"));
        assert!(!html.contains("<ul"));
    }

    #[test]
    fn empty_answer_still_renders_a_paragraph() {
        let html = render_answer(&AnswerResult::default());
        assert!(html.contains("<p></p>"));
        assert!(html.contains("Confidence: 0%"));
    }

    #[test]
    fn grounded_answer_scenario() {
        let r: AnswerResult = serde_json::from_str(
            r#"{"answer":"30 days","confidence":0.92,"missing_info":[],
                "citations":[{"context_ref":"policy.pdf#3","filename":"policy.pdf","chunk_index":3}]}"#,
        )
        .unwrap();
        let html = render_answer(&r);
        assert!(html.contains("Confidence: 92%"));
        assert!(html.contains(">Grounded<"));
        assert!(html.contains("<p>30 days</p>"));
        assert!(html.contains("<li><b>policy.pdf#3</b> — policy.pdf (chunk 3)</li>"));
    }

    #[test]
    fn ungrounded_answer_scenario() {
        let r: AnswerResult = serde_json::from_str(
            r#"{"answer":"","confidence":0,"missing_info":["refund window"]}"#,
        )
        .unwrap();
        let html = render_answer(&r);
        assert!(html.contains("Confidence: 0%"));
        assert!(html.contains("Missing info: 1"));
        assert!(html.contains("<li>refund window</li>"));
        assert!(!html.contains(">Grounded<"));
    }

    #[test]
    fn section_order_is_fixed() {
        let r = AnswerResult {
            answer: "x".into(),
            missing_info: vec!["gap".into()],
            enrichment_suggestions: vec![EnrichmentSuggestion {
                kind: "document".into(),
                suggestion: "upload more".into(),
            }],
            citations: vec![Citation {
                context_ref: "Context #1".into(),
                filename: "a.pdf".into(),
                chunk_index: ChunkIndex::Number(0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let html = render_answer(&r);
        let cit = html.find("Citations").unwrap();
        let miss = html.find("<div class=\"kv\"><b>Missing info</b></div>").unwrap();
        let enr = html.find("Enrichment suggestions").unwrap();
        assert!(cit < miss && miss < enr);
    }
}
