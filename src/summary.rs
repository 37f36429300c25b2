//! Text summary builder for terminal output.
//!
//! Mirrors the HTML renderer's content and section order; used by the
//! one-shot `ask` command and the TUI answer pane. Plain text, no escaping.

use crate::model::AnswerResult;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary of an answer.
pub(crate) fn build_answer_summary(result: &AnswerResult) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Confidence: {}%", result.confidence_pct()));
    if result.is_grounded() {
        lines.push("Grounded".to_string());
    } else {
        lines.push(format!("Missing info: {}", result.missing_info.len()));
    }

    lines.push(String::new());
    if result.answer.is_empty() {
        lines.push(String::new());
    } else {
        lines.extend(result.answer.lines().map(|l| l.to_string()));
    }

    if !result.citations.is_empty() {
        lines.push(String::new());
        lines.push("Citations:".to_string());
        for c in &result.citations {
            let mut line = format!("  {} — {} (chunk {})", c.context_ref, c.filename, c.chunk_index);
            if let Some(sim) = c.similarity {
                line.push_str(&format!(" [similarity {sim:.4}]"));
            }
            lines.push(line);
            if let Some(quote) = c.quote.as_deref() {
                if !quote.is_empty() {
                    lines.push(format!("    \"{quote}\""));
                }
            }
        }
    }

    if !result.missing_info.is_empty() {
        lines.push(String::new());
        lines.push("Missing info:".to_string());
        for m in &result.missing_info {
            lines.push(format!("  - {m}"));
        }
    }

    if !result.enrichment_suggestions.is_empty() {
        lines.push(String::new());
        lines.push("Enrichment suggestions:".to_string());
        for s in &result.enrichment_suggestions {
            lines.push(format!("  {}: {}", s.kind, s.suggestion));
        }
    }

    TextSummary { lines }
}
