use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default `top_k` when the input field is left blank.
pub const DEFAULT_TOP_K: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Body for `POST /v1/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: u32,
}

/// Chunk index as reported by the backend. Some deployments send a number,
/// others a string; both display identically. Absent indexes display empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChunkIndex {
    Number(i64),
    Float(f64),
    Text(String),
}

impl Default for ChunkIndex {
    fn default() -> Self {
        ChunkIndex::Text(String::new())
    }
}

impl fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkIndex::Number(n) => write!(f, "{n}"),
            ChunkIndex::Float(x) => write!(f, "{x}"),
            ChunkIndex::Text(s) => f.write_str(s),
        }
    }
}

/// One retrieved-context reference attached to an answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub context_ref: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub chunk_index: ChunkIndex,
    // Extra detail some backends attach to each citation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// A backend-proposed action to improve future answer quality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentSuggestion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub suggestion: String,
}

/// Structured answer returned by `POST /v1/query`.
///
/// Every field is optional on the wire. Absence means the empty/zero default
/// and is never an error; defaults are applied here, at the deserialization
/// boundary, not in rendering code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResult {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub enrichment_suggestions: Vec<EnrichmentSuggestion>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl AnswerResult {
    /// Confidence as the integer percentage shown in badges.
    pub fn confidence_pct(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }

    /// Grounded means the backend reported no missing information.
    pub fn is_grounded(&self) -> bool {
        self.missing_info.is_empty()
    }
}

/// One row of `GET /v1/documents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(default)]
    pub document_id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub created_at: String,
}

/// Events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Busy gate transitions; both triggers are disabled while busy.
    BusyChanged { busy: bool },
    UploadStarted {
        files: usize,
    },
    /// Pretty-printed response body, displayed verbatim.
    UploadCompleted {
        raw_json: String,
    },
    UploadFailed {
        error: String,
    },
    AskStarted {
        question: String,
    },
    AskCompleted {
        raw_json: String,
        // Box to keep AppEvent size small.
        result: Box<AnswerResult>,
    },
    AskFailed {
        error: String,
    },
    Info(InfoEvent),
}

/// Validation and status notices surfaced in-place by UI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    EmptySelection,
    EmptyQuestion,
    InvalidTopK { raw: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::EmptySelection => "Please select file(s) first.".to_string(),
            InfoEvent::EmptyQuestion => "Please enter a question.".to_string(),
            InfoEvent::InvalidTopK { raw } => {
                format!("top_k must be a positive integer (got '{raw}')")
            }
        }
    }
}
