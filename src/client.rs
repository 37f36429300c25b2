//! HTTP client for the knowledge-base backend.
//!
//! For the two core endpoints (upload, query) the HTTP status is not
//! interpreted: whatever body the backend sends is parsed as JSON and handed
//! to the caller for display, error bodies included. Only transport failures
//! and non-JSON bodies are errors.

use crate::model::{ClientConfig, DocumentInfo, QueryRequest};
use anyhow::{bail, Context, Result};
use reqwest::multipart;
use std::path::PathBuf;

pub struct KbClient {
    http: reqwest::Client,
    base_url: String,
}

impl KbClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST the selected files to the ingestion endpoint as multipart form
    /// data, one part per file under the repeated key `files`. The response
    /// body is opaque to the client; callers display it verbatim.
    pub async fn upload_documents(&self, files: &[PathBuf]) -> Result<serde_json::Value> {
        let mut form = multipart::Form::new();
        for path in files {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
                .to_string();
            let part = multipart::Part::bytes(bytes)
                .file_name(name)
                .mime_str("application/octet-stream")
                .context("build multipart part")?;
            form = form.part("files", part);
        }

        let resp = self
            .http
            .post(self.url("/v1/documents/upload"))
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;
        json_body(resp).await
    }

    /// POST a question to the query endpoint. Returns the raw response body;
    /// callers deserialize `AnswerResult` from the same value.
    pub async fn query(&self, question: &str, top_k: u32) -> Result<serde_json::Value> {
        let body = QueryRequest {
            question: question.to_string(),
            top_k,
        };
        let resp = self
            .http
            .post(self.url("/v1/query"))
            .json(&body)
            .send()
            .await
            .context("query request failed")?;
        json_body(resp).await
    }

    /// List indexed documents.
    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let resp = self
            .http
            .get(self.url("/v1/documents"))
            .send()
            .await
            .context("documents request failed")?;
        let value = checked_json_body(resp).await?;
        serde_json::from_value(value).context("unexpected document list shape")
    }

    /// Backend health probe.
    pub async fn health(&self) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .context("health request failed")?;
        checked_json_body(resp).await
    }
}

/// Parse a response body as JSON regardless of status.
async fn json_body(resp: reqwest::Response) -> Result<serde_json::Value> {
    let text = resp.text().await.context("read response body")?;
    serde_json::from_str(&text).context("response was not valid JSON")
}

/// Parse a response body as JSON, treating non-2xx statuses as errors that
/// carry the status and a bounded body excerpt.
async fn checked_json_body(resp: reqwest::Response) -> Result<serde_json::Value> {
    let status = resp.status();
    let text = resp.text().await.context("read response body")?;
    if !status.is_success() {
        bail!("backend returned {status}: {}", excerpt(&text, 300));
    }
    serde_json::from_str(&text).context("response was not valid JSON")
}

fn excerpt(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(2),
            user_agent: "kbase-cli-test".to_string(),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = KbClient::new(&test_config("http://localhost:8000/")).unwrap();
        assert_eq!(client.url("/v1/query"), "http://localhost:8000/v1/query");
    }

    #[test]
    fn excerpt_bounds_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long, 300);
        assert_eq!(cut.chars().count(), 301);
        assert!(cut.ends_with('…'));
        assert_eq!(excerpt("  short  ", 300), "short");
    }

    #[tokio::test]
    async fn upload_with_unreadable_file_fails_before_network() {
        let client = KbClient::new(&test_config("http://127.0.0.1:1")).unwrap();
        let err = client
            .upload_documents(&[PathBuf::from("/nonexistent/kbase-test-input")])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("read /nonexistent/kbase-test-input"));
    }
}
