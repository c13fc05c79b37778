//! Natural-language summarization capability.
//!
//! Availability facts go in, a sentence or two of prose comes out. The
//! capability is opaque and optional: when it fails or is unconfigured the
//! caller uses its own templated fallback, never an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SummarizerConfig;
use crate::error::SummarizeError;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, facts: &serde_json::Value) -> Result<String, SummarizeError>;
}

/// Build the summarizer the configuration asks for.
pub fn create_summarizer(config: &SummarizerConfig) -> Arc<dyn Summarizer> {
    match &config.endpoint {
        Some(endpoint) => {
            tracing::info!("Using HTTP summarizer at {endpoint}");
            Arc::new(HttpSummarizer::new(endpoint.clone()))
        }
        None => {
            tracing::info!("No summarizer endpoint configured; availability uses templated text");
            Arc::new(Unconfigured)
        }
    }
}

/// Posts facts to a remote summarization endpoint.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    text: String,
}

impl HttpSummarizer {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, facts: &serde_json::Value) -> Result<String, SummarizeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "facts": facts }))
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SummarizeError::Request(format!(
                "status {}",
                response.status()
            )));
        }

        let body: SummarizeResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::BadResponse(e.to_string()))?;

        let text = body.text.trim().to_string();
        if text.is_empty() {
            return Err(SummarizeError::BadResponse("empty text".to_string()));
        }
        Ok(text)
    }
}

/// Stands in when no endpoint is configured; always errors so callers take
/// their fallback path.
pub struct Unconfigured;

#[async_trait]
impl Summarizer for Unconfigured {
    async fn summarize(&self, _facts: &serde_json::Value) -> Result<String, SummarizeError> {
        Err(SummarizeError::Unconfigured)
    }
}
