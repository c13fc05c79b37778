//! Tool trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthorizationRecord;
use crate::error::ToolError;

/// Per-invocation context handed to a tool by the registry.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The fresh authorization record, present iff the gate passed. Gated
    /// tools can rely on it; public tools usually ignore it.
    pub auth: Option<AuthorizationRecord>,
    /// Trace id stamped on the invocation's log lines.
    pub trace_id: Option<Uuid>,
}

impl ToolContext {
    /// The authorized subject's email.
    ///
    /// Only meaningful inside a gated tool; the registry never dispatches one
    /// without a record.
    pub fn subject_email(&self) -> Result<&str, ToolError> {
        self.auth
            .as_ref()
            .map(|r| r.subject_email.as_str())
            .ok_or_else(|| {
                ToolError::ExecutionFailed("no authorization record on a gated call".to_string())
            })
    }
}

/// Output from a tool execution: human-readable text, plus the structured
/// form where one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Definition of a tool's parameters using JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Trait for the operations exposed to callers.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's argument object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Whether a fresh authorization record is required before this tool may
    /// run. State-mutating tools say yes.
    fn requires_auth(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Pull a required string parameter out of an argument object.
pub fn required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{key}' parameter")))
}

/// Pull an optional string parameter.
pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}
