//! Authorization status tools.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::AuthStore;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolContext, ToolOutput};

/// Public: reports whether a fresh authorization record exists.
pub struct AuthStatusTool {
    auth: Arc<AuthStore>,
}

impl AuthStatusTool {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Tool for AuthStatusTool {
    fn name(&self) -> &str {
        "auth_status"
    }

    fn description(&self) -> &str {
        "Report whether a fresh authorization session is active."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        match self.auth.current().await {
            Some(record) => Ok(ToolOutput::text(format!(
                "Authorized as {} (since {}).",
                record.subject_email,
                record.issued_at.format("%Y-%m-%d %H:%M UTC")
            ))),
            None => Ok(ToolOutput::text(format!(
                "Not authorized. Visit {} to authenticate.",
                self.auth.auth_url()
            ))),
        }
    }
}

/// Public: hands out the identity-provider entry point.
pub struct AuthUrlTool {
    auth: Arc<AuthStore>,
}

impl AuthUrlTool {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Tool for AuthUrlTool {
    fn name(&self) -> &str {
        "get_auth_url"
    }

    fn description(&self) -> &str {
        "Get the login URL for authorizing booking operations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::text(format!(
            "Authenticate at {}",
            self.auth.auth_url()
        )))
    }
}
