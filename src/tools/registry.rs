//! Tool registry and the authorization gate.
//!
//! Every external call resolves here: look the tool up, enforce the gate for
//! state-mutating tools, execute, and flatten every error into user-facing
//! text. Nothing below this boundary talks to the transport.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::auth::AuthStore;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolContext, ToolOutput, ToolSchema};

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    auth: Arc<AuthStore>,
}

impl ToolRegistry {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self {
            tools: HashMap::new(),
            auth,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Schemas of every registered tool, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Run a tool by name. Always returns text; tool-level failures are
    /// reported in-band, never propagated.
    pub async fn dispatch(&self, name: &str, params: serde_json::Value) -> ToolOutput {
        let trace_id = Uuid::new_v4();
        match self.try_dispatch(name, params, trace_id).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(%trace_id, tool = name, "Tool call failed: {e}");
                ToolOutput::text(failure_text(&e, &self.auth))
            }
        }
    }

    async fn try_dispatch(
        &self,
        name: &str,
        params: serde_json::Value,
        trace_id: Uuid,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let auth = if tool.requires_auth() {
            Some(self.auth.require_fresh().await?)
        } else {
            None
        };

        let ctx = ToolContext {
            auth,
            trace_id: Some(trace_id),
        };

        tracing::info!(%trace_id, tool = name, "Dispatching tool");
        tool.execute(params, &ctx).await
    }
}

fn failure_text(err: &ToolError, auth: &AuthStore) -> String {
    match err {
        ToolError::NotAuthorized(_) => format!(
            "{err} Visit {} to authenticate, then retry.",
            auth.auth_url()
        ),
        _ => err.to_string(),
    }
}
