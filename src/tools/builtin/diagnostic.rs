//! Driver smoke test.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::session::SessionManager;
use crate::tools::tool::{Tool, ToolContext, ToolOutput};

const PROBE_URL: &str = "https://example.com";
const PROBE_WAIT: Duration = Duration::from_secs(10);

/// Public: exercises the automation driver end to end without touching any
/// booking state. Configuration problems surface here verbatim.
pub struct DiagnosticTool {
    session: Arc<SessionManager>,
}

impl DiagnosticTool {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for DiagnosticTool {
    fn name(&self) -> &str {
        "diagnostic"
    }

    fn description(&self) -> &str {
        "Smoke-test the browser automation driver."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let driver = self.session.ensure_ready().await?;
        let page = driver
            .open_page()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let probe = async {
            page.navigate(PROBE_URL).await?;
            page.wait_for("h1", PROBE_WAIT).await?;
            page.read_text("h1").await
        }
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("driver probe failed: {e}")))?;

        Ok(ToolOutput::text(format!(
            "Automation driver OK (session {:?}). Probe page heading: {}",
            self.session.state().await,
            probe.trim()
        )))
    }
}
