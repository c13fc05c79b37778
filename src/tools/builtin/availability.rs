//! Court availability tool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::availability::AvailabilityQuery;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolContext, ToolOutput, optional_str};

/// Public read-only check; never touches booking state.
pub struct AvailabilityTool {
    query: Arc<AvailabilityQuery>,
}

impl AvailabilityTool {
    pub fn new(query: Arc<AvailabilityQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Tool for AvailabilityTool {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "Check which court time slots are open on a date. All parameters are optional."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "Date to check (YYYY-MM-DD, default today)"
                },
                "court": {
                    "type": "string",
                    "description": "Court name (default: every known court)"
                },
                "time": {
                    "type": "string",
                    "description": "A specific time to look for, e.g. \"2pm\""
                }
            },
            "required": []
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let report = self
            .query
            .check(
                optional_str(&params, "date"),
                optional_str(&params, "court"),
                optional_str(&params, "time"),
            )
            .await?;

        let data = serde_json::to_value(&report)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolOutput::text(report.summary.clone()).with_data(data))
    }
}
