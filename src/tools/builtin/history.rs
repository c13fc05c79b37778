//! Booking history tool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::booking::BookingRecordStore;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolContext, ToolOutput};

const DEFAULT_LOOKBACK_DAYS: u64 = 30;
const MAX_LOOKBACK_DAYS: u64 = 90;

/// Gated: lists the caller's own completed bookings.
pub struct HistoryTool {
    records: Arc<BookingRecordStore>,
}

impl HistoryTool {
    pub fn new(records: Arc<BookingRecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Tool for HistoryTool {
    fn name(&self) -> &str {
        "list_booking_history"
    }

    fn description(&self) -> &str {
        "List your completed bookings from the last N days (default 30)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "How many days back to look (default 30, max 90)"
                }
            },
            "required": []
        })
    }

    fn requires_auth(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let days = params
            .get("days")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_LOOKBACK_DAYS)
            .clamp(1, MAX_LOOKBACK_DAYS);
        let email = ctx.subject_email()?;

        let records = self
            .records
            .history(email, days)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        if records.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No bookings in the last {days} days."
            )));
        }

        let mut lines = vec![format!("Bookings in the last {days} days:")];
        for record in &records {
            lines.push(format!(
                "- {}: {} at {} ({})",
                record.date, record.court, record.time, record.status
            ));
        }
        let data = serde_json::to_value(&records)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolOutput::text(lines.join("\n")).with_data(data))
    }
}
