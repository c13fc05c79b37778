//! Booking tools: start a reservation, then finish it with the code.

use std::sync::Arc;

use async_trait::async_trait;

use crate::booking::BookingWorkflow;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolContext, ToolOutput, required_str};

/// Gated: drives the site up to the verification-code prompt and suspends.
pub struct StartBookingTool {
    workflow: Arc<BookingWorkflow>,
}

impl StartBookingTool {
    pub fn new(workflow: Arc<BookingWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Tool for StartBookingTool {
    fn name(&self) -> &str {
        "start_booking"
    }

    fn description(&self) -> &str {
        "Start booking a court. A verification code will be sent to the account phone; \
         finish with submit_verification_code."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "court": { "type": "string", "description": "Court name" },
                "time": { "type": "string", "description": "Slot time, e.g. \"2pm\"" },
                "date": { "type": "string", "description": "Date (YYYY-MM-DD)" }
            },
            "required": ["court", "time", "date"]
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
        let court = required_str(&params, "court")?;
        let time = required_str(&params, "time")?;
        let date = required_str(&params, "date")?;
        let email = ctx.subject_email()?;

        let pending = self.workflow.start(court, time, date, email).await?;

        Ok(ToolOutput::text(format!(
            "Reservation for {} at {} on {} is ready to confirm. A verification code was \
             just sent to the account phone. Call submit_verification_code with that code \
             to complete the booking.",
            pending.court, pending.time, pending.date
        )))
    }
}

/// Gated: resumes the suspended booking. Terminal either way.
pub struct SubmitCodeTool {
    workflow: Arc<BookingWorkflow>,
}

impl SubmitCodeTool {
    pub fn new(workflow: Arc<BookingWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Tool for SubmitCodeTool {
    fn name(&self) -> &str {
        "submit_verification_code"
    }

    fn description(&self) -> &str {
        "Complete a pending booking with the verification code from the account phone."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": { "type": "string", "description": "The verification code" }
            },
            "required": ["code"]
        })
    }

    fn requires_auth(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let code = required_str(&params, "code")?;

        let record = self.workflow.submit_code(code.trim()).await?;

        Ok(ToolOutput::text(format!(
            "Booked {} at {} on {}. The reservation is confirmed.",
            record.court, record.time, record.date
        )))
    }
}
