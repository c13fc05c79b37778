//! Built-in tools exposed by the facade.

mod auth;
mod availability;
mod booking;
mod diagnostic;
mod history;

pub use auth::{AuthStatusTool, AuthUrlTool};
pub use availability::AvailabilityTool;
pub use booking::{StartBookingTool, SubmitCodeTool};
pub use diagnostic::DiagnosticTool;
pub use history::HistoryTool;
