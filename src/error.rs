//! Error types for every subsystem.
//!
//! Each subsystem gets its own enum; the tool facade is the one place where
//! all of them are flattened into user-facing text.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the remote automation driver capability.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The driver binding is missing or unreachable. Fatal configuration
    /// problem, surfaced verbatim and never retried.
    #[error("Automation driver is not configured: {0}")]
    NotConfigured(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timed out after {timeout:?} waiting for {selector}")]
    WaitTimeout { selector: String, timeout: Duration },

    #[error("Driver call failed: {0}")]
    Call(String),
}

/// Errors from the automation session manager.
///
/// Clone is required: every caller blocked on a single in-flight acquisition
/// observes the same error value.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Automation session could not be acquired: {0}")]
    Acquire(#[from] DriverError),

    #[error("No live automation session")]
    NotReady,
}

impl SessionError {
    /// Whether this error should be reported as a deployment/configuration
    /// problem rather than a transient site issue.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SessionError::Acquire(DriverError::NotConfigured(_)))
    }
}

/// Errors from the key-value capability.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Stored value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Authorization failures. Expected, actionable, never bypassed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized. Authenticate first, then retry.")]
    NotAuthorized,

    #[error("Email {0} is not on the authorized list")]
    NotAllowed(String),

    /// Store trouble is deliberately reported as "not authorized": the gate
    /// fails closed, never open.
    #[error("Not authorized (authorization store unavailable)")]
    StoreUnavailable,
}

/// Booking workflow failures.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Could not understand time {input:?}. Use a format like \"2pm\" or \"2:00 PM\".")]
    InvalidTime { input: String },

    #[error("Could not understand date {input:?}. Use YYYY-MM-DD.")]
    InvalidDate { input: String },

    #[error("Unknown court {court:?}. Known courts: {known}")]
    UnknownCourt { court: String, known: String },

    #[error(
        "Requested date {date} is more than one month past the calendar view; \
         bookings that far out are not supported"
    )]
    DateTooFarOut { date: String },

    #[error("{time} is not available on {date} at {court}. Available times: {available}")]
    SlotUnavailable {
        court: String,
        date: String,
        time: String,
        available: String,
    },

    #[error("A booking is already awaiting its verification code. Submit the code or restart the service before starting another booking.")]
    AlreadyPending,

    #[error("No booking is awaiting a verification code")]
    NoPendingBooking,

    #[error("No open page is waiting for a verification code; the booking may have expired")]
    PendingPageLost,

    #[error("This slot was already reserved by someone else")]
    AlreadyReserved,

    /// Ambiguous outcome: the site never showed a success indicator within
    /// the bound, but the reservation may still have gone through.
    #[error(
        "Booking outcome unknown: no confirmation appeared within {}s. \
         Check the reservation site manually before retrying.",
        .waited.as_secs()
    )]
    VerificationTimeout { waited: Duration },

    #[error("Site interaction failed: {0}")]
    Site(#[from] DriverError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Summarization capability failures. Always recoverable: callers fall back
/// to templated text.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("No summarizer endpoint configured")]
    Unconfigured,

    #[error("Summarizer request failed: {0}")]
    Request(String),

    #[error("Summarizer returned an unusable response: {0}")]
    BadResponse(String),
}

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    NotAuthorized(#[from] AuthError),
}

impl From<BookingError> for ToolError {
    fn from(err: BookingError) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

impl From<SessionError> for ToolError {
    fn from(err: SessionError) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

/// HTTP surface errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to start server: {0}")]
    StartupFailed(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}
