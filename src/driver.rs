//! Remote browser-automation capability.
//!
//! The driver itself is an external collaborator; this module defines only
//! the capability surface the rest of the crate drives. A connector yields a
//! live driver handle; the handle opens pages; pages expose the navigation
//! primitives the booking scripts need. None of the selector knowledge lives
//! here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DriverConfig;
use crate::error::DriverError;

/// One open page of the remote automation instance.
#[async_trait]
pub trait AutomationPage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Replace the contents of an input.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    /// Type into an input keystroke by keystroke (some widgets ignore fills).
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Wait until an element matching the selector is present.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Read the combined text of all elements matching the selector.
    async fn read_text(&self, selector: &str) -> Result<String, DriverError>;

    /// Whether an element matching the selector currently exists. Never
    /// waits; used to probe pages across invocations.
    async fn is_present(&self, selector: &str) -> Result<bool, DriverError>;
}

/// A live connection to one remote automation instance.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Open a fresh page.
    async fn open_page(&self) -> Result<Arc<dyn AutomationPage>, DriverError>;

    /// Every page currently open on this instance, oldest first.
    async fn pages(&self) -> Result<Vec<Arc<dyn AutomationPage>>, DriverError>;

    /// Close the instance and every page it holds.
    async fn close(&self) -> Result<(), DriverError>;
}

/// Acquires driver handles. The session manager owns exactly one connector
/// and calls it at most once per acquisition.
#[async_trait]
pub trait DriverConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn AutomationDriver>, DriverError>;
}

/// Production connector: validates the configured binding before handing the
/// acquisition off to the remote endpoint.
///
/// The wire protocol to the remote driver is deployment-specific and plugged
/// in behind [`DriverConnector`]; an unset endpoint is the one failure this
/// crate itself can diagnose, and it must read as a configuration problem,
/// not a transient one.
pub struct EndpointConnector {
    endpoint: Option<String>,
}

impl EndpointConnector {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl DriverConnector for EndpointConnector {
    async fn connect(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            DriverError::NotConfigured(
                "COURTSIDE_DRIVER_ENDPOINT is not set; the automation driver binding is missing"
                    .to_string(),
            )
        })?;

        // No transport is compiled into this build; deployments supply one by
        // wiring their own connector in main.
        Err(DriverError::NotConfigured(format!(
            "no automation transport is compiled in for endpoint {endpoint}"
        )))
    }
}
