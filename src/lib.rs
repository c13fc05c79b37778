//! courtside: automated court reservations on a site with no API.
//!
//! The core is three tightly coupled pieces sharing one mutable automation
//! resource: the session manager (acquire/reuse/expire a single remote
//! browser handle), the suspendable booking workflow (availability →
//! initiate → await code → complete), and the TTL-backed authorization store
//! gating every state-mutating operation. Everything external (the browser
//! driver, the identity provider, the summarizer) is an opaque capability
//! behind a trait.

pub mod auth;
pub mod availability;
pub mod booking;
pub mod config;
pub mod driver;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;
pub mod store;
pub mod tools;

use std::sync::Arc;

use crate::auth::AuthStore;
use crate::availability::AvailabilityQuery;
use crate::booking::{BookingRecordStore, BookingWorkflow, CourtSite};
use crate::config::AppConfig;
use crate::driver::{DriverConnector, EndpointConnector};
use crate::llm::create_summarizer;
use crate::server::AppState;
use crate::session::SessionManager;
use crate::store::{KvStore, MemoryStore};
use crate::tools::ToolRegistry;
use crate::tools::builtin::{
    AuthStatusTool, AuthUrlTool, AvailabilityTool, DiagnosticTool, HistoryTool, StartBookingTool,
    SubmitCodeTool,
};

/// The wired application: the HTTP state plus the session manager, which the
/// binary owns for shutdown teardown.
pub struct App {
    pub state: AppState,
    pub session: Arc<SessionManager>,
}

/// Wire the whole application from configuration, with the default in-memory
/// store and the configured driver connector.
pub fn build_app(config: &AppConfig) -> App {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let connector: Arc<dyn DriverConnector> = Arc::new(EndpointConnector::new(&config.driver));
    build_app_with(config, store, connector)
}

/// Wire the application around caller-supplied store and driver capabilities.
pub fn build_app_with(
    config: &AppConfig,
    store: Arc<dyn KvStore>,
    connector: Arc<dyn DriverConnector>,
) -> App {
    let auth = Arc::new(AuthStore::new(Arc::clone(&store), &config.auth));
    let session = Arc::new(SessionManager::new(connector, config.session_freshness));
    let site = Arc::new(CourtSite::new(config.site.clone()));
    let records = Arc::new(BookingRecordStore::new(store));
    let summarizer = create_summarizer(&config.summarizer);

    let availability = Arc::new(AvailabilityQuery::new(
        Arc::clone(&session),
        Arc::clone(&site),
        summarizer,
    ));
    let workflow = Arc::new(BookingWorkflow::new(
        Arc::clone(&session),
        site,
        Arc::clone(&records),
    ));

    let mut registry = ToolRegistry::new(Arc::clone(&auth));
    registry.register(Arc::new(AvailabilityTool::new(availability)));
    registry.register(Arc::new(StartBookingTool::new(Arc::clone(&workflow))));
    registry.register(Arc::new(SubmitCodeTool::new(workflow)));
    registry.register(Arc::new(HistoryTool::new(records)));
    registry.register(Arc::new(AuthStatusTool::new(Arc::clone(&auth))));
    registry.register(Arc::new(AuthUrlTool::new(Arc::clone(&auth))));
    registry.register(Arc::new(DiagnosticTool::new(Arc::clone(&session))));

    App {
        state: AppState {
            auth,
            registry: Arc::new(registry),
        },
        session,
    }
}
