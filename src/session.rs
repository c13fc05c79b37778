//! Automation session lifecycle.
//!
//! One process owns at most one remote automation session. Every operation
//! that needs the browser goes through [`SessionManager::ensure_ready`],
//! which reuses a fresh session, lazily replaces a stale one, and guarantees
//! that overlapping callers share a single acquisition attempt instead of
//! racing the connector.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use crate::driver::{AutomationDriver, DriverConnector};
use crate::error::SessionError;

type AcquireOutcome = Result<Arc<dyn AutomationDriver>, SessionError>;
type InFlight = Shared<BoxFuture<'static, AcquireOutcome>>;

/// Observable lifecycle state, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Acquiring,
    Ready,
    Closing,
}

struct ActiveSession {
    handle: Arc<dyn AutomationDriver>,
    acquired_at: Instant,
}

#[derive(Default)]
struct Inner {
    current: Option<ActiveSession>,
    in_flight: Option<InFlight>,
    closing: bool,
}

/// Owns the single shared automation handle.
pub struct SessionManager {
    connector: Arc<dyn DriverConnector>,
    freshness: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn DriverConnector>, freshness: Duration) -> Self {
        Self {
            connector,
            freshness,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Return a live automation handle, acquiring or re-acquiring as needed.
    ///
    /// A session younger than the freshness window is returned unchanged.
    /// Otherwise the stale handle (if any) is closed best-effort and one new
    /// acquisition runs; callers arriving while it is in flight await the
    /// same attempt and observe its single outcome.
    pub async fn ensure_ready(&self) -> AcquireOutcome {
        let fut = {
            let mut inner = self.inner.lock().await;

            if let Some(active) = &inner.current {
                if active.acquired_at.elapsed() < self.freshness {
                    return Ok(Arc::clone(&active.handle));
                }
            }

            if let Some(in_flight) = &inner.in_flight {
                in_flight.clone()
            } else {
                let stale = inner.current.take();
                let connector = Arc::clone(&self.connector);
                let shared_inner = Arc::clone(&self.inner);
                let fut = async move {
                    if let Some(old) = stale {
                        tracing::info!("Replacing stale automation session");
                        if let Err(e) = old.handle.close().await {
                            tracing::warn!("Failed to close stale automation session: {e}");
                        }
                    }
                    let outcome = connector.connect().await.map_err(SessionError::from);

                    // Publish the result from inside the shared attempt:
                    // whichever caller drives it to completion also clears
                    // the in-flight slot, so a caller dropped mid-acquisition
                    // cannot leave the manager stuck on a finished future.
                    let mut inner = shared_inner.lock().await;
                    inner.in_flight = None;
                    match &outcome {
                        Ok(handle) => {
                            inner.current = Some(ActiveSession {
                                handle: Arc::clone(handle),
                                acquired_at: Instant::now(),
                            });
                            tracing::info!("Automation session ready");
                        }
                        Err(e) => {
                            tracing::error!("Automation session acquisition failed: {e}");
                        }
                    }
                    outcome
                }
                .boxed()
                .shared();
                inner.in_flight = Some(fut.clone());
                fut
            }
        };

        fut.await
    }

    /// The live handle, if any, without triggering an acquisition. The
    /// handle may be past its freshness window.
    pub async fn current(&self) -> Option<Arc<dyn AutomationDriver>> {
        self.inner
            .lock()
            .await
            .current
            .as_ref()
            .map(|a| Arc::clone(&a.handle))
    }

    /// Close the session if one exists. Idempotent; close errors are logged,
    /// never propagated.
    pub async fn teardown(&self) {
        let taken = {
            let mut inner = self.inner.lock().await;
            let taken = inner.current.take();
            if taken.is_some() {
                inner.closing = true;
            }
            taken
        };

        if let Some(active) = taken {
            if let Err(e) = active.handle.close().await {
                tracing::warn!("Failed to close automation session: {e}");
            }
        }

        self.inner.lock().await.closing = false;
    }

    pub async fn state(&self) -> SessionState {
        let inner = self.inner.lock().await;
        if inner.closing {
            SessionState::Closing
        } else if inner.in_flight.is_some() {
            SessionState::Acquiring
        } else if inner.current.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }
}
