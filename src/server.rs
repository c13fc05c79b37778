//! HTTP surface: identity assertion intake plus a thin tool transport.
//!
//! The transport stays dumb on purpose: the registry already produces final
//! user-facing text, so tool-level failures ride back in-band with a 200.
//! Only the intake endpoint speaks in status codes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthStore;
use crate::error::{AuthError, ServerError};
use crate::tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthStore>,
    pub registry: Arc<ToolRegistry>,
}

/// Identity assertion forwarded by the external identity provider.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub subject_id: String,
    pub subject_email: String,
    #[serde(default)]
    pub verified: bool,
    /// Provider session token; carried for audit logs only.
    #[serde(default)]
    pub session_token: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/authenticate", post(authenticate_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(tool_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn authenticate_handler(
    State(state): State<AppState>,
    Json(request): Json<AuthenticateRequest>,
) -> impl IntoResponse {
    if request.session_token.is_some() {
        tracing::debug!(subject = %request.subject_id, "Assertion carries a session token");
    }

    match state
        .auth
        .accept_assertion(&request.subject_id, &request.subject_email, request.verified)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            "Authentication successful. Booking operations are now unlocked for one hour."
                .to_string(),
        ),
        Err(AuthError::NotAllowed(email)) => (
            StatusCode::FORBIDDEN,
            format!("Email {email} is not authorized to use this service."),
        ),
        Err(e) => {
            tracing::error!("Authentication intake failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed due to an internal error.".to_string(),
            )
        }
    }
}

async fn list_tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.schemas())
}

async fn tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> impl IntoResponse {
    let output = state.registry.dispatch(&name, params).await;
    output.text
}

/// Owns the bound listener and its serving task: build routes, start once,
/// shut down gracefully.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            shutdown_tx: None,
            handle: None,
        }
    }

    pub async fn start(&mut self, state: AppState) -> Result<(), ServerError> {
        let app = routes(state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::StartupFailed(format!("bind {}: {e}", self.addr)))?;

        tracing::info!("API server listening on {}", self.addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("API server shutting down");
                })
                .await
            {
                tracing::error!("API server error: {e}");
            }
        });

        self.handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::config::AuthConfig;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        let auth = Arc::new(AuthStore::new(
            Arc::new(MemoryStore::new()),
            &AuthConfig {
                allowed_emails: vec!["a@b.com".to_string()],
                auth_url: "https://id.example/login".to_string(),
                ttl: Duration::from_secs(3600),
            },
        ));
        let registry = Arc::new(ToolRegistry::new(Arc::clone(&auth)));
        AppState { auth, registry }
    }

    fn authenticate_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/authenticate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_allowed_email() {
        let state = test_state();
        let app = routes(state.clone());

        let response = app
            .oneshot(authenticate_request(serde_json::json!({
                "subject_id": "u1",
                "subject_email": "a@b.com",
                "verified": true,
                "session_token": "tok"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.auth.current().await.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unlisted_email_naming_it() {
        let state = test_state();
        let app = routes(state.clone());

        let response = app
            .oneshot(authenticate_request(serde_json::json!({
                "subject_id": "u2",
                "subject_email": "mallory@evil.com",
                "verified": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("mallory@evil.com"));
        assert!(state.auth.current().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_rides_back_in_band() {
        let state = test_state();
        let app = routes(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tools/frobnicate")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = routes(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
