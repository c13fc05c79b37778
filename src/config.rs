//! Environment-driven configuration.
//!
//! Everything operational comes from the environment (or a `.env` file loaded
//! by the binary). Secrets stay wrapped in [`SecretString`] so they never land
//! in logs or debug output.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default freshness window for a reused automation session.
pub const DEFAULT_SESSION_FRESHNESS_SECS: u64 = 5 * 60;

/// Default time-to-live for an authorization record.
pub const DEFAULT_AUTH_TTL_SECS: u64 = 60 * 60;

/// Top-level application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub driver: DriverConfig,
    pub auth: AuthConfig,
    pub summarizer: SummarizerConfig,
    /// Sessions older than this are torn down and re-acquired on next use.
    pub session_freshness: Duration,
}

/// Bind address for the HTTP surface.
#[derive(Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

/// The reservation site itself: where it lives and how the operator's
/// account logs into it. These are the operator's credentials, not any end
/// user's.
#[derive(Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
}

/// Remote browser-automation binding.
#[derive(Clone)]
pub struct DriverConfig {
    /// Endpoint of the remote automation driver. Absent means every session
    /// acquisition fails with a configuration error.
    pub endpoint: Option<String>,
}

/// Authorization gate settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// Emails permitted to authorize gated operations.
    pub allowed_emails: Vec<String>,
    /// Identity-provider entry point handed out by `get_auth_url`.
    pub auth_url: String,
    /// Validity window for an issued authorization record.
    pub ttl: Duration,
}

/// Natural-language summarization endpoint for availability reports.
#[derive(Clone)]
pub struct SummarizerConfig {
    /// Absent means availability responses always use the templated fallback.
    pub endpoint: Option<String>,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr: SocketAddr = optional("COURTSIDE_BIND")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidVar {
                var: "COURTSIDE_BIND",
                reason: format!("{e}"),
            })?;

        let allowed_emails = required("COURTSIDE_ALLOWED_EMAILS")?
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if allowed_emails.is_empty() {
            return Err(ConfigError::InvalidVar {
                var: "COURTSIDE_ALLOWED_EMAILS",
                reason: "allow-list is empty".to_string(),
            });
        }

        Ok(Self {
            server: ServerConfig { addr },
            site: SiteConfig {
                base_url: optional("COURTSIDE_SITE_URL")
                    .unwrap_or_else(|| "https://www.rec.us/organizations/san-francisco".to_string()),
                username: required("COURTSIDE_SITE_USERNAME")?,
                password: SecretString::from(required("COURTSIDE_SITE_PASSWORD")?),
            },
            driver: DriverConfig {
                endpoint: optional("COURTSIDE_DRIVER_ENDPOINT"),
            },
            auth: AuthConfig {
                allowed_emails,
                auth_url: required("COURTSIDE_AUTH_URL")?,
                ttl: duration_var("COURTSIDE_AUTH_TTL_SECS", DEFAULT_AUTH_TTL_SECS)?,
            },
            summarizer: SummarizerConfig {
                endpoint: optional("COURTSIDE_SUMMARIZER_ENDPOINT"),
            },
            session_freshness: duration_var(
                "COURTSIDE_SESSION_FRESHNESS_SECS",
                DEFAULT_SESSION_FRESHNESS_SECS,
            )?,
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn duration_var(var: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    match optional(var) {
        None => Ok(Duration::from_secs(default_secs)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidVar {
                var,
                reason: format!("{e}"),
            }),
    }
}
