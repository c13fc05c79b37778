//! Ephemeral authorization store.
//!
//! Holds short-lived proof-of-identity records issued after the external
//! identity provider verifies a subject whose email is on the operator's
//! allow-list. Records expire by TTL (checked at read time, never swept) and
//! gate every state-mutating tool.
//!
//! Lookup is deliberately not keyed by caller identity: the tool transport
//! does not carry subject identity on every call, so the store answers "is
//! any fresh session active". Single-operator simplification; see DESIGN.md.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::store::{AUTH_NAMESPACE, KvStore};

/// Proof that a subject recently completed identity verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub subject_id: String,
    pub subject_email: String,
    pub verified: bool,
    pub issued_at: DateTime<Utc>,
}

/// TTL-gated record store over the key-value capability.
pub struct AuthStore {
    store: Arc<dyn KvStore>,
    allowed_emails: Vec<String>,
    auth_url: String,
    ttl: ChronoDuration,
}

impl AuthStore {
    pub fn new(store: Arc<dyn KvStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            allowed_emails: config.allowed_emails.clone(),
            auth_url: config.auth_url.clone(),
            ttl: ChronoDuration::from_std(config.ttl).unwrap_or(ChronoDuration::hours(1)),
        }
    }

    /// The identity-provider entry point users are sent to.
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Whether an email is on the operator's allow-list.
    pub fn is_allowed(&self, email: &str) -> bool {
        let email = email.to_ascii_lowercase();
        self.allowed_emails.iter().any(|e| *e == email)
    }

    /// Accept an external identity assertion: allow-list membership and a
    /// verified assertion are required before a record is issued.
    pub async fn accept_assertion(
        &self,
        subject_id: &str,
        subject_email: &str,
        verified: bool,
    ) -> Result<(), AuthError> {
        if !verified || !self.is_allowed(subject_email) {
            return Err(AuthError::NotAllowed(subject_email.to_string()));
        }
        self.issue(subject_id, subject_email).await
    }

    /// Persist a fresh record for the subject, overwriting any prior one.
    pub async fn issue(&self, subject_id: &str, subject_email: &str) -> Result<(), AuthError> {
        let record = AuthorizationRecord {
            subject_id: subject_id.to_string(),
            subject_email: subject_email.to_string(),
            verified: true,
            issued_at: Utc::now(),
        };
        let value = serde_json::to_value(&record)
            .map_err(|_| AuthError::StoreUnavailable)?;
        self.store
            .put(&format!("{AUTH_NAMESPACE}{subject_id}"), value)
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist authorization record: {e}");
                AuthError::StoreUnavailable
            })?;
        tracing::info!(subject = subject_id, "Authorization record issued");
        Ok(())
    }

    /// The most recent record still inside its TTL, if any.
    ///
    /// Store trouble fails closed: any error reading records is logged and
    /// reported as "no authorization".
    pub async fn current(&self) -> Option<AuthorizationRecord> {
        let keys = match self.store.list_keys(AUTH_NAMESPACE).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("Authorization store unavailable, failing closed: {e}");
                return None;
            }
        };

        let now = Utc::now();
        let mut newest: Option<AuthorizationRecord> = None;
        for key in keys {
            let value = match self.store.get(&key).await {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Authorization store unavailable, failing closed: {e}");
                    return None;
                }
            };
            let record: AuthorizationRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(key, "Skipping unreadable authorization record: {e}");
                    continue;
                }
            };
            if now - record.issued_at >= self.ttl {
                continue;
            }
            let is_newer = newest
                .as_ref()
                .is_none_or(|best| record.issued_at > best.issued_at);
            if is_newer {
                newest = Some(record);
            }
        }
        newest
    }

    /// The gate in front of state-mutating tools.
    pub async fn require_fresh(&self) -> Result<AuthorizationRecord, AuthError> {
        self.current().await.ok_or(AuthError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;

    fn auth_config(ttl: Duration) -> AuthConfig {
        AuthConfig {
            allowed_emails: vec!["a@b.com".to_string()],
            auth_url: "https://id.example/login".to_string(),
            ttl,
        }
    }

    fn store_with_ttl(ttl: Duration) -> AuthStore {
        AuthStore::new(Arc::new(MemoryStore::new()), &auth_config(ttl))
    }

    #[tokio::test]
    async fn test_issue_then_current_within_ttl() {
        let auth = store_with_ttl(Duration::from_secs(3600));
        auth.issue("u1", "a@b.com").await.unwrap();

        let record = auth.current().await.unwrap();
        assert_eq!(record.subject_email, "a@b.com");
        assert_eq!(record.subject_id, "u1");
    }

    #[tokio::test]
    async fn test_expired_record_is_absent() {
        let auth = store_with_ttl(Duration::from_millis(10));
        auth.issue("u1", "a@b.com").await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(auth.current().await.is_none());
        assert!(auth.require_fresh().await.is_err());
    }

    #[tokio::test]
    async fn test_newest_fresh_record_wins() {
        let auth = store_with_ttl(Duration::from_secs(3600));
        auth.issue("u1", "a@b.com").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        auth.issue("u2", "a@b.com").await.unwrap();

        let record = auth.current().await.unwrap();
        assert_eq!(record.subject_id, "u2");
    }

    #[tokio::test]
    async fn test_assertion_rejected_off_allowlist() {
        let auth = store_with_ttl(Duration::from_secs(3600));
        let err = auth
            .accept_assertion("u1", "mallory@evil.com", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mallory@evil.com"));
        assert!(auth.current().await.is_none());
    }

    #[tokio::test]
    async fn test_unverified_assertion_rejected() {
        let auth = store_with_ttl(Duration::from_secs(3600));
        assert!(auth.accept_assertion("u1", "a@b.com", false).await.is_err());
    }

    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn put(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let auth = AuthStore::new(
            Arc::new(BrokenStore),
            &auth_config(Duration::from_secs(3600)),
        );
        assert!(auth.current().await.is_none());
        assert!(matches!(
            auth.require_fresh().await.unwrap_err(),
            AuthError::NotAuthorized
        ));
    }
}
