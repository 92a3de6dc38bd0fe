//! API-key authentication: header parsing, the identity store seam, and the
//! credential resolver that decides whether a presented key is usable.

pub mod memory;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::Identity;
use crate::database::DatabaseError;

pub use memory::MemoryIdentityStore;

/// Why a request could not be authenticated
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingHeader,

    #[error("Invalid authorization format. Use Bearer token")]
    InvalidFormat,

    #[error("Token is required")]
    EmptyToken,

    /// Unknown, inactive or expired credential
    #[error("Invalid or expired token")]
    Unauthenticated,

    #[error("identity store failure: {0}")]
    Store(#[from] DatabaseError),
}

/// Persistence seam for identities keyed by API key
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Raw lookup; does not filter on status or expiration
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Identity>, DatabaseError>;

    /// Active identity by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError>;

    async fn update_expired_date(
        &self,
        id: Uuid,
        expired_date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;

    async fn update_rate_limit(&self, id: Uuid, rate_limit: u32) -> Result<(), DatabaseError>;
}

/// Maps a presented credential to a usable identity
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn IdentityStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, credential: &str) -> Result<Identity, AuthError> {
        self.resolve_at(credential, Utc::now()).await
    }

    /// Succeeds only for an existing, active identity whose expiration (if
    /// any) is strictly after `now`.
    pub async fn resolve_at(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let identity = self
            .store
            .find_by_api_key(credential)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !identity.is_active() {
            tracing::debug!("Rejected inactive identity {}", identity.id);
            return Err(AuthError::Unauthenticated);
        }
        if identity.is_expired_at(now) {
            tracing::debug!("Rejected expired identity {}", identity.id);
            return Err(AuthError::Unauthenticated);
        }

        Ok(identity)
    }
}

/// Extract the bearer credential from the Authorization header
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidFormat)?;
    if auth_str.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    // HTTP/1 parsers strip trailing whitespace, so "Bearer " may arrive as "Bearer"
    let token = match auth_str.strip_prefix("Bearer") {
        Some("") => return Err(AuthError::EmptyToken),
        Some(rest) => rest.strip_prefix(' ').ok_or(AuthError::InvalidFormat)?,
        None => return Err(AuthError::InvalidFormat),
    };
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    Ok(token.to_string())
}

/// Stable, non-reversible tag for a credential; safe to log and to key
/// in-memory state by.
pub fn fingerprint(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::seeder::demo_identities;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn resolver(now: DateTime<Utc>) -> CredentialResolver {
        CredentialResolver::new(Arc::new(MemoryIdentityStore::new(demo_identities(now))))
    }

    #[test]
    fn bearer_extraction_errors() {
        assert!(matches!(extract_bearer(&HeaderMap::new()), Err(AuthError::MissingHeader)));
        assert!(matches!(extract_bearer(&headers("Basic abc")), Err(AuthError::InvalidFormat)));
        assert!(matches!(extract_bearer(&headers("bearer abc")), Err(AuthError::InvalidFormat)));
        assert!(matches!(extract_bearer(&headers("Bearer ")), Err(AuthError::EmptyToken)));
        assert!(matches!(extract_bearer(&headers("Bearer")), Err(AuthError::EmptyToken)));
        assert!(matches!(extract_bearer(&headers("Bearerabc")), Err(AuthError::InvalidFormat)));
        assert_eq!(extract_bearer(&headers("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn fingerprint_is_stable_and_hides_key() {
        let a = fingerprint("test-api-key-123");
        assert_eq!(a, fingerprint("test-api-key-123"));
        assert_ne!(a, fingerprint("test-api-key-456"));
        assert_eq!(a.len(), 64);
        assert!(!a.contains("test-api-key"));
    }

    #[tokio::test]
    async fn resolves_active_unexpired_key() {
        let now = Utc::now();
        let identity = resolver(now).resolve_at("test-api-key-123", now).await.unwrap();
        assert_eq!(identity.email, "john@example.com");
        assert_eq!(identity.rate_limit, 120);
        assert!(identity.group.is_some());
    }

    #[tokio::test]
    async fn rejects_unknown_inactive_and_expired_keys() {
        let now = Utc::now();
        let resolver = resolver(now);
        for key in ["nope", "test-api-key-456", "test-api-key-000"] {
            assert!(
                matches!(resolver.resolve_at(key, now).await, Err(AuthError::Unauthenticated)),
                "{key} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn key_expiring_exactly_now_is_rejected() {
        let now = Utc::now();
        let resolver = resolver(now);
        let john = resolver.resolve_at("test-api-key-123", now).await.unwrap();
        let expires = john.expired_date.unwrap();

        assert!(resolver.resolve_at("test-api-key-123", expires).await.is_err());
        assert!(resolver
            .resolve_at("test-api-key-123", expires - chrono::Duration::milliseconds(1))
            .await
            .is_ok());
    }
}
