use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{extract_bearer, fingerprint, AuthError};
use crate::error::ApiError;

/// Fingerprint of the presented credential, keyed into the rate limiter
#[derive(Clone, Debug)]
pub struct CredentialKey(pub String);

impl CredentialKey {
    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

/// API-key authentication middleware. Resolves the bearer credential and
/// injects the `Identity` plus its `CredentialKey` into the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = extract_bearer(request.headers()).map_err(|e| {
        tracing::debug!("Rejected request without usable Authorization header: {}", e);
        ApiError::from(e)
    })?;

    let key = CredentialKey(fingerprint(&credential));

    let identity = match state.resolver.resolve(&credential).await {
        Ok(identity) => identity,
        Err(AuthError::Unauthenticated) => {
            tracing::warn!("Authentication failed for key {}", key.short());
            return Err(AuthError::Unauthenticated.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!("Authenticated {} ({}) with key {}", identity.email, identity.id, key.short());

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(key);

    Ok(next.run(request).await)
}
