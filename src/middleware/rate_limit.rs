use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::CredentialKey;
use crate::app::AppState;
use crate::database::models::Identity;
use crate::error::ApiError;
use crate::rate_limit::RateLimitDecision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Per-key rate limiting. Must run after `auth_middleware`; requests without
/// an authenticated identity pass through untouched.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (quota, key) = match (
        request.extensions().get::<Identity>(),
        request.extensions().get::<CredentialKey>(),
    ) {
        (Some(identity), Some(key)) => (identity.rate_limit, key.clone()),
        _ => return next.run(request).await,
    };

    let decision = state.limiter.check(&key.0, Some(quota));

    if !decision.allowed {
        tracing::warn!(
            "Rate limit exceeded for key {} ({} requests/minute)",
            key.short(),
            decision.limit
        );
        let mut response =
            ApiError::too_many_requests("Rate limit exceeded. Try again later.").into_response();
        apply_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &decision);
    response
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset));
}
