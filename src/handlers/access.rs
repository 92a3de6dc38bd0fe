// Access management: the caller's profile plus API key expiration and quota
// updates. Every route here sits behind auth → rate limit → permission.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct UpdateExpiredDateRequest {
    pub expired_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRateLimitRequest {
    pub rate_limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ExpiredDateUpdated {
    pub user_id: Uuid,
    pub email: String,
    pub expired_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitUpdated {
    pub user_id: Uuid,
    pub email: String,
    pub rate_limit: u32,
}

/// GET /v1/profile
pub async fn profile(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}

/// PUT /v1/access/:id/expired-date
pub async fn update_expired_date(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateExpiredDateRequest>, JsonRejection>,
) -> ApiResult<ExpiredDateUpdated> {
    let id = parse_id(&id)?;
    let Json(req) = body.map_err(|e| {
        tracing::debug!("Invalid expiration body: {}", e);
        ApiError::bad_request("Invalid request body")
    })?;

    let identity = find_identity(&state, id).await?;

    if let Some(expired_date) = req.expired_date {
        if expired_date < Utc::now() {
            return Err(ApiError::bad_request("Expiration date must be in the future"));
        }
    }

    state
        .store
        .update_expired_date(identity.id, req.expired_date)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update expiration date for {}: {}", identity.id, e);
            ApiError::internal_server_error("Failed to update expiration date")
        })?;

    tracing::info!("Expiration for {} set to {:?}", identity.email, req.expired_date);

    Ok(ApiResponse::success(ExpiredDateUpdated {
        user_id: identity.id,
        email: identity.email,
        expired_date: req.expired_date,
    }))
}

/// DELETE /v1/access/:id/expired-date
pub async fn remove_expired_date(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ExpiredDateUpdated> {
    let id = parse_id(&id)?;
    let identity = find_identity(&state, id).await?;

    state
        .store
        .update_expired_date(identity.id, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to remove expiration date for {}: {}", identity.id, e);
            ApiError::internal_server_error("Failed to remove expiration date")
        })?;

    tracing::info!("Expiration for {} removed", identity.email);

    Ok(ApiResponse::success(ExpiredDateUpdated {
        user_id: identity.id,
        email: identity.email,
        expired_date: None,
    })
    .with_message("API key will never expire"))
}

/// PUT /v1/access/:id/rate-limit
pub async fn update_rate_limit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateRateLimitRequest>, JsonRejection>,
) -> ApiResult<RateLimitUpdated> {
    let id = parse_id(&id)?;
    let Json(req) = body.map_err(|e| {
        tracing::debug!("Invalid rate limit body: {}", e);
        ApiError::bad_request("Invalid request body")
    })?;

    if req.rate_limit < 1 {
        return Err(ApiError::bad_request("Rate limit must be at least 1"));
    }
    let rate_limit = u32::try_from(req.rate_limit)
        .map_err(|_| ApiError::bad_request("Rate limit is too large"))?;

    let identity = find_identity(&state, id).await?;

    state
        .store
        .update_rate_limit(identity.id, rate_limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update rate limit for {}: {}", identity.id, e);
            ApiError::internal_server_error("Failed to update rate limit")
        })?;

    tracing::info!("Rate limit for {} set to {}/min", identity.email, rate_limit);

    Ok(ApiResponse::success(RateLimitUpdated {
        user_id: identity.id,
        email: identity.email,
        rate_limit,
    }))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid user ID"))
}

async fn find_identity(state: &AppState, id: Uuid) -> Result<Identity, ApiError> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
