// Public endpoints: no API key required

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "OK"
    }))
}

/// GET /health - reports degraded when a configured database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "API is running"
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "API is running"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "database unavailable"
                })),
            )
        }
    }
}

/// GET /version
pub async fn version(State(state): State<AppState>) -> Json<Value> {
    let app = &state.config.app;
    Json(json!({
        "app": app.name,
        "version": app.version,
        "build_version": app.build_version,
        "build_date": app.build_date,
        "git_commit": app.git_commit,
    }))
}
