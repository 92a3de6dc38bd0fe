use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{CredentialResolver, IdentityStore};
use crate::config::AppConfig;
use crate::handlers::{access, public};
use crate::middleware::{auth_middleware, rate_limit_middleware, require_permission, RequiredPermission};
use crate::rate_limit::RateLimiter;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn IdentityStore>,
    pub resolver: CredentialResolver,
    pub limiter: Arc<RateLimiter>,
    /// Present when backed by Postgres; used by the health check
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn IdentityStore>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.default_requests_per_minute));
        Self {
            config: Arc::new(config),
            resolver: CredentialResolver::new(store.clone()),
            store,
            limiter,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/version", get(public::version))
        // Protected API
        .merge(access_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Auth runs first, then rate limiting, then the per-route permission gate
fn access_routes(state: AppState) -> Router<AppState> {
    let profile_read = RequiredPermission::one("profile", "read");
    let access_manage = RequiredPermission::one("access", "manage");

    Router::new()
        .route(
            "/v1/profile",
            get(access::profile)
                .route_layer(middleware::from_fn_with_state(profile_read, require_permission)),
        )
        .route(
            "/v1/access/:id/expired-date",
            put(access::update_expired_date)
                .delete(access::remove_expired_date)
                .route_layer(middleware::from_fn_with_state(
                    access_manage.clone(),
                    require_permission,
                )),
        )
        .route(
            "/v1/access/:id/rate-limit",
            put(access::update_rate_limit)
                .route_layer(middleware::from_fn_with_state(access_manage, require_permission)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
