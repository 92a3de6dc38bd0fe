#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use uuid::Uuid;

use keygate_api::auth::MemoryIdentityStore;
use keygate_api::config::AppConfig;
use keygate_api::database::models::Identity;
use keygate_api::database::seeder::demo_identities;
use keygate_api::{app, AppState};

pub const ADMIN_KEY: &str = "admin-api-key-789";
pub const USER_KEY: &str = "test-api-key-123";
pub const EXPIRED_KEY: &str = "test-api-key-456";
pub const INACTIVE_KEY: &str = "test-api-key-000";

/// A server instance with its own store and limiter, so tests never share
/// rate-limit state.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub store: Arc<MemoryIdentityStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryIdentityStore::new(demo_identities(Utc::now())));
        let state = AppState::new(config, store.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            base_url,
            state,
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_with_key(&self, path: &str, key: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(key)
            .send()
            .await?)
    }

    /// Register a fresh identity in the `user` group with the given quota
    pub async fn add_user(&self, api_key: &str, rate_limit: u32) -> Result<Identity> {
        let template = self.identity(USER_KEY).await?;
        let identity = Identity {
            id: Uuid::new_v4(),
            name: format!("Test {}", api_key),
            email: format!("{}@example.com", api_key),
            api_key: api_key.to_string(),
            expired_date: None,
            rate_limit,
            ..template
        };
        self.store.insert(identity.clone());
        Ok(identity)
    }

    pub async fn identity(&self, api_key: &str) -> Result<Identity> {
        use keygate_api::auth::IdentityStore;
        self.store
            .find_by_api_key(api_key)
            .await?
            .with_context(|| format!("no identity for {}", api_key))
    }
}

pub fn header(res: &reqwest::Response, name: &str) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn header_num(res: &reqwest::Response, name: &str) -> Option<i64> {
    header(res, name).and_then(|v| v.parse().ok())
}
