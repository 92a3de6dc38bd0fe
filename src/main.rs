use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use keygate_api::auth::{IdentityStore, MemoryIdentityStore};
use keygate_api::database::{schema, seeder, DatabaseManager, PgIdentityStore};
use keygate_api::rate_limit::spawn_sweeper;
use keygate_api::{app, config, AppState};

#[derive(Parser, Debug)]
#[command(name = "keygate-api")]
#[command(about = "REST API server with API-key authentication and per-key rate limiting")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides SERVER_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Seed demo permissions, groups and API keys, then exit
    #[arg(long)]
    seed: bool,

    /// Serve the built-in demo identities from memory instead of Postgres
    #[arg(long, conflicts_with = "seed")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, DB_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = config::config().clone();
    tracing::info!("Starting {} in {:?} mode", config.app.name, config.environment);

    let state = if args.in_memory {
        tracing::warn!("Using in-memory demo identities; changes are lost on exit");
        let store: Arc<dyn IdentityStore> =
            Arc::new(MemoryIdentityStore::new(seeder::demo_identities(Utc::now())));
        AppState::new(config.clone(), store)
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        schema::ensure_schema(&pool)
            .await
            .context("failed to prepare database schema")?;

        if args.seed {
            seeder::seed(&pool).await.context("database seeding failed")?;
            tracing::info!("Seeding completed. Exiting...");
            return Ok(());
        }

        let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(
            pool.clone(),
            config.rate_limit.default_requests_per_minute,
        ));
        AppState::new(config.clone(), store).with_pool(pool)
    };

    spawn_sweeper(
        state.limiter.clone(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1)),
    );

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "Listening on http://{} (default rate limit {} requests/minute)",
        bind_addr,
        config.rate_limit.default_requests_per_minute
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
