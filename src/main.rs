use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nge_api::config::AppConfig;
use nge_api::database::{DatabaseManager, PgUserDirectory};
use nge_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and JWT_SECRET
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nge_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!("Starting NGE API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let directory = Arc::new(PgUserDirectory::new(pool.clone()));
    let state = AppState::new(&config, pool, directory);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state, &config)).await.context("server error")?;
    Ok(())
}
