use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use stockyard_api::{app, state::{AppState, AuthConfig}};
use stockyard_store::{app_config::Config, HttpRequestStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockyard_api=debug,stockyard_offer=debug,stockyard_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Stockyard API on port {}", config.server.port);

    // Request Store and Distance Service share one HTTP client
    let store = Arc::new(HttpRequestStore::from_config(&config.store).context("Failed to build store client")?);
    tracing::info!("Using request store at {}", config.store.base_url);

    let app_state = AppState::new(
        store.clone(),
        store,
        AuthConfig { secret: config.auth.jwt_secret.clone() },
        config.navigation.transit_route.clone(),
    )
    .with_view_idle_timeout(config.views.idle_timeout());

    // Abandoned page views are reclaimed in the background
    app_state.spawn_view_sweeper(config.views.sweep_interval());

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("Failed to bind")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
