//! # Presence Light Worker
//!
//! Headless presence-to-light sync service with a small HTTP surface.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Presence Worker Process                           │
//! │                                                                         │
//! │  Microsoft Graph ◄─── Worker loop ───► Hue / LIFX / Webhook            │
//! │                           │                                             │
//! │                           ▼                                             │
//! │  Alexa skill ───► HTTP (5000) ───► AppState (status, session, mode)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod alexa;
mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use presence_sync::{build_actuators, AppState, GraphClient, LightConfig, ModeController, Worker};

use crate::routes::{ApiState, SessionTokens};

/// Bind address override, e.g. `PRESENCE_BIND=0.0.0.0:8080`.
const BIND_ENV: &str = "PRESENCE_BIND";
const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Presence Light worker...");

    // Load configuration
    let config = LightConfig::load_or_default(None);
    config.validate()?;
    if !config.any_backend_configured() {
        warn!("No light backend configured; presence will be polled but no lights driven");
    }
    info!(
        interval_secs = config.polling_interval_secs(),
        "Configuration loaded"
    );

    // Shared state
    let state = AppState::new();
    let tokens = SessionTokens::new(config.graph.token.clone());
    if config.graph.token.as_deref().is_some_and(|t| !t.is_empty()) {
        state.set_authenticated(true);
        info!("Pre-configured Graph token found, starting authenticated");
    }

    let http = reqwest::Client::new();
    let graph = Arc::new(GraphClient::new(
        http.clone(),
        config.graph.base_url.clone(),
        tokens.clone(),
    ));

    let config = Arc::new(RwLock::new(config));
    let actuators = build_actuators(http, config.clone());
    let controller = Arc::new(ModeController::new(state.clone(), actuators.clone()));

    // Spawn the sync loop
    let worker = Worker::new(graph, actuators, state.clone(), config);
    let handle = worker.spawn();

    // HTTP surface
    let api = ApiState {
        app: state,
        controller,
        tokens,
    };
    let router = Router::new()
        .route("/api/status", get(routes::status))
        .route("/api/session/login", post(routes::login))
        .route("/api/session/logout", post(routes::logout))
        .route("/api/alexa", post(alexa::handle))
        .with_state(api);

    let bind = std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&bind).await?;
    info!(address = %bind, "HTTP surface listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // Stop the sync loop before exiting
    handle.shutdown().await;
    info!("Presence Light worker stopped");

    Ok(())
}
