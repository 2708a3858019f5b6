//! # presence-sync: Sync Engine for Presence Light
//!
//! This crate provides the synchronization layer for Presence Light:
//! fetching the signed-in user's presence from Microsoft Graph and
//! pushing the mapped color to every configured smart-light backend.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Presence Sync Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     Worker (Main Orchestrator)                   │  │
//! │  │                                                                  │  │
//! │  │  Spawned as Tokio task at startup                                │  │
//! │  │  WaitingForAuth → FetchingInitialSnapshot → Polling              │  │
//! │  │  Self-healing: failed sessions restart after 1s                  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ GraphClient    │  │ ModeController │  │  Actuator Fan-Out      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ /me, presence, │  │ Automatic vs   │  │ Hue bridge, LIFX       │    │
//! │  │ photo, $batch  │  │ Custom color   │  │ cloud, generic webhook │    │
//! │  │ 2-retry policy │  │ arbitration    │  │ change suppression     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  Shared state (AppState): auth flag, mode+color pair, last            │
//! │  presence, user profile. Read by the HTTP surface, written by the     │
//! │  worker and controllers.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`actuator`] - The `LightActuator` trait and the Hue/LIFX/webhook backends
//! - [`config`] - On-disk TOML config with env overrides
//! - [`error`] - Sync error types
//! - [`graph`] - Microsoft Graph client (`PresenceSource`, `TokenProvider`)
//! - [`mode`] - Automatic/Custom mode controller
//! - [`retry`] - Fixed-policy retry combinator (2 retries, exponential delay)
//! - [`state`] - Shared `AppState`
//! - [`worker`] - The presence sync loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use presence_sync::{
//!     actuator::build_actuators, config::LightConfig, graph::GraphClient,
//!     state::AppState, worker::Worker,
//! };
//!
//! let config = Arc::new(RwLock::new(LightConfig::load_or_default(None)?));
//! let state = AppState::new();
//! let client = Arc::new(GraphClient::new(base_url, tokens)?);
//! let actuators = build_actuators(reqwest::Client::new(), config.clone());
//!
//! let handle = Worker::new(client, actuators, state, config).spawn();
//! // ... serve the HTTP surface ...
//! handle.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod actuator;
pub mod config;
pub mod error;
pub mod graph;
pub mod mode;
pub mod retry;
pub mod state;
pub mod worker;

// =============================================================================
// Public Re-exports
// =============================================================================

pub use actuator::{apply_color, apply_presence, build_actuators, ApplyOutcome, LightActuator};
pub use config::LightConfig;
pub use error::{SyncError, SyncResult};
pub use graph::{photo_data_uri, GraphClient, PresenceSource, StaticTokenProvider, TokenProvider};
pub use mode::ModeController;
pub use retry::RetryPolicy;
pub use state::{AppState, ModeSnapshot};
pub use worker::{Worker, WorkerHandle};
