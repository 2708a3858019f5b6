//! Status and session routes.
//!
//! A thin JSON surface over the shared state: the desktop shell and
//! diagnostics poll `/api/status`, and headless deployments drive the
//! session with `/api/session/login` / `/api/session/logout`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use presence_sync::error::{SyncError, SyncResult};
use presence_sync::{AppState, ModeController, TokenProvider};

// =============================================================================
// Shared Router State
// =============================================================================

#[derive(Clone)]
pub struct ApiState {
    pub app: Arc<AppState>,
    pub controller: Arc<ModeController>,
    pub tokens: Arc<SessionTokens>,
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Token provider the session routes can swap at runtime.
///
/// Seeded from config at startup; `/api/session/login` replaces the
/// token and `/api/session/logout` drops it.
pub struct SessionTokens {
    token: RwLock<Option<String>>,
}

impl SessionTokens {
    pub fn new(initial: Option<String>) -> Arc<Self> {
        Arc::new(SessionTokens {
            token: RwLock::new(initial.filter(|t| !t.is_empty())),
        })
    }

    pub async fn set(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl TokenProvider for SessionTokens {
    async fn bearer_token(&self) -> SyncResult<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| SyncError::NotAuthenticated("no session token".into()))
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub mode: String,
    pub custom_color: String,
    pub availability: Option<String>,
    pub activity: Option<String>,
    /// RFC 3339 timestamp of the last presence observation.
    pub last_updated: Option<String>,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub display_name: String,
    pub photo: Option<String>,
}

/// GET /api/status
pub async fn status(State(api): State<ApiState>) -> Json<StatusResponse> {
    let mode = api.app.mode().await;
    let presence = api.app.last_presence().await;
    let user = api.app.user().await.map(|u| UserResponse {
        display_name: u.display_name,
        photo: u.photo,
    });

    Json(StatusResponse {
        authenticated: api.app.is_authenticated(),
        mode: mode.mode.to_string(),
        custom_color: mode.custom_color.to_hex(),
        availability: presence.as_ref().map(|p| p.availability.clone()),
        activity: presence.map(|p| p.activity),
        last_updated: api.app.last_updated().await.map(|t| t.to_rfc3339()),
        user,
    })
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

/// POST /api/session/login
///
/// Stores the bearer token and raises the auth flag; the worker picks
/// the new session up within a second.
pub async fn login(
    State(api): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> StatusCode {
    if request.token.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    api.tokens.set(request.token).await;
    api.app.set_authenticated(true);
    info!("Session login accepted");
    StatusCode::NO_CONTENT
}

/// POST /api/session/logout
pub async fn logout(State(api): State<ApiState>) -> StatusCode {
    api.tokens.clear().await;
    api.app.clear_session().await;
    info!("Session logged out");
    StatusCode::NO_CONTENT
}
