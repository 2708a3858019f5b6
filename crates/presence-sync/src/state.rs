//! # Shared Session State
//!
//! The single `AppState` instance shared by the worker loop, the mode
//! controller, and the host's display surface.
//!
//! ## Ownership & Writers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState Writers                                │
//! │                                                                         │
//! │  Field                    Writer             Readers                    │
//! │  ─────────────────────    ───────────────    ───────────────────────    │
//! │  is_authenticated         host (auth flow)   worker loop                │
//! │  mode + custom_color      ModeController     worker loop, host          │
//! │  last_presence            worker loop        host status surface        │
//! │  user                     worker loop        host status surface        │
//! │                                                                         │
//! │  mode and custom_color live in ONE ModeSnapshot behind one lock so      │
//! │  a consistent pair is always observed - never a torn read.              │
//! │  Readers get cloned snapshots, never live references.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use presence_core::{LightMode, PresenceSnapshot, Rgb, UserSnapshot, DEFAULT_CUSTOM_COLOR};

// =============================================================================
// Mode Snapshot
// =============================================================================

/// The light mode and its companion custom color, read/written as one
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSnapshot {
    /// Automatic (follow presence) or Custom (pinned color).
    pub mode: LightMode,

    /// The pinned color; meaningful only while `mode` is Custom.
    pub custom_color: Rgb,
}

impl Default for ModeSnapshot {
    fn default() -> Self {
        ModeSnapshot {
            mode: LightMode::Automatic,
            custom_color: DEFAULT_CUSTOM_COLOR,
        }
    }
}

// =============================================================================
// App State
// =============================================================================

/// Shared mutable session state (one instance per process).
///
/// Cheap to clone via `Arc`; every accessor takes or returns owned
/// snapshots so no caller ever holds a lock across an await point.
#[derive(Default)]
pub struct AppState {
    /// True between successful credential acquisition and logout.
    authenticated: AtomicBool,

    /// Mode + custom color pair.
    mode: RwLock<ModeSnapshot>,

    /// Most recently observed presence, if any.
    last_presence: RwLock<Option<PresenceSnapshot>>,

    /// Profile fetched at session start, if any.
    user: RwLock<Option<UserSnapshot>>,

    /// When the presence snapshot last changed.
    last_updated: RwLock<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Creates a fresh state (unauthenticated, Automatic mode).
    pub fn new() -> Arc<Self> {
        Arc::new(AppState::default())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Returns true if a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Flips the session flag. The worker observes the transition within
    /// one poll cycle.
    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    // =========================================================================
    // Mode
    // =========================================================================

    /// Returns the current mode + custom color pair.
    pub async fn mode(&self) -> ModeSnapshot {
        *self.mode.read().await
    }

    /// Sets the light mode, keeping the current custom color.
    pub async fn set_light_mode(&self, mode: LightMode) {
        self.mode.write().await.mode = mode;
    }

    /// Sets the custom color, keeping the current mode.
    pub async fn set_custom_color(&self, color: Rgb) {
        self.mode.write().await.custom_color = color;
    }

    /// Switches to Custom and sets its color under one lock, so a
    /// concurrent reader never sees the new mode with a stale color.
    pub async fn set_custom_mode(&self, color: Rgb) {
        let mut snapshot = self.mode.write().await;
        snapshot.mode = LightMode::Custom;
        snapshot.custom_color = color;
    }

    // =========================================================================
    // Presence / User Snapshots
    // =========================================================================

    /// Returns the most recently observed presence.
    pub async fn last_presence(&self) -> Option<PresenceSnapshot> {
        self.last_presence.read().await.clone()
    }

    /// Publishes a new presence observation.
    pub async fn set_presence(&self, presence: PresenceSnapshot) {
        *self.last_presence.write().await = Some(presence);
        *self.last_updated.write().await = Some(Utc::now());
    }

    /// When the presence snapshot last changed, if ever.
    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.read().await
    }

    /// Returns the session's user profile.
    pub async fn user(&self) -> Option<UserSnapshot> {
        self.user.read().await.clone()
    }

    /// Publishes the session's user info in one step (session start).
    pub async fn set_user_info(&self, user: UserSnapshot, presence: PresenceSnapshot) {
        *self.user.write().await = Some(user);
        *self.last_presence.write().await = Some(presence);
        *self.last_updated.write().await = Some(Utc::now());
    }

    /// Clears per-session data (logout).
    pub async fn clear_session(&self) {
        self.set_authenticated(false);
        *self.user.write().await = None;
        *self.last_presence.write().await = None;
        *self.last_updated.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let state = AppState::new();
        assert!(!state.is_authenticated());
        let mode = state.mode().await;
        assert_eq!(mode.mode, LightMode::Automatic);
        assert_eq!(mode.custom_color, DEFAULT_CUSTOM_COLOR);
        assert!(state.last_presence().await.is_none());
    }

    #[tokio::test]
    async fn test_mode_pair_updates_independently() {
        let state = AppState::new();
        state.set_light_mode(LightMode::Custom).await;
        state.set_custom_color(Rgb::new(1, 2, 3)).await;

        let snapshot = state.mode().await;
        assert_eq!(snapshot.mode, LightMode::Custom);
        assert_eq!(snapshot.custom_color, Rgb::new(1, 2, 3));

        state.set_light_mode(LightMode::Automatic).await;
        let snapshot = state.mode().await;
        assert_eq!(snapshot.mode, LightMode::Automatic);
        // Color survives mode flips.
        assert_eq!(snapshot.custom_color, Rgb::new(1, 2, 3));
    }

    #[tokio::test]
    async fn test_clear_session_resets_snapshots() {
        let state = AppState::new();
        state.set_authenticated(true);
        state
            .set_user_info(
                UserSnapshot::new("Ada"),
                PresenceSnapshot::new("Available", "Available"),
            )
            .await;
        assert!(state.user().await.is_some());

        state.clear_session().await;
        assert!(!state.is_authenticated());
        assert!(state.user().await.is_none());
        assert!(state.last_presence().await.is_none());
    }
}
