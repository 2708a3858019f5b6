//! # Sync Error Types
//!
//! Error types for the presence sync engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Presence API   │  │      Actuator           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NotAuth'd      │  │  Actuator{backend,..}   │ │
//! │  │  ConfigLoad     │  │  Api{status}    │  │  NotConfigured          │ │
//! │  │  ConfigSave     │  │  BatchIncomplete│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Handling strategy per category:                                       │
//! │  • Configuration → fail fast at startup, skip backend at runtime       │
//! │  • Presence API  → retried, then restarts the session (self-healing)   │
//! │  • Actuator      → logged, contained to that backend for the cycle     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all engine failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Errors are categorized for different handling strategies
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// Invalid backend address or API URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Presence Source Errors
    // =========================================================================
    /// No bearer credential is available.
    ///
    /// The authentication provider is an external collaborator; "it could
    /// not produce a token" is treated as "not authenticated", never as a
    /// fatal fault.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// The presence source returned a failure status.
    #[error("Presence source returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A batch response was missing one of its sub-responses.
    #[error("Batch response incomplete: missing '{0}'")]
    BatchIncomplete(&'static str),

    /// The presence source returned a payload we could not interpret.
    #[error("Unexpected presence payload: {0}")]
    UnexpectedPayload(String),

    /// Transport-level HTTP failure (DNS, TLS, connect, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Actuator Errors
    // =========================================================================
    /// A light backend call failed.
    #[error("{backend} actuator failed: {reason}")]
    Actuator { backend: &'static str, reason: String },

    /// A backend was invoked without complete configuration.
    ///
    /// The fan-out path never produces this (unconfigured backends are
    /// skipped); it guards direct calls only.
    #[error("{0} backend is not fully configured")]
    NotConfigured(&'static str),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The worker is shutting down.
    #[error("Sync worker is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Core domain error (color parsing).
    #[error(transparent)]
    Core(#[from] presence_core::CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::UnexpectedPayload(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if this error indicates a missing/rejected credential.
    ///
    /// The retry policy deliberately does NOT consult this: the reference
    /// behavior retries every failure, auth included. The hook exists so
    /// a future policy change can stop retrying these without re-deriving
    /// the classification.
    pub fn is_auth_error(&self) -> bool {
        match self {
            SyncError::NotAuthenticated(_) => true,
            SyncError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
                | SyncError::InvalidUrl(_)
                | SyncError::NotConfigured(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_classification() {
        assert!(SyncError::NotAuthenticated("no token".into()).is_auth_error());
        assert!(SyncError::Api { status: 401, body: String::new() }.is_auth_error());
        assert!(SyncError::Api { status: 403, body: String::new() }.is_auth_error());
        assert!(!SyncError::Api { status: 500, body: String::new() }.is_auth_error());
        assert!(!SyncError::ShuttingDown.is_auth_error());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(SyncError::InvalidConfig("bad".into()).is_config_error());
        assert!(SyncError::NotConfigured("hue").is_config_error());
        assert!(!SyncError::BatchIncomplete("presence").is_config_error());
    }

    #[test]
    fn test_actuator_error_display() {
        let err = SyncError::Actuator {
            backend: "lifx",
            reason: "rate limited".into(),
        };
        assert!(err.to_string().contains("lifx"));
        assert!(err.to_string().contains("rate limited"));
    }
}
