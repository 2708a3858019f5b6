//! # Light Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PRESENCE_GRAPH_TOKEN=eyJ0...                                       │
//! │     PRESENCE_POLL_INTERVAL_SECS=10                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/presence-light/config.toml (Linux)                       │
//! │     ~/Library/Application Support/com.presence-light/... (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 s polling, all backends disabled, stock palette                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Per-Backend Gating
//! Each backend section carries its own `enabled` flag plus the fields its
//! transport needs. `is_configured()` is the single predicate the worker
//! evaluates every cycle: enabled AND all required fields present. An
//! incomplete backend is silently skipped - never an error.
//!
//! ## Configuration File Format
//! ```toml
//! [graph]
//! client_id = "ddb80e06-..."
//! tenant_id = "common"
//!
//! [light]
//! polling_interval_secs = 5
//!
//! [hue]
//! enabled = true
//! bridge_address = "192.168.1.2"
//! api_key = "bridge-user-key"
//! light_id = "4"
//!
//! [lifx]
//! enabled = false
//! api_key = ""
//! selector = "label:Desk Lamp"
//!
//! [webhook]
//! enabled = true
//! method = "POST"
//! url = "https://example.test/hooks/presence"
//!
//! [colors]
//! available = "#00cc00"
//! busy = "#ff0000"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use presence_core::Palette;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Graph Settings
// =============================================================================

/// Settings for the remote presence source (Microsoft Graph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Azure AD application (client) id used by the auth provider.
    #[serde(default)]
    pub client_id: String,

    /// Tenant to authenticate against.
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    /// API base URL. Overridable for tests and sovereign clouds.
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,

    /// Static bearer token for headless deployments.
    ///
    /// Interactive token acquisition lives outside the engine; when the
    /// host has no interactive provider it can pin a token here (or via
    /// `PRESENCE_GRAPH_TOKEN`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_tenant_id() -> String {
    "common".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

impl Default for GraphSettings {
    fn default() -> Self {
        GraphSettings {
            client_id: String::new(),
            tenant_id: default_tenant_id(),
            base_url: default_graph_base_url(),
            token: None,
        }
    }
}

// =============================================================================
// Light Settings
// =============================================================================

/// Loop-wide light behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightSettings {
    /// Seconds between presence poll cycles.
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,
}

fn default_polling_interval() -> u64 {
    5
}

impl Default for LightSettings {
    fn default() -> Self {
        LightSettings {
            polling_interval_secs: default_polling_interval(),
        }
    }
}

// =============================================================================
// Hue Settings (bridge-local bulb)
// =============================================================================

/// Settings for the Hue bridge backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HueSettings {
    /// Master switch for the backend.
    #[serde(default)]
    pub enabled: bool,

    /// Bridge IP or hostname (no scheme).
    #[serde(default)]
    pub bridge_address: String,

    /// Registered bridge user key.
    #[serde(default)]
    pub api_key: String,

    /// The bridge-local id of the bulb to drive.
    #[serde(default)]
    pub light_id: String,
}

impl HueSettings {
    /// Enabled and every field the transport needs is present.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.bridge_address.is_empty()
            && !self.api_key.is_empty()
            && !self.light_id.is_empty()
    }
}

// =============================================================================
// LIFX Settings (cloud bulb)
// =============================================================================

/// Settings for the LIFX cloud backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifxSettings {
    /// Master switch for the backend.
    #[serde(default)]
    pub enabled: bool,

    /// LIFX cloud personal access token.
    #[serde(default)]
    pub api_key: String,

    /// LIFX selector ("all", "id:...", "label:...").
    #[serde(default = "default_lifx_selector")]
    pub selector: String,

    /// Cloud API base URL. Overridable for tests.
    #[serde(default = "default_lifx_base_url")]
    pub base_url: String,
}

fn default_lifx_selector() -> String {
    "all".to_string()
}

fn default_lifx_base_url() -> String {
    "https://api.lifx.com/v1".to_string()
}

impl Default for LifxSettings {
    fn default() -> Self {
        LifxSettings {
            enabled: false,
            api_key: String::new(),
            selector: default_lifx_selector(),
            base_url: default_lifx_base_url(),
        }
    }
}

impl LifxSettings {
    /// Enabled and every field the transport needs is present.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty() && !self.selector.is_empty()
    }
}

// =============================================================================
// Webhook Settings (generic target)
// =============================================================================

/// HTTP method for the webhook backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Get,
}

impl std::fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookMethod::Post => write!(f, "POST"),
            WebhookMethod::Get => write!(f, "GET"),
        }
    }
}

/// Settings for the generic webhook backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Master switch for the backend.
    #[serde(default)]
    pub enabled: bool,

    /// Method to use for the call.
    #[serde(default)]
    pub method: WebhookMethod,

    /// Target URL.
    #[serde(default)]
    pub url: String,
}

impl WebhookSettings {
    /// Enabled and a target URL is present.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.url.is_empty()
    }
}

// =============================================================================
// Main Light Configuration
// =============================================================================

/// Complete engine configuration.
///
/// The running instance lives behind `Arc<tokio::sync::RwLock<...>>` so
/// the worker reads a fresh view each cycle and the host can hot-swap it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightConfig {
    /// Remote presence source settings.
    #[serde(default)]
    pub graph: GraphSettings,

    /// Loop-wide light behavior.
    #[serde(default)]
    pub light: LightSettings,

    /// Hue bridge backend.
    #[serde(default)]
    pub hue: HueSettings,

    /// LIFX cloud backend.
    #[serde(default)]
    pub lifx: LifxSettings,

    /// Generic webhook backend.
    #[serde(default)]
    pub webhook: WebhookSettings,

    /// Availability → color palette.
    #[serde(default)]
    pub colors: Palette,
}

impl LightConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (config.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading light config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if the load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load light config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Light config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// Hard rules only. Backend incompleteness is NOT an error - the
    /// worker skips incomplete backends per cycle.
    pub fn validate(&self) -> SyncResult<()> {
        if self.light.polling_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "polling_interval_secs must be greater than 0".into(),
            ));
        }

        if !self.webhook.url.is_empty() {
            url::Url::parse(&self.webhook.url)?;
        }

        if !self.graph.base_url.starts_with("http://") && !self.graph.base_url.starts_with("https://")
        {
            return Err(SyncError::InvalidUrl(format!(
                "graph base_url must be http(s), got: {}",
                self.graph.base_url
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("PRESENCE_GRAPH_TOKEN") {
            debug!("Overriding Graph token from environment");
            self.graph.token = Some(token);
        }

        if let Ok(client_id) = std::env::var("PRESENCE_GRAPH_CLIENT_ID") {
            self.graph.client_id = client_id;
        }

        if let Ok(interval) = std::env::var("PRESENCE_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                debug!(secs, "Overriding polling interval from environment");
                self.light.polling_interval_secs = secs;
            }
        }

        if let Ok(addr) = std::env::var("PRESENCE_HUE_BRIDGE") {
            self.hue.bridge_address = addr;
        }

        if let Ok(key) = std::env::var("PRESENCE_HUE_API_KEY") {
            self.hue.api_key = key;
        }

        if let Ok(key) = std::env::var("PRESENCE_LIFX_API_KEY") {
            self.lifx.api_key = key;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "presence-light", "presence-light")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Seconds between hot-loop poll cycles.
    pub fn polling_interval_secs(&self) -> u64 {
        self.light.polling_interval_secs
    }

    /// Returns true if at least one backend is fully configured.
    pub fn any_backend_configured(&self) -> bool {
        self.hue.is_configured() || self.lifx.is_configured() || self.webhook.is_configured()
    }
}
