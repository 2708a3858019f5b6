//! LIFX cloud backend.
//!
//! Drives bulbs through the LIFX HTTP API with a bearer token. Colors
//! go out as hex strings against a selector ("all", "label:...",
//! "id:...").

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use presence_core::Rgb;

use crate::config::{LifxSettings, LightConfig};
use crate::error::{SyncError, SyncResult};

use super::{resolve_color, LastApplied, LightActuator};

pub struct LifxActuator {
    http: reqwest::Client,
    config: Arc<RwLock<LightConfig>>,
    last_applied: LastApplied,
}

impl LifxActuator {
    pub fn new(http: reqwest::Client, config: Arc<RwLock<LightConfig>>) -> Self {
        LifxActuator {
            http,
            config,
            last_applied: LastApplied::default(),
        }
    }

    async fn settings(&self) -> LifxSettings {
        self.config.read().await.lifx.clone()
    }

    async fn put_state(&self, settings: &LifxSettings, color: Rgb) -> SyncResult<()> {
        let url = format!(
            "{}/lights/{}/state",
            settings.base_url.trim_end_matches('/'),
            settings.selector
        );
        let body = json!({
            "power": "on",
            "color": color.to_hex(),
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Actuator {
                backend: "lifx",
                reason: format!("cloud API returned {}", status),
            });
        }

        info!(selector = %settings.selector, color = %color, "LIFX lights updated");
        Ok(())
    }

    async fn apply(&self, color: Rgb) -> SyncResult<()> {
        let settings = self.settings().await;
        if !settings.is_configured() {
            return Err(SyncError::NotConfigured("lifx"));
        }

        if self.last_applied.is_unchanged(&settings.selector, color).await {
            debug!(selector = %settings.selector, color = %color, "LIFX color unchanged, skipping");
            return Ok(());
        }

        match self.put_state(&settings, color).await {
            Ok(()) => {
                self.last_applied.record(&settings.selector, color).await;
                Ok(())
            }
            Err(e) => {
                self.last_applied.clear(&settings.selector).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl LightActuator for LifxActuator {
    fn name(&self) -> &'static str {
        "lifx"
    }

    async fn is_configured(&self) -> bool {
        self.settings().await.is_configured()
    }

    async fn set_availability(&self, availability: &str, activity: Option<&str>) -> SyncResult<()> {
        let color = resolve_color(&self.config, availability, activity).await;
        self.apply(color).await
    }

    async fn set_color(&self, color: Rgb) -> SyncResult<()> {
        self.apply(color).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifx_config(server: &mockito::Server) -> Arc<RwLock<LightConfig>> {
        let mut config = LightConfig::default();
        config.lifx.enabled = true;
        config.lifx.api_key = "lifx-token".to_string();
        config.lifx.selector = "all".to_string();
        config.lifx.base_url = server.url();
        Arc::new(RwLock::new(config))
    }

    #[tokio::test]
    async fn test_set_color_sends_bearer_and_hex() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/lights/all/state")
            .match_header("authorization", "Bearer lifx-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "power": "on",
                "color": "#ff0000",
            })))
            .with_status(207)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let actuator = LifxActuator::new(reqwest::Client::new(), lifx_config(&server));
        actuator.set_color(Rgb::new(255, 0, 0)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_availability_resolves_through_palette() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/lights/all/state")
            .match_body(mockito::Matcher::PartialJson(json!({
                "color": "#00cc00",
            })))
            .with_status(200)
            .create_async()
            .await;

        let actuator = LifxActuator::new(reqwest::Client::new(), lifx_config(&server));
        actuator.set_availability("Available", None).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cloud_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/lights/all/state")
            .with_status(401)
            .create_async()
            .await;

        let actuator = LifxActuator::new(reqwest::Client::new(), lifx_config(&server));
        let err = actuator.set_color(Rgb::new(0, 0, 255)).await.unwrap_err();
        assert!(matches!(err, SyncError::Actuator { backend: "lifx", .. }));
    }
}
