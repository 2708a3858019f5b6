//! Philips Hue bridge backend.
//!
//! Talks to the bridge's local REST API over plain HTTP. Colors go out
//! in the bridge's native hue/sat/bri encoding, converted from RGB by
//! [`Rgb::to_hsb`].

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use presence_core::Rgb;

use crate::config::{HueSettings, LightConfig};
use crate::error::{SyncError, SyncResult};

use super::{resolve_color, LastApplied, LightActuator};

pub struct HueActuator {
    http: reqwest::Client,
    config: Arc<RwLock<LightConfig>>,
    last_applied: LastApplied,
}

impl HueActuator {
    pub fn new(http: reqwest::Client, config: Arc<RwLock<LightConfig>>) -> Self {
        HueActuator {
            http,
            config,
            last_applied: LastApplied::default(),
        }
    }

    async fn settings(&self) -> HueSettings {
        self.config.read().await.hue.clone()
    }

    /// PUTs a light state to the bridge.
    ///
    /// The bridge answers 200 even for per-field errors, but a refused
    /// connection or non-2xx status still surfaces as a failure.
    async fn put_state(&self, settings: &HueSettings, color: Rgb) -> SyncResult<()> {
        let url = format!(
            "http://{}/api/{}/lights/{}/state",
            settings.bridge_address, settings.api_key, settings.light_id
        );
        let (hue, sat, bri) = color.to_hsb();
        let body = json!({
            "on": true,
            "hue": hue,
            "sat": sat,
            "bri": bri,
        });

        let response = self.http.put(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Actuator {
                backend: "hue",
                reason: format!("bridge returned {}", status),
            });
        }

        info!(light = %settings.light_id, color = %color, "Hue light updated");
        Ok(())
    }

    async fn apply(&self, color: Rgb) -> SyncResult<()> {
        let settings = self.settings().await;
        if !settings.is_configured() {
            return Err(SyncError::NotConfigured("hue"));
        }

        if self.last_applied.is_unchanged(&settings.light_id, color).await {
            debug!(light = %settings.light_id, color = %color, "Hue color unchanged, skipping");
            return Ok(());
        }

        match self.put_state(&settings, color).await {
            Ok(()) => {
                self.last_applied.record(&settings.light_id, color).await;
                Ok(())
            }
            Err(e) => {
                // Forget the device so the next cycle retries it.
                self.last_applied.clear(&settings.light_id).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl LightActuator for HueActuator {
    fn name(&self) -> &'static str {
        "hue"
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

    fn hue_config(server: &mockito::Server) -> Arc<RwLock<LightConfig>> {
        let mut config = LightConfig::default();
        config.hue.enabled = true;
        // Bridge address carries no scheme; strip the server's.
        config.hue.bridge_address = server.url().trim_start_matches("http://").to_string();
        config.hue.api_key = "test-key".to_string();
        config.hue.light_id = "7".to_string();
        Arc::new(RwLock::new(config))
    }

    #[tokio::test]
    async fn test_set_availability_puts_hsb_state() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/test-key/lights/7/state")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let actuator = HueActuator::new(reqwest::Client::new(), hue_config(&server));
        actuator.set_availability("Busy", None).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unchanged_color_suppresses_second_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/test-key/lights/7/state")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let actuator = HueActuator::new(reqwest::Client::new(), hue_config(&server));
        actuator.set_color(Rgb::new(0, 204, 0)).await.unwrap();
        // Same color again: acknowledged without a bridge call.
        actuator.set_color(Rgb::new(0, 204, 0)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_clears_suppression() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("PUT", "/api/test-key/lights/7/state")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let actuator = HueActuator::new(reqwest::Client::new(), hue_config(&server));
        let red = Rgb::new(255, 0, 0);
        assert!(actuator.set_color(red).await.is_err());
        failing.assert_async().await;

        // After a failure the same color goes to the bridge again.
        let recovered = server
            .mock("PUT", "/api/test-key/lights/7/state")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;
        actuator.set_color(red).await.unwrap();
        recovered.assert_async().await;
    }

    #[tokio::test]
    async fn test_unconfigured_rejects() {
        let config = Arc::new(RwLock::new(LightConfig::default()));
        let actuator = HueActuator::new(reqwest::Client::new(), config);

        assert!(!actuator.is_configured().await);
        let err = actuator.set_color(Rgb::new(1, 2, 3)).await.unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured("hue")));
    }
}
