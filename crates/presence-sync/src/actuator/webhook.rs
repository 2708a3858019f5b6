//! Generic webhook backend.
//!
//! Pushes state to an arbitrary HTTP endpoint so home-automation hubs
//! and custom receivers can react. POST sends a JSON body; GET encodes
//! the same fields as query parameters.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use presence_core::Rgb;

use crate::config::{LightConfig, WebhookMethod, WebhookSettings};
use crate::error::{SyncError, SyncResult};

use super::{resolve_color, LastApplied, LightActuator};

/// The payload shape for both transports.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    availability: &'a str,
    activity: &'a str,
    color: String,
}

pub struct WebhookActuator {
    http: reqwest::Client,
    config: Arc<RwLock<LightConfig>>,
    last_applied: LastApplied,
}

impl WebhookActuator {
    pub fn new(http: reqwest::Client, config: Arc<RwLock<LightConfig>>) -> Self {
        WebhookActuator {
            http,
            config,
            last_applied: LastApplied::default(),
        }
    }

    async fn settings(&self) -> WebhookSettings {
        self.config.read().await.webhook.clone()
    }

    async fn send(
        &self,
        settings: &WebhookSettings,
        payload: &WebhookPayload<'_>,
    ) -> SyncResult<()> {
        let request = match settings.method {
            WebhookMethod::Post => self.http.post(&settings.url).json(payload),
            WebhookMethod::Get => self.http.get(&settings.url).query(payload),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Actuator {
                backend: "webhook",
                reason: format!("endpoint returned {}", status),
            });
        }

        info!(url = %settings.url, color = %payload.color, "Webhook notified");
        Ok(())
    }

    async fn apply(&self, availability: &str, activity: &str, color: Rgb) -> SyncResult<()> {
        let settings = self.settings().await;
        if !settings.is_configured() {
            return Err(SyncError::NotConfigured("webhook"));
        }

        if self.last_applied.is_unchanged(&settings.url, color).await {
            debug!(url = %settings.url, color = %color, "Webhook color unchanged, skipping");
            return Ok(());
        }

        let payload = WebhookPayload {
            availability,
            activity,
            color: color.to_hex(),
        };

        match self.send(&settings, &payload).await {
            Ok(()) => {
                self.last_applied.record(&settings.url, color).await;
                Ok(())
            }
            Err(e) => {
                self.last_applied.clear(&settings.url).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl LightActuator for WebhookActuator {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn is_configured(&self) -> bool {
        self.settings().await.is_configured()
    }

    async fn set_availability(&self, availability: &str, activity: Option<&str>) -> SyncResult<()> {
        let color = resolve_color(&self.config, availability, activity).await;
        self.apply(availability, activity.unwrap_or(""), color).await
    }

    async fn set_color(&self, color: Rgb) -> SyncResult<()> {
        self.apply("Custom", "", color).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook_config(server: &mockito::Server, method: WebhookMethod) -> Arc<RwLock<LightConfig>> {
        let mut config = LightConfig::default();
        config.webhook.enabled = true;
        config.webhook.method = method;
        config.webhook.url = format!("{}/notify", server.url());
        Arc::new(RwLock::new(config))
    }

    #[tokio::test]
    async fn test_post_sends_json_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notify")
            .match_body(mockito::Matcher::Json(json!({
                "availability": "DoNotDisturb",
                "activity": "Presenting",
                "color": "#b20000",
            })))
            .with_status(204)
            .create_async()
            .await;

        let config = webhook_config(&server, WebhookMethod::Post);
        let actuator = WebhookActuator::new(reqwest::Client::new(), config);
        actuator
            .set_availability("DoNotDisturb", Some("Presenting"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_sends_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/notify")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("availability".into(), "Away".into()),
                mockito::Matcher::UrlEncoded("color".into(), "#ffff00".into()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let config = webhook_config(&server, WebhookMethod::Get);
        let actuator = WebhookActuator::new(reqwest::Client::new(), config);
        actuator.set_availability("Away", None).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/notify")
            .with_status(502)
            .create_async()
            .await;

        let config = webhook_config(&server, WebhookMethod::Post);
        let actuator = WebhookActuator::new(reqwest::Client::new(), config);
        let err = actuator.set_color(Rgb::new(10, 20, 30)).await.unwrap_err();
        assert!(matches!(err, SyncError::Actuator { backend: "webhook", .. }));
    }
}
