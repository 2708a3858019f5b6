//! # Presence Source Client
//!
//! Microsoft Graph client for profile, photo, and presence.
//!
//! ## Request Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Graph Client Requests                              │
//! │                                                                         │
//! │  get_profile()   GET  {base}/me                → UserSnapshot           │
//! │  get_presence()  GET  {base}/me/presence       → PresenceSnapshot       │
//! │  get_photo()     GET  {base}/me/photo/$value   → raw bytes              │
//! │                                                                         │
//! │  get_profile_and_presence()                                             │
//! │       POST {base}/$batch                                                │
//! │       { "requests": [ {id:"profile", GET /me},                          │
//! │                       {id:"presence", GET /me/presence} ] }             │
//! │       → one round trip, both sub-responses must be 2xx                  │
//! │       → any sub-failure fails the WHOLE batch (no partial result)       │
//! │                                                                         │
//! │  Every operation runs under the retry combinator (2 retries,            │
//! │  2^attempt second delays); the final error propagates unchanged.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client is generic at two seams: [`TokenProvider`] models the
//! external authentication collaborator, and [`PresenceSource`] is the
//! trait the worker consumes so tests can substitute a stub source.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use presence_core::{PresenceSnapshot, UserSnapshot};

use crate::error::{SyncError, SyncResult};
use crate::retry::{retry, RetryPolicy};

// =============================================================================
// Token Provider (external authentication collaborator)
// =============================================================================

/// Produces a bearer credential for the presence source.
///
/// Acquisition strategy (silent refresh, interactive prompt, static
/// secret) is the host's concern; the engine only asks for "a token or
/// an error". A failure here surfaces as `SyncError::NotAuthenticated`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a currently valid bearer token.
    async fn bearer_token(&self) -> SyncResult<String>;
}

/// Token provider backed by a fixed secret (headless deployments).
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Creates a provider around a pre-acquired token.
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenProvider { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> SyncResult<String> {
        if self.token.is_empty() {
            return Err(SyncError::NotAuthenticated("no token configured".into()));
        }
        Ok(self.token.clone())
    }
}

// =============================================================================
// Presence Source Trait
// =============================================================================

/// What the worker loop needs from the remote presence source.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    /// Fetches the current presence.
    async fn get_presence(&self) -> SyncResult<PresenceSnapshot>;

    /// Fetches the user profile.
    async fn get_profile(&self) -> SyncResult<UserSnapshot>;

    /// Fetches the raw profile photo bytes.
    async fn get_photo(&self) -> SyncResult<Vec<u8>>;

    /// Fetches profile and presence in a single round trip.
    ///
    /// Either both values are returned or the call fails - never a
    /// partial result.
    async fn get_profile_and_presence(&self) -> SyncResult<(UserSnapshot, PresenceSnapshot)>;
}

// =============================================================================
// Wire Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresencePayload {
    #[serde(default)]
    availability: String,
    #[serde(default)]
    activity: String,
}

impl From<PresencePayload> for PresenceSnapshot {
    fn from(p: PresencePayload) -> Self {
        PresenceSnapshot::new(p.availability, p.activity)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    #[serde(default)]
    display_name: String,
}

impl From<ProfilePayload> for UserSnapshot {
    fn from(p: ProfilePayload) -> Self {
        UserSnapshot::new(p.display_name)
    }
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    responses: Vec<BatchSubResponse>,
}

#[derive(Debug, Deserialize)]
struct BatchSubResponse {
    id: String,
    status: u16,
    #[serde(default)]
    body: serde_json::Value,
}

// =============================================================================
// Graph Client
// =============================================================================

/// Presence source client over Microsoft Graph.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    retry_policy: RetryPolicy,
}

impl GraphClient {
    /// Creates a client against the given API base URL.
    ///
    /// `base_url` has no trailing slash (e.g.
    /// `https://graph.microsoft.com/v1.0`).
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        GraphClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy (tests use `RetryPolicy::none()`).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn get_raw(&self, path: &str) -> SyncResult<reqwest::Response> {
        let token = self.tokens.bearer_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Graph GET");

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let response = self.get_raw(path).await?;
        Ok(response.json::<T>().await?)
    }

    /// One `$batch` round trip bundling the profile and presence fetches.
    async fn fetch_batch(&self) -> SyncResult<(UserSnapshot, PresenceSnapshot)> {
        info!("Fetching batched profile and presence");

        let token = self.tokens.bearer_token().await?;
        let url = format!("{}/$batch", self.base_url);
        let body = serde_json::json!({
            "requests": [
                { "id": "profile", "method": "GET", "url": "/me" },
                { "id": "presence", "method": "GET", "url": "/me/presence" },
            ]
        });

        let result: SyncResult<(UserSnapshot, PresenceSnapshot)> = async {
            let response = self.http.post(&url).bearer_auth(token).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let batch: BatchResponse = response.json().await?;
            let profile = Self::take_sub_response(&batch, "profile")?;
            let presence = Self::take_sub_response(&batch, "presence")?;

            let user: ProfilePayload = serde_json::from_value(profile)?;
            let presence: PresencePayload = serde_json::from_value(presence)?;
            Ok((user.into(), presence.into()))
        }
        .await;

        if let Err(ref e) = result {
            error!(error = %e, "Batched profile/presence fetch failed");
        }
        result
    }

    /// Extracts one sub-response body, failing the whole batch if the
    /// sub-response is missing or unsuccessful.
    fn take_sub_response(batch: &BatchResponse, id: &'static str) -> SyncResult<serde_json::Value> {
        let sub = batch
            .responses
            .iter()
            .find(|r| r.id == id)
            .ok_or(SyncError::BatchIncomplete(id))?;

        if !(200..300).contains(&sub.status) {
            return Err(SyncError::Api {
                status: sub.status,
                body: sub.body.to_string(),
            });
        }
        Ok(sub.body.clone())
    }
}

#[async_trait]
impl PresenceSource for GraphClient {
    async fn get_presence(&self) -> SyncResult<PresenceSnapshot> {
        retry(&self.retry_policy, "get_presence", || async {
            let payload: PresencePayload = self.get_json("/me/presence").await?;
            Ok(payload.into())
        })
        .await
    }

    async fn get_profile(&self) -> SyncResult<UserSnapshot> {
        retry(&self.retry_policy, "get_profile", || async {
            let payload: ProfilePayload = self.get_json("/me").await?;
            Ok(payload.into())
        })
        .await
    }

    async fn get_photo(&self) -> SyncResult<Vec<u8>> {
        retry(&self.retry_policy, "get_photo", || async {
            let response = self.get_raw("/me/photo/$value").await?;
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn get_profile_and_presence(&self) -> SyncResult<(UserSnapshot, PresenceSnapshot)> {
        retry(&self.retry_policy, "get_profile_and_presence", || self.fetch_batch()).await
    }
}

// =============================================================================
// Photo Encoding
// =============================================================================

/// Encodes raw photo bytes as the data URI the display surface expects.
pub fn photo_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:image/gif;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
