//! # Light Actuators
//!
//! The polymorphic backend surface: one trait, three implementations.
//!
//! ## Fan-Out Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Per-Cycle Actuator Fan-Out                         │
//! │                                                                         │
//! │                        worker cycle                                     │
//! │                             │                                           │
//! │        ┌────────────────────┼────────────────────┐                      │
//! │        ▼                    ▼                    ▼                      │
//! │  ┌───────────┐        ┌───────────┐        ┌───────────┐               │
//! │  │ Hue       │        │ LIFX      │        │ Webhook   │               │
//! │  │ (bridge)  │        │ (cloud)   │        │ (generic) │               │
//! │  └─────┬─────┘        └─────┬─────┘        └─────┬─────┘               │
//! │        │                    │                    │                      │
//! │   is_configured?       is_configured?       is_configured?              │
//! │   no → skip silently   no → skip silently   no → skip silently         │
//! │        │                    │                    │                      │
//! │   unchanged color?     unchanged color?     unchanged color?            │
//! │   yes → Ok, no call    yes → Ok, no call    yes → Ok, no call          │
//! │        │                    │                    │                      │
//! │   HTTP call            HTTP call            HTTP call                   │
//! │   failure → logged,    INDEPENDENT: one backend's failure never         │
//! │   contained            prevents or cancels the others                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Device selection (bridge light id, LIFX selector, webhook URL) comes
//! from each backend's own config section, so the trait surface stays
//! transport-neutral.

mod hue;
mod lifx;
mod webhook;

pub use hue::HueActuator;
pub use lifx::LifxActuator;
pub use webhook::WebhookActuator;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

use presence_core::{map_presence_to_color, Rgb};

use crate::config::LightConfig;
use crate::error::SyncResult;

// =============================================================================
// Actuator Trait
// =============================================================================

/// A smart-light control surface.
///
/// Implementations are independently enabled/configured and keep their
/// own change-suppression state. Callers invoke `set_*` unconditionally;
/// skipping a redundant transport call is internal.
#[async_trait]
pub trait LightActuator: Send + Sync {
    /// Stable backend name, used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Enabled AND fully configured, evaluated against the live config.
    ///
    /// The worker checks this fresh every cycle; config can change at
    /// runtime.
    async fn is_configured(&self) -> bool;

    /// Resolves the presence to a color via the palette and applies it.
    async fn set_availability(&self, availability: &str, activity: Option<&str>) -> SyncResult<()>;

    /// Applies an explicit color, bypassing the palette (custom mode).
    async fn set_color(&self, color: Rgb) -> SyncResult<()>;
}

/// Resolves a presence value against the live palette.
pub(crate) async fn resolve_color(
    config: &RwLock<LightConfig>,
    availability: &str,
    activity: Option<&str>,
) -> Rgb {
    let palette = config.read().await.colors;
    map_presence_to_color(availability, activity, &palette)
}

// =============================================================================
// Change Suppression
// =============================================================================

/// Remembers the last color successfully applied per device.
///
/// A repeat of the same color is acknowledged without a transport call.
/// Failed applies clear the entry so the next cycle retries the device.
#[derive(Default)]
pub(crate) struct LastApplied {
    colors: Mutex<HashMap<String, Rgb>>,
}

impl LastApplied {
    /// True if `color` is already live on `device`.
    pub(crate) async fn is_unchanged(&self, device: &str, color: Rgb) -> bool {
        self.colors.lock().await.get(device) == Some(&color)
    }

    /// Records a successful apply.
    pub(crate) async fn record(&self, device: &str, color: Rgb) {
        self.colors.lock().await.insert(device.to_string(), color);
    }

    /// Forgets a device after a failed apply.
    pub(crate) async fn clear(&self, device: &str) {
        self.colors.lock().await.remove(device);
    }
}

// =============================================================================
// Fan-Out
// =============================================================================

/// One backend's result from a fan-out pass.
pub struct ApplyOutcome {
    /// Backend name.
    pub backend: &'static str,

    /// The backend's own result; failures are already logged.
    pub result: SyncResult<()>,
}

/// Applies a presence value to every configured actuator.
///
/// Sequential, order-insensitive; each backend is attempted regardless
/// of sibling failures. Unconfigured backends are skipped silently and
/// produce no outcome.
pub async fn apply_presence(
    actuators: &[Arc<dyn LightActuator>],
    availability: &str,
    activity: Option<&str>,
) -> Vec<ApplyOutcome> {
    let mut outcomes = Vec::with_capacity(actuators.len());

    for actuator in actuators {
        if !actuator.is_configured().await {
            debug!(backend = actuator.name(), "Backend not configured, skipping");
            continue;
        }

        let result = actuator.set_availability(availability, activity).await;
        if let Err(ref e) = result {
            error!(backend = actuator.name(), error = %e, "Actuator update failed");
        }
        outcomes.push(ApplyOutcome {
            backend: actuator.name(),
            result,
        });
    }

    outcomes
}

/// Applies an explicit color to every configured actuator.
pub async fn apply_color(actuators: &[Arc<dyn LightActuator>], color: Rgb) -> Vec<ApplyOutcome> {
    let mut outcomes = Vec::with_capacity(actuators.len());

    for actuator in actuators {
        if !actuator.is_configured().await {
            debug!(backend = actuator.name(), "Backend not configured, skipping");
            continue;
        }

        let result = actuator.set_color(color).await;
        if let Err(ref e) = result {
            error!(backend = actuator.name(), error = %e, "Actuator update failed");
        }
        outcomes.push(ApplyOutcome {
            backend: actuator.name(),
            result,
        });
    }

    outcomes
}

/// Builds the actuator set for the configured backends.
///
/// All three are constructed; per-cycle `is_configured` checks decide
/// which ones actually fire.
pub fn build_actuators(
    http: reqwest::Client,
    config: Arc<RwLock<LightConfig>>,
) -> Vec<Arc<dyn LightActuator>> {
    vec![
        Arc::new(HueActuator::new(http.clone(), config.clone())),
        Arc::new(LifxActuator::new(http.clone(), config.clone())),
        Arc::new(WebhookActuator::new(http, config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted actuator for fan-out tests.
    pub(crate) struct StubActuator {
        pub name: &'static str,
        pub configured: bool,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StubActuator {
        pub(crate) fn new(name: &'static str, configured: bool, fail: bool) -> Arc<Self> {
            Arc::new(StubActuator {
                name,
                configured,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LightActuator for StubActuator {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn is_configured(&self) -> bool {
            self.configured
        }

        async fn set_availability(&self, _: &str, _: Option<&str>) -> SyncResult<()> {
            self.set_color(Rgb::new(0, 0, 0)).await
        }

        async fn set_color(&self, _: Rgb) -> SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SyncError::Actuator {
                    backend: self.name,
                    reason: "scripted failure".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_fanout_skips_unconfigured_backends() {
        let configured = StubActuator::new("hue", true, false);
        let unconfigured = StubActuator::new("lifx", false, false);
        let actuators: Vec<Arc<dyn LightActuator>> = vec![configured.clone(), unconfigured.clone()];

        let outcomes = apply_presence(&actuators, "Available", None).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].backend, "hue");
        assert_eq!(configured.calls.load(Ordering::SeqCst), 1);
        assert_eq!(unconfigured.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fanout_contains_failures_to_one_backend() {
        let failing = StubActuator::new("hue", true, true);
        let healthy = StubActuator::new("lifx", true, false);
        let actuators: Vec<Arc<dyn LightActuator>> = vec![failing.clone(), healthy.clone()];

        let outcomes = apply_color(&actuators, Rgb::new(1, 2, 3)).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|o| o.backend == "hue" && o.result.is_err()));
        assert!(outcomes.iter().any(|o| o.backend == "lifx" && o.result.is_ok()));
        // The failing sibling never blocked the healthy one.
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_applied_suppression_and_reset() {
        let last = LastApplied::default();
        let red = Rgb::new(255, 0, 0);

        assert!(!last.is_unchanged("bulb-1", red).await);
        last.record("bulb-1", red).await;
        assert!(last.is_unchanged("bulb-1", red).await);
        assert!(!last.is_unchanged("bulb-2", red).await);
        assert!(!last.is_unchanged("bulb-1", Rgb::new(0, 255, 0)).await);

        last.clear("bulb-1").await;
        assert!(!last.is_unchanged("bulb-1", red).await);
    }
}
