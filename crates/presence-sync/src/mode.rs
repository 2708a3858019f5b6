//! Mode arbitration.
//!
//! Two modes exist: Automatic (lights follow presence) and Custom
//! (lights hold a user-chosen color). The controller owns the
//! transitions; the worker only reads the published snapshot.

use std::sync::Arc;

use tracing::info;

use presence_core::{LightMode, Rgb};

use crate::actuator::{apply_color, LightActuator};
use crate::state::AppState;

/// Switches modes and pushes custom colors to the backends.
///
/// Mode changes take effect without waking the worker: the poll loop
/// reads the mode fresh at the top of every cycle, so a switch is
/// honored within one polling interval.
pub struct ModeController {
    state: Arc<AppState>,
    actuators: Vec<Arc<dyn LightActuator>>,
}

impl ModeController {
    pub fn new(state: Arc<AppState>, actuators: Vec<Arc<dyn LightActuator>>) -> Self {
        ModeController { state, actuators }
    }

    /// Switches to Automatic; the next poll cycle resumes presence-driven
    /// updates.
    pub async fn set_automatic(&self) {
        self.state.set_light_mode(LightMode::Automatic).await;
        info!("Light mode set to automatic");
    }

    /// Switches to Custom with the given color and applies it once,
    /// immediately. While Custom is active the worker leaves the lights
    /// alone.
    pub async fn set_custom(&self, color: Rgb) {
        self.state.set_custom_mode(color).await;
        info!(color = %color, "Light mode set to custom");
        apply_color(&self.actuators, color).await;
    }

    /// Re-applies the current custom color without changing mode.
    ///
    /// No-op in Automatic; presence drives the lights there.
    pub async fn reapply_custom(&self) {
        let snapshot = self.state.mode().await;
        if snapshot.mode == LightMode::Custom {
            apply_color(&self.actuators, snapshot.custom_color).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::LightActuator;
    use crate::error::SyncResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct RecordingActuator {
        calls: AtomicUsize,
        last_color: Mutex<Option<Rgb>>,
    }

    impl RecordingActuator {
        fn new() -> Arc<Self> {
            Arc::new(RecordingActuator {
                calls: AtomicUsize::new(0),
                last_color: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LightActuator for RecordingActuator {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn is_configured(&self) -> bool {
            true
        }

        async fn set_availability(&self, _: &str, _: Option<&str>) -> SyncResult<()> {
            Ok(())
        }

        async fn set_color(&self, color: Rgb) -> SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_color.lock().await = Some(color);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_set_custom_publishes_and_applies_once() {
        let state = AppState::new();
        let actuator = RecordingActuator::new();
        let controller = ModeController::new(state.clone(), vec![actuator.clone()]);

        let teal = Rgb::new(0, 128, 128);
        controller.set_custom(teal).await;

        let snapshot = state.mode().await;
        assert_eq!(snapshot.mode, LightMode::Custom);
        assert_eq!(snapshot.custom_color, teal);
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*actuator.last_color.lock().await, Some(teal));
    }

    #[tokio::test]
    async fn test_set_automatic_does_not_touch_lights() {
        let state = AppState::new();
        let actuator = RecordingActuator::new();
        let controller = ModeController::new(state.clone(), vec![actuator.clone()]);

        controller.set_automatic().await;

        assert_eq!(state.mode().await.mode, LightMode::Automatic);
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reapply_custom_is_noop_in_automatic() {
        let state = AppState::new();
        let actuator = RecordingActuator::new();
        let controller = ModeController::new(state.clone(), vec![actuator.clone()]);

        controller.reapply_custom().await;
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 0);

        controller.set_custom(Rgb::new(255, 255, 255)).await;
        controller.reapply_custom().await;
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 2);
    }
}
