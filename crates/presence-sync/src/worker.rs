//! # Presence Worker
//!
//! The long-running sync loop that keeps the lights in step with the
//! user's presence.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Worker State Machine                            │
//! │                                                                         │
//! │   ┌──────────────────┐   auth flag set    ┌───────────────────────┐     │
//! │   │ WaitingForAuth   │ ─────────────────► │ FetchingInitial       │     │
//! │   │ (1s cadence)     │                    │ Snapshot              │     │
//! │   └──────────────────┘                    │ profile, photo,       │     │
//! │          ▲                                │ presence, first apply │     │
//! │          │                                └──────────┬────────────┘     │
//! │          │  logout / session error                   │                  │
//! │          │  (error logged, self-heals)               ▼                  │
//! │          │                                ┌───────────────────────┐     │
//! │          └─────────────────────────────── │ Polling               │     │
//! │                                           │ every interval:       │     │
//! │   shutdown signal races the WHOLE         │  Automatic → fetch +  │     │
//! │   session: in-flight fetches, backoff     │  fan-out              │     │
//! │   sleeps, and remaining actuator calls    │  Custom → hold        │     │
//! │   are abandoned, not completed            └───────────────────────┘     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The worker never terminates on its own: failed sessions are logged
//! and retried, so transient Graph or network trouble costs at most one
//! session restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use presence_core::{LightMode, UserSnapshot};

use crate::actuator::{apply_presence, LightActuator};
use crate::config::LightConfig;
use crate::error::SyncResult;
use crate::graph::{photo_data_uri, PresenceSource};
use crate::state::AppState;

/// How often the supervisor re-checks the auth flag while signed out.
const WAIT_CADENCE: Duration = Duration::from_secs(1);

// =============================================================================
// Worker
// =============================================================================

/// The presence sync loop.
///
/// Owns no transport of its own: presence comes from a
/// [`PresenceSource`], lights go out through [`LightActuator`]s, and
/// everything observable is published to the shared [`AppState`].
pub struct Worker {
    source: Arc<dyn PresenceSource>,
    actuators: Vec<Arc<dyn LightActuator>>,
    state: Arc<AppState>,
    config: Arc<RwLock<LightConfig>>,
}

/// Handle for a spawned worker; dropping it detaches the task.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signals shutdown and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.handle.await;
    }
}

impl Worker {
    pub fn new(
        source: Arc<dyn PresenceSource>,
        actuators: Vec<Arc<dyn LightActuator>>,
        state: Arc<AppState>,
        config: Arc<RwLock<LightConfig>>,
    ) -> Self {
        Worker {
            source,
            actuators,
            state,
            config,
        }
    }

    /// Spawns the worker onto the runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(self.run(shutdown_rx));
        WorkerHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        info!("Presence worker started");

        loop {
            if !self.state.is_authenticated() {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = sleep(WAIT_CADENCE) => continue,
                }
            }

            // The whole session races the shutdown signal: a signal
            // arriving mid-fetch (or mid-backoff, or mid-fan-out) drops
            // the session future on the spot instead of finishing the
            // cycle.
            let outcome = tokio::select! {
                _ = shutdown.recv() => break,
                outcome = self.run_session() => outcome,
            };

            match outcome {
                Ok(()) => {
                    info!("User logged out, no longer polling for presence");
                }
                Err(e) => {
                    error!(error = %e, "Presence session failed, restarting");
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = sleep(WAIT_CADENCE) => {}
                    }
                }
            }
        }

        info!("Presence worker stopped");
    }

    /// One authenticated session: initial snapshot, then the poll loop.
    ///
    /// Returns `Ok(())` on logout. Any error aborts the session; the
    /// supervisor restarts it after a short pause, so a failure here is
    /// never fatal. The caller cancels this future on shutdown, so no
    /// step needs its own signal check.
    async fn run_session(&self) -> SyncResult<()> {
        // Startup snapshot: profile, photo, presence, one at a time.
        let profile = self.source.get_profile().await?;

        // The photo is cosmetic; a missing or denied photo must not
        // block the session.
        let photo = match self.source.get_photo().await {
            Ok(bytes) => Some(photo_data_uri(&bytes)),
            Err(e) => {
                warn!(error = %e, "Profile photo unavailable");
                None
            }
        };

        let presence = self.source.get_presence().await?;

        let user = UserSnapshot {
            display_name: profile.display_name,
            photo,
        };
        info!(user = %user.display_name, availability = %presence.availability, "Session established");
        self.state.set_user_info(user, presence.clone()).await;
        apply_presence(&self.actuators, &presence.availability, Some(&presence.activity)).await;

        loop {
            if !self.state.is_authenticated() {
                return Ok(());
            }

            // Interval and mode are re-read every cycle so config edits
            // and mode switches land within one polling interval.
            let interval = self.config.read().await.polling_interval_secs();

            if self.state.mode().await.mode == LightMode::Automatic {
                let presence = self.source.get_presence().await?;
                self.state.set_presence(presence.clone()).await;
                apply_presence(&self.actuators, &presence.availability, Some(&presence.activity))
                    .await;
            }

            sleep(Duration::from_secs(interval)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use async_trait::async_trait;
    use presence_core::{PresenceSnapshot, Rgb};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Scripted presence source: serves a queue of presence results,
    /// then repeats the last one.
    struct ScriptedSource {
        presences: Mutex<Vec<SyncResult<PresenceSnapshot>>>,
        fetches: AtomicUsize,
        fail_startup: bool,
    }

    impl ScriptedSource {
        fn new(script: Vec<SyncResult<PresenceSnapshot>>) -> Arc<Self> {
            Arc::new(ScriptedSource {
                presences: Mutex::new(script),
                fetches: AtomicUsize::new(0),
                fail_startup: false,
            })
        }

        fn failing_startup() -> Arc<Self> {
            Arc::new(ScriptedSource {
                presences: Mutex::new(vec![]),
                fetches: AtomicUsize::new(0),
                fail_startup: true,
            })
        }

        async fn next(&self) -> SyncResult<PresenceSnapshot> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut script = self.presences.lock().await;
            if script.len() > 1 {
                script.remove(0)
            } else {
                match script.first() {
                    Some(Ok(p)) => Ok(p.clone()),
                    Some(Err(_)) | None => {
                        Err(SyncError::UnexpectedPayload("script exhausted".into()))
                    }
                }
            }
        }
    }

    #[async_trait]
    impl PresenceSource for ScriptedSource {
        async fn get_presence(&self) -> SyncResult<PresenceSnapshot> {
            self.next().await
        }

        async fn get_profile(&self) -> SyncResult<UserSnapshot> {
            if self.fail_startup {
                return Err(SyncError::Api {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(UserSnapshot {
                display_name: "Test User".to_string(),
                photo: None,
            })
        }

        async fn get_photo(&self) -> SyncResult<Vec<u8>> {
            Err(SyncError::Api {
                status: 404,
                body: "no photo".to_string(),
            })
        }

        async fn get_profile_and_presence(&self) -> SyncResult<(UserSnapshot, PresenceSnapshot)> {
            Ok((self.get_profile().await?, self.next().await?))
        }
    }

    /// Source whose remote calls hang far longer than any poll interval.
    struct HangingSource;

    #[async_trait]
    impl PresenceSource for HangingSource {
        async fn get_presence(&self) -> SyncResult<PresenceSnapshot> {
            sleep(Duration::from_secs(300)).await;
            Ok(PresenceSnapshot::new("Available", "Available"))
        }

        async fn get_profile(&self) -> SyncResult<UserSnapshot> {
            sleep(Duration::from_secs(300)).await;
            Ok(UserSnapshot::new("Slow User"))
        }

        async fn get_photo(&self) -> SyncResult<Vec<u8>> {
            sleep(Duration::from_secs(300)).await;
            Ok(vec![])
        }

        async fn get_profile_and_presence(&self) -> SyncResult<(UserSnapshot, PresenceSnapshot)> {
            Ok((self.get_profile().await?, self.get_presence().await?))
        }
    }

    struct CountingActuator {
        calls: AtomicUsize,
        last: Mutex<Option<String>>,
    }

    impl CountingActuator {
        fn new() -> Arc<Self> {
            Arc::new(CountingActuator {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl crate::actuator::LightActuator for CountingActuator {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn is_configured(&self) -> bool {
            true
        }

        async fn set_availability(&self, availability: &str, _: Option<&str>) -> SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().await = Some(availability.to_string());
            Ok(())
        }

        async fn set_color(&self, _: Rgb) -> SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn presence(availability: &str) -> PresenceSnapshot {
        PresenceSnapshot::new(availability, availability)
    }

    fn test_config() -> Arc<RwLock<LightConfig>> {
        Arc::new(RwLock::new(LightConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_authenticated() {
        let source = ScriptedSource::new(vec![Ok(presence("Available"))]);
        let actuator = CountingActuator::new();
        let state = AppState::new();
        let worker = Worker::new(
            source.clone(),
            vec![actuator.clone()],
            state.clone(),
            test_config(),
        );
        let handle = worker.spawn();

        // Signed out: nothing is fetched no matter how long we wait.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        state.set_authenticated(true);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(source.fetches.load(Ordering::SeqCst) >= 1);
        assert_eq!(state.user().await.unwrap().display_name, "Test User");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_automatic_mode_polls_and_fans_out() {
        let source = ScriptedSource::new(vec![
            Ok(presence("Available")),
            Ok(presence("Busy")),
            Ok(presence("Away")),
        ]);
        let actuator = CountingActuator::new();
        let state = AppState::new();
        state.set_authenticated(true);
        let worker = Worker::new(
            source.clone(),
            vec![actuator.clone()],
            state.clone(),
            test_config(),
        );
        let handle = worker.spawn();

        // Startup apply plus two 5s poll cycles.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(actuator.calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(
            state.last_presence().await.unwrap().availability,
            "Away"
        );

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_mode_stops_driving_lights() {
        let source = ScriptedSource::new(vec![Ok(presence("Available"))]);
        let actuator = CountingActuator::new();
        let state = AppState::new();
        state.set_authenticated(true);
        state.set_custom_mode(Rgb::new(255, 255, 255)).await;
        let worker = Worker::new(
            source.clone(),
            vec![actuator.clone()],
            state.clone(),
            test_config(),
        );
        let handle = worker.spawn();

        tokio::time::sleep(Duration::from_secs(20)).await;
        // Startup snapshot still lands, but the poll loop never fetches
        // or applies while Custom holds the lights.
        let startup_fetches = source.fetches.load(Ordering::SeqCst);
        assert_eq!(startup_fetches, 1);
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_back_to_automatic_resumes_polling() {
        let source = ScriptedSource::new(vec![Ok(presence("Available")), Ok(presence("Busy"))]);
        let actuator = CountingActuator::new();
        let state = AppState::new();
        state.set_authenticated(true);
        state.set_custom_mode(Rgb::new(255, 255, 255)).await;
        let worker = Worker::new(
            source.clone(),
            vec![actuator.clone()],
            state.clone(),
            test_config(),
        );
        let handle = worker.spawn();

        // Custom: only the startup snapshot lands.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.last_presence().await.unwrap().availability,
            "Available"
        );

        // Back to Automatic: the next cycle fetches and publishes.
        state.set_light_mode(LightMode::Automatic).await;
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(source.fetches.load(Ordering::SeqCst) >= 2);
        assert_eq!(state.last_presence().await.unwrap().availability, "Busy");
        assert_eq!(*actuator.last.lock().await, Some("Busy".to_string()));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_returns_to_waiting_within_one_cycle() {
        let source = ScriptedSource::new(vec![Ok(presence("Available"))]);
        let actuator = CountingActuator::new();
        let state = AppState::new();
        state.set_authenticated(true);
        let worker = Worker::new(
            source.clone(),
            vec![actuator.clone()],
            state.clone(),
            test_config(),
        );
        let handle = worker.spawn();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let fetches_before = source.fetches.load(Ordering::SeqCst);
        state.set_authenticated(false);

        // One polling interval later the loop has noticed and stopped.
        tokio::time::sleep(Duration::from_secs(6)).await;
        let fetches_at_logout = source.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), fetches_at_logout);
        assert!(fetches_before >= 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_session_restarts() {
        let source = ScriptedSource::failing_startup();
        let state = AppState::new();
        state.set_authenticated(true);
        let worker = Worker::new(source.clone(), vec![], state.clone(), test_config());
        let handle = worker.spawn();

        // Every ~1s the supervisor retries the failing startup; the
        // worker survives all of it.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!handle.handle.is_finished());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_in_flight_remote_call() {
        let actuator = CountingActuator::new();
        let state = AppState::new();
        state.set_authenticated(true);
        let worker = Worker::new(
            Arc::new(HangingSource),
            vec![actuator.clone()],
            state,
            test_config(),
        );
        let handle = worker.spawn();

        // The session is now stuck deep inside the startup fetch.
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Shutdown must not wait the remaining ~299s out; the in-flight
        // call is abandoned and the loop exits promptly.
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("worker did not stop while a remote call was in flight");

        // The cancelled cycle never reached the actuators.
        assert_eq!(actuator.calls.load(Ordering::SeqCst), 0);
    }
}
