//! Insight regeneration state machine
//!
//! Models the "regenerate insight" action independently of any UI toolkit:
//!
//! ```text
//! Idle -> Running -> Completed -> (display window) -> Idle
//!            \-> Cancelled (teardown)
//! ```
//!
//! - `start()` only acts from `Idle`; calling it while a run is pending is
//!   a no-op and never schedules a second timer.
//! - Completion fires after a simulated analysis latency; the `Completed`
//!   state (the transient "refreshed" flag) clears after a display window.
//! - `teardown()` (also run on drop) cancels any pending transition. Every
//!   transition re-checks the run id and current state under the lock, so
//!   nothing can complete after teardown.
//!
//! Regeneration does not alter any `InsightRecord`; it only drives the
//! affordance state. Timers run on the tokio runtime current at `start()`;
//! without one, `start()` logs a warning and leaves the controller idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Simulated analysis latency
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1800);
/// How long the "refreshed" state stays visible
pub const DEFAULT_DISPLAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl RegenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationState::Idle => "idle",
            RegenerationState::Running => "running",
            RegenerationState::Completed => "completed",
            RegenerationState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RegenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timing policy for regeneration runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationConfig {
    pub latency: Duration,
    pub display: Duration,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            display: DEFAULT_DISPLAY,
        }
    }
}

impl RegenerationConfig {
    pub fn new(latency: Duration, display: Duration) -> Result<Self> {
        if latency.is_zero() || display.is_zero() {
            return Err(Error::Configuration(
                "regeneration latency and display durations must be non-zero".to_string(),
            ));
        }
        Ok(Self { latency, display })
    }
}

struct Inner {
    state: RegenerationState,
    started_at: Option<DateTime<Utc>>,
    /// Id of the most recently started run
    run: u64,
    completions: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<RegenerationState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `run` from `from` to `to`; false if the run was superseded or torn down
    fn transition(&self, run: u64, from: RegenerationState, to: RegenerationState) -> bool {
        let mut inner = self.lock();
        if inner.run != run || inner.state != from {
            tracing::debug!(run, from = %from, to = %to, state = %inner.state, "Stale regeneration transition dropped");
            return false;
        }

        inner.state = to;
        match to {
            RegenerationState::Completed => inner.completions += 1,
            RegenerationState::Idle => {
                inner.started_at = None;
                inner.task = None;
            }
            _ => {}
        }
        self.state_tx.send_replace(to);
        tracing::debug!(run, state = %to, "Regeneration state changed");
        true
    }
}

/// Cancellable, single-outstanding-timer regeneration controller
pub struct InsightRegenerationController {
    config: RegenerationConfig,
    shared: Arc<Shared>,
}

impl Default for InsightRegenerationController {
    fn default() -> Self {
        Self::new(RegenerationConfig::default())
    }
}

impl InsightRegenerationController {
    pub fn new(config: RegenerationConfig) -> Self {
        let (state_tx, _) = watch::channel(RegenerationState::Idle);
        Self {
            config,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: RegenerationState::Idle,
                    started_at: None,
                    run: 0,
                    completions: 0,
                    task: None,
                }),
                state_tx,
            }),
        }
    }

    /// Begin a regeneration run.
    ///
    /// Returns false (and schedules nothing) unless the controller is `Idle`
    /// and a tokio runtime is available.
    pub fn start(&self) -> bool {
        let mut inner = self.shared.lock();
        if inner.state != RegenerationState::Idle {
            tracing::debug!(state = %inner.state, "Regeneration already in progress, ignoring start");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "No tokio runtime available, regeneration not started");
                return false;
            }
        };

        inner.run += 1;
        let run = inner.run;
        inner.state = RegenerationState::Running;
        inner.started_at = Some(Utc::now());
        self.shared.state_tx.send_replace(RegenerationState::Running);

        let shared = Arc::clone(&self.shared);
        let config = self.config;
        inner.task = Some(runtime.spawn(async move {
            tokio::time::sleep(config.latency).await;
            if !shared.transition(run, RegenerationState::Running, RegenerationState::Completed) {
                return;
            }
            tokio::time::sleep(config.display).await;
            shared.transition(run, RegenerationState::Completed, RegenerationState::Idle);
        }));

        tracing::info!(run, latency_ms = config.latency.as_millis() as u64, "Insight regeneration started");
        true
    }

    /// Cancel any pending transition and move to the terminal `Cancelled` state
    pub fn teardown(&self) {
        let mut inner = self.shared.lock();
        if inner.state == RegenerationState::Cancelled {
            return;
        }

        if let Some(task) = inner.task.take() {
            task.abort();
        }
        if inner.state == RegenerationState::Running {
            tracing::info!(run = inner.run, "Pending insight regeneration cancelled");
        }
        inner.state = RegenerationState::Cancelled;
        inner.started_at = None;
        self.shared.state_tx.send_replace(RegenerationState::Cancelled);
    }

    pub fn state(&self) -> RegenerationState {
        self.shared.lock().state
    }

    /// True while the transient "refreshed" notice should be shown
    pub fn is_refreshed(&self) -> bool {
        self.state() == RegenerationState::Completed
    }

    /// Start time of the current run
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().started_at
    }

    /// Number of runs that reached `Completed`
    pub fn completions(&self) -> u64 {
        self.shared.lock().completions
    }

    pub fn config(&self) -> RegenerationConfig {
        self.config
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<RegenerationState> {
        self.shared.state_tx.subscribe()
    }
}

impl Drop for InsightRegenerationController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_config_rejects_zero_durations() {
        assert!(RegenerationConfig::new(ms(0), ms(3000)).is_err());
        assert!(RegenerationConfig::new(ms(1800), ms(0)).is_err());
        assert_eq!(
            RegenerationConfig::new(ms(1800), ms(3000)).unwrap(),
            RegenerationConfig::default()
        );
    }

    #[test]
    fn test_start_without_runtime_stays_idle() {
        let controller = InsightRegenerationController::default();
        assert!(!controller.start());
        assert_eq!(controller.state(), RegenerationState::Idle);
        assert!(controller.started_at().is_none());

        controller.teardown();
        assert_eq!(controller.state(), RegenerationState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle() {
        let controller = InsightRegenerationController::default();
        assert_eq!(controller.state(), RegenerationState::Idle);

        assert!(controller.start());
        assert_eq!(controller.state(), RegenerationState::Running);
        assert!(controller.started_at().is_some());
        assert!(!controller.is_refreshed());

        tokio::time::sleep(ms(1801)).await;
        assert_eq!(controller.state(), RegenerationState::Completed);
        assert!(controller.is_refreshed());

        tokio::time::sleep(ms(3000)).await;
        assert_eq!(controller.state(), RegenerationState::Idle);
        assert!(!controller.is_refreshed());
        assert!(controller.started_at().is_none());
        assert_eq!(controller.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_still_running_before_latency_elapses() {
        let controller = InsightRegenerationController::default();
        controller.start();

        tokio::time::sleep(ms(1799)).await;
        assert_eq!(controller.state(), RegenerationState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_schedules_one_completion() {
        let controller = InsightRegenerationController::default();
        assert!(controller.start());
        assert!(!controller.start());

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(controller.completions(), 1);
        assert_eq!(controller.state(), RegenerationState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_ignored_while_completed() {
        let controller = InsightRegenerationController::default();
        controller.start();
        tokio::time::sleep(ms(2000)).await;
        assert_eq!(controller.state(), RegenerationState::Completed);

        assert!(!controller.start());
        tokio::time::sleep(ms(3000)).await;
        assert_eq!(controller.state(), RegenerationState::Idle);
        assert_eq!(controller.completions(), 1);

        // A fresh run is allowed once idle again
        assert!(controller.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_while_running_never_completes() {
        let controller = InsightRegenerationController::default();
        let mut rx = controller.subscribe();
        controller.start();

        tokio::time::sleep(ms(1000)).await;
        controller.teardown();
        assert_eq!(controller.state(), RegenerationState::Cancelled);

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(controller.state(), RegenerationState::Cancelled);
        assert_eq!(controller.completions(), 0);
        assert!(!controller.is_refreshed());
        assert_eq!(*rx.borrow_and_update(), RegenerationState::Cancelled);

        assert!(!controller.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_run() {
        let controller = InsightRegenerationController::default();
        let rx = controller.subscribe();
        controller.start();
        drop(controller);

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(*rx.borrow(), RegenerationState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let config = RegenerationConfig::new(ms(100), ms(200)).unwrap();
        let controller = InsightRegenerationController::new(config);
        let mut rx = controller.subscribe();

        controller.start();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), RegenerationState::Running);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), RegenerationState::Completed);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), RegenerationState::Idle);
    }
}
