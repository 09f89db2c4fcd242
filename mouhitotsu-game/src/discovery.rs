//! Discover-before-timeout countdown.
//!
//! The coordinator is tick driven: its owner calls [`DiscoveryCoordinator::advance`]
//! once per frame or fixed interval. Discovery may be reported from any thread
//! through a [`DiscoveryHandle`], but it is only observed inside `advance`, so
//! every window settles exactly once and in a deterministic order.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crate::constants::{LOG_WINDOW_CANCELLED, LOG_WINDOW_SETTLED, LOG_WINDOW_STARTED};

/// How a window settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowOutcome {
    Discovered,
    Expired,
}

impl WindowOutcome {
    #[must_use]
    pub const fn discovered(self) -> bool {
        matches!(self, Self::Discovered)
    }
}

/// Result of one [`DiscoveryCoordinator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No window is live (never started, stopped, or cancelled through a handle).
    Idle,
    Running { remaining: Duration },
    /// The window settled on this tick; callbacks have already fired.
    Settled(WindowOutcome),
}

const PHASE_LIVE: u8 = 0;
const PHASE_DISCOVERED: u8 = 1;
const PHASE_SETTLED: u8 = 2;
const PHASE_CANCELLED: u8 = 3;

/// Shared state of a single window. A new one is allocated per `start`.
#[derive(Debug, Default)]
struct WindowState {
    phase: AtomicU8,
}

impl WindowState {
    fn phase(&self) -> u8 {
        self.phase.load(Ordering::Acquire)
    }

    fn mark_discovered(&self) -> bool {
        self.phase
            .compare_exchange(
                PHASE_LIVE,
                PHASE_DISCOVERED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Cancel unless already settled. Returns whether this call cancelled it.
    fn cancel(&self) -> bool {
        self.phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |phase| {
                matches!(phase, PHASE_LIVE | PHASE_DISCOVERED).then_some(PHASE_CANCELLED)
            })
            .is_ok()
    }

    /// Settle as expired, unless discovery landed first.
    fn settle_expired(&self) -> Result<(), u8> {
        self.phase
            .compare_exchange(
                PHASE_LIVE,
                PHASE_SETTLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
    }

    fn settle_discovered(&self) -> bool {
        self.phase
            .compare_exchange(
                PHASE_DISCOVERED,
                PHASE_SETTLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Thread-safe handle to one discovery window.
///
/// Handles outlive their window harmlessly: once the window settles, is
/// stopped, or is superseded by a later `start`, every call is a no-op.
#[derive(Debug, Clone)]
pub struct DiscoveryHandle {
    state: Arc<WindowState>,
}

impl DiscoveryHandle {
    /// Report that the hidden word was found.
    ///
    /// Returns `true` if the flag was raised by this call. The flag takes
    /// effect at the coordinator's next tick.
    pub fn notify_discovered(&self) -> bool {
        self.state.mark_discovered()
    }

    /// Cancel the window silently. No callbacks will fire for it.
    pub fn cancel(&self) -> bool {
        self.state.cancel()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.phase() == PHASE_SETTLED
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.phase() == PHASE_CANCELLED
    }

    /// Whether both handles refer to the same window.
    #[must_use]
    pub fn same_window(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

type Notify = Box<dyn FnOnce() + Send>;
type Settle = Box<dyn FnOnce(WindowOutcome) + Send>;

/// Callbacks for one window. Each fires at most once.
///
/// Order is `on_discovered` then `on_settled`, or `on_window_expired` then
/// `on_settled`.
#[derive(Default)]
pub struct WindowCallbacks {
    on_discovered: Option<Notify>,
    on_window_expired: Option<Notify>,
    on_settled: Option<Settle>,
}

impl WindowCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_discovered(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_discovered = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_window_expired(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_window_expired = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_settled(mut self, f: impl FnOnce(WindowOutcome) + Send + 'static) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }

    fn fire(self, outcome: WindowOutcome) {
        let first = match outcome {
            WindowOutcome::Discovered => self.on_discovered,
            WindowOutcome::Expired => self.on_window_expired,
        };
        if let Some(f) = first {
            f();
        }
        if let Some(f) = self.on_settled {
            f(outcome);
        }
    }
}

impl fmt::Debug for WindowCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowCallbacks")
            .field("on_discovered", &self.on_discovered.is_some())
            .field("on_window_expired", &self.on_window_expired.is_some())
            .field("on_settled", &self.on_settled.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct ActiveWindow {
    state: Arc<WindowState>,
    remaining: Duration,
    callbacks: WindowCallbacks,
}

/// Runs at most one discovery window at a time.
#[derive(Debug, Default)]
pub struct DiscoveryCoordinator {
    active: Option<ActiveWindow>,
}

impl DiscoveryCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a countdown of `window`, silently cancelling any live one.
    pub fn start(&mut self, window: Duration, callbacks: WindowCallbacks) -> DiscoveryHandle {
        if let Some(previous) = self.active.take() {
            if previous.state.cancel() {
                log::debug!("{LOG_WINDOW_CANCELLED}: superseded by a new window");
            }
        }

        let state = Arc::new(WindowState::default());
        self.active = Some(ActiveWindow {
            state: Arc::clone(&state),
            remaining: window,
            callbacks,
        });
        log::debug!("{LOG_WINDOW_STARTED}: {window:?}");
        DiscoveryHandle { state }
    }

    /// Advance the live window by `elapsed` and settle it if due.
    ///
    /// A discovery raised before this call wins even if `elapsed` also
    /// exhausts the countdown.
    pub fn advance(&mut self, elapsed: Duration) -> TickStatus {
        let Some(active) = self.active.as_mut() else {
            return TickStatus::Idle;
        };

        match active.state.phase() {
            PHASE_CANCELLED => {
                self.active = None;
                log::debug!("{LOG_WINDOW_CANCELLED}: cancelled through handle");
                return TickStatus::Idle;
            }
            PHASE_DISCOVERED => {
                if active.state.settle_discovered() {
                    return self.settle(WindowOutcome::Discovered);
                }
                // Cancelled between the two loads.
                self.active = None;
                return TickStatus::Idle;
            }
            _ => {}
        }

        active.remaining = active.remaining.saturating_sub(elapsed);
        if !active.remaining.is_zero() {
            return TickStatus::Running {
                remaining: active.remaining,
            };
        }

        match active.state.settle_expired() {
            Ok(()) => self.settle(WindowOutcome::Expired),
            Err(PHASE_DISCOVERED) => {
                if active.state.settle_discovered() {
                    self.settle(WindowOutcome::Discovered)
                } else {
                    self.active = None;
                    TickStatus::Idle
                }
            }
            Err(_) => {
                self.active = None;
                TickStatus::Idle
            }
        }
    }

    fn settle(&mut self, outcome: WindowOutcome) -> TickStatus {
        if let Some(active) = self.active.take() {
            log::debug!("{LOG_WINDOW_SETTLED}: {outcome:?}");
            active.callbacks.fire(outcome);
        }
        TickStatus::Settled(outcome)
    }

    /// Report discovery for the live window. No-op when idle.
    pub fn notify_discovered(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.state.mark_discovered())
    }

    /// Cancel the live window without firing any callback.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if active.state.cancel() {
                log::debug!("{LOG_WINDOW_CANCELLED}: stopped");
            }
        }
    }

    /// Time left on the live window, or zero when idle.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.active
            .as_ref()
            .filter(|active| active.state.phase() != PHASE_CANCELLED)
            .map_or(Duration::ZERO, |active| active.remaining)
    }

    /// Whole seconds shown on a countdown label, rounded up.
    #[must_use]
    pub fn display_seconds(&self) -> u64 {
        let remaining = self.remaining();
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.state.phase() != PHASE_CANCELLED)
    }

    /// Handle to the live window, if any.
    #[must_use]
    pub fn handle(&self) -> Option<DiscoveryHandle> {
        self.active.as_ref().map(|active| DiscoveryHandle {
            state: Arc::clone(&active.state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (WindowCallbacks, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let callbacks = WindowCallbacks::new()
            .on_discovered(move || a.lock().unwrap().push("discovered".to_string()))
            .on_window_expired(move || b.lock().unwrap().push("expired".to_string()))
            .on_settled(move |outcome| c.lock().unwrap().push(format!("settled:{outcome:?}")));
        (callbacks, log)
    }

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn idle_coordinator_reports_idle() {
        let mut coordinator = DiscoveryCoordinator::new();
        assert_eq!(coordinator.advance(TICK), TickStatus::Idle);
        assert!(!coordinator.notify_discovered());
        assert_eq!(coordinator.remaining(), Duration::ZERO);
        assert_eq!(coordinator.display_seconds(), 0);
        assert!(coordinator.handle().is_none());
    }

    #[test]
    fn expiry_fires_expired_then_settled() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        coordinator.start(Duration::from_millis(250), callbacks);

        assert_eq!(
            coordinator.advance(TICK),
            TickStatus::Running {
                remaining: Duration::from_millis(150)
            }
        );
        assert!(matches!(coordinator.advance(TICK), TickStatus::Running { .. }));
        assert_eq!(
            coordinator.advance(TICK),
            TickStatus::Settled(WindowOutcome::Expired)
        );
        assert_eq!(*log.lock().unwrap(), vec!["expired", "settled:Expired"]);
        assert!(!coordinator.is_live());
        assert_eq!(coordinator.advance(TICK), TickStatus::Idle);
    }

    #[test]
    fn discovery_before_expiry_never_reports_expired() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        let handle = coordinator.start(Duration::from_secs(10), callbacks);

        coordinator.advance(Duration::from_secs(3));
        assert!(handle.notify_discovered());
        // Observed only at the next tick boundary.
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(
            coordinator.advance(TICK),
            TickStatus::Settled(WindowOutcome::Discovered)
        );
        for _ in 0..200 {
            coordinator.advance(TICK);
        }
        assert_eq!(*log.lock().unwrap(), vec!["discovered", "settled:Discovered"]);
        assert!(handle.is_settled());
    }

    #[test]
    fn discovery_wins_on_the_expiring_tick() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        coordinator.start(Duration::from_secs(1), callbacks);
        assert!(coordinator.notify_discovered());
        assert_eq!(
            coordinator.advance(Duration::from_secs(5)),
            TickStatus::Settled(WindowOutcome::Discovered)
        );
        assert_eq!(*log.lock().unwrap(), vec!["discovered", "settled:Discovered"]);
    }

    #[test]
    fn duplicate_notifications_settle_once() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        let handle = coordinator.start(Duration::from_secs(10), callbacks);
        assert!(handle.notify_discovered());
        assert!(!handle.notify_discovered());
        assert!(!coordinator.notify_discovered());
        coordinator.advance(TICK);
        assert!(!handle.notify_discovered());
        coordinator.advance(TICK);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn stop_before_either_fires_nothing() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        let handle = coordinator.start(Duration::from_secs(1), callbacks);
        coordinator.advance(TICK);
        coordinator.stop();
        assert!(!handle.notify_discovered());
        assert!(handle.is_cancelled());
        for _ in 0..20 {
            assert_eq!(coordinator.advance(TICK), TickStatus::Idle);
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn stop_after_discovery_but_before_tick_fires_nothing() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        let handle = coordinator.start(Duration::from_secs(1), callbacks);
        handle.notify_discovered();
        coordinator.stop();
        assert_eq!(coordinator.advance(TICK), TickStatus::Idle);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn handle_cancel_is_observed_at_next_tick() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (callbacks, log) = recording();
        let handle = coordinator.start(Duration::from_secs(1), callbacks);
        assert!(handle.cancel());
        assert!(!coordinator.is_live());
        assert_eq!(coordinator.remaining(), Duration::ZERO);
        assert_eq!(coordinator.advance(Duration::from_secs(2)), TickStatus::Idle);
        assert!(log.lock().unwrap().is_empty());
        assert!(!handle.cancel());
    }

    #[test]
    fn restart_supersedes_previous_window() {
        let mut coordinator = DiscoveryCoordinator::new();
        let (first_callbacks, first_log) = recording();
        let stale = coordinator.start(Duration::from_secs(1), first_callbacks);
        let (second_callbacks, second_log) = recording();
        let fresh = coordinator.start(Duration::from_secs(1), second_callbacks);

        assert!(!stale.same_window(&fresh));
        assert!(stale.is_cancelled());
        // A stale handle cannot leak discovery into the new window.
        assert!(!stale.notify_discovered());
        assert_eq!(
            coordinator.advance(Duration::from_secs(1)),
            TickStatus::Settled(WindowOutcome::Expired)
        );
        assert!(first_log.lock().unwrap().is_empty());
        assert_eq!(*second_log.lock().unwrap(), vec!["expired", "settled:Expired"]);
    }

    #[test]
    fn display_seconds_rounds_up() {
        let mut coordinator = DiscoveryCoordinator::new();
        coordinator.start(Duration::from_secs(10), WindowCallbacks::new());
        assert_eq!(coordinator.display_seconds(), 10);
        coordinator.advance(Duration::from_millis(16));
        assert_eq!(coordinator.display_seconds(), 10);
        coordinator.advance(Duration::from_millis(984));
        assert_eq!(coordinator.display_seconds(), 9);
        coordinator.advance(Duration::from_millis(8_999));
        assert_eq!(coordinator.display_seconds(), 1);
        assert!(coordinator.is_live());
    }

    #[test]
    fn handle_is_send_and_sync_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiscoveryHandle>();

        let mut coordinator = DiscoveryCoordinator::new();
        let handle = coordinator.start(Duration::from_secs(10), WindowCallbacks::new());
        let worker = std::thread::spawn(move || handle.notify_discovered());
        assert!(worker.join().unwrap());
        assert_eq!(
            coordinator.advance(TICK),
            TickStatus::Settled(WindowOutcome::Discovered)
        );
    }

    #[test]
    fn callbacks_debug_lists_registered_hooks() {
        let callbacks = WindowCallbacks::new().on_settled(|_| {});
        assert_eq!(
            format!("{callbacks:?}"),
            "WindowCallbacks { on_discovered: false, on_window_expired: false, on_settled: true }"
        );
    }
}
