//! Tokio driver for a discovery window.

use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::discovery::{DiscoveryCoordinator, TickStatus, WindowOutcome};

/// Shortest interval the driver will tick at.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Tick `coordinator` every `tick` until its live window settles.
///
/// Returns `None` if no window is live or it was cancelled through a
/// [`crate::discovery::DiscoveryHandle`] while running. A zero `tick` is
/// raised to [`MIN_TICK`].
pub async fn run_window(
    coordinator: &mut DiscoveryCoordinator,
    tick: Duration,
) -> Option<WindowOutcome> {
    if !coordinator.is_live() {
        return None;
    }

    let mut interval = time::interval(tick.max(MIN_TICK));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = interval.tick().await;

    loop {
        let now = interval.tick().await;
        let elapsed = now.saturating_duration_since(last);
        last = now;

        match coordinator.advance(elapsed) {
            TickStatus::Running { .. } => {}
            TickStatus::Settled(outcome) => return Some(outcome),
            TickStatus::Idle => return None,
        }
    }
}
