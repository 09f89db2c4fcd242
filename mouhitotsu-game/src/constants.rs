//! Centralized constants for Mouhitotsu progression logic.
//!
//! Story content lives in the JSON assets; the values here define the rules
//! that content is played under and can only change through code review.

use std::time::Duration;

// Story shape --------------------------------------------------------------
/// Scenario that is gated behind the letter-bearing scenarios.
pub const FINALE_SCENARIO_ID: u32 = 6;
/// Letters collected from successful resolutions, indexed by `scenario_id - 1`.
pub const LETTER_SEQUENCE: [char; 5] = ['も', 'う', 'ひ', 'と', 'つ'];
/// Scenarios that must all be completed before the finale opens.
pub const LETTER_SCENARIO_IDS: [u32; 5] = [1, 2, 3, 4, 5];

// Discovery timing -----------------------------------------------------------
/// Countdown length used by the result screen when the caller does not override it.
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_secs(10);
/// Fixed tick interval used by the async driver.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

// Asset payloads ---------------------------------------------------------------
pub(crate) const DEFAULT_SCENARIOS_DATA: &str = include_str!("../assets/data/scenarios.json");
pub(crate) const DEFAULT_CHARACTERS_DATA: &str = include_str!("../assets/data/characters.json");
pub(crate) const DEFAULT_ANOMALY_DATA: &str = include_str!("../assets/data/anomaly.json");

// Logging keys -----------------------------------------------------------------
pub(crate) const LOG_CATALOG_INSTALLED: &str = "catalog.installed";
pub(crate) const LOG_CATALOG_FALLBACK: &str = "catalog.fallback";
pub(crate) const LOG_CHOICE_RESOLVED: &str = "choice.resolved";
pub(crate) const LOG_CHOICE_REJECTED: &str = "choice.rejected";
pub(crate) const LOG_ANOMALY_LATCHED: &str = "anomaly.latched";
pub(crate) const LOG_PROGRESS_RESET: &str = "progress.reset";
pub(crate) const LOG_WINDOW_STARTED: &str = "discovery.started";
pub(crate) const LOG_WINDOW_SETTLED: &str = "discovery.settled";
pub(crate) const LOG_WINDOW_CANCELLED: &str = "discovery.cancelled";

/// Letter awarded for a successful resolution of `scenario_id`, if any.
#[must_use]
pub fn letter_for_scenario(scenario_id: u32) -> Option<char> {
    let index = usize::try_from(scenario_id.checked_sub(1)?).ok()?;
    LETTER_SEQUENCE.get(index).copied()
}
