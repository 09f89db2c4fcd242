//! Progression engine: the single reducer over [`PlayerProgress`].

use serde::Serialize;

use crate::catalog::{ScenarioCatalog, ScenarioDefinition};
use crate::constants::{
    FINALE_SCENARIO_ID, LETTER_SCENARIO_IDS, LOG_ANOMALY_LATCHED, LOG_CATALOG_FALLBACK,
    LOG_CATALOG_INSTALLED, LOG_CHOICE_REJECTED, LOG_CHOICE_RESOLVED, LOG_PROGRESS_RESET,
};
use crate::events::{ProgressEvent, SubscriptionId, Subscribers};
use crate::progress::{EndMode, PlayerProgress, ScenarioOutcome};

/// Summary of one accepted `resolve_choice` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub scenario_id: u32,
    pub choice_id: u32,
    pub success: bool,
    pub mode: EndMode,
    pub score_before: u32,
    pub score_after: u32,
    /// Whether this (scenario, mode, choice) end was witnessed for the first time.
    pub newly_seen: bool,
}

impl Resolution {
    #[must_use]
    pub const fn score_changed(&self) -> bool {
        self.score_before != self.score_after
    }
}

/// Owns the session's progress and the installed catalog.
///
/// Constructed explicitly and passed by reference; there is no global
/// instance. All mutation goes through [`Self::resolve_choice`] and
/// [`Self::reset`], plus the active-scenario pointer.
#[derive(Debug, Default)]
pub struct ProgressionEngine {
    catalog: ScenarioCatalog,
    progress: PlayerProgress,
    subscribers: Subscribers,
}

impl ProgressionEngine {
    /// Engine with no catalog installed yet; call [`Self::load`] before play.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(catalog: ScenarioCatalog) -> Self {
        let mut engine = Self::new();
        engine.load(Some(catalog));
        engine
    }

    /// Install `catalog`, or the built-in story if it is missing or empty.
    ///
    /// Once a non-empty catalog is installed further calls are ignored.
    pub fn load(&mut self, catalog: Option<ScenarioCatalog>) {
        if !self.catalog.is_empty() {
            log::debug!("{LOG_CATALOG_INSTALLED}: already installed, ignoring load");
            return;
        }

        match catalog.filter(|c| !c.is_empty()) {
            Some(catalog) => {
                if let Err(err) = catalog.validate() {
                    log::warn!("{LOG_CATALOG_INSTALLED}: supplied catalog is inconsistent: {err}");
                }
                self.catalog = catalog;
            }
            None => {
                log::debug!("{LOG_CATALOG_FALLBACK}: using built-in scenarios");
                self.catalog = ScenarioCatalog::load_from_static();
            }
        }
        log::debug!(
            "{LOG_CATALOG_INSTALLED}: {} scenarios",
            self.catalog.len()
        );
    }

    #[must_use]
    pub const fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Installed scenarios in catalog order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioDefinition] {
        &self.catalog.scenarios
    }

    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.catalog.len()
    }

    #[must_use]
    pub fn scenario_by_id(&self, id: u32) -> Option<&ScenarioDefinition> {
        self.catalog.scenario_by_id(id)
    }

    /// Point the engine at scenario `id`, or clear the pointer if it is unknown.
    pub fn select_scenario(&mut self, id: u32) -> Option<&ScenarioDefinition> {
        let known = self.catalog.contains(id);
        self.progress
            .set_current_scenario(if known { Some(id) } else { None });
        if known { self.catalog.scenario_by_id(id) } else { None }
    }

    #[must_use]
    pub fn current_scenario(&self) -> Option<&ScenarioDefinition> {
        self.progress
            .current_scenario()
            .and_then(|id| self.catalog.scenario_by_id(id))
    }

    /// Resolve `choice_id` in the active scenario.
    ///
    /// `was_word_found` overrides the branch's declared success flag when
    /// present. Returns `None` without touching state when no scenario is
    /// active or the choice has no branch; the latter is a caller bug and
    /// asserts in debug builds.
    ///
    /// Resolving a scenario again is allowed and re-awards score on success.
    /// That is how the score can pass the scenario count and latch anomaly
    /// mode.
    pub fn resolve_choice(
        &mut self,
        choice_id: u32,
        was_word_found: Option<bool>,
    ) -> Option<Resolution> {
        let scenario = self.current_scenario()?;
        let scenario_id = scenario.id;
        let Some(branch) = scenario.branch(choice_id) else {
            log::warn!("{LOG_CHOICE_REJECTED}: scenario {scenario_id} has no branch {choice_id}");
            debug_assert!(
                false,
                "resolve_choice: scenario {scenario_id} has no branch for choice {choice_id}"
            );
            return None;
        };

        let success = was_word_found.unwrap_or(branch.success);
        let epilogue = branch.epilogue.clone();
        let epilogue_secondary = branch.epilogue_secondary.clone();
        let score_before = self.progress.score();
        let anomaly_before = self.is_anomaly_mode();

        if success {
            self.progress.award_success(scenario_id);
        }

        let mode = EndMode::from_anomaly(self.is_anomaly_mode() && scenario_id == FINALE_SCENARIO_ID);

        self.progress.record_outcome(
            scenario_id,
            ScenarioOutcome {
                choice_id,
                success,
                epilogue,
                epilogue_secondary,
                score_at_completion: self.progress.score(),
            },
        );
        let newly_seen = self.progress.record_end(scenario_id, mode, choice_id);

        let resolution = Resolution {
            scenario_id,
            choice_id,
            success,
            mode,
            score_before,
            score_after: self.progress.score(),
            newly_seen,
        };
        log::debug!(
            "{LOG_CHOICE_RESOLVED}: scenario={scenario_id} choice={choice_id} success={success} mode={mode} score={}",
            resolution.score_after
        );
        if !anomaly_before && self.is_anomaly_mode() {
            log::debug!(
                "{LOG_ANOMALY_LATCHED}: score {} exceeds {} scenarios",
                resolution.score_after,
                self.catalog.len()
            );
        }

        if resolution.score_changed() {
            self.subscribers.emit(&ProgressEvent::ScoreChanged {
                score: resolution.score_after,
            });
        }
        self.subscribers.emit(&ProgressEvent::ScenarioCompleted {
            scenario_id,
            choice_id,
            success,
        });

        Some(resolution)
    }

    /// Only the finale is gated; unknown ids are reported accessible.
    #[must_use]
    pub fn can_access(&self, scenario_id: u32) -> bool {
        if scenario_id != FINALE_SCENARIO_ID {
            return true;
        }
        LETTER_SCENARIO_IDS
            .iter()
            .all(|id| self.progress.is_completed(*id))
    }

    /// True once the score exceeds the number of installed scenarios.
    #[must_use]
    pub fn is_anomaly_mode(&self) -> bool {
        usize::try_from(self.progress.score()).unwrap_or(usize::MAX) > self.catalog.len()
    }

    #[must_use]
    pub fn has_seen_end(&self, scenario_id: u32, choice_id: u32, mode: Option<EndMode>) -> bool {
        self.progress.ledger().contains(scenario_id, choice_id, mode)
    }

    #[must_use]
    pub fn has_seen_true_end(&self, scenario_id: u32) -> bool {
        self.catalog
            .scenario_by_id(scenario_id)
            .and_then(ScenarioDefinition::success_choice_id)
            .is_some_and(|choice_id| self.has_seen_end(scenario_id, choice_id, None))
    }

    #[must_use]
    pub fn has_seen_false_end(&self, scenario_id: u32) -> bool {
        self.catalog
            .scenario_by_id(scenario_id)
            .and_then(ScenarioDefinition::failure_choice_id)
            .is_some_and(|choice_id| self.has_seen_end(scenario_id, choice_id, None))
    }

    /// Clear all progress. Emits `ScoreChanged` even when the score was already zero.
    pub fn reset(&mut self) {
        self.progress.clear();
        log::debug!("{LOG_PROGRESS_RESET}");
        self.subscribers
            .emit(&ProgressEvent::ScoreChanged { score: 0 });
    }

    #[must_use]
    pub const fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.progress.score()
    }

    #[must_use]
    pub fn is_scenario_completed(&self, scenario_id: u32) -> bool {
        self.progress.is_completed(scenario_id)
    }

    #[must_use]
    pub fn scenario_outcome(&self, scenario_id: u32) -> Option<&ScenarioOutcome> {
        self.progress.outcome(scenario_id)
    }

    #[must_use]
    pub fn collected_letters(&self) -> Vec<char> {
        self.progress.collected_letters()
    }

    /// Whether every installed scenario has been completed at least once.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.catalog.is_empty()
            && self
                .catalog
                .iter()
                .all(|s| self.progress.is_completed(s.id))
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&ProgressEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}
