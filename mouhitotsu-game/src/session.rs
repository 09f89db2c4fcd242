//! One player's session: engine, character directory and discovery window
//! bound together so that each visit resolves exactly once.

use std::time::Duration;
use thiserror::Error;

use crate::anomaly::AnomalyContent;
use crate::characters::CharacterDirectory;
use crate::discovery::{
    DiscoveryCoordinator, DiscoveryHandle, TickStatus, WindowCallbacks, WindowOutcome,
};
use crate::engine::{ProgressionEngine, Resolution};
use crate::ContentLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VisitError {
    #[error("scenario {0} is not in the catalog")]
    UnknownScenario(u32),
    #[error("scenario {0} is locked")]
    Locked(u32),
    #[error("no scenario is being visited")]
    NoActiveScenario,
    #[error("scenario {scenario_id} has no choice {choice_id}")]
    UnknownChoice { scenario_id: u32, choice_id: u32 },
}

#[derive(Debug)]
pub struct GameSession {
    engine: ProgressionEngine,
    directory: CharacterDirectory,
    anomaly: AnomalyContent,
    discovery: DiscoveryCoordinator,
    pending_choice: Option<u32>,
}

impl GameSession {
    #[must_use]
    pub fn new(
        engine: ProgressionEngine,
        directory: CharacterDirectory,
        anomaly: AnomalyContent,
    ) -> Self {
        Self {
            engine,
            directory,
            anomaly,
            discovery: DiscoveryCoordinator::new(),
            pending_choice: None,
        }
    }

    /// Build a session from any content source.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the catalog or directory cannot be loaded.
    pub fn from_loader<L: ContentLoader>(loader: &L) -> Result<Self, L::Error> {
        let catalog = loader.load_catalog()?;
        let directory = loader.load_characters()?;
        let anomaly = loader.load_anomaly()?;
        Ok(Self::new(
            ProgressionEngine::with_catalog(catalog),
            directory,
            anomaly,
        ))
    }

    /// Session over the embedded story.
    #[must_use]
    pub fn with_static_content() -> Self {
        Self::new(
            ProgressionEngine::with_catalog(crate::catalog::ScenarioCatalog::load_from_static()),
            CharacterDirectory::load_from_static(),
            AnomalyContent::load_from_static(),
        )
    }

    #[must_use]
    pub const fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Mutable engine access, e.g. to subscribe to progress events.
    pub const fn engine_mut(&mut self) -> &mut ProgressionEngine {
        &mut self.engine
    }

    #[must_use]
    pub const fn directory(&self) -> &CharacterDirectory {
        &self.directory
    }

    #[must_use]
    pub const fn anomaly(&self) -> &AnomalyContent {
        &self.anomaly
    }

    #[must_use]
    pub const fn discovery(&self) -> &DiscoveryCoordinator {
        &self.discovery
    }

    #[must_use]
    pub const fn pending_choice(&self) -> Option<u32> {
        self.pending_choice
    }

    /// Enter `scenario_id`, abandoning any visit in progress.
    ///
    /// # Errors
    ///
    /// Returns [`VisitError::UnknownScenario`] for ids missing from the
    /// catalog and [`VisitError::Locked`] for the finale before it opens.
    pub fn begin_visit(&mut self, scenario_id: u32) -> Result<(), VisitError> {
        if self.engine.scenario_by_id(scenario_id).is_none() {
            return Err(VisitError::UnknownScenario(scenario_id));
        }
        if !self.engine.can_access(scenario_id) {
            return Err(VisitError::Locked(scenario_id));
        }
        self.abandon_visit();
        self.engine.select_scenario(scenario_id);
        Ok(())
    }

    fn check_choice(&self, choice_id: u32) -> Result<(), VisitError> {
        let scenario = self
            .engine
            .current_scenario()
            .ok_or(VisitError::NoActiveScenario)?;
        if scenario.branch(choice_id).is_none() {
            return Err(VisitError::UnknownChoice {
                scenario_id: scenario.id,
                choice_id,
            });
        }
        Ok(())
    }

    /// Commit to `choice_id` and open a discovery window of `window`.
    ///
    /// The choice resolves when [`Self::tick`] observes the window settling.
    /// Choosing again before then replaces the pending choice and restarts
    /// the window.
    ///
    /// # Errors
    ///
    /// Returns [`VisitError::NoActiveScenario`] outside a visit and
    /// [`VisitError::UnknownChoice`] when the scenario has no such branch.
    pub fn choose(&mut self, choice_id: u32, window: Duration) -> Result<DiscoveryHandle, VisitError> {
        self.check_choice(choice_id)?;
        self.pending_choice = Some(choice_id);
        Ok(self.discovery.start(window, WindowCallbacks::new()))
    }

    /// Advance the discovery window; resolves the pending choice once it settles.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Resolution> {
        match self.discovery.advance(elapsed) {
            TickStatus::Settled(outcome) => self.finish_visit(outcome),
            TickStatus::Idle => {
                // Cancelled through a handle.
                self.pending_choice = None;
                None
            }
            TickStatus::Running { .. } => None,
        }
    }

    /// Drive the discovery window on the tokio clock and resolve when it settles.
    ///
    /// Returns `None` when no choice is pending or the window was cancelled.
    #[cfg(feature = "async")]
    pub async fn run_discovery(&mut self, tick: Duration) -> Option<Resolution> {
        match crate::driver::run_window(&mut self.discovery, tick).await {
            Some(outcome) => self.finish_visit(outcome),
            None => {
                self.pending_choice = None;
                None
            }
        }
    }

    fn finish_visit(&mut self, outcome: WindowOutcome) -> Option<Resolution> {
        let choice_id = self.pending_choice.take()?;
        self.engine
            .resolve_choice(choice_id, Some(outcome.discovered()))
    }

    /// Report discovery for the current window.
    pub fn notify_discovered(&self) -> bool {
        self.discovery.notify_discovered()
    }

    /// Resolve `choice_id` with the branch's declared outcome, skipping discovery.
    ///
    /// # Errors
    ///
    /// Same as [`Self::choose`].
    pub fn resolve_immediately(&mut self, choice_id: u32) -> Result<Resolution, VisitError> {
        self.check_choice(choice_id)?;
        self.discovery.stop();
        self.pending_choice = None;
        self.engine
            .resolve_choice(choice_id, None)
            .ok_or(VisitError::NoActiveScenario)
    }

    /// Drop the current window without resolving anything.
    pub fn abandon_visit(&mut self) {
        self.discovery.stop();
        self.pending_choice = None;
    }

    pub fn reset(&mut self) {
        self.abandon_visit();
        self.engine.reset();
    }
}
