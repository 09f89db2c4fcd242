//! Mouhitotsu Game Engine
//!
//! Platform-agnostic progression core for the Mouhitotsu branching story.
//! This crate tracks player progress across the six scenarios, resolves
//! choices, runs the timed discovery window and derives the view models a
//! presentation layer renders. It has no UI or platform-specific dependencies.

pub mod anomaly;
pub mod catalog;
pub mod characters;
pub mod constants;
pub mod discovery;
#[cfg(feature = "async")]
pub mod driver;
pub mod engine;
pub mod events;
pub mod progress;
pub mod session;
pub mod views;

// Re-export commonly used types
pub use anomaly::{AnomalyContent, AnomalyEnding, DegradedProfileText};
pub use catalog::{
    BranchDefinition, CatalogError, ChoiceDefinition, ScenarioCatalog, ScenarioDefinition,
};
pub use characters::{CharacterDirectory, CharacterProfile};
pub use constants::{DEFAULT_DISCOVERY_WINDOW, DEFAULT_TICK_INTERVAL, FINALE_SCENARIO_ID};
pub use discovery::{
    DiscoveryCoordinator, DiscoveryHandle, TickStatus, WindowCallbacks, WindowOutcome,
};
pub use engine::{ProgressionEngine, Resolution};
pub use events::{ProgressEvent, SubscriptionId};
pub use progress::{EndMode, PlayerProgress, ScenarioOutcome, SeenEndsLedger};
pub use session::{GameSession, VisitError};

/// Trait for abstracting content loading
/// Platform-specific implementations should provide this
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the scenario catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or is inconsistent.
    fn load_catalog(&self) -> Result<ScenarioCatalog, Self::Error>;

    /// Load the character directory
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles cannot be loaded.
    fn load_characters(&self) -> Result<CharacterDirectory, Self::Error>;

    /// Load anomaly-mode replacement content
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be loaded.
    fn load_anomaly(&self) -> Result<AnomalyContent, Self::Error>;
}

/// Content embedded in the crate at build time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContent;

impl ContentLoader for StaticContent {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<ScenarioCatalog, Self::Error> {
        Ok(ScenarioCatalog::load_from_static())
    }

    fn load_characters(&self) -> Result<CharacterDirectory, Self::Error> {
        Ok(CharacterDirectory::load_from_static())
    }

    fn load_anomaly(&self) -> Result<AnomalyContent, Self::Error> {
        Ok(AnomalyContent::load_from_static())
    }
}

/// Caller-supplied JSON documents; sections left as `None` use the embedded content.
#[derive(Debug, Clone, Default)]
pub struct JsonContent {
    pub scenarios: Option<String>,
    pub characters: Option<String>,
    pub anomaly: Option<String>,
}

impl JsonContent {
    #[must_use]
    pub fn with_scenarios(mut self, json: impl Into<String>) -> Self {
        self.scenarios = Some(json.into());
        self
    }

    #[must_use]
    pub fn with_characters(mut self, json: impl Into<String>) -> Self {
        self.characters = Some(json.into());
        self
    }

    #[must_use]
    pub fn with_anomaly(mut self, json: impl Into<String>) -> Self {
        self.anomaly = Some(json.into());
        self
    }
}

impl ContentLoader for JsonContent {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<ScenarioCatalog, Self::Error> {
        self.scenarios
            .as_deref()
            .map_or_else(|| Ok(ScenarioCatalog::load_from_static()), ScenarioCatalog::parse_validated)
    }

    fn load_characters(&self) -> Result<CharacterDirectory, Self::Error> {
        match self.characters.as_deref() {
            Some(json) => CharacterDirectory::from_json(json).map_err(CatalogError::Characters),
            None => Ok(CharacterDirectory::load_from_static()),
        }
    }

    fn load_anomaly(&self) -> Result<AnomalyContent, Self::Error> {
        match self.anomaly.as_deref() {
            Some(json) => AnomalyContent::from_json(json).map_err(CatalogError::Anomaly),
            None => Ok(AnomalyContent::load_from_static()),
        }
    }
}
