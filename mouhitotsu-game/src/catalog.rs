//! Scenario content catalog.
//!
//! The catalog is immutable once loaded: the progression engine reads it to
//! resolve choices but never writes to it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::constants::DEFAULT_SCENARIOS_DATA;

/// A choice offered to the player within a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDefinition {
    pub id: u32,
    pub label: String,
    #[serde(default)]
    pub preview: String,
}

/// The narrative outcome tied to one choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDefinition {
    pub text: String,
    /// Whether this branch is the canonical "word found" outcome.
    #[serde(default)]
    pub success: bool,
    pub epilogue: String,
    #[serde(default)]
    pub epilogue_secondary: Option<String>,
    /// Nudge shown on the profile screen; only meaningful on non-success branches.
    #[serde(default)]
    pub hint: Option<String>,
}

/// A self-contained story segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: u32,
    pub title: String,
    pub intro: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDefinition>,
    #[serde(default)]
    pub branches: BTreeMap<u32, BranchDefinition>,
}

impl ScenarioDefinition {
    #[must_use]
    pub fn branch(&self, choice_id: u32) -> Option<&BranchDefinition> {
        self.branches.get(&choice_id)
    }

    #[must_use]
    pub fn choice(&self, choice_id: u32) -> Option<&ChoiceDefinition> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// First choice (in presentation order) whose branch is the success outcome.
    #[must_use]
    pub fn success_choice_id(&self) -> Option<u32> {
        self.find_choice_by_success(true)
    }

    /// First choice (in presentation order) whose branch is not the success outcome.
    #[must_use]
    pub fn failure_choice_id(&self) -> Option<u32> {
        self.find_choice_by_success(false)
    }

    fn find_choice_by_success(&self, success: bool) -> Option<u32> {
        self.choices
            .iter()
            .find(|c| self.branch(c.id).is_some_and(|b| b.success == success))
            .map(|c| c.id)
    }
}

/// Errors raised when catalog content is malformed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("character profile JSON is invalid: {0}")]
    Characters(#[source] serde_json::Error),
    #[error("anomaly content JSON is invalid: {0}")]
    Anomaly(#[source] serde_json::Error),
    #[error("scenario {scenario_id} offers choice {choice_id} without a branch")]
    MissingBranch { scenario_id: u32, choice_id: u32 },
    #[error("scenario id {0} appears more than once")]
    DuplicateScenario(u32),
    #[error("scenario {scenario_id} lists choice {choice_id} more than once")]
    DuplicateChoice { scenario_id: u32, choice_id: u32 },
}

/// Container for all scenario definitions, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScenarioCatalog {
    pub scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    /// Load a catalog from a JSON string without structural checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse and validate a catalog in one step.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the JSON is invalid or a choice lacks a branch.
    pub fn parse_validated(json: &str) -> Result<Self, CatalogError> {
        let catalog = Self::from_json(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in six-scenario story.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_SCENARIOS_DATA).unwrap_or_else(|err| {
            log::error!("embedded scenario catalog failed to parse: {err}");
            Self::empty()
        })
    }

    /// Check that every listed choice resolves to a branch and ids are unique.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut scenario_ids = HashSet::new();
        for scenario in &self.scenarios {
            if !scenario_ids.insert(scenario.id) {
                return Err(CatalogError::DuplicateScenario(scenario.id));
            }
            let mut choice_ids = HashSet::new();
            for choice in &scenario.choices {
                if !choice_ids.insert(choice.id) {
                    return Err(CatalogError::DuplicateChoice {
                        scenario_id: scenario.id,
                        choice_id: choice.id,
                    });
                }
                if scenario.branch(choice.id).is_none() {
                    return Err(CatalogError::MissingBranch {
                        scenario_id: scenario.id,
                        choice_id: choice.id,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn scenario_by_id(&self, id: u32) -> Option<&ScenarioDefinition> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.scenario_by_id(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScenarioDefinition> {
        self.scenarios.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl<'a> IntoIterator for &'a ScenarioCatalog {
    type Item = &'a ScenarioDefinition;
    type IntoIter = std::slice::Iter<'a, ScenarioDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CHOICE_JSON: &str = r#"{
        "scenarios": [
            {
                "id": 1,
                "title": "Test Scenario",
                "intro": "An old photograph.",
                "choices": [
                    { "id": 1, "label": "Study the person", "preview": "Me: ..." },
                    { "id": 2, "label": "Study the building" }
                ],
                "branches": {
                    "1": { "text": "Found it", "success": true, "epilogue": "Solved", "epilogue_secondary": "Later" },
                    "2": { "text": "Missed it", "epilogue": "Unsatisfied", "hint": "Look again" }
                }
            }
        ]
    }"#;

    #[test]
    fn catalog_from_json_reads_branches_by_choice_id() {
        let catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        assert_eq!(catalog.len(), 1);

        let scenario = catalog.scenario_by_id(1).unwrap();
        assert_eq!(scenario.choices[1].preview, "");
        assert!(scenario.branch(1).unwrap().success);
        assert!(!scenario.branch(2).unwrap().success);
        assert_eq!(scenario.branch(2).unwrap().hint.as_deref(), Some("Look again"));
        assert_eq!(
            scenario.branch(1).unwrap().epilogue_secondary.as_deref(),
            Some("Later")
        );
        assert!(scenario.branch(3).is_none());
    }

    #[test]
    fn success_and_failure_choice_follow_presentation_order() {
        let catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        let scenario = catalog.scenario_by_id(1).unwrap();
        assert_eq!(scenario.success_choice_id(), Some(1));
        assert_eq!(scenario.failure_choice_id(), Some(2));
    }

    #[test]
    fn unknown_scenario_is_absent_not_an_error() {
        let catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        assert!(catalog.scenario_by_id(42).is_none());
        assert!(!catalog.contains(0));
    }

    #[test]
    fn validate_reports_choice_without_branch() {
        let mut catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        catalog.scenarios[0].branches.remove(&2);
        let err = catalog.validate().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingBranch {
                scenario_id: 1,
                choice_id: 2
            }
        ));
        assert!(err.to_string().contains("choice 2"));
    }

    #[test]
    fn validate_reports_duplicate_ids() {
        let mut catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        let copy = catalog.scenarios[0].clone();
        catalog.scenarios.push(copy);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateScenario(1))
        ));

        let mut catalog = ScenarioCatalog::from_json(TWO_CHOICE_JSON).unwrap();
        let choice = catalog.scenarios[0].choices[0].clone();
        catalog.scenarios[0].choices.push(choice);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateChoice {
                scenario_id: 1,
                choice_id: 1
            })
        ));
    }

    #[test]
    fn parse_validated_surfaces_json_errors() {
        let err = ScenarioCatalog::parse_validated("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn static_catalog_has_six_scenarios_with_one_success_each() {
        let catalog = ScenarioCatalog::load_from_static();
        assert_eq!(catalog.len(), 6);
        catalog.validate().unwrap();
        for scenario in &catalog {
            let successes = scenario.branches.values().filter(|b| b.success).count();
            assert_eq!(successes, 1, "scenario {} success count", scenario.id);
            assert!(scenario.choices.len() >= 2);
        }
    }

    #[test]
    fn empty_helpers_are_consistent() {
        let empty = ScenarioCatalog::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.iter().count(), 0);
        assert_eq!(empty, ScenarioCatalog::default());
    }
}
