//! Alternate content surfaced once anomaly mode has latched.
//!
//! Anomaly mode only changes what the finale and the profile screen show;
//! the resolution rules in the engine are identical in both modes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::ChoiceDefinition;
use crate::constants::DEFAULT_ANOMALY_DATA;

/// Replacement result text for one finale choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyEnding {
    pub text: String,
    pub epilogue: String,
}

/// Templates used to describe a character whose data has collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DegradedProfileText {
    pub job_redacted: String,
    pub epilogue_prefix: String,
    pub epilogue_suffix: String,
    pub secondary_prefix: String,
    pub secondary_suffix: String,
}

impl DegradedProfileText {
    #[must_use]
    pub fn epilogue(&self, name: &str) -> String {
        format!("{}{name}{}", self.epilogue_prefix, self.epilogue_suffix)
    }

    #[must_use]
    pub fn secondary_epilogue(&self, name: &str) -> String {
        format!("{}{name}{}", self.secondary_prefix, self.secondary_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnomalyContent {
    /// Choices offered in the finale instead of the catalog's own.
    #[serde(default)]
    pub finale_choices: Vec<ChoiceDefinition>,
    #[serde(default)]
    pub finale_endings: BTreeMap<u32, AnomalyEnding>,
    #[serde(default)]
    pub profile: DegradedProfileText,
}

impl AnomalyContent {
    /// Load anomaly content from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ANOMALY_DATA).unwrap_or_else(|err| {
            log::error!("embedded anomaly content failed to parse: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn finale_ending(&self, choice_id: u32) -> Option<&AnomalyEnding> {
        self.finale_endings.get(&choice_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_content_has_an_ending_per_finale_choice() {
        let content = AnomalyContent::load_from_static();
        assert_eq!(content.finale_choices.len(), 2);
        for choice in &content.finale_choices {
            let ending = content.finale_ending(choice.id).unwrap();
            assert!(!ending.text.is_empty());
            assert!(!ending.epilogue.is_empty());
        }
        assert!(content.finale_ending(3).is_none());
    }

    #[test]
    fn degraded_text_wraps_character_name() {
        let text = DegradedProfileText {
            job_redacted: "[redacted]".to_string(),
            epilogue_prefix: "<".to_string(),
            epilogue_suffix: "> collapsed".to_string(),
            secondary_prefix: "(".to_string(),
            secondary_suffix: ") vanished".to_string(),
        };
        assert_eq!(text.epilogue("Momoko"), "<Momoko> collapsed");
        assert_eq!(text.secondary_epilogue("Umi"), "(Umi) vanished");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let content = AnomalyContent::from_json("{}").unwrap();
        assert!(content.finale_choices.is_empty());
        assert_eq!(content.profile, DegradedProfileText::default());
    }
}
