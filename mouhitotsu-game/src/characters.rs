use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CHARACTERS_DATA;

/// Static profile of the character met in one scenario.
///
/// Text fields come in normal/anomaly pairs. An empty string means the
/// section is omitted for this character, which is how the finale's
/// non-player entity is described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub scenario_id: u32,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub feature_anomaly: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub quote_anomaly: String,
    #[serde(default)]
    pub relationship_with_voice: String,
    #[serde(default)]
    pub anomaly_description: String,
    #[serde(default)]
    pub profile_color: [u8; 3],
    #[serde(default)]
    pub border_color: [u8; 3],
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() { None } else { Some(text) }
}

impl CharacterProfile {
    #[must_use]
    pub fn job(&self) -> Option<&str> {
        non_empty(&self.job)
    }

    #[must_use]
    pub fn feature_for(&self, anomaly: bool) -> Option<&str> {
        non_empty(if anomaly {
            &self.feature_anomaly
        } else {
            &self.feature
        })
    }

    #[must_use]
    pub fn quote_for(&self, anomaly: bool) -> Option<&str> {
        non_empty(if anomaly {
            &self.quote_anomaly
        } else {
            &self.quote
        })
    }

    #[must_use]
    pub fn relationship_with_voice(&self) -> Option<&str> {
        non_empty(&self.relationship_with_voice)
    }

    #[must_use]
    pub fn anomaly_description(&self) -> Option<&str> {
        non_empty(&self.anomaly_description)
    }

    /// Whether either quote variant exists.
    #[must_use]
    pub fn has_quote(&self) -> bool {
        !self.quote.is_empty() || !self.quote_anomaly.is_empty()
    }
}

/// Read-only lookup from scenario id to character profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CharacterDirectory {
    pub profiles: Vec<CharacterProfile>,
}

impl CharacterDirectory {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Load profiles from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into profile data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CHARACTERS_DATA).unwrap_or_else(|err| {
            log::error!("embedded character directory failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn profile_by_id(&self, scenario_id: u32) -> Option<&CharacterProfile> {
        self.profiles.iter().find(|p| p.scenario_id == scenario_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CharacterProfile> {
        self.profiles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'a> IntoIterator for &'a CharacterDirectory {
    type Item = &'a CharacterProfile;
    type IntoIter = std::slice::Iter<'a, CharacterProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
