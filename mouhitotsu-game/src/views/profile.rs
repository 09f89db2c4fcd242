//! Character profile cards.
//!
//! A card unlocks once its scenario has a recorded outcome. In anomaly mode
//! every unlocked card shows the corrupted variants of its text, and the
//! finale's entity only appears after the finale has been completed.

use serde::Serialize;

use crate::anomaly::AnomalyContent;
use crate::characters::{CharacterDirectory, CharacterProfile};
use crate::constants::{FINALE_SCENARIO_ID, LETTER_SCENARIO_IDS};
use crate::engine::ProgressionEngine;

const TITLE_NORMAL: &str = "登場人物プロフィール";
const TITLE_ANOMALY: &str = "登場人物プロフィール【データ破損】";
const LOCKED_NAME: &str = "???";
const LOCKED_BORDER: [u8; 3] = [51, 51, 51];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProfileDetail {
    Locked {
        /// Names the scenario that unlocks this card.
        unlock_hint: String,
    },
    Unlocked {
        job: Option<String>,
        feature: Option<String>,
        /// Only after the finale, normal mode.
        relationship_with_voice: Option<String>,
        /// Only after the finale, anomaly mode.
        bug_report: Option<String>,
        quote: Option<String>,
        epilogue: String,
        epilogue_secondary: Option<String>,
        hint: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileCard {
    pub scenario_id: u32,
    /// `name（role）`, or `???（role）` while locked.
    pub heading: String,
    pub border_color: [u8; 3],
    pub profile_color: [u8; 3],
    pub anomaly: bool,
    pub detail: ProfileDetail,
}

impl ProfileCard {
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self.detail, ProfileDetail::Unlocked { .. })
    }
}

#[must_use]
pub fn profile_screen_title(engine: &ProgressionEngine) -> &'static str {
    if engine.is_anomaly_mode() {
        TITLE_ANOMALY
    } else {
        TITLE_NORMAL
    }
}

/// Cards for scenarios 1 to 5, plus the finale once it has been completed.
#[must_use]
pub fn profile_cards(
    engine: &ProgressionEngine,
    directory: &CharacterDirectory,
    anomaly: &AnomalyContent,
) -> Vec<ProfileCard> {
    let finale_completed = engine.is_scenario_completed(FINALE_SCENARIO_ID);
    LETTER_SCENARIO_IDS
        .iter()
        .copied()
        .chain(finale_completed.then_some(FINALE_SCENARIO_ID))
        .filter_map(|id| directory.profile_by_id(id))
        .map(|profile| build_card(engine, anomaly, profile, finale_completed))
        .collect()
}

fn build_card(
    engine: &ProgressionEngine,
    anomaly: &AnomalyContent,
    profile: &CharacterProfile,
    finale_completed: bool,
) -> ProfileCard {
    let id = profile.scenario_id;
    let anomalous = engine.is_anomaly_mode();

    let Some(outcome) = engine.scenario_outcome(id) else {
        let title = engine
            .scenario_by_id(id)
            .map(|s| s.title.as_str())
            .unwrap_or_default();
        return ProfileCard {
            scenario_id: id,
            heading: format!("{LOCKED_NAME}（{}）", profile.role),
            border_color: LOCKED_BORDER,
            profile_color: profile.profile_color,
            anomaly: anomalous,
            detail: ProfileDetail::Locked {
                unlock_hint: format!("シナリオ「{title}」をクリアすると表示されます"),
            },
        };
    };

    let degraded = &anomaly.profile;
    let letter_scenario = LETTER_SCENARIO_IDS.contains(&id);
    let branch = engine
        .scenario_by_id(id)
        .and_then(|s| s.branch(outcome.choice_id));

    let job = if anomalous {
        Some(degraded.job_redacted.clone())
    } else {
        profile.job().map(str::to_string)
    };
    let relationship_with_voice = (finale_completed && !anomalous)
        .then(|| profile.relationship_with_voice())
        .flatten()
        .map(str::to_string);
    let bug_report = (finale_completed && anomalous)
        .then(|| profile.anomaly_description())
        .flatten()
        .map(str::to_string);
    let quote = if profile.has_quote() {
        profile.quote_for(anomalous).map(str::to_string)
    } else {
        None
    };
    let epilogue = if anomalous {
        degraded.epilogue(&profile.name)
    } else {
        outcome.epilogue.clone()
    };
    let epilogue_secondary = match &outcome.epilogue_secondary {
        Some(text) if outcome.success && letter_scenario && !text.is_empty() => Some(if anomalous {
            degraded.secondary_epilogue(&profile.name)
        } else {
            text.clone()
        }),
        _ => None,
    };
    let hint = if !outcome.success && letter_scenario {
        branch
            .and_then(|b| b.hint.as_deref())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    ProfileCard {
        scenario_id: id,
        heading: format!("{}（{}）", profile.name, profile.role),
        border_color: profile.border_color,
        profile_color: profile.profile_color,
        anomaly: anomalous,
        detail: ProfileDetail::Unlocked {
            job,
            feature: profile.feature_for(anomalous).map(str::to_string),
            relationship_with_voice,
            bug_report,
            quote,
            epilogue,
            epilogue_secondary,
            hint,
        },
    }
}
