//! Result screen and choice buttons.
use serde::Serialize;

use crate::anomaly::AnomalyContent;
use crate::catalog::ChoiceDefinition;
use crate::constants::FINALE_SCENARIO_ID;
use crate::engine::ProgressionEngine;

const BANNER_WORD_FOUND: &str = "✨ 【もうひとつ】ワードゲット! ✨";
const BANNER_WORD_MISSED: &str = "残念...【もうひとつ】は出ませんでした";
const BANNER_SYSTEM_ERROR: &str = "⚠️ 【システムエラー】世界崩壊 ⚠️";

/// Headline shown above the result text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Banner {
    WordFound,
    WordMissed,
    SystemError,
}

impl Banner {
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::WordFound => BANNER_WORD_FOUND,
            Self::WordMissed => BANNER_WORD_MISSED,
            Self::SystemError => BANNER_SYSTEM_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub id: u32,
    pub label: String,
    pub preview: String,
}

impl ChoiceOption {
    /// Numbered button caption, e.g. `選択肢1：...`.
    #[must_use]
    pub fn button_label(&self) -> String {
        format!("選択肢{}：{}", self.id, self.label)
    }
}

impl From<&ChoiceDefinition> for ChoiceOption {
    fn from(choice: &ChoiceDefinition) -> Self {
        Self {
            id: choice.id,
            label: choice.label.clone(),
            preview: choice.preview.clone(),
        }
    }
}

/// Everything the result screen needs for one recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub scenario_id: u32,
    pub choice_id: u32,
    pub banner: Banner,
    pub text: String,
    pub epilogue: String,
    pub anomaly: bool,
}

fn anomaly_applies(engine: &ProgressionEngine, scenario_id: u32) -> bool {
    scenario_id == FINALE_SCENARIO_ID && engine.is_anomaly_mode()
}

/// Result for the last recorded outcome of `scenario_id`, if any.
///
/// In anomaly mode the finale's text and epilogue come from the anomaly
/// content keyed by the chosen choice id.
#[must_use]
pub fn result_view(
    engine: &ProgressionEngine,
    anomaly: &AnomalyContent,
    scenario_id: u32,
) -> Option<ResultView> {
    let outcome = engine.scenario_outcome(scenario_id)?;
    let scenario = engine.scenario_by_id(scenario_id)?;
    let branch_text = scenario
        .branch(outcome.choice_id)
        .map(|b| b.text.clone())
        .unwrap_or_default();

    if anomaly_applies(engine, scenario_id) {
        let (text, epilogue) = anomaly.finale_ending(outcome.choice_id).map_or_else(
            || (branch_text, outcome.epilogue.clone()),
            |ending| (ending.text.clone(), ending.epilogue.clone()),
        );
        return Some(ResultView {
            scenario_id,
            choice_id: outcome.choice_id,
            banner: Banner::SystemError,
            text,
            epilogue,
            anomaly: true,
        });
    }

    Some(ResultView {
        scenario_id,
        choice_id: outcome.choice_id,
        banner: if outcome.success {
            Banner::WordFound
        } else {
            Banner::WordMissed
        },
        text: branch_text,
        epilogue: outcome.epilogue.clone(),
        anomaly: false,
    })
}

/// Choices offered in `scenario_id`; the finale swaps to the anomaly set in anomaly mode.
#[must_use]
pub fn choice_options(
    engine: &ProgressionEngine,
    anomaly: &AnomalyContent,
    scenario_id: u32,
) -> Vec<ChoiceOption> {
    if anomaly_applies(engine, scenario_id) && !anomaly.finale_choices.is_empty() {
        return anomaly.finale_choices.iter().map(ChoiceOption::from).collect();
    }
    engine
        .scenario_by_id(scenario_id)
        .map(|s| s.choices.iter().map(ChoiceOption::from).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn finale_choices(engine: &ProgressionEngine, anomaly: &AnomalyContent) -> Vec<ChoiceOption> {
    choice_options(engine, anomaly, FINALE_SCENARIO_ID)
}
