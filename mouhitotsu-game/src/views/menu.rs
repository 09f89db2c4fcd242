use serde::Serialize;

use crate::constants::FINALE_SCENARIO_ID;
use crate::engine::ProgressionEngine;

/// One button on the scenario selection screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub scenario_id: u32,
    pub title: String,
    pub completed: bool,
    pub locked: bool,
}

/// Selection screen entries in catalog order.
///
/// The finale is left out entirely until it can be accessed.
#[must_use]
pub fn scenario_menu(engine: &ProgressionEngine) -> Vec<MenuEntry> {
    engine
        .scenarios()
        .iter()
        .filter(|s| s.id != FINALE_SCENARIO_ID || engine.can_access(s.id))
        .map(|s| MenuEntry {
            scenario_id: s.id,
            title: s.title.clone(),
            completed: engine.is_scenario_completed(s.id),
            locked: !engine.can_access(s.id),
        })
        .collect()
}

#[must_use]
pub fn score_label(engine: &ProgressionEngine) -> String {
    format!(
        "【もうひとつ】ワードゲット数: {} / {}",
        engine.score(),
        engine.scenario_count()
    )
}
