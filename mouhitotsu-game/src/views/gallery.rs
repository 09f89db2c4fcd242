//! Achievement gallery of witnessed endings.
use serde::Serialize;

use crate::constants::{FINALE_SCENARIO_ID, LETTER_SCENARIO_IDS};
use crate::engine::ProgressionEngine;
use crate::progress::EndMode;

const FINALE_TITLE_FALLBACK: &str = "真実の扉";
const TRUE_END_CHOICE: u32 = 2;
const FALSE_END_CHOICE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    True,
    False,
    AnomalyOne,
    AnomalyTwo,
}

impl EndKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::True => "✨ Trueエンド",
            Self::False => "❌ Falseエンド",
            Self::AnomalyOne => "⚠️ ダークエンド1",
            Self::AnomalyTwo => "⚠️ ダークエンド2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndBadge {
    pub kind: EndKind,
    pub seen: bool,
    /// Only revealed once the end has been seen.
    pub description: Option<&'static str>,
}

impl EndBadge {
    fn new(kind: EndKind, seen: bool, description: &'static str) -> Self {
        Self {
            kind,
            seen,
            description: seen.then_some(description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementCard {
    pub scenario_id: u32,
    pub title: String,
    pub ends: Vec<EndBadge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementGallery {
    pub cards: Vec<AchievementCard>,
}

impl AchievementGallery {
    /// Seen ends over total ends across every card.
    #[must_use]
    pub fn seen_count(&self) -> (usize, usize) {
        let ends = self.cards.iter().flat_map(|c| &c.ends);
        let total = ends.clone().count();
        (ends.filter(|e| e.seen).count(), total)
    }
}

/// The gallery, or `None` until every scenario in the catalog has been completed.
#[must_use]
pub fn achievement_gallery(engine: &ProgressionEngine) -> Option<AchievementGallery> {
    if !engine.all_completed() {
        return None;
    }

    let mut cards: Vec<AchievementCard> = LETTER_SCENARIO_IDS
        .iter()
        .filter_map(|id| engine.scenario_by_id(*id))
        .map(|scenario| AchievementCard {
            scenario_id: scenario.id,
            title: scenario.title.clone(),
            ends: vec![
                EndBadge::new(
                    EndKind::True,
                    engine.has_seen_true_end(scenario.id),
                    "【もうひとつ】を獲得したエンド",
                ),
                EndBadge::new(
                    EndKind::False,
                    engine.has_seen_false_end(scenario.id),
                    "【もうひとつ】を獲得できなかったエンド",
                ),
            ],
        })
        .collect();

    if let Some(finale) = engine.scenario_by_id(FINALE_SCENARIO_ID) {
        let seen = |choice, mode| engine.has_seen_end(FINALE_SCENARIO_ID, choice, Some(mode));
        cards.push(AchievementCard {
            scenario_id: finale.id,
            title: if finale.title.is_empty() {
                FINALE_TITLE_FALLBACK.to_string()
            } else {
                finale.title.clone()
            },
            ends: vec![
                EndBadge::new(
                    EndKind::True,
                    seen(TRUE_END_CHOICE, EndMode::Normal),
                    "「答えを知りたかった」を選んだエンド",
                ),
                EndBadge::new(
                    EndKind::False,
                    seen(FALSE_END_CHOICE, EndMode::Normal),
                    "「好奇心から」を選んだエンド",
                ),
                EndBadge::new(
                    EndKind::AnomalyOne,
                    seen(FALSE_END_CHOICE, EndMode::Anomaly),
                    "「すみません...」と謝ったエンド",
                ),
                EndBadge::new(
                    EndKind::AnomalyTwo,
                    seen(TRUE_END_CHOICE, EndMode::Anomaly),
                    "「これは何ですか？」と問うたエンド",
                ),
            ],
        });
    }

    Some(AchievementGallery { cards })
}
