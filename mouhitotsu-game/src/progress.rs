//! Player progress for one running session.
//!
//! Everything here is mutated only by [`crate::engine::ProgressionEngine`];
//! the public surface is read-only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::constants::{LETTER_SEQUENCE, letter_for_scenario};

/// Which variant of an ending was witnessed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum EndMode {
    #[default]
    Normal,
    Anomaly,
}

impl EndMode {
    #[must_use]
    pub const fn from_anomaly(anomaly: bool) -> Self {
        if anomaly { Self::Anomaly } else { Self::Normal }
    }

    #[must_use]
    pub const fn is_anomaly(self) -> bool {
        matches!(self, Self::Anomaly)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Anomaly => "anomaly",
        }
    }
}

impl fmt::Display for EndMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Snapshot of the last resolution of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub choice_id: u32,
    /// Effective success; may differ from the branch flag when discovery overrode it.
    pub success: bool,
    pub epilogue: String,
    #[serde(default)]
    pub epilogue_secondary: Option<String>,
    pub score_at_completion: u32,
}

/// Which choice ids were witnessed per scenario and mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenEndsLedger {
    entries: BTreeMap<(u32, EndMode), BTreeSet<u32>>,
}

impl SeenEndsLedger {
    /// Record a witnessed end. Returns `true` when it had not been seen before.
    pub(crate) fn record(&mut self, scenario_id: u32, mode: EndMode, choice_id: u32) -> bool {
        self.entries
            .entry((scenario_id, mode))
            .or_default()
            .insert(choice_id)
    }

    /// Whether `choice_id` was witnessed for `scenario_id`, under `mode` or either mode.
    #[must_use]
    pub fn contains(&self, scenario_id: u32, choice_id: u32, mode: Option<EndMode>) -> bool {
        let seen_in = |m: EndMode| {
            self.entries
                .get(&(scenario_id, m))
                .is_some_and(|set| set.contains(&choice_id))
        };
        match mode {
            Some(m) => seen_in(m),
            None => seen_in(EndMode::Normal) || seen_in(EndMode::Anomaly),
        }
    }

    /// Choice ids witnessed for one scenario and mode, ascending.
    pub fn choices(&self, scenario_id: u32, mode: EndMode) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .get(&(scenario_id, mode))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Total witnessed (scenario, mode, choice) triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProgress {
    score: u32,
    completed: BTreeSet<u32>,
    outcomes: BTreeMap<u32, ScenarioOutcome>,
    letters: BTreeSet<char>,
    ledger: SeenEndsLedger,
    current_scenario: Option<u32>,
}

impl PlayerProgress {
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn is_completed(&self, scenario_id: u32) -> bool {
        self.completed.contains(&scenario_id)
    }

    #[must_use]
    pub const fn completed(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    #[must_use]
    pub fn outcome(&self, scenario_id: u32) -> Option<&ScenarioOutcome> {
        self.outcomes.get(&scenario_id)
    }

    /// Collected letters in story order rather than code-point order.
    #[must_use]
    pub fn collected_letters(&self) -> Vec<char> {
        LETTER_SEQUENCE
            .iter()
            .copied()
            .filter(|c| self.letters.contains(c))
            .collect()
    }

    #[must_use]
    pub const fn ledger(&self) -> &SeenEndsLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn current_scenario(&self) -> Option<u32> {
        self.current_scenario
    }

    pub(crate) fn award_success(&mut self, scenario_id: u32) {
        self.score = self.score.saturating_add(1);
        self.completed.insert(scenario_id);
        if let Some(letter) = letter_for_scenario(scenario_id) {
            self.letters.insert(letter);
        }
    }

    pub(crate) fn record_outcome(&mut self, scenario_id: u32, outcome: ScenarioOutcome) {
        self.outcomes.insert(scenario_id, outcome);
    }

    pub(crate) fn record_end(&mut self, scenario_id: u32, mode: EndMode, choice_id: u32) -> bool {
        self.ledger.record(scenario_id, mode, choice_id)
    }

    pub(crate) const fn set_current_scenario(&mut self, scenario_id: Option<u32>) {
        self.current_scenario = scenario_id;
    }

    pub(crate) fn clear(&mut self) {
        self.score = 0;
        self.completed.clear();
        self.outcomes.clear();
        self.letters.clear();
        self.ledger.clear();
        self.current_scenario = None;
    }
}
