use std::collections::BTreeSet;

use mouhitotsu_game::constants::{LETTER_SCENARIO_IDS, LETTER_SEQUENCE};
use mouhitotsu_game::views::{ProfileDetail, profile_cards};
use mouhitotsu_game::{
    AnomalyContent, CharacterDirectory, EndMode, FINALE_SCENARIO_ID, ProgressionEngine,
    ScenarioCatalog, ScenarioOutcome,
};
use serde_json::Value;

fn load_catalog() -> ScenarioCatalog {
    ScenarioCatalog::parse_validated(include_str!("../assets/data/scenarios.json")).unwrap()
}

fn load_characters() -> CharacterDirectory {
    CharacterDirectory::from_json(include_str!("../assets/data/characters.json")).unwrap()
}

fn load_anomaly() -> AnomalyContent {
    AnomalyContent::from_json(include_str!("../assets/data/anomaly.json")).unwrap()
}

#[test]
fn every_scenario_has_one_success_and_a_branch_per_choice() {
    let catalog = load_catalog();
    let ids: Vec<u32> = catalog.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    for scenario in &catalog {
        assert!(scenario.choices.len() >= 2, "scenario {}", scenario.id);
        assert!(!scenario.title.is_empty());
        assert!(!scenario.intro.is_empty());
        let successes = scenario
            .choices
            .iter()
            .filter(|c| scenario.branch(c.id).is_some_and(|b| b.success))
            .count();
        assert_eq!(successes, 1, "scenario {} success count", scenario.id);
    }
}

#[test]
fn hints_live_only_on_failure_branches_of_letter_scenarios() {
    let catalog = load_catalog();
    for scenario in &catalog {
        for (choice_id, branch) in &scenario.branches {
            if branch.success {
                assert!(branch.hint.is_none(), "{}:{choice_id}", scenario.id);
            } else if LETTER_SCENARIO_IDS.contains(&scenario.id) {
                assert!(branch.hint.is_some(), "{}:{choice_id}", scenario.id);
            }
            if !branch.success {
                assert!(branch.epilogue_secondary.is_none());
            }
        }
    }
    let finale = catalog.scenario_by_id(FINALE_SCENARIO_ID).unwrap();
    assert!(finale.branches.values().all(|b| b.hint.is_none()));
}

#[test]
fn anomaly_features_drop_the_characters_letter() {
    let characters = load_characters();
    for (id, letter) in LETTER_SCENARIO_IDS.iter().zip(LETTER_SEQUENCE) {
        let profile = characters.profile_by_id(*id).unwrap();
        assert!(profile.feature_for(false).is_some());
        assert!(profile.feature_for(true).unwrap().contains(letter), "profile {id}");
        assert!(profile.has_quote());
        assert!(profile.relationship_with_voice().is_some());
        assert!(profile.anomaly_description().is_some());
    }
}

#[test]
fn anomaly_endings_match_finale_choice_ids() {
    let catalog = load_catalog();
    let anomaly = load_anomaly();
    let finale = catalog.scenario_by_id(FINALE_SCENARIO_ID).unwrap();
    let finale_ids: BTreeSet<u32> = finale.choices.iter().map(|c| c.id).collect();
    let anomaly_ids: BTreeSet<u32> = anomaly.finale_choices.iter().map(|c| c.id).collect();
    let ending_ids: BTreeSet<u32> = anomaly.finale_endings.keys().copied().collect();
    assert_eq!(finale_ids, anomaly_ids);
    assert_eq!(anomaly_ids, ending_ids);
    assert_eq!(anomaly.profile.job_redacted, "【データ欠損】");
}

#[test]
fn outcome_and_views_serialize_to_stable_json() {
    let outcome = ScenarioOutcome {
        choice_id: 2,
        success: true,
        epilogue: "after".to_string(),
        epilogue_secondary: None,
        score_at_completion: 3,
    };
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["choice_id"], 2);
    assert_eq!(value["epilogue_secondary"], Value::Null);
    let restored: ScenarioOutcome = serde_json::from_value(value).unwrap();
    assert_eq!(restored, outcome);

    assert_eq!(serde_json::to_value(EndMode::Anomaly).unwrap(), "anomaly");

    let mut engine = ProgressionEngine::new();
    engine.load(Some(load_catalog()));
    let cards = profile_cards(&engine, &load_characters(), &load_anomaly());
    let value = serde_json::to_value(&cards[0]).unwrap();
    assert_eq!(value["detail"]["state"], "locked");
    assert!(matches!(cards[0].detail, ProfileDetail::Locked { .. }));
}
