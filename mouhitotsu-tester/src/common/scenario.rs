use anyhow::{Result, ensure};

use crate::logic::playthrough::{PlayStrategy, PlaythroughPlan, PlaythroughSummary};
use mouhitotsu_game::views::Banner;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: PlaythroughPlan,
}

impl TestScenario {
    #[must_use]
    pub fn playthrough(name: impl Into<String>, plan: PlaythroughPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

fn no_violations(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(
        summary.violations.is_empty(),
        "invariant violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn word_assembled(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(
        summary.letters == "もうひとつ",
        "expected letters もうひとつ, got '{}'",
        summary.letters
    );
    ensure!(summary.finale_unlocked, "finale should be unlocked");
    Ok(())
}

fn finale_cleared(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(summary.finale_cleared, "finale should be cleared");
    ensure!(
        summary.gallery.is_some(),
        "gallery should open after every scenario is cleared"
    );
    Ok(())
}

fn every_visit_discovered(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(
        summary.visits.iter().all(|v| v.discovered == Some(true) && v.success),
        "every visit should resolve as discovered"
    );
    Ok(())
}

fn nothing_collected(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(summary.score == 0, "score should stay 0, got {}", summary.score);
    ensure!(summary.letters.is_empty(), "no letters should be collected");
    ensure!(!summary.finale_unlocked, "finale should stay locked");
    ensure!(summary.gallery.is_none(), "gallery should stay hidden");
    Ok(())
}

fn anomaly_endings(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(summary.anomaly, "anomaly mode should be latched");
    ensure!(
        summary.finale_ends_seen == [true, false, true, true],
        "finale ends seen {:?}",
        summary.finale_ends_seen
    );
    ensure!(
        summary.last_banner == Some(Banner::SystemError),
        "anomalous finale should show the system error banner"
    );
    Ok(())
}

fn events_observed(summary: &PlaythroughSummary) -> Result<()> {
    ensure!(
        summary.events >= summary.visits.len(),
        "expected at least one event per visit, saw {} for {} visits",
        summary.events,
        summary.visits.len()
    );
    Ok(())
}

fn smoke_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Smoke Test",
        PlaythroughPlan::new(PlayStrategy::TrueRoute)
            .with_expectation(no_violations)
            .with_expectation(word_assembled)
            .with_expectation(finale_cleared),
    )
}

fn true_route_scenario() -> TestScenario {
    TestScenario::playthrough(
        "True Route",
        PlaythroughPlan::new(PlayStrategy::TrueRoute)
            .with_expectation(no_violations)
            .with_expectation(word_assembled)
            .with_expectation(finale_cleared)
            .with_expectation(every_visit_discovered)
            .with_expectation(events_observed),
    )
}

fn failure_route_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Failure Route",
        PlaythroughPlan::new(PlayStrategy::FailureRoute)
            .with_expectation(no_violations)
            .with_expectation(nothing_collected),
    )
}

fn anomaly_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Anomaly Route",
        PlaythroughPlan::new(PlayStrategy::AnomalyRoute)
            .with_expectation(no_violations)
            .with_expectation(anomaly_endings),
    )
}

fn random_walk_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Random Walk",
        PlaythroughPlan::new(PlayStrategy::RandomWalk)
            .with_expectation(no_violations)
            .with_expectation(events_observed),
    )
}

fn last_tick_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Last Tick Discovery",
        PlaythroughPlan::new(PlayStrategy::LastTickDiscovery)
            .with_expectation(no_violations)
            .with_expectation(every_visit_discovered)
            .with_expectation(word_assembled),
    )
}

fn async_driver_scenario() -> TestScenario {
    TestScenario::playthrough(
        "Async Driver",
        PlaythroughPlan::new(PlayStrategy::AsyncDriver)
            .with_expectation(no_violations)
            .with_expectation(finale_cleared),
    )
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "true-route" | "true" => Some(true_route_scenario()),
        "failure-route" | "failure" => Some(failure_route_scenario()),
        "anomaly" | "anomaly-route" => Some(anomaly_scenario()),
        "random-walk" | "random" => Some(random_walk_scenario()),
        "last-tick" | "last-tick-discovery" => Some(last_tick_scenario()),
        "async-driver" | "async" => Some(async_driver_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("true-route", "True Route"),
        ("failure-route", "Failure Route"),
        ("anomaly", "Anomaly Route"),
        ("random-walk", "Random Walk"),
        ("last-tick", "Last Tick Discovery"),
        ("async-driver", "Async Driver"),
    ]
}
