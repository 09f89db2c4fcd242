use std::sync::{Arc, Mutex};
use std::time::Duration;

use mouhitotsu_game::views::{
    Banner, achievement_gallery, profile_cards, result_view, scenario_menu, score_label,
};
use mouhitotsu_game::{
    EndMode, FINALE_SCENARIO_ID, GameSession, ProgressEvent, StaticContent, VisitError,
};

const FRAME: Duration = Duration::from_millis(16);

fn success_choice(session: &GameSession, scenario_id: u32) -> u32 {
    session
        .engine()
        .scenario_by_id(scenario_id)
        .and_then(|s| s.success_choice_id())
        .unwrap()
}

/// Choose, then report discovery on the first frame.
fn visit_and_find(session: &mut GameSession, scenario_id: u32, choice_id: u32) {
    session.begin_visit(scenario_id).unwrap();
    let handle = session.choose(choice_id, Duration::from_secs(10)).unwrap();
    handle.notify_discovered();
    assert!(session.tick(FRAME).is_some());
}

#[test]
fn true_route_collects_every_letter_and_clears_the_finale() {
    let mut session = GameSession::from_loader(&StaticContent).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .engine_mut()
        .subscribe(move |event| sink.lock().unwrap().push(*event));

    assert_eq!(
        session.begin_visit(FINALE_SCENARIO_ID),
        Err(VisitError::Locked(FINALE_SCENARIO_ID))
    );

    for id in 1..=5 {
        let choice = success_choice(&session, id);
        session.begin_visit(id).unwrap();
        session.resolve_immediately(choice).unwrap();
    }
    let word: String = session.engine().collected_letters().into_iter().collect();
    assert_eq!(word, "もうひとつ");
    assert!(session.engine().can_access(FINALE_SCENARIO_ID));
    assert_eq!(scenario_menu(session.engine()).len(), 6);

    let choice = success_choice(&session, FINALE_SCENARIO_ID);
    session.begin_visit(FINALE_SCENARIO_ID).unwrap();
    let resolution = session.resolve_immediately(choice).unwrap();
    assert!(resolution.success);
    assert_eq!(resolution.mode, EndMode::Normal);
    assert!(session.engine().scenario_outcome(FINALE_SCENARIO_ID).unwrap().success);
    assert!(!session.engine().is_anomaly_mode());
    assert_eq!(score_label(session.engine()), "【もうひとつ】ワードゲット数: 6 / 6");

    let view = result_view(session.engine(), session.anomaly(), FINALE_SCENARIO_ID).unwrap();
    assert_eq!(view.banner, Banner::WordFound);
    assert!(achievement_gallery(session.engine()).is_some());
    assert_eq!(
        profile_cards(session.engine(), session.directory(), session.anomaly()).len(),
        6
    );

    let events = events.lock().unwrap();
    let completions = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::ScenarioCompleted { .. }))
        .count();
    assert_eq!(completions, 6);
    assert_eq!(events.first(), Some(&ProgressEvent::ScoreChanged { score: 1 }));
}

#[test]
fn replaying_for_score_unlocks_the_anomaly_finale() {
    let mut session = GameSession::with_static_content();
    for id in 1..=5 {
        let choice = success_choice(&session, id);
        visit_and_find(&mut session, id, choice);
    }
    // Replays keep awarding score until it passes the catalog size.
    visit_and_find(&mut session, 1, 2);
    visit_and_find(&mut session, 3, 1);
    assert_eq!(session.engine().score(), 7);
    assert!(session.engine().is_anomaly_mode());

    session.begin_visit(FINALE_SCENARIO_ID).unwrap();
    session.choose(1, Duration::from_millis(100)).unwrap();
    let resolution = loop {
        if let Some(resolution) = session.tick(FRAME) {
            break resolution;
        }
    };
    assert!(!resolution.success);
    assert_eq!(resolution.mode, EndMode::Anomaly);
    assert!(session.engine().has_seen_end(FINALE_SCENARIO_ID, 1, Some(EndMode::Anomaly)));

    let view = result_view(session.engine(), session.anomaly(), FINALE_SCENARIO_ID).unwrap();
    assert_eq!(view.banner, Banner::SystemError);
    assert_eq!(view.text, session.anomaly().finale_ending(1).unwrap().text);
    // The finale has not been completed, so the gallery stays closed.
    assert!(achievement_gallery(session.engine()).is_none());
}

#[test]
fn reset_returns_to_a_fresh_session() {
    let mut session = GameSession::with_static_content();
    for id in 1..=5 {
        let choice = success_choice(&session, id);
        visit_and_find(&mut session, id, choice);
    }
    session.begin_visit(2).unwrap();
    session.choose(1, Duration::from_secs(10)).unwrap();

    session.reset();
    assert!(!session.discovery().is_live());
    assert_eq!(session.engine().score(), 0);
    assert!(session.engine().collected_letters().is_empty());
    assert!(!session.engine().can_access(FINALE_SCENARIO_ID));
    assert_eq!(scenario_menu(session.engine()).len(), 5);
    assert!(session.tick(FRAME).is_none());
}
