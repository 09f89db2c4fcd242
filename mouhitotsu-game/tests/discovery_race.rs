use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mouhitotsu_game::{
    DEFAULT_DISCOVERY_WINDOW, DiscoveryCoordinator, TickStatus, WindowCallbacks, WindowOutcome,
};

const FRAME: Duration = Duration::from_millis(16);

struct Tally {
    discovered: Arc<AtomicUsize>,
    expired: Arc<AtomicUsize>,
    settled: Arc<Mutex<Vec<WindowOutcome>>>,
}

impl Tally {
    fn new() -> Self {
        Self {
            discovered: Arc::new(AtomicUsize::new(0)),
            expired: Arc::new(AtomicUsize::new(0)),
            settled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn callbacks(&self) -> WindowCallbacks {
        let discovered = Arc::clone(&self.discovered);
        let expired = Arc::clone(&self.expired);
        let settled = Arc::clone(&self.settled);
        WindowCallbacks::new()
            .on_discovered(move || {
                discovered.fetch_add(1, Ordering::SeqCst);
            })
            .on_window_expired(move || {
                expired.fetch_add(1, Ordering::SeqCst);
            })
            .on_settled(move |outcome| settled.lock().unwrap().push(outcome))
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.discovered.load(Ordering::SeqCst),
            self.expired.load(Ordering::SeqCst),
            self.settled.lock().unwrap().len(),
        )
    }
}

fn run_to_completion(coordinator: &mut DiscoveryCoordinator) -> Option<WindowOutcome> {
    for _ in 0..2_000 {
        match coordinator.advance(FRAME) {
            TickStatus::Settled(outcome) => return Some(outcome),
            TickStatus::Idle => return None,
            TickStatus::Running { .. } => {}
        }
    }
    None
}

#[test]
fn notify_storm_from_many_threads_settles_once() {
    let tally = Tally::new();
    let mut coordinator = DiscoveryCoordinator::new();
    let handle = coordinator.start(DEFAULT_DISCOVERY_WINDOW, tally.callbacks());

    let accepted: usize = (0..8)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || (0..100).filter(|_| handle.notify_discovered()).count())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .sum();
    assert_eq!(accepted, 1);

    assert_eq!(run_to_completion(&mut coordinator), Some(WindowOutcome::Discovered));
    assert_eq!(tally.counts(), (1, 0, 1));
}

#[test]
fn expiry_without_notification() {
    let tally = Tally::new();
    let mut coordinator = DiscoveryCoordinator::new();
    coordinator.start(Duration::from_millis(500), tally.callbacks());
    assert_eq!(run_to_completion(&mut coordinator), Some(WindowOutcome::Expired));
    assert_eq!(tally.counts(), (0, 1, 1));
    assert_eq!(*tally.settled.lock().unwrap(), vec![WindowOutcome::Expired]);
}

#[test]
fn late_notification_after_expiry_is_ignored() {
    let tally = Tally::new();
    let mut coordinator = DiscoveryCoordinator::new();
    let handle = coordinator.start(Duration::from_millis(32), tally.callbacks());
    run_to_completion(&mut coordinator);
    assert!(!handle.notify_discovered());
    assert!(!coordinator.notify_discovered());
    assert_eq!(coordinator.advance(FRAME), TickStatus::Idle);
    assert_eq!(tally.counts(), (0, 1, 1));
}

#[test]
fn consecutive_windows_do_not_leak_state() {
    let first = Tally::new();
    let second = Tally::new();
    let mut coordinator = DiscoveryCoordinator::new();

    let stale = coordinator.start(Duration::from_secs(1), first.callbacks());
    stale.notify_discovered();
    assert_eq!(run_to_completion(&mut coordinator), Some(WindowOutcome::Discovered));

    coordinator.start(Duration::from_millis(64), second.callbacks());
    assert!(!stale.notify_discovered());
    assert_eq!(run_to_completion(&mut coordinator), Some(WindowOutcome::Expired));

    assert_eq!(first.counts(), (1, 0, 1));
    assert_eq!(second.counts(), (0, 1, 1));
}

#[test]
fn stop_then_restart_only_fires_for_the_new_window() {
    let first = Tally::new();
    let second = Tally::new();
    let mut coordinator = DiscoveryCoordinator::new();

    coordinator.start(Duration::from_secs(1), first.callbacks());
    coordinator.advance(FRAME);
    coordinator.stop();
    coordinator.start(Duration::from_secs(1), second.callbacks());
    coordinator.notify_discovered();
    assert_eq!(run_to_completion(&mut coordinator), Some(WindowOutcome::Discovered));

    assert_eq!(first.counts(), (0, 0, 0));
    assert_eq!(second.counts(), (1, 0, 1));
}
