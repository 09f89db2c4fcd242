use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mouhitotsu_game::constants::LETTER_SCENARIO_IDS;
use mouhitotsu_game::views::{
    Banner, achievement_gallery, choice_options, result_view, scenario_menu,
};
use mouhitotsu_game::{
    DEFAULT_DISCOVERY_WINDOW, EndMode, FINALE_SCENARIO_ID, GameSession, JsonContent, Resolution,
    VisitError,
};

/// Simulated frame length used when ticking discovery windows.
pub const FRAME: Duration = Duration::from_millis(16);
/// Visits made by a random walk.
pub const RANDOM_WALK_VISITS: usize = 40;
/// Wall-clock window used by the tokio-driven strategy.
const ASYNC_WINDOW: Duration = Duration::from_secs(2);
const ASYNC_FIND_DELAY: Duration = Duration::from_millis(10);

/// Content the playthroughs run against.
#[derive(Debug, Clone, Default)]
pub struct TesterAssets {
    content: JsonContent,
}

impl TesterAssets {
    #[must_use]
    pub fn load_default() -> Self {
        Self::default()
    }

    /// Load override documents from disk; missing paths fall back to the embedded story.
    pub fn from_paths(
        scenarios: Option<&Path>,
        characters: Option<&Path>,
        anomaly: Option<&Path>,
    ) -> Result<Self> {
        let read = |path: Option<&Path>| -> Result<Option<String>> {
            path.map(|p| {
                std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
            })
            .transpose()
        };
        if scenarios.is_none() && characters.is_none() && anomaly.is_none() {
            return Ok(Self::load_default());
        }
        let content = JsonContent {
            scenarios: read(scenarios)?,
            characters: read(characters)?,
            anomaly: read(anomaly)?,
        };
        let assets = Self { content };
        assets.new_session().context("content failed validation")?;
        Ok(assets)
    }

    pub fn new_session(&self) -> Result<GameSession> {
        GameSession::from_loader(&self.content).context("failed to load content")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayStrategy {
    /// Find the word in every success branch, then clear the finale.
    TrueRoute,
    /// Let every window expire.
    FailureRoute,
    /// Replay for score until anomaly mode, then see both corrupted endings.
    AnomalyRoute,
    /// Seeded random visits, choices and discovery timing.
    RandomWalk,
    /// Report discovery on the tick the window runs out.
    LastTickDiscovery,
    /// True route with windows driven by the tokio clock.
    AsyncDriver,
}

impl PlayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TrueRoute => "true-route",
            Self::FailureRoute => "failure-route",
            Self::AnomalyRoute => "anomaly-route",
            Self::RandomWalk => "random-walk",
            Self::LastTickDiscovery => "last-tick-discovery",
            Self::AsyncDriver => "async-driver",
        }
    }
}

/// How a visit's discovery window is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timing {
    /// Skip the window and use the branch's declared outcome.
    Immediate,
    /// Report discovery before the given frame.
    FindAt(u64),
    Expire,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitRecord {
    pub scenario_id: u32,
    pub choice_id: u32,
    /// `None` when the visit skipped the discovery window.
    pub discovered: Option<bool>,
    pub success: bool,
    pub mode: EndMode,
    pub score_after: u32,
}

/// Complete record of one playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct PlaythroughSummary {
    pub seed: u64,
    pub strategy: PlayStrategy,
    pub visits: Vec<VisitRecord>,
    pub score: u32,
    pub letters: String,
    pub anomaly: bool,
    pub finale_unlocked: bool,
    pub finale_cleared: bool,
    /// Seen and total ends, once the gallery is open.
    pub gallery: Option<(usize, usize)>,
    pub finale_ends_seen: Vec<bool>,
    pub last_banner: Option<Banner>,
    pub events: usize,
    pub violations: Vec<String>,
}

/// Assertion hook run after a playthrough completes.
type PlaythroughExpectationFn = Arc<dyn Fn(&PlaythroughSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct PlaythroughExpectation(PlaythroughExpectationFn);

impl std::fmt::Debug for PlaythroughExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaythroughExpectation").finish()
    }
}

impl PlaythroughExpectation {
    pub fn evaluate(&self, summary: &PlaythroughSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for PlaythroughExpectation
where
    F: Fn(&PlaythroughSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct PlaythroughPlan {
    pub strategy: PlayStrategy,
    pub expectations: Vec<PlaythroughExpectation>,
}

impl PlaythroughPlan {
    #[must_use]
    pub const fn new(strategy: PlayStrategy) -> Self {
        Self {
            strategy,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<PlaythroughExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Runs playthrough plans against fresh sessions.
#[derive(Debug, Clone)]
pub struct GameTester {
    assets: Arc<TesterAssets>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { assets, verbose }
    }

    pub fn run_plan(&self, plan: &PlaythroughPlan, seed: u64) -> Result<PlaythroughSummary> {
        let session = self.assets.new_session()?;
        let mut run = Playthrough::new(session, seed);
        match plan.strategy {
            PlayStrategy::TrueRoute => run.true_route()?,
            PlayStrategy::FailureRoute => run.failure_route()?,
            PlayStrategy::AnomalyRoute => run.anomaly_route()?,
            PlayStrategy::RandomWalk => run.random_walk(RANDOM_WALK_VISITS)?,
            PlayStrategy::LastTickDiscovery => run.last_tick_route()?,
            PlayStrategy::AsyncDriver => run.async_route()?,
        }
        let summary = run.finish(seed, plan.strategy);
        if self.verbose {
            log::info!(
                "{} seed {}: {} visits, score {}, letters '{}'",
                plan.strategy.label(),
                seed,
                summary.visits.len(),
                summary.score,
                summary.letters
            );
        }
        Ok(summary)
    }
}

struct Playthrough {
    session: GameSession,
    rng: ChaCha20Rng,
    visits: Vec<VisitRecord>,
    violations: Vec<String>,
    events: Arc<AtomicUsize>,
    expected_score: u32,
    last_banner: Option<Banner>,
}

fn window_frames(window: Duration) -> u64 {
    let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
    let frame_ms = u64::try_from(FRAME.as_millis()).unwrap_or(1).max(1);
    window_ms.div_ceil(frame_ms)
}

impl Playthrough {
    fn new(mut session: GameSession, seed: u64) -> Self {
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        session.engine_mut().subscribe(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        Self {
            session,
            rng: ChaCha20Rng::seed_from_u64(seed),
            visits: Vec::new(),
            violations: Vec::new(),
            events,
            expected_score: 0,
            last_banner: None,
        }
    }

    fn success_choice(&self, scenario_id: u32) -> Result<u32> {
        self.session
            .engine()
            .scenario_by_id(scenario_id)
            .and_then(|s| s.success_choice_id())
            .with_context(|| format!("scenario {scenario_id} has no success branch"))
    }

    fn random_find_frame(&mut self) -> u64 {
        self.rng.gen_range(0..window_frames(DEFAULT_DISCOVERY_WINDOW))
    }

    fn visit(&mut self, scenario_id: u32, choice_id: u32, timing: Timing) -> Result<Resolution> {
        self.session.begin_visit(scenario_id)?;
        let resolution = match timing {
            Timing::Immediate => self.session.resolve_immediately(choice_id)?,
            Timing::FindAt(frame) => self.tick_window(choice_id, Some(frame))?,
            Timing::Expire => self.tick_window(choice_id, None)?,
        };
        let discovered = (timing != Timing::Immediate).then_some(resolution.success);
        self.record(resolution, discovered);
        Ok(resolution)
    }

    fn tick_window(&mut self, choice_id: u32, find_at: Option<u64>) -> Result<Resolution> {
        let handle = self.session.choose(choice_id, DEFAULT_DISCOVERY_WINDOW)?;
        let limit = window_frames(DEFAULT_DISCOVERY_WINDOW) + 1;
        for frame in 0..=limit {
            if find_at == Some(frame) {
                handle.notify_discovered();
            }
            if let Some(resolution) = self.session.tick(FRAME) {
                return Ok(resolution);
            }
        }
        bail!("discovery window for choice {choice_id} never settled")
    }

    fn record(&mut self, resolution: Resolution, discovered: Option<bool>) {
        if resolution.success {
            self.expected_score += 1;
        }
        self.check_invariants(&resolution);
        self.last_banner = result_view(
            self.session.engine(),
            self.session.anomaly(),
            resolution.scenario_id,
        )
        .map(|view| view.banner);
        self.visits.push(VisitRecord {
            scenario_id: resolution.scenario_id,
            choice_id: resolution.choice_id,
            discovered,
            success: resolution.success,
            mode: resolution.mode,
            score_after: resolution.score_after,
        });
    }

    fn check_invariants(&mut self, resolution: &Resolution) {
        let engine = self.session.engine();
        let mut problems = Vec::new();

        if engine.score() != self.expected_score {
            problems.push(format!(
                "score {} but {} successes were resolved",
                engine.score(),
                self.expected_score
            ));
        }

        let successes: BTreeSet<u32> = self
            .visits
            .iter()
            .chain(std::iter::once(&VisitRecord {
                scenario_id: resolution.scenario_id,
                choice_id: resolution.choice_id,
                discovered: None,
                success: resolution.success,
                mode: resolution.mode,
                score_after: resolution.score_after,
            }))
            .filter(|v| v.success && LETTER_SCENARIO_IDS.contains(&v.scenario_id))
            .map(|v| v.scenario_id)
            .collect();
        if engine.collected_letters().len() != successes.len() {
            problems.push(format!(
                "{} letters for {} distinct letter successes",
                engine.collected_letters().len(),
                successes.len()
            ));
        }

        let gate_expected = LETTER_SCENARIO_IDS
            .iter()
            .all(|id| engine.is_scenario_completed(*id));
        if engine.can_access(FINALE_SCENARIO_ID) != gate_expected {
            problems.push("finale gate disagrees with completed scenarios".to_string());
        }

        let anomaly_expected = usize::try_from(engine.score()).unwrap_or(usize::MAX)
            > engine.scenario_count();
        if engine.is_anomaly_mode() != anomaly_expected {
            problems.push("anomaly flag disagrees with score".to_string());
        }

        if !engine.has_seen_end(resolution.scenario_id, resolution.choice_id, Some(resolution.mode)) {
            problems.push("resolved end missing from the ledger".to_string());
        }

        let seen_before = self.visits.iter().any(|v| {
            v.scenario_id == resolution.scenario_id
                && v.choice_id == resolution.choice_id
                && v.mode == resolution.mode
        });
        if resolution.newly_seen == seen_before {
            problems.push(format!(
                "newly_seen is {} for an end seen before: {seen_before}",
                resolution.newly_seen
            ));
        }

        let anomalous_finale =
            engine.is_anomaly_mode() && resolution.scenario_id == FINALE_SCENARIO_ID;
        if resolution.mode.is_anomaly() != anomalous_finale {
            problems.push(format!("resolved in {} mode", resolution.mode));
        }

        let menu = scenario_menu(engine);
        if menu.iter().any(|e| e.scenario_id == FINALE_SCENARIO_ID) != gate_expected {
            problems.push("menu shows the finale while it is locked".to_string());
        }

        for problem in problems {
            self.violations.push(format!(
                "after {}:{} -> {problem}",
                resolution.scenario_id, resolution.choice_id
            ));
        }
    }

    fn true_route(&mut self) -> Result<()> {
        for id in LETTER_SCENARIO_IDS {
            let choice = self.success_choice(id)?;
            let frame = self.random_find_frame();
            self.visit(id, choice, Timing::FindAt(frame))?;
        }
        let choice = self.success_choice(FINALE_SCENARIO_ID)?;
        let frame = self.random_find_frame();
        self.visit(FINALE_SCENARIO_ID, choice, Timing::FindAt(frame))?;
        Ok(())
    }

    fn failure_route(&mut self) -> Result<()> {
        for id in LETTER_SCENARIO_IDS {
            let choice = self.success_choice(id)?;
            self.visit(id, choice, Timing::Expire)?;
        }
        match self.session.begin_visit(FINALE_SCENARIO_ID) {
            Err(VisitError::Locked(_)) => Ok(()),
            Ok(()) => {
                self.violations
                    .push("finale opened without any letters".to_string());
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn anomaly_route(&mut self) -> Result<()> {
        for id in LETTER_SCENARIO_IDS.into_iter().chain([FINALE_SCENARIO_ID]) {
            let choice = self.success_choice(id)?;
            self.visit(id, choice, Timing::Immediate)?;
        }
        while !self.session.engine().is_anomaly_mode() {
            let index = self.rng.gen_range(0..LETTER_SCENARIO_IDS.len());
            let id = LETTER_SCENARIO_IDS[index];
            let choice = self.success_choice(id)?;
            self.visit(id, choice, Timing::Immediate)?;
        }
        let finale_ids: Vec<u32> = choice_options(
            self.session.engine(),
            self.session.anomaly(),
            FINALE_SCENARIO_ID,
        )
        .iter()
        .map(|c| c.id)
        .collect();
        for choice in finale_ids {
            self.visit(FINALE_SCENARIO_ID, choice, Timing::Immediate)?;
        }
        Ok(())
    }

    fn random_walk(&mut self, visits: usize) -> Result<()> {
        for _ in 0..visits {
            let menu = scenario_menu(self.session.engine());
            if menu.is_empty() {
                bail!("scenario menu is empty");
            }
            let entry = &menu[self.rng.gen_range(0..menu.len())];
            let scenario_id = entry.scenario_id;
            let options = choice_options(self.session.engine(), self.session.anomaly(), scenario_id);
            if options.is_empty() {
                bail!("scenario {scenario_id} offers no choices");
            }
            let choice_id = options[self.rng.gen_range(0..options.len())].id;
            let timing = match self.rng.gen_range(0..3) {
                0 => Timing::Immediate,
                1 => Timing::FindAt(self.random_find_frame()),
                _ => Timing::Expire,
            };
            self.visit(scenario_id, choice_id, timing)?;
        }
        Ok(())
    }

    fn last_tick_route(&mut self) -> Result<()> {
        let expiring_frame = window_frames(DEFAULT_DISCOVERY_WINDOW).saturating_sub(1);
        for id in LETTER_SCENARIO_IDS {
            // Take the failure branch so only discovery can award the letter.
            let choice = self
                .session
                .engine()
                .scenario_by_id(id)
                .and_then(|s| s.failure_choice_id())
                .with_context(|| format!("scenario {id} has no failure branch"))?;
            self.visit(id, choice, Timing::FindAt(expiring_frame))?;
        }
        Ok(())
    }

    fn async_route(&mut self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to build tokio runtime")?;

        for id in LETTER_SCENARIO_IDS.into_iter().chain([FINALE_SCENARIO_ID]) {
            let choice = self.success_choice(id)?;
            self.session.begin_visit(id)?;
            let handle = self.session.choose(choice, ASYNC_WINDOW)?;
            let session = &mut self.session;
            let resolution = runtime.block_on(async move {
                tokio::spawn(async move {
                    tokio::time::sleep(ASYNC_FIND_DELAY).await;
                    handle.notify_discovered();
                });
                session.run_discovery(FRAME).await
            });
            let resolution =
                resolution.with_context(|| format!("scenario {id} window did not resolve"))?;
            self.record(resolution, Some(resolution.success));
        }
        Ok(())
    }

    fn finish(self, seed: u64, strategy: PlayStrategy) -> PlaythroughSummary {
        let engine = self.session.engine();
        let gallery = achievement_gallery(engine);
        let finale_ends_seen = gallery
            .as_ref()
            .and_then(|g| g.cards.iter().find(|c| c.scenario_id == FINALE_SCENARIO_ID))
            .map(|card| card.ends.iter().map(|e| e.seen).collect())
            .unwrap_or_default();

        PlaythroughSummary {
            seed,
            strategy,
            score: engine.score(),
            letters: engine.collected_letters().into_iter().collect(),
            anomaly: engine.is_anomaly_mode(),
            finale_unlocked: engine.can_access(FINALE_SCENARIO_ID),
            finale_cleared: engine.is_scenario_completed(FINALE_SCENARIO_ID),
            gallery: gallery.map(|g| g.seen_count()),
            finale_ends_seen,
            last_banner: self.last_banner,
            events: self.events.load(Ordering::Relaxed),
            visits: self.visits,
            violations: self.violations,
        }
    }
}
