#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative experiment state for Prefire.
//!
//! The world owns the trial state machine, the round and session counters, the
//! pause manager and every phase-transition timer. Adapters drive it through
//! [`apply`] and observe it through [`query`]; systems react to the emitted
//! [`Event`] stream.

mod pause;
mod playfield;
mod session;
mod timers;

use std::time::Duration;

use prefire_core::{
    AudioReadiness, BestStats, Command, DifficultyTier, Event, Phase, Quarter, SoundEffect,
    TrialId, QUARTER_COUNT, WELCOME_BANNER,
};
use prefire_system_scoring::{Scoreboard, StreakCounter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

pub use playfield::{AdversarySnapshot, PlayfieldConfig};
pub use session::SessionSnapshot;
pub use timers::{ArmedTimer, TimerKind};

use pause::PauseManager;
use playfield::{Contact, Playfield};
use session::{Progress, Session};
use timers::TimerRegistry;

const WORLD_RNG_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const STARTING_QUARTER: u8 = 1;

/// Timing and session parameters of the experiment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Trials in one round.
    pub trials_per_round: u32,
    /// Rounds in one session.
    pub rounds: u32,
    /// Masking noise length before the cue phase.
    pub pre_cue: Duration,
    /// Length of the cue phase before the adversary spawns.
    pub cue_window: Duration,
    /// Delay between a correct pre-fire or kill and the tone cloud.
    pub feedback_delay: Duration,
    /// Length of the tone cloud.
    pub tone_cloud: Duration,
    /// Delay between the end of the tone cloud and trial resolution.
    pub post_cloud: Duration,
    /// Longest wait for audio samples before the cue phase starts regardless.
    pub audio_ready_timeout: Duration,
    /// Readiness polling interval while samples load.
    pub audio_poll_interval: Duration,
    /// Difficulty tier used to evaluate pre-fires.
    pub difficulty: DifficultyTier,
    /// Seed for quarter selection.
    pub rng_seed: u64,
    /// Playfield geometry.
    pub playfield: PlayfieldConfig,
}

impl Config {
    /// Time from a correct pre-fire or kill until the trial resolves.
    #[must_use]
    pub fn drain_delay(&self) -> Duration {
        self.feedback_delay + self.tone_cloud + self.post_cloud
    }

    /// Trials in one full session.
    #[must_use]
    pub const fn total_trials(&self) -> u32 {
        self.trials_per_round.saturating_mul(self.rounds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials_per_round: 50,
            rounds: 4,
            pre_cue: Duration::from_millis(2000),
            cue_window: Duration::from_millis(4000),
            feedback_delay: Duration::from_millis(1000),
            tone_cloud: Duration::from_millis(2000),
            post_cloud: Duration::from_millis(1000),
            audio_ready_timeout: Duration::from_secs(20),
            audio_poll_interval: Duration::from_millis(25),
            difficulty: DifficultyTier::EXPERIMENT,
            rng_seed: WORLD_RNG_SEED,
            playfield: PlayfieldConfig::default(),
        }
    }
}

/// Read-only view of the open trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialSnapshot {
    /// Identifier of the trial.
    pub id: TrialId,
    /// Quarter the adversary will appear in.
    pub quarter: Quarter,
    /// Whether a correct pre-fire was registered.
    pub hit: bool,
    /// Whether the pre-fire opportunity was used.
    pub prefire_spent: bool,
    /// Whether the outcome was folded into the session.
    pub resolved: bool,
}

#[derive(Clone, Copy, Debug)]
struct Trial {
    id: TrialId,
    quarter: Quarter,
    hit: bool,
    prefire_spent: bool,
    resolved: bool,
    awaiting_audio_since: Option<Duration>,
}

impl Trial {
    fn new(id: TrialId, quarter: Quarter) -> Self {
        Self {
            id,
            quarter,
            hit: false,
            prefire_spent: false,
            resolved: false,
            awaiting_audio_since: None,
        }
    }

    /// A trial takes at most one pre-fire, and none once resolved.
    fn accepts_prefire(&self) -> bool {
        !self.prefire_spent && !self.resolved
    }
}

/// Represents the authoritative Prefire experiment state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: Config,
    clock: Duration,
    phase: Phase,
    rng: ChaCha8Rng,
    next_trial: u64,
    trial: Option<Trial>,
    session: Session,
    streak: StreakCounter,
    scoreboard: Scoreboard,
    timers: TimerRegistry,
    pause: PauseManager,
    playfield: Playfield,
    readiness: AudioReadiness,
}

impl World {
    /// Creates a world seeded with the subject's persisted best statistics.
    #[must_use]
    pub fn new(config: Config, best: BestStats) -> Self {
        Self {
            banner: WELCOME_BANNER,
            clock: Duration::ZERO,
            phase: Phase::Idle,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            next_trial: 0,
            trial: None,
            session: Session::new(config.trials_per_round, config.rounds, best.accuracy),
            streak: StreakCounter::seeded(best.best_streak),
            scoreboard: Scoreboard::new(),
            timers: TimerRegistry::default(),
            pause: PauseManager::default(),
            playfield: Playfield::new(config.playfield, starting_quarter()),
            readiness: AudioReadiness::Pending,
            config,
        }
    }

    fn is_running(&self) -> bool {
        !self.pause.is_paused() && !self.phase.is_halted()
    }

    fn set_phase(&mut self, phase: Phase, out_events: &mut Vec<Event>) {
        if self.phase == phase {
            return;
        }
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn push_streak(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::StreakChanged {
            streak: self.streak.current(),
            best_streak: self.streak.best(),
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        if !self.is_running() {
            return;
        }

        while let Some(timer) = self.timers.pop_due(self.clock) {
            self.on_timer(timer, out_events);
        }

        if !self.is_running() {
            return;
        }

        match self.playfield.advance(dt) {
            Some(Contact::Destroyed) => self.on_adversary_destroyed(out_events),
            Some(Contact::ReachedThreshold) => self.on_threshold_reached(out_events),
            None => {}
        }

        if self.phase == Phase::Idle {
            self.begin_trial(out_events);
        }
    }

    fn begin_trial(&mut self, out_events: &mut Vec<Event>) {
        if !self.is_running() || self.trial.is_some() {
            return;
        }
        if self.session.total_trials() >= self.config.total_trials() {
            return;
        }

        out_events.push(Event::CueStopped);
        let quarter = Quarter::ALL[self.rng.gen_range(0..QUARTER_COUNT)];
        let id = TrialId::new(self.next_trial);
        self.next_trial = self.next_trial.saturating_add(1);
        self.trial = Some(Trial::new(id, quarter));

        self.set_phase(Phase::PreCueNoise, out_events);
        out_events.push(Event::TrialStarted { trial: id, quarter });
        out_events.push(Event::SoundRequested {
            effect: SoundEffect::MaskingNoise {
                duration: self.config.pre_cue,
            },
        });
        self.timers.arm(
            TimerKind::PreCueElapsed,
            self.clock + self.config.pre_cue,
            id,
        );
    }

    fn on_timer(&mut self, timer: ArmedTimer, out_events: &mut Vec<Event>) {
        // Stale callbacks are dropped rather than applied to a newer trial.
        if !self.is_running() {
            return;
        }
        let Some(trial) = self.trial else {
            return;
        };
        if trial.id != timer.trial || trial.resolved {
            return;
        }

        match (timer.kind, self.phase) {
            (TimerKind::PreCueElapsed | TimerKind::ReadinessPoll, Phase::PreCueNoise) => {
                self.enter_cue_phase(timer.deadline, out_events);
            }
            (TimerKind::CueWindowElapsed, Phase::WithinCuePhase) => {
                self.open_reaction_window(out_events);
            }
            (TimerKind::ToneCloud, Phase::Resolving) => {
                out_events.push(Event::ToneCloudRequested {
                    duration: self.config.tone_cloud,
                });
            }
            (TimerKind::TrialDrain, Phase::Resolving) => self.resolve_trial(out_events),
            _ => {}
        }
    }

    /// Starts the cue phase at `fired_at`, the deadline of the timer that triggered it.
    fn enter_cue_phase(&mut self, fired_at: Duration, out_events: &mut Vec<Event>) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };

        if self.readiness == AudioReadiness::Pending {
            let since = *trial.awaiting_audio_since.get_or_insert(fired_at);
            if fired_at.saturating_sub(since) < self.config.audio_ready_timeout {
                self.timers.arm(
                    TimerKind::ReadinessPoll,
                    fired_at + self.config.audio_poll_interval,
                    trial.id,
                );
                return;
            }
            warn!(
                trial = trial.id.get(),
                "audio still loading; cue phase starts without samples"
            );
        }

        let (id, quarter) = (trial.id, trial.quarter);
        self.set_phase(Phase::WithinCuePhase, out_events);
        out_events.push(Event::CueStarted { quarter });
        self.timers.arm(
            TimerKind::CueWindowElapsed,
            fired_at + self.config.cue_window,
            id,
        );
    }

    fn open_reaction_window(&mut self, out_events: &mut Vec<Event>) {
        let Some(trial) = self.trial else {
            return;
        };

        if !trial.hit {
            self.streak.reset();
            self.push_streak(out_events);
            out_events.push(Event::CueWindowMissed { trial: trial.id });
        }

        self.playfield.spawn_adversary(trial.quarter);
        out_events.push(Event::AdversarySpawned {
            quarter: trial.quarter,
        });
        self.set_phase(Phase::ReactionWindow, out_events);
    }

    fn fire(&mut self, out_events: &mut Vec<Event>) {
        let prefire_open = self.phase == Phase::WithinCuePhase && !self.playfield.has_adversary();
        if prefire_open {
            if let Some(trial) = self.trial.filter(Trial::accepts_prefire) {
                self.evaluate_prefire(trial, out_events);
                return;
            }
        }

        self.playfield.fire_burst();
        out_events.push(Event::ShotsFired {
            quarter: self.playfield.player(),
        });
        out_events.push(Event::SoundRequested {
            effect: SoundEffect::Laser,
        });
    }

    fn evaluate_prefire(&mut self, trial: Trial, out_events: &mut Vec<Event>) {
        let player = self.playfield.player();
        let correct = self.config.difficulty.prefire_matches(trial.quarter, player);
        out_events.push(Event::PrefireEvaluated {
            trial: trial.id,
            player,
            correct,
        });

        if let Some(open) = self.trial.as_mut() {
            open.prefire_spent = true;
            open.hit = correct;
        }

        if !correct {
            // The window keeps running; only a correct guess ends it early.
            self.streak.reset();
            self.push_streak(out_events);
            return;
        }

        self.scoreboard.award_prefire();
        out_events.push(Event::ScoreChanged {
            score: self.scoreboard.score(),
        });
        self.streak.increment();
        self.push_streak(out_events);

        self.timers.cancel(TimerKind::CueWindowElapsed);
        out_events.push(Event::CueStopped);
        out_events.push(Event::SoundRequested {
            effect: SoundEffect::Pew,
        });
        self.schedule_feedback(trial.id, out_events);
    }

    fn schedule_feedback(&mut self, trial: TrialId, out_events: &mut Vec<Event>) {
        self.set_phase(Phase::Resolving, out_events);
        self.timers.arm(
            TimerKind::ToneCloud,
            self.clock + self.config.feedback_delay,
            trial,
        );
        self.timers.arm(
            TimerKind::TrialDrain,
            self.clock + self.config.drain_delay(),
            trial,
        );
    }

    fn on_adversary_destroyed(&mut self, out_events: &mut Vec<Event>) {
        let points = self.scoreboard.award_kill(self.streak.current());
        out_events.push(Event::AdversaryDestroyed { points });
        out_events.push(Event::ScoreChanged {
            score: self.scoreboard.score(),
        });
        out_events.push(Event::CueStopped);
        self.streak.reset();
        self.push_streak(out_events);

        match self.trial {
            Some(trial) if !trial.resolved => self.schedule_feedback(trial.id, out_events),
            _ => {}
        }
    }

    fn on_threshold_reached(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::AdversaryReachedThreshold);
        out_events.push(Event::CueStopped);
        self.timers.clear_all();
        self.resolve_trial(out_events);
    }

    fn resolve_trial(&mut self, out_events: &mut Vec<Event>) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        if trial.resolved {
            return;
        }
        trial.resolved = true;
        let (id, hit) = (trial.id, trial.hit);
        self.trial = None;

        self.timers.clear_all();
        self.playfield.remove_adversary();

        let progress = self.session.record(hit);
        debug!(trial = id.get(), hit, ?progress, "trial resolved");
        out_events.push(Event::TrialResolved {
            trial: id,
            hit,
            total_trials: self.session.total_trials(),
            correct_prefires: self.session.correct_prefires(),
        });

        match progress {
            Progress::SessionComplete => {
                let summary = self
                    .session
                    .summary(self.streak.current(), self.streak.best(), true);
                info!(
                    correct = summary.correct,
                    total = summary.total,
                    accuracy = summary.accuracy_pct,
                    "session complete"
                );
                self.set_phase(Phase::SessionDone, out_events);
                out_events.push(Event::SessionCompleted { summary });
                self.commit_best_stats(out_events);
            }
            Progress::RoundComplete => {
                let summary = self
                    .session
                    .summary(self.streak.current(), self.streak.best(), false);
                info!(
                    title = %summary.title,
                    accuracy = summary.accuracy_pct,
                    "round complete"
                );
                self.set_phase(Phase::RoundBoundary, out_events);
                out_events.push(Event::RoundCompleted { summary });
            }
            Progress::Continue => {
                self.set_phase(Phase::Idle, out_events);
                self.begin_trial(out_events);
            }
        }
    }

    fn abandon_trial(&mut self, out_events: &mut Vec<Event>) {
        if let Some(trial) = self.trial.take() {
            if !trial.resolved {
                debug!(trial = trial.id.get(), "trial abandoned");
                out_events.push(Event::TrialAbandoned { trial: trial.id });
            }
        }
        self.playfield.remove_adversary();
    }

    fn commit_best_stats(&mut self, out_events: &mut Vec<Event>) {
        let accuracy = self.session.commit_best_accuracy();
        out_events.push(Event::BestStatsCommitted {
            stats: BestStats {
                accuracy,
                best_streak: self.streak.best(),
            },
        });
    }

    fn pause(&mut self, out_events: &mut Vec<Event>) {
        let quarter = self.trial.map(|trial| trial.quarter);
        if !self
            .pause
            .pause(self.phase, quarter, self.playfield.has_adversary())
        {
            return;
        }
        self.timers.clear_all();
        out_events.push(Event::CueStopped);
        out_events.push(Event::AudioSuspended);
        out_events.push(Event::PauseChanged { paused: true });
    }

    fn resume(&mut self, out_events: &mut Vec<Event>) {
        let Some(snapshot) = self.pause.resume() else {
            return;
        };
        out_events.push(Event::PauseChanged { paused: false });
        out_events.push(Event::AudioResumed);

        if snapshot.within_cue_phase && self.phase == Phase::WithinCuePhase {
            if let (Some(quarter), Some(trial)) = (snapshot.quarter, self.trial) {
                // The window restarts in full; elapsed time before the pause is discarded.
                out_events.push(Event::CueStarted { quarter });
                self.timers.arm(
                    TimerKind::CueWindowElapsed,
                    self.clock + self.config.cue_window,
                    trial.id,
                );
                return;
            }
        }

        if snapshot.had_reaction_waiting {
            self.abandon_trial(out_events);
            self.set_phase(Phase::Idle, out_events);
            self.begin_trial(out_events);
        } else if self.phase == Phase::Resolving {
            self.resolve_trial(out_events);
        } else if self.phase == Phase::Idle {
            self.begin_trial(out_events);
        }
    }

    fn continue_after_summary(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            Phase::SessionDone => self.exit(out_events),
            Phase::RoundBoundary => {
                let round_index = self.session.advance_round();
                out_events.push(Event::RoundAdvanced { round_index });
                self.set_phase(Phase::Idle, out_events);
                self.begin_trial(out_events);
            }
            _ => {}
        }
    }

    fn exit(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == Phase::Exited {
            return;
        }
        if self.phase != Phase::SessionDone {
            self.commit_best_stats(out_events);
        }

        self.timers.clear_all();
        self.pause.clear();
        self.abandon_trial(out_events);
        self.playfield.clear();
        out_events.push(Event::CueStopped);
        out_events.push(Event::AudioSuspended);
        self.set_phase(Phase::Exited, out_events);
        info!("experiment exited");
        out_events.push(Event::Exited);
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Exited {
            return;
        }
        self.session.reset();
        self.streak = StreakCounter::seeded(self.streak.best());
        self.scoreboard = Scoreboard::new();
        self.playfield = Playfield::new(self.config.playfield, starting_quarter());
        self.timers.clear_all();
        self.trial = None;

        info!("session restarted");
        out_events.push(Event::SessionRestarted);
        out_events.push(Event::AudioResumed);
        self.push_streak(out_events);
        out_events.push(Event::ScoreChanged { score: 0 });
        self.set_phase(Phase::Idle, out_events);
    }
}

fn starting_quarter() -> Quarter {
    Quarter::ALL[usize::from(STARTING_QUARTER)]
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SelectQuarter { quarter } => {
            if world.is_running() {
                world.playfield.select(quarter);
                out_events.push(Event::PlayerQuarterSelected { quarter });
            }
        }
        Command::Fire => {
            if world.is_running() {
                world.fire(out_events);
            }
        }
        Command::IncrementStreak => {
            if world.is_running() {
                world.streak.increment();
                world.push_streak(out_events);
            }
        }
        Command::TogglePause => {
            if world.pause.is_paused() {
                world.resume(out_events);
            } else if !world.phase.is_halted() {
                world.pause(out_events);
            }
        }
        Command::Resume => world.resume(out_events),
        Command::Restart => world.restart(out_events),
        Command::Continue => world.continue_after_summary(out_events),
        Command::Exit => world.exit(out_events),
        Command::SetAudioReadiness { readiness } => {
            if world.readiness != readiness {
                debug!(?readiness, "audio readiness changed");
                world.readiness = readiness;
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use prefire_core::{AudioReadiness, PauseSnapshot, Phase, Quarter};
    use prefire_system_scoring::StreakCounter;

    use super::{AdversarySnapshot, ArmedTimer, SessionSnapshot, TrialSnapshot, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current phase of the trial state machine.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Reports whether the experiment is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.pause.is_paused()
    }

    /// Snapshot captured by the active pause, if any.
    #[must_use]
    pub fn pause_snapshot(world: &World) -> Option<PauseSnapshot> {
        world.pause.snapshot()
    }

    /// Read-only view of the session counters.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        world.session.snapshot()
    }

    /// The open trial, if any.
    #[must_use]
    pub fn trial(world: &World) -> Option<TrialSnapshot> {
        world.trial.map(|trial| TrialSnapshot {
            id: trial.id,
            quarter: trial.quarter,
            hit: trial.hit,
            prefire_spent: trial.prefire_spent,
            resolved: trial.resolved,
        })
    }

    /// Current and best streak.
    #[must_use]
    pub fn streak(world: &World) -> StreakCounter {
        world.streak
    }

    /// Points accumulated in the session.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.scoreboard.score()
    }

    /// Quarter the player currently occupies.
    #[must_use]
    pub fn player_quarter(world: &World) -> Quarter {
        world.playfield.player()
    }

    /// The descending adversary, if spawned.
    #[must_use]
    pub fn adversary(world: &World) -> Option<AdversarySnapshot> {
        world.playfield.adversary()
    }

    /// Number of shots in flight.
    #[must_use]
    pub fn shots_in_flight(world: &World) -> usize {
        world.playfield.shot_count()
    }

    /// Armed timers ordered by deadline.
    #[must_use]
    pub fn armed_timers(world: &World) -> Vec<ArmedTimer> {
        world.timers.snapshot()
    }

    /// Experiment clock.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Last audio readiness reported to the world.
    #[must_use]
    pub fn audio_readiness(world: &World) -> AudioReadiness {
        world.readiness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_world() -> World {
        let mut world = World::new(Config::default(), BestStats::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetAudioReadiness {
                readiness: AudioReadiness::Ready,
            },
            &mut events,
        );
        world
    }

    #[test]
    fn first_tick_opens_trial_with_masking_noise() {
        let mut world = ready_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );

        assert_eq!(query::phase(&world), Phase::PreCueNoise);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TrialStarted { .. })));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::SoundRequested {
                effect: SoundEffect::MaskingNoise { .. }
            }
        )));
        let timers = query::armed_timers(&world);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].kind, TimerKind::PreCueElapsed);
    }

    #[test]
    fn pending_audio_defers_cue_phase_until_ready() {
        let mut world = World::new(Config::default(), BestStats::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(10),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(2000),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), Phase::PreCueNoise);
        assert_eq!(
            query::armed_timers(&world)[0].kind,
            TimerKind::ReadinessPoll
        );

        apply(
            &mut world,
            Command::SetAudioReadiness {
                readiness: AudioReadiness::Ready,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(25),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), Phase::WithinCuePhase);
    }

    #[test]
    fn pending_audio_starts_cue_phase_once_timeout_elapses() {
        let mut world = World::new(Config::default(), BestStats::default());
        let mut events = Vec::new();
        for millis in [10, 2000, 19_975] {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(millis),
                },
                &mut events,
            );
        }
        assert_eq!(query::phase(&world), Phase::PreCueNoise);
        assert_eq!(query::audio_readiness(&world), AudioReadiness::Pending);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(25),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), Phase::WithinCuePhase);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::CueStarted { .. })));
        let timers = query::armed_timers(&world);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].kind, TimerKind::CueWindowElapsed);
        assert_eq!(timers[0].deadline, Duration::from_millis(26_010));
    }

    #[test]
    fn cue_window_is_armed_from_the_pre_cue_deadline() {
        let mut world = ready_world();
        let mut events = Vec::new();
        for millis in [10, 2100] {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(millis),
                },
                &mut events,
            );
        }
        assert_eq!(query::phase(&world), Phase::WithinCuePhase);
        let timers = query::armed_timers(&world);
        assert_eq!(timers[0].kind, TimerKind::CueWindowElapsed);
        assert_eq!(timers[0].deadline, Duration::from_millis(6010));
    }

    #[test]
    fn halted_world_ignores_gameplay_input() {
        let mut world = ready_world();
        let mut events = Vec::new();
        apply(&mut world, Command::Exit, &mut events);
        events.clear();

        apply(&mut world, Command::Fire, &mut events);
        apply(&mut world, Command::IncrementStreak, &mut events);
        apply(&mut world, Command::TogglePause, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::phase(&world), Phase::Exited);
    }
}
